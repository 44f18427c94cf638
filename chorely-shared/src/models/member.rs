/// Household member profiles
///
/// A member is a household-scoped participant: a name, a colour for the
/// calendar, a free-text role ("Owner", "Parent", "Roommate", ...) and optional
/// contact details. A member may be linked to a user account through
/// `user_id`; unlinked members are plain profiles (children, flatmates without
/// an account).
///
/// # Invariants
///
/// - A member id belongs to exactly one household.
/// - A user is linked to at most one member per household
///   (`household_members_household_user_key`).
/// - Member emails are unique per household, case-insensitively
///   (`household_members_household_email_key`).
/// - A member cannot be removed while tasks are assigned to them. [`Member::remove`]
///   checks this under a row lock and the `tasks_assignee_fkey` foreign key
///   (`ON DELETE RESTRICT`) rejects any delete that races past the check.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};
use tracing::{debug, info};
use uuid::Uuid;

use super::user::User;
use crate::error::{DomainError, ASSIGNED_TASKS_MESSAGE};

/// Colour given to members created without one
pub const DEFAULT_MEMBER_COLOR: &str = "#3B82F6";

/// Role given to members created without one
pub const DEFAULT_MEMBER_ROLE: &str = "Member";

/// Role of the member created for the user who creates a household
pub const OWNER_ROLE: &str = "Owner";

/// A household-scoped participant profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Member {
    pub id: Uuid,
    pub household_id: Uuid,

    /// Linked account, if any
    pub user_id: Option<Uuid>,

    pub name: String,

    /// `#RRGGBB`
    pub color: String,

    /// Free-text household role
    pub role: String,

    pub age: Option<i32>,
    pub room: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,

    pub joined_at: DateTime<Utc>,
}

/// Input for creating a member
#[derive(Debug, Clone)]
pub struct CreateMember {
    pub household_id: Uuid,
    pub user_id: Option<Uuid>,
    pub name: String,
    pub color: String,
    pub role: String,
    pub age: Option<i32>,
    pub room: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
}

impl CreateMember {
    /// Profile for a user account, copying its name and email
    pub fn for_user(household_id: Uuid, user: &User, role: impl Into<String>) -> Self {
        Self {
            household_id,
            user_id: Some(user.id),
            name: user.name.clone(),
            color: DEFAULT_MEMBER_COLOR.to_string(),
            role: role.into(),
            age: None,
            room: None,
            email: Some(user.email.clone()),
            phone: None,
            bio: None,
        }
    }
}

/// Profile edits; `None` leaves a field alone, `Some(None)` clears it
#[derive(Debug, Clone, Default)]
pub struct UpdateMember {
    pub name: Option<String>,
    pub color: Option<String>,
    pub role: Option<String>,
    pub age: Option<Option<i32>>,
    pub room: Option<Option<String>>,
    pub email: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub bio: Option<Option<String>>,
}

impl UpdateMember {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.color.is_none()
            && self.role.is_none()
            && self.age.is_none()
            && self.room.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.bio.is_none()
    }
}

const MEMBER_COLUMNS: &str =
    "id, household_id, user_id, name, color, role, age, room, email, phone, bio, joined_at";

impl Member {
    /// Inserts a member using any executor, so it can join a caller's transaction
    pub async fn insert<'e, E>(executor: E, data: CreateMember) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Member>(&format!(
            r#"
            INSERT INTO household_members
                (household_id, user_id, name, color, role, age, room, email, phone, bio)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {MEMBER_COLUMNS}
            "#
        ))
        .bind(data.household_id)
        .bind(data.user_id)
        .bind(data.name)
        .bind(data.color)
        .bind(data.role)
        .bind(data.age)
        .bind(data.room)
        .bind(data.email)
        .bind(data.phone)
        .bind(data.bio)
        .fetch_one(executor)
        .await
    }

    /// Adds a member to a household
    ///
    /// # Errors
    ///
    /// `DomainError::Conflict` when the linked user is already a member or the
    /// email is already used in this household. Nothing is written in either
    /// case.
    pub async fn create(pool: &PgPool, data: CreateMember) -> Result<Self, DomainError> {
        let household_id = data.household_id;
        let member = Self::insert(pool, data).await?;

        info!(
            household_id = %household_id,
            member_id = %member.id,
            linked = member.user_id.is_some(),
            "Member added"
        );
        Ok(member)
    }

    /// Links a user account to a household with the given role
    pub async fn add_user(
        pool: &PgPool,
        household_id: Uuid,
        user: &User,
        role: impl Into<String>,
    ) -> Result<Self, DomainError> {
        Self::create(pool, CreateMember::for_user(household_id, user, role)).await
    }

    pub async fn find(
        pool: &PgPool,
        household_id: Uuid,
        member_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Member>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM household_members WHERE household_id = $1 AND id = $2"
        ))
        .bind(household_id)
        .bind(member_id)
        .fetch_optional(pool)
        .await
    }

    /// Members of one household in join order
    pub async fn list_by_household(
        pool: &PgPool,
        household_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        Self::list_by_households(pool, &[household_id]).await
    }

    /// Members of several households in join order
    pub async fn list_by_households(
        pool: &PgPool,
        household_ids: &[Uuid],
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Member>(&format!(
            r#"
            SELECT {MEMBER_COLUMNS}
            FROM household_members
            WHERE household_id = ANY($1)
            ORDER BY joined_at, id
            "#
        ))
        .bind(household_ids)
        .fetch_all(pool)
        .await
    }

    /// Whether the user has a member profile in the household
    pub async fn is_linked_user(
        pool: &PgPool,
        household_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM household_members
                WHERE household_id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(household_id)
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    /// Applies profile edits; `Ok(None)` when the member is not in the household
    ///
    /// # Errors
    ///
    /// `DomainError::Conflict` when the new email is already used in the
    /// household.
    pub async fn update(
        pool: &PgPool,
        household_id: Uuid,
        member_id: Uuid,
        data: UpdateMember,
    ) -> Result<Option<Self>, DomainError> {
        if data.is_empty() {
            return Ok(Self::find(pool, household_id, member_id).await?);
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE household_members SET ");
        let mut set = builder.separated(", ");

        if let Some(name) = data.name {
            set.push("name = ").push_bind_unseparated(name);
        }
        if let Some(color) = data.color {
            set.push("color = ").push_bind_unseparated(color);
        }
        if let Some(role) = data.role {
            set.push("role = ").push_bind_unseparated(role);
        }
        if let Some(age) = data.age {
            set.push("age = ").push_bind_unseparated(age);
        }
        if let Some(room) = data.room {
            set.push("room = ").push_bind_unseparated(room);
        }
        if let Some(email) = data.email {
            set.push("email = ").push_bind_unseparated(email);
        }
        if let Some(phone) = data.phone {
            set.push("phone = ").push_bind_unseparated(phone);
        }
        if let Some(bio) = data.bio {
            set.push("bio = ").push_bind_unseparated(bio);
        }

        builder
            .push(" WHERE household_id = ")
            .push_bind(household_id)
            .push(" AND id = ")
            .push_bind(member_id)
            .push(format!(" RETURNING {MEMBER_COLUMNS}"));

        let member = builder
            .build_query_as::<Member>()
            .fetch_optional(pool)
            .await?;

        Ok(member)
    }

    /// Removes one member from a household
    ///
    /// Runs in a transaction holding a row lock on the member:
    ///
    /// 1. Lock the member row (`NotFound` if it is not in this household)
    /// 2. Refuse with `Conflict` while any task is assigned to the member
    /// 3. Delete exactly one row
    ///
    /// A task assigned concurrently between steps 2 and 3 makes the delete fail
    /// on `tasks_assignee_fkey`, which is reported as the same `Conflict`.
    pub async fn remove(
        pool: &PgPool,
        household_id: Uuid,
        member_id: Uuid,
    ) -> Result<(), DomainError> {
        let mut tx = pool.begin().await?;

        let locked: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM household_members
            WHERE household_id = $1 AND id = $2
            FOR UPDATE
            "#,
        )
        .bind(household_id)
        .bind(member_id)
        .fetch_optional(&mut *tx)
        .await?;

        if locked.is_none() {
            return Err(DomainError::NotFound(
                "Member not found in this household".to_string(),
            ));
        }

        let assigned: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM tasks WHERE household_id = $1 AND assigned_to = $2",
        )
        .bind(household_id)
        .bind(member_id)
        .fetch_one(&mut *tx)
        .await?;

        if assigned > 0 {
            debug!(
                household_id = %household_id,
                member_id = %member_id,
                assigned,
                "Refusing to remove member with assigned tasks"
            );
            return Err(DomainError::Conflict(ASSIGNED_TASKS_MESSAGE.to_string()));
        }

        let result = sqlx::query("DELETE FROM household_members WHERE household_id = $1 AND id = $2")
            .bind(household_id)
            .bind(member_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            household_id = %household_id,
            member_id = %member_id,
            rows = result.rows_affected(),
            "Member removed"
        );
        Ok(())
    }

    pub async fn count_by_household(pool: &PgPool, household_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM household_members WHERE household_id = $1")
            .bind(household_id)
            .fetch_one(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::UserRole;

    #[test]
    fn test_create_member_for_user_copies_profile() {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: "John Smith".to_string(),
            email: "john@smith.family".to_string(),
            password_hash: String::new(),
            role: UserRole::User,
            avatar_url: None,
            created_at: now,
            updated_at: now,
        };
        let household_id = Uuid::new_v4();

        let data = CreateMember::for_user(household_id, &user, OWNER_ROLE);

        assert_eq!(data.household_id, household_id);
        assert_eq!(data.user_id, Some(user.id));
        assert_eq!(data.name, "John Smith");
        assert_eq!(data.email.as_deref(), Some("john@smith.family"));
        assert_eq!(data.role, "Owner");
        assert_eq!(data.color, DEFAULT_MEMBER_COLOR);
    }

    #[test]
    fn test_update_member_default_is_noop() {
        assert!(UpdateMember::default().is_empty());
        assert!(!UpdateMember {
            bio: Some(None),
            ..Default::default()
        }
        .is_empty());
    }
}
