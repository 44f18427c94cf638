/// User accounts
///
/// A user is a registered account with credentials and a role. Users take part
/// in households through member profiles linked by `household_members.user_id`;
/// the list of a user's households is derived from those links.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(50) NOT NULL,
///     email VARCHAR(255) NOT NULL,          -- unique on LOWER(email)
///     password_hash VARCHAR(255) NOT NULL,
///     role user_role NOT NULL DEFAULT 'user',
///     avatar_url VARCHAR(512),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use chorely_shared::models::user::{CreateUser, User, UserRole};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let user = User::create(&pool, CreateUser {
///     name: "John Smith".to_string(),
///     email: "john@smith.family".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     role: UserRole::User,
/// }).await?;
///
/// let found = User::find_by_email(&pool, "JOHN@smith.family").await?;
/// assert_eq!(found.map(|u| u.id), Some(user.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DomainError;

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// May act on every household
    Admin,
    User,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::User => "user",
        }
    }
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::User
    }
}

/// A registered account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,

    /// Display name shown on comments and history entries
    pub name: String,

    /// Unique across accounts, compared case-insensitively
    pub email: String,

    /// Argon2id PHC string; never serialized
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    pub role: UserRole,

    pub avatar_url: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    /// Argon2id hash, not the plaintext password
    pub password_hash: String,
    pub role: UserRole,
}

/// Profile fields a user can change; only `Some` fields are written
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    /// `Some(None)` clears the avatar
    pub avatar_url: Option<Option<String>>,
}

impl UpdateUser {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.avatar_url.is_none()
    }
}

/// A user together with the households their member profiles belong to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: User,
    pub household_ids: Vec<Uuid>,
}

const USER_COLUMNS: &str = "id, name, email, password_hash, role, avatar_url, created_at, updated_at";

impl User {
    /// Inserts a new account
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Conflict` ("User with this email already exists.")
    /// when the email is taken, regardless of case.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, DomainError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(data.name)
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.role)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Case-insensitive lookup by email
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email.trim())
        .fetch_optional(pool)
        .await
    }

    /// Updates profile fields
    ///
    /// Returns `Ok(None)` when the user does not exist.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Conflict` when the new email belongs to another
    /// account.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateUser,
    ) -> Result<Option<Self>, DomainError> {
        let mut query = String::from("UPDATE users SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.email.is_some() {
            bind_count += 1;
            query.push_str(&format!(", email = ${}", bind_count));
        }
        if data.avatar_url.is_some() {
            bind_count += 1;
            query.push_str(&format!(", avatar_url = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {USER_COLUMNS}"));

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(email) = data.email {
            q = q.bind(email);
        }
        if let Some(avatar_url) = data.avatar_url {
            q = q.bind(avatar_url);
        }

        Ok(q.fetch_optional(pool).await?)
    }

    /// Changes the account role; returns `Ok(None)` for an unknown id
    pub async fn set_role(
        pool: &PgPool,
        id: Uuid,
        role: UserRole,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET role = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(role)
        .fetch_optional(pool)
        .await
    }

    /// All accounts ordered by name
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY LOWER(name), created_at"
        ))
        .fetch_all(pool)
        .await
    }

    /// Households the user has a linked member profile in
    pub async fn household_ids(pool: &PgPool, id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT household_id
            FROM household_members
            WHERE user_id = $1
            ORDER BY joined_at
            "#,
        )
        .bind(id)
        .fetch_all(pool)
        .await
    }

    /// Loads the user and their household ids
    pub async fn profile(pool: &PgPool, id: Uuid) -> Result<Option<UserProfile>, sqlx::Error> {
        let Some(user) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };
        let household_ids = Self::household_ids(pool, id).await?;

        Ok(Some(UserProfile { user, household_ids }))
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            name: "Jane Smith".to_string(),
            email: "jane@smith.family".to_string(),
            password_hash: "$argon2id$v=19$secret".to_string(),
            role: UserRole::User,
            avatar_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let json = serde_json::to_value(sample_user()).unwrap();

        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "user");
        assert_eq!(json["name"], "Jane Smith");
    }

    #[test]
    fn test_profile_flattens_user() {
        let user = sample_user();
        let household_id = Uuid::new_v4();
        let profile = UserProfile {
            user: user.clone(),
            household_ids: vec![household_id],
        };

        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["id"], user.id.to_string());
        assert_eq!(json["household_ids"][0], household_id.to_string());
    }

    #[test]
    fn test_user_role() {
        assert_eq!(UserRole::Admin.as_str(), "admin");
        assert_eq!(UserRole::default(), UserRole::User);
        assert_eq!(
            serde_json::from_str::<UserRole>("\"admin\"").unwrap(),
            UserRole::Admin
        );
        assert!(!sample_user().is_admin());
    }

    #[test]
    fn test_update_user_is_empty() {
        assert!(UpdateUser::default().is_empty());
        assert!(!UpdateUser {
            avatar_url: Some(None),
            ..Default::default()
        }
        .is_empty());
    }
}
