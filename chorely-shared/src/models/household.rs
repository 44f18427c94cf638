/// Households
///
/// A household is the isolation boundary: it owns its members and tasks, and a
/// user reaches a household only through a member profile linked to their
/// account.
///
/// # Deletion
///
/// Foreign keys do not cascade. [`Household::delete_cascade`] removes the
/// dependents explicitly, in one transaction, in this order:
///
/// 1. comments on the household's tasks
/// 2. task history entries
/// 3. tasks
/// 4. member profiles
/// 5. the household row
///
/// # Example
///
/// ```no_run
/// use chorely_shared::models::household::{CreateHousehold, Household, HouseType};
/// use chorely_shared::models::user::User;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, owner: User) -> Result<(), Box<dyn std::error::Error>> {
/// let (household, owner_member) = Household::create_with_owner(&pool, CreateHousehold {
///     name: "Smith Family Home".to_string(),
///     house_type: Some(HouseType::House),
///     has_garden: true,
///     ..Default::default()
/// }, &owner).await?;
///
/// assert_eq!(owner_member.role, "Owner");
/// let summary = Household::delete_cascade(&pool, household.id).await?;
/// assert_eq!(summary.members, 1);
/// # Ok(())
/// # }
/// ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use super::member::{CreateMember, Member, OWNER_ROLE};
use super::task::{Task, TaskView};
use super::user::User;
use crate::error::DomainError;

/// Kind of dwelling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "house_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum HouseType {
    Apartment,
    House,
    Studio,
    Villa,
    Other,
}

impl HouseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HouseType::Apartment => "apartment",
            HouseType::House => "house",
            HouseType::Studio => "studio",
            HouseType::Villa => "villa",
            HouseType::Other => "other",
        }
    }
}

/// A household row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Household {
    pub id: Uuid,
    pub name: String,
    pub number_of_rooms: Option<i32>,
    /// Floor area in m²
    pub house_size: Option<f64>,
    pub number_of_floors: Option<i32>,
    pub address: Option<String>,
    pub house_type: Option<HouseType>,
    pub has_garden: bool,
    pub has_garage: bool,
    pub has_basement: bool,
    pub has_attic: bool,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A household with its members and tasks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseholdDetail {
    #[serde(flatten)]
    pub household: Household,
    pub members: Vec<Member>,
    pub tasks: Vec<TaskView>,
}

/// Input for creating a household
#[derive(Debug, Clone, Default)]
pub struct CreateHousehold {
    pub name: String,
    pub number_of_rooms: Option<i32>,
    pub house_size: Option<f64>,
    pub number_of_floors: Option<i32>,
    pub address: Option<String>,
    pub house_type: Option<HouseType>,
    pub has_garden: bool,
    pub has_garage: bool,
    pub has_basement: bool,
    pub has_attic: bool,
    pub description: Option<String>,
}

/// Attribute edits; `None` leaves a field alone, `Some(None)` clears it
#[derive(Debug, Clone, Default)]
pub struct UpdateHousehold {
    pub name: Option<String>,
    pub number_of_rooms: Option<Option<i32>>,
    pub house_size: Option<Option<f64>>,
    pub number_of_floors: Option<Option<i32>>,
    pub address: Option<Option<String>>,
    pub house_type: Option<Option<HouseType>>,
    pub has_garden: Option<bool>,
    pub has_garage: Option<bool>,
    pub has_basement: Option<bool>,
    pub has_attic: Option<bool>,
    pub description: Option<Option<String>>,
}

/// Row counts removed by [`Household::delete_cascade`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HouseholdDeletion {
    pub comments: u64,
    pub history_entries: u64,
    pub tasks: u64,
    pub members: u64,
}

const HOUSEHOLD_COLUMNS: &str = "id, name, number_of_rooms, house_size, number_of_floors, address, \
                                 house_type, has_garden, has_garage, has_basement, has_attic, \
                                 description, created_at, updated_at";

impl Household {
    /// Creates a household and enrols `owner` as its "Owner" member
    ///
    /// Both rows are written in one transaction.
    pub async fn create_with_owner(
        pool: &PgPool,
        data: CreateHousehold,
        owner: &User,
    ) -> Result<(Self, Member), DomainError> {
        let mut tx = pool.begin().await?;

        let household = sqlx::query_as::<_, Household>(&format!(
            r#"
            INSERT INTO households
                (name, number_of_rooms, house_size, number_of_floors, address, house_type,
                 has_garden, has_garage, has_basement, has_attic, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {HOUSEHOLD_COLUMNS}
            "#
        ))
        .bind(data.name)
        .bind(data.number_of_rooms)
        .bind(data.house_size)
        .bind(data.number_of_floors)
        .bind(data.address)
        .bind(data.house_type)
        .bind(data.has_garden)
        .bind(data.has_garage)
        .bind(data.has_basement)
        .bind(data.has_attic)
        .bind(data.description)
        .fetch_one(&mut *tx)
        .await?;

        let member = Member::insert(
            &mut *tx,
            CreateMember::for_user(household.id, owner, OWNER_ROLE),
        )
        .await?;

        tx.commit().await?;

        info!(
            household_id = %household.id,
            owner_id = %owner.id,
            "Household created"
        );
        Ok((household, member))
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Household>(&format!(
            "SELECT {HOUSEHOLD_COLUMNS} FROM households WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Every household, oldest first
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Household>(&format!(
            "SELECT {HOUSEHOLD_COLUMNS} FROM households ORDER BY created_at, id"
        ))
        .fetch_all(pool)
        .await
    }

    /// Households the user has a linked member profile in, oldest first
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Household>(&format!(
            r#"
            SELECT {HOUSEHOLD_COLUMNS}
            FROM households
            WHERE id IN (SELECT household_id FROM household_members WHERE user_id = $1)
            ORDER BY created_at, id
            "#
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Attaches members and tasks to each household with two queries in total
    pub async fn with_details(
        pool: &PgPool,
        households: Vec<Household>,
    ) -> Result<Vec<HouseholdDetail>, sqlx::Error> {
        let ids: Vec<Uuid> = households.iter().map(|h| h.id).collect();

        let mut members: HashMap<Uuid, Vec<Member>> = HashMap::new();
        for member in Member::list_by_households(pool, &ids).await? {
            members.entry(member.household_id).or_default().push(member);
        }

        let mut tasks: HashMap<Uuid, Vec<TaskView>> = HashMap::new();
        for task in Task::list_by_households(pool, &ids).await? {
            tasks.entry(task.household_id).or_default().push(task.into());
        }

        Ok(households
            .into_iter()
            .map(|household| HouseholdDetail {
                members: members.remove(&household.id).unwrap_or_default(),
                tasks: tasks.remove(&household.id).unwrap_or_default(),
                household,
            })
            .collect())
    }

    /// One household with members and tasks; `Ok(None)` when it does not exist
    pub async fn detail(pool: &PgPool, id: Uuid) -> Result<Option<HouseholdDetail>, sqlx::Error> {
        let Some(household) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };

        Ok(Self::with_details(pool, vec![household]).await?.pop())
    }

    /// Applies attribute edits; `Ok(None)` when the household does not exist
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateHousehold,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("UPDATE households SET updated_at = NOW()");

        if let Some(name) = data.name {
            builder.push(", name = ").push_bind(name);
        }
        if let Some(rooms) = data.number_of_rooms {
            builder.push(", number_of_rooms = ").push_bind(rooms);
        }
        if let Some(size) = data.house_size {
            builder.push(", house_size = ").push_bind(size);
        }
        if let Some(floors) = data.number_of_floors {
            builder.push(", number_of_floors = ").push_bind(floors);
        }
        if let Some(address) = data.address {
            builder.push(", address = ").push_bind(address);
        }
        if let Some(house_type) = data.house_type {
            builder.push(", house_type = ").push_bind(house_type);
        }
        if let Some(garden) = data.has_garden {
            builder.push(", has_garden = ").push_bind(garden);
        }
        if let Some(garage) = data.has_garage {
            builder.push(", has_garage = ").push_bind(garage);
        }
        if let Some(basement) = data.has_basement {
            builder.push(", has_basement = ").push_bind(basement);
        }
        if let Some(attic) = data.has_attic {
            builder.push(", has_attic = ").push_bind(attic);
        }
        if let Some(description) = data.description {
            builder.push(", description = ").push_bind(description);
        }

        builder
            .push(" WHERE id = ")
            .push_bind(id)
            .push(format!(" RETURNING {HOUSEHOLD_COLUMNS}"));

        builder.build_query_as::<Household>().fetch_optional(pool).await
    }

    /// Deletes a household and everything that references it
    ///
    /// The household row is locked first, so tasks or members cannot be added
    /// to it while the delete runs. Nothing is deleted when the household does
    /// not exist.
    ///
    /// # Errors
    ///
    /// `DomainError::NotFound` for an unknown household id
    pub async fn delete_cascade(pool: &PgPool, id: Uuid) -> Result<HouseholdDeletion, DomainError> {
        let mut tx = pool.begin().await?;

        let locked: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM households WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        if locked.is_none() {
            return Err(DomainError::not_found("Household", id));
        }

        let comments = sqlx::query(
            "DELETE FROM comments WHERE task_id IN (SELECT id FROM tasks WHERE household_id = $1)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let history_entries = sqlx::query("DELETE FROM task_history WHERE household_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let tasks = sqlx::query("DELETE FROM tasks WHERE household_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let members = sqlx::query("DELETE FROM household_members WHERE household_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM households WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let summary = HouseholdDeletion {
            comments,
            history_entries,
            tasks,
            members,
        };
        info!(household_id = %id, ?summary, "Household deleted");
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::{TaskPriority, TaskStatus};
    use chrono::NaiveDate;

    fn household(name: &str) -> Household {
        let now = Utc::now();
        Household {
            id: Uuid::new_v4(),
            name: name.to_string(),
            number_of_rooms: Some(5),
            house_size: Some(142.5),
            number_of_floors: Some(2),
            address: Some("12 Elm Street".to_string()),
            house_type: Some(HouseType::House),
            has_garden: true,
            has_garage: true,
            has_basement: false,
            has_attic: true,
            description: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn member(household_id: Uuid, name: &str) -> Member {
        Member {
            id: Uuid::new_v4(),
            household_id,
            user_id: Some(Uuid::new_v4()),
            name: name.to_string(),
            color: "#10B981".to_string(),
            role: "Parent".to_string(),
            age: Some(41),
            room: Some("Master bedroom".to_string()),
            email: Some(format!("{}@smith.family", name.to_lowercase())),
            phone: Some("+1 555 0100".to_string()),
            bio: None,
            joined_at: Utc::now(),
        }
    }

    fn task(household_id: Uuid, assigned_to: Option<Uuid>, title: &str, status: TaskStatus) -> TaskView {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4(),
            household_id,
            assigned_to,
            title: title.to_string(),
            description: None,
            priority: TaskPriority::Medium,
            category: "Cleaning".to_string(),
            status,
            due_date: NaiveDate::from_ymd_opt(2025, 6, 30),
            created_at: now,
            updated_at: now,
        }
        .into()
    }

    #[test]
    fn test_detail_round_trip() {
        let home = household("Smith Family Home");
        let john = member(home.id, "John");
        let jane = member(home.id, "Jane");
        let detail = HouseholdDetail {
            tasks: vec![
                task(home.id, Some(john.id), "Clean the kitchen", TaskStatus::Todo),
                task(home.id, Some(jane.id), "Mow the lawn", TaskStatus::Done),
                task(home.id, None, "Take out recycling", TaskStatus::InProgress),
            ],
            members: vec![john, jane],
            household: home,
        };

        let json = serde_json::to_string(&detail).unwrap();
        let back: HouseholdDetail = serde_json::from_str(&json).unwrap();

        assert_eq!(back, detail);
        assert_eq!(back.members.len(), 2);
        assert_eq!(back.tasks.len(), 3);
    }

    #[test]
    fn test_detail_json_shape() {
        let home = household("Flat 3B");
        let detail = HouseholdDetail {
            members: vec![],
            tasks: vec![task(home.id, None, "Water plants", TaskStatus::Done)],
            household: home,
        };

        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["name"], "Flat 3B");
        assert_eq!(json["house_type"], "house");
        assert_eq!(json["tasks"][0]["completed"], true);
        assert!(json["members"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_house_type_strings() {
        assert_eq!(HouseType::Apartment.as_str(), "apartment");
        assert_eq!(
            serde_json::from_str::<HouseType>("\"villa\"").unwrap(),
            HouseType::Villa
        );
        assert!(serde_json::from_str::<HouseType>("\"castle\"").is_err());
    }
}
