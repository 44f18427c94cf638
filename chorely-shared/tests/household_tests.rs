//! Household and member consistency rules against a real database

mod common;

use chorely_shared::error::{DomainError, ASSIGNED_TASKS_MESSAGE};
use chorely_shared::models::comment::Comment;
use chorely_shared::models::household::{Household, UpdateHousehold};
use chorely_shared::models::member::{Member, UpdateMember};
use chorely_shared::models::task::{StatusChange, Task, UpdateTask};

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn test_delete_household_leaves_no_orphans() {
    let pool = common::setup_pool().await;
    let (household, owner) = common::create_household(&pool, "Cascade Cottage").await;
    let kid = common::add_profile(&pool, household.id, "Mia", None).await;

    let dishes = common::create_task(&pool, household.id, "Dishes", Some(kid.id), owner.id).await;
    let trash = common::create_task(&pool, household.id, "Trash", None, owner.id).await;
    Task::toggle_completion(&pool, trash.id, owner.id).await.unwrap();
    Comment::create(&pool, dishes.id, owner.id, "Use the blue sponge").await.unwrap();

    let summary = Household::delete_cascade(&pool, household.id).await.unwrap();
    assert_eq!(summary.tasks, 2);
    assert_eq!(summary.members, 2);
    assert_eq!(summary.comments, 1);
    assert_eq!(summary.history_entries, 3);

    let id = household.id;
    assert_eq!(
        common::count(&pool, "SELECT COUNT(*) FROM comments WHERE task_id IN ($1)", dishes.id).await,
        0
    );
    assert_eq!(common::count(&pool, "SELECT COUNT(*) FROM task_history WHERE household_id = $1", id).await, 0);
    assert_eq!(common::count(&pool, "SELECT COUNT(*) FROM tasks WHERE household_id = $1", id).await, 0);
    assert_eq!(
        common::count(&pool, "SELECT COUNT(*) FROM household_members WHERE household_id = $1", id).await,
        0
    );
    assert!(Household::find_by_id(&pool, id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn test_delete_missing_household_is_not_found() {
    let pool = common::setup_pool().await;

    let result = Household::delete_cascade(&pool, uuid::Uuid::new_v4()).await;
    assert!(matches!(result, Err(DomainError::NotFound(_))));
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn test_smith_family_member_removal() {
    let pool = common::setup_pool().await;
    let (household, owner) = common::create_household(&pool, "Smith Family Home").await;
    let john = common::add_profile(&pool, household.id, "John", None).await;
    let jane = common::add_profile(&pool, household.id, "Jane", None).await;
    let kitchen = common::create_task(&pool, household.id, "Clean the kitchen", Some(john.id), owner.id).await;

    let blocked = Member::remove(&pool, household.id, john.id).await;
    match blocked {
        Err(DomainError::Conflict(message)) => assert_eq!(message, ASSIGNED_TASKS_MESSAGE),
        other => panic!("expected conflict, got {:?}", other),
    }
    assert!(Member::find(&pool, household.id, john.id).await.unwrap().is_some());

    Task::update(
        &pool,
        kitchen.id,
        UpdateTask {
            assigned_to: Some(Some(jane.id)),
            ..Default::default()
        },
        owner.id,
    )
    .await
    .unwrap();

    let before = Member::count_by_household(&pool, household.id).await.unwrap();
    Member::remove(&pool, household.id, john.id).await.unwrap();
    let after = Member::count_by_household(&pool, household.id).await.unwrap();

    assert_eq!(before - after, 1);
    assert!(Member::find(&pool, household.id, john.id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn test_remove_member_from_other_household_is_not_found() {
    let pool = common::setup_pool().await;
    let (first, _) = common::create_household(&pool, "First House").await;
    let (second, _) = common::create_household(&pool, "Second House").await;
    let member = common::add_profile(&pool, first.id, "Leo", None).await;

    let result = Member::remove(&pool, second.id, member.id).await;
    assert!(matches!(result, Err(DomainError::NotFound(_))));
    assert!(Member::find(&pool, first.id, member.id).await.unwrap().is_some());
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn test_duplicate_member_email_conflicts() {
    let pool = common::setup_pool().await;
    let (household, _) = common::create_household(&pool, "Email Manor").await;
    common::add_profile(&pool, household.id, "Sam", Some("sam@example.com")).await;
    let before = Member::list_by_household(&pool, household.id).await.unwrap();

    let mut duplicate = chorely_shared::models::member::CreateMember {
        household_id: household.id,
        user_id: None,
        name: "Samantha".to_string(),
        color: "#EF4444".to_string(),
        role: "Roommate".to_string(),
        age: None,
        room: None,
        email: Some("SAM@example.com".to_string()),
        phone: None,
        bio: None,
    };
    let result = Member::create(&pool, duplicate.clone()).await;
    assert!(matches!(result, Err(DomainError::Conflict(_))));

    let after = Member::list_by_household(&pool, household.id).await.unwrap();
    assert_eq!(before, after);

    duplicate.email = Some("samantha@example.com".to_string());
    assert!(Member::create(&pool, duplicate).await.is_ok());
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn test_add_same_user_twice_conflicts() {
    let pool = common::setup_pool().await;
    let (household, owner) = common::create_household(&pool, "Twice House").await;

    let result = Member::add_user(&pool, household.id, &owner, "Parent").await;
    match result {
        Err(DomainError::Conflict(message)) => {
            assert_eq!(message, "User is already a member of this household.")
        }
        other => panic!("expected conflict, got {:?}", other),
    }
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn test_detail_nests_members_and_tasks() {
    let pool = common::setup_pool().await;
    let (household, owner) = common::create_household(&pool, "Detail Duplex").await;
    let ana = common::add_profile(&pool, household.id, "Ana", None).await;
    let task = common::create_task(&pool, household.id, "Sweep porch", Some(ana.id), owner.id).await;
    Task::update(
        &pool,
        task.id,
        UpdateTask {
            status_change: Some(StatusChange::Completed(true)),
            ..Default::default()
        },
        owner.id,
    )
    .await
    .unwrap();

    let detail = Household::detail(&pool, household.id).await.unwrap().unwrap();
    assert_eq!(detail.members.len(), 2);
    assert_eq!(detail.tasks.len(), 1);
    assert!(detail.tasks[0].completed);

    let households = Household::list_for_user(&pool, owner.id).await.unwrap();
    assert!(households.iter().any(|h| h.id == household.id));
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn test_update_household_and_member() {
    let pool = common::setup_pool().await;
    let (household, _) = common::create_household(&pool, "Old Name").await;
    let member = common::add_profile(&pool, household.id, "Ola", None).await;

    let updated = Household::update(
        &pool,
        household.id,
        UpdateHousehold {
            name: Some("New Name".to_string()),
            number_of_rooms: Some(Some(4)),
            has_garden: Some(true),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(updated.name, "New Name");
    assert_eq!(updated.number_of_rooms, Some(4));
    assert!(updated.has_garden);

    let edited = Member::update(
        &pool,
        household.id,
        member.id,
        UpdateMember {
            room: Some(Some("Attic".to_string())),
            age: Some(Some(12)),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(edited.room.as_deref(), Some("Attic"));
    assert_eq!(edited.age, Some(12));
    assert_eq!(edited.name, "Ola");
}
