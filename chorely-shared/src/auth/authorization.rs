/// Authorization checks
///
/// # Permission Model
///
/// 1. **Admin accounts** may act on every household, member, task and comment.
/// 2. **User accounts** may act on a household only when one of its member
///    profiles is linked to their account (`household_members.user_id`).
/// 3. **Comments** may be edited or deleted by their author or an admin.
///
/// # Example
///
/// ```no_run
/// use chorely_shared::auth::authorization::require_household_access;
/// use chorely_shared::auth::session::Session;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// async fn check(pool: &PgPool, session: &Session, household_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
///     require_household_access(pool, session, household_id).await?;
///     Ok(())
/// }
/// ```

use sqlx::PgPool;
use uuid::Uuid;

use super::session::Session;
use crate::models::comment::Comment;
use crate::models::member::Member;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Caller has no member profile in the household
    #[error("Not a member of household {0}")]
    NotMember(Uuid),

    #[error("Administrator role required")]
    AdminRequired,

    /// Caller is neither the comment author nor an admin
    #[error("Only the author or an administrator can modify this comment")]
    NotAuthor,

    /// Caller tried to act on another account
    #[error("Not authorized to access this account")]
    NotSelf,

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

pub fn require_admin(session: &Session) -> Result<(), AuthzError> {
    if !session.is_admin() {
        return Err(AuthzError::AdminRequired);
    }
    Ok(())
}

/// Requires the caller to be an admin or linked to a member of the household
///
/// # Errors
///
/// Returns `AuthzError::NotMember` for non-admins without a linked profile
pub async fn require_household_access(
    pool: &PgPool,
    session: &Session,
    household_id: Uuid,
) -> Result<(), AuthzError> {
    if session.is_admin() {
        return Ok(());
    }

    if !Member::is_linked_user(pool, household_id, session.user_id).await? {
        return Err(AuthzError::NotMember(household_id));
    }

    Ok(())
}

/// Requires the caller to be the comment author or an admin
pub fn require_comment_author(session: &Session, comment: &Comment) -> Result<(), AuthzError> {
    if session.is_admin() || comment.user_id == session.user_id {
        return Ok(());
    }
    Err(AuthzError::NotAuthor)
}

/// Requires the caller to be the account itself or an admin
pub fn require_self_or_admin(session: &Session, user_id: Uuid) -> Result<(), AuthzError> {
    if session.is_admin() || session.user_id == user_id {
        return Ok(());
    }
    Err(AuthzError::NotSelf)
}
