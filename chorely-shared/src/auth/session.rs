/// Per-request session
///
/// The API's auth layer turns the `Authorization: Bearer <token>` header into a
/// [`Session`] and stores it in the request extensions. Handlers receive it as
/// an explicit value; nothing about the caller is kept in global state.
///
/// # Example
///
/// ```
/// use chorely_shared::auth::jwt::{create_token, Claims, TokenType};
/// use chorely_shared::auth::session::authenticate_bearer;
/// use chorely_shared::models::user::UserRole;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "a-signing-secret-of-at-least-32-bytes!";
/// let user_id = Uuid::new_v4();
/// let token = create_token(&Claims::new(user_id, UserRole::User, TokenType::Access), secret)?;
///
/// let session = authenticate_bearer(Some(&format!("Bearer {}", token)), secret)?;
/// assert_eq!(session.user_id, user_id);
/// assert!(!session.is_admin());
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{validate_access_token, Claims, JwtError};
use crate::models::user::UserRole;

/// The authenticated caller of one request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl Session {
    pub fn new(user_id: Uuid, role: UserRole) -> Self {
        Self { user_id, role }
    }

    pub fn from_claims(claims: &Claims) -> Self {
        Self::new(claims.sub, claims.role)
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Reasons a request could not be authenticated
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Missing credentials")]
    MissingCredentials,

    #[error("{0}")]
    InvalidFormat(String),

    #[error("{0}")]
    InvalidToken(String),

    #[error("Invalid email or password")]
    InvalidCredentials,
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
            JwtError::InvalidIssuer { .. } => AuthError::InvalidToken("Invalid issuer".to_string()),
            other => AuthError::InvalidToken(format!("Invalid token: {}", other)),
        }
    }
}

/// Parses an `Authorization` header value and validates the access token
///
/// # Errors
///
/// - `MissingCredentials` when the header is absent
/// - `InvalidFormat` when the value is not `Bearer <token>`
/// - `InvalidToken` when the token fails validation or is a refresh token
pub fn authenticate_bearer(header: Option<&str>, secret: &str) -> Result<Session, AuthError> {
    let header = header.ok_or(AuthError::MissingCredentials)?;

    let token = header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    let claims = validate_access_token(token, secret)?;
    Ok(Session::from_claims(&claims))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{create_token, TokenType};

    const SECRET: &str = "test-secret-key-that-is-long-enough-for-hs256";

    fn bearer(role: UserRole, token_type: TokenType) -> (Uuid, String) {
        let user_id = Uuid::new_v4();
        let token = create_token(&Claims::new(user_id, role, token_type), SECRET).unwrap();
        (user_id, format!("Bearer {}", token))
    }

    #[test]
    fn test_valid_access_token() {
        let (user_id, header) = bearer(UserRole::Admin, TokenType::Access);
        let session = authenticate_bearer(Some(&header), SECRET).unwrap();

        assert_eq!(session, Session::new(user_id, UserRole::Admin));
        assert!(session.is_admin());
    }

    #[test]
    fn test_missing_header() {
        assert_eq!(
            authenticate_bearer(None, SECRET),
            Err(AuthError::MissingCredentials)
        );
    }

    #[test]
    fn test_wrong_scheme() {
        assert!(matches!(
            authenticate_bearer(Some("Basic dXNlcjpwYXNz"), SECRET),
            Err(AuthError::InvalidFormat(_))
        ));
        assert!(matches!(
            authenticate_bearer(Some("Bearer "), SECRET),
            Err(AuthError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_refresh_token_not_accepted() {
        let (_, header) = bearer(UserRole::User, TokenType::Refresh);
        assert!(matches!(
            authenticate_bearer(Some(&header), SECRET),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_tampered_token() {
        let (_, header) = bearer(UserRole::User, TokenType::Access);
        let tampered = format!("{}x", header);
        assert!(matches!(
            authenticate_bearer(Some(&tampered), SECRET),
            Err(AuthError::InvalidToken(_))
        ));
    }
}
