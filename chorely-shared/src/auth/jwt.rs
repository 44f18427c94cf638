/// JWT issuing and validation
///
/// Tokens are HS256-signed and carry the user id and the account role, so a
/// request can be authorized without a database round-trip. The role is
/// refreshed from the database whenever a refresh token is exchanged.
///
/// # Token Types
///
/// - **Access**: 24 hours, sent as `Authorization: Bearer <token>`
/// - **Refresh**: 30 days, only accepted by `/v1/auth/refresh`
///
/// # Example
///
/// ```
/// use chorely_shared::auth::jwt::{create_token, validate_access_token, Claims, TokenType};
/// use chorely_shared::models::user::UserRole;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "a-signing-secret-of-at-least-32-bytes!";
/// let claims = Claims::new(Uuid::new_v4(), UserRole::User, TokenType::Access);
/// let token = create_token(&claims, secret)?;
///
/// let validated = validate_access_token(&token, secret)?;
/// assert_eq!(validated.role, UserRole::User);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::UserRole;

/// Value of the `iss` claim
pub const ISSUER: &str = "chorely";

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Failed to create token: {0}")]
    CreateError(String),

    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    #[error("Token has expired")]
    Expired,

    #[error("Invalid issuer: expected {expected}")]
    InvalidIssuer { expected: String },

    #[error("Expected {expected} token, got {actual} token")]
    WrongTokenType {
        expected: &'static str,
        actual: &'static str,
    },
}

/// Token type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn default_expiration(&self) -> Duration {
        match self {
            TokenType::Access => Duration::hours(24),
            TokenType::Refresh => Duration::days(30),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

/// JWT claims
///
/// Standard claims (`sub`, `iss`, `iat`, `exp`, `nbf`) plus the account role
/// and the token type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,

    /// Always [`ISSUER`]
    pub iss: String,

    pub iat: i64,
    pub exp: i64,
    pub nbf: i64,

    /// Account role at the time the token was issued
    pub role: UserRole,

    pub token_type: TokenType,
}

impl Claims {
    /// Creates claims that expire after the token type's default lifetime
    pub fn new(user_id: Uuid, role: UserRole, token_type: TokenType) -> Self {
        Self::with_expiration(user_id, role, token_type, token_type.default_expiration())
    }

    /// Creates claims with an explicit lifetime
    pub fn with_expiration(
        user_id: Uuid,
        role: UserRole,
        token_type: TokenType,
        expires_in: Duration,
    ) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
            nbf: now.timestamp(),
            role,
            token_type,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Access and refresh token issued together at login/registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// Signs claims with HS256
///
/// # Errors
///
/// Returns `JwtError::CreateError` if encoding fails
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&Header::new(Algorithm::HS256), claims, &key)
        .map_err(|e| JwtError::CreateError(e.to_string()))
}

/// Issues a fresh access/refresh pair for an account
pub fn issue_token_pair(user_id: Uuid, role: UserRole, secret: &str) -> Result<TokenPair, JwtError> {
    let access = Claims::new(user_id, role, TokenType::Access);
    let refresh = Claims::new(user_id, role, TokenType::Refresh);

    Ok(TokenPair {
        access_token: create_token(&access, secret)?,
        refresh_token: create_token(&refresh, secret)?,
        token_type: "Bearer".to_string(),
        expires_in: TokenType::Access.default_expiration().num_seconds(),
    })
}

/// Verifies signature, expiry, not-before and issuer, then returns the claims
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => JwtError::Expired,
        ErrorKind::InvalidIssuer => JwtError::InvalidIssuer {
            expected: ISSUER.to_string(),
        },
        _ => JwtError::ValidationError(e.to_string()),
    })?;

    Ok(data.claims)
}

fn validate_typed(token: &str, secret: &str, expected: TokenType) -> Result<Claims, JwtError> {
    let claims = validate_token(token, secret)?;

    if claims.token_type != expected {
        return Err(JwtError::WrongTokenType {
            expected: expected.as_str(),
            actual: claims.token_type.as_str(),
        });
    }

    Ok(claims)
}

/// Validates a token and requires it to be an access token
pub fn validate_access_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    validate_typed(token, secret, TokenType::Access)
}

/// Validates a token and requires it to be a refresh token
pub fn validate_refresh_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    validate_typed(token, secret, TokenType::Refresh)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-that-is-long-enough-for-hs256";

    #[test]
    fn test_create_and_validate() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, UserRole::Admin, TokenType::Access);
        let token = create_token(&claims, SECRET).unwrap();

        let validated = validate_token(&token, SECRET).unwrap();
        assert_eq!(validated.sub, user_id);
        assert_eq!(validated.role, UserRole::Admin);
        assert_eq!(validated.iss, ISSUER);
        assert_eq!(validated, claims);
    }

    #[test]
    fn test_default_expirations() {
        let access = Claims::new(Uuid::new_v4(), UserRole::User, TokenType::Access);
        assert_eq!(access.exp - access.iat, 24 * 3600);

        let refresh = Claims::new(Uuid::new_v4(), UserRole::User, TokenType::Refresh);
        assert_eq!(refresh.exp - refresh.iat, 30 * 24 * 3600);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let claims = Claims::new(Uuid::new_v4(), UserRole::User, TokenType::Access);
        let token = create_token(&claims, SECRET).unwrap();

        assert!(matches!(
            validate_token(&token, "another-secret-key-that-is-long-enough"),
            Err(JwtError::ValidationError(_))
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let claims = Claims::with_expiration(
            Uuid::new_v4(),
            UserRole::User,
            TokenType::Access,
            Duration::hours(-2),
        );
        assert!(claims.is_expired());

        let token = create_token(&claims, SECRET).unwrap();
        assert!(matches!(validate_token(&token, SECRET), Err(JwtError::Expired)));
    }

    #[test]
    fn test_foreign_issuer_rejected() {
        let mut claims = Claims::new(Uuid::new_v4(), UserRole::User, TokenType::Access);
        claims.iss = "someone-else".to_string();
        let token = create_token(&claims, SECRET).unwrap();

        assert!(matches!(
            validate_token(&token, SECRET),
            Err(JwtError::InvalidIssuer { .. })
        ));
    }

    #[test]
    fn test_token_type_enforced() {
        let refresh = Claims::new(Uuid::new_v4(), UserRole::User, TokenType::Refresh);
        let token = create_token(&refresh, SECRET).unwrap();

        assert!(matches!(
            validate_access_token(&token, SECRET),
            Err(JwtError::WrongTokenType { expected: "access", actual: "refresh" })
        ));
        assert!(validate_refresh_token(&token, SECRET).is_ok());
    }

    #[test]
    fn test_issue_token_pair() {
        let user_id = Uuid::new_v4();
        let pair = issue_token_pair(user_id, UserRole::User, SECRET).unwrap();

        assert_eq!(pair.token_type, "Bearer");
        assert_eq!(pair.expires_in, 86400);
        assert_eq!(validate_access_token(&pair.access_token, SECRET).unwrap().sub, user_id);
        assert_eq!(validate_refresh_token(&pair.refresh_token, SECRET).unwrap().sub, user_id);
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(validate_token("not.a.jwt", SECRET).is_err());
        assert!(validate_token("", SECRET).is_err());
    }
}
