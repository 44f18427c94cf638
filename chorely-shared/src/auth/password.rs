/// Argon2id password hashing
///
/// Hashes are PHC strings (`$argon2id$v=19$m=65536,t=3,p=4$...`), so the
/// parameters travel with each stored hash and verification does not depend on
/// the current defaults.
///
/// # Example
///
/// ```
/// use chorely_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("kitchen-duty")?;
/// assert!(verify_password("kitchen-duty", &hash)?);
/// assert!(!verify_password("laundry-duty", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, ParamsBuilder, Version,
};
use std::sync::OnceLock;

/// Memory cost in KiB (64 MiB)
const MEMORY_COST_KIB: u32 = 65536;
const ITERATIONS: u32 = 3;
const PARALLELISM: u32 = 4;
const OUTPUT_LEN: usize = 32;

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashError(String),

    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

fn hasher() -> Result<Argon2<'static>, PasswordError> {
    let params = ParamsBuilder::new()
        .m_cost(MEMORY_COST_KIB)
        .t_cost(ITERATIONS)
        .p_cost(PARALLELISM)
        .output_len(OUTPUT_LEN)
        .build()
        .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hashes a password with a fresh random salt
///
/// # Errors
///
/// Returns `PasswordError::HashError` if hashing fails
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(e.to_string()))?;

    Ok(hash.to_string())
}

/// Checks a password against a stored PHC hash
///
/// Returns `Ok(false)` on mismatch. Errors are reserved for hashes that cannot
/// be parsed or verified at all, including PHC strings without a salt or hash
/// output.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(|e| PasswordError::InvalidHash(e.to_string()))?;
    if parsed.salt.is_none() || parsed.hash.is_none() {
        return Err(PasswordError::InvalidHash(
            "hash is missing its salt or output".to_string(),
        ));
    }

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(e.to_string())),
    }
}

/// Runs a full verification against a throwaway hash and always returns false
///
/// Login calls this when no account matches the email, so an unknown email
/// costs the same as a wrong password.
pub fn verify_without_account(password: &str) -> Result<bool, PasswordError> {
    static DUMMY_HASH: OnceLock<String> = OnceLock::new();

    let hash = match DUMMY_HASH.get() {
        Some(hash) => hash,
        None => {
            let hash = hash_password("chorely-placeholder-credential")?;
            DUMMY_HASH.get_or_init(|| hash)
        }
    };

    verify_password(password, hash)?;
    Ok(false)
}
