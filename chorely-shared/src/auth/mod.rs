//! Authentication and authorization
//!
//! # Modules
//!
//! - [`password`]: Argon2id password hashing
//! - [`jwt`]: HS256 access/refresh tokens carrying user id and role
//! - [`session`]: bearer header → per-request [`session::Session`]
//! - [`authorization`]: household, comment and admin checks
//!
//! # Example
//!
//! ```
//! use chorely_shared::auth::password::{hash_password, verify_password};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let hash = hash_password("user_password")?;
//! assert!(verify_password("user_password", &hash)?);
//! # Ok(())
//! # }
//! ```

pub mod authorization;
pub mod jwt;
pub mod password;
pub mod session;
