//! # Chorely Shared Library
//!
//! Domain types, persistence and auth primitives used by the Chorely API
//! server.
//!
//! ## Module Organization
//!
//! - `models`: users, households, members, tasks, comments, task history
//! - `db`: connection pool and embedded migrations
//! - `auth`: password hashing, JWTs, per-request session, authorization
//! - `error`: domain error type shared by model operations

pub mod auth;
pub mod db;
pub mod error;
pub mod models;

pub use error::{DomainError, DomainResult};

/// Current version of the Chorely shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
