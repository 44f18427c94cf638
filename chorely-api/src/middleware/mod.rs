//! Tower middleware for the API server
//!
//! - `security`: response hardening headers
//! - `auth`: bearer-token authentication producing a per-request `Session`

pub mod auth;
pub mod security;
