//! # Chorely API Server Library
//!
//! HTTP surface of the household chore manager.
//!
//! ## Modules
//!
//! - `app`: application state and router builder
//! - `config`: configuration from the environment
//! - `error`: error type and HTTP response mapping
//! - `extract`: validated JSON extractor
//! - `middleware`: authentication and security headers
//! - `routes`: route handlers
//! - `validation`: shared field rules for request types

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod validation;
