//! Database models and their queries
//!
//! - [`user`]: accounts and roles
//! - [`household`]: households, nested detail view, cascading delete
//! - [`member`]: household-scoped member profiles
//! - [`task`]: tasks and the status lifecycle
//! - [`comment`]: task comments with author info
//! - [`task_history`]: append-only status audit trail, sorting and statistics

pub mod comment;
pub mod household;
pub mod member;
pub mod task;
pub mod task_history;
pub mod user;
