/// API route handlers, one module per resource
///
/// - `health`: liveness and database status
/// - `auth`: register, login, token refresh
/// - `users`: own profile and admin account management
/// - `households`: household CRUD with cascading delete
/// - `members`: household member profiles
/// - `tasks`: task lifecycle
/// - `comments`: task comments
/// - `history`: task status history and statistics

pub mod auth;
pub mod comments;
pub mod health;
pub mod history;
pub mod households;
pub mod members;
pub mod tasks;
pub mod users;
