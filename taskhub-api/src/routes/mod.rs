/// API route handlers
///
/// - `health`: liveness string and health check
/// - `users`: sign-in and credential issuance
/// - `tasks`: task CRUD for the verified caller

pub mod health;
pub mod tasks;
pub mod users;
