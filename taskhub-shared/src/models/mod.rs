/// Data models for TaskHub
///
/// - `user`: users, keyed by email
/// - `task`: tasks owned by a user, plus create/patch inputs and operation outcomes

pub mod task;
pub mod user;
