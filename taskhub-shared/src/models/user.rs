/// User model
///
/// A user is identified by email alone. Users are created on first sign-in and
/// never updated or deleted afterwards.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email TEXT NOT NULL UNIQUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// User record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Email address, unique across all users (compared case-sensitively)
    pub email: String,

    /// When the user first signed in
    pub created_at: DateTime<Utc>,
}

/// Sign-in request body
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SignIn {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

impl User {
    /// Builds a new user record for `email`
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            created_at: Utc::now(),
        }
    }
}
