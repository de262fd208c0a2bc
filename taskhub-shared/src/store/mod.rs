/// Document store abstraction
///
/// Handlers never talk to a database directly; they go through the [`Store`]
/// trait, which covers exactly the operations the API needs. Each method is a
/// single atomic store operation touching at most one document (listing
/// aside).
///
/// Every task operation takes the owner email of the verified caller and only
/// ever sees tasks owned by that email.
///
/// # Implementations
///
/// - [`postgres::PgStore`]: PostgreSQL via sqlx (production)
/// - [`memory::MemoryStore`]: in-process maps (tests, local runs)
///
/// # Example
///
/// ```
/// use taskhub_shared::store::{find_or_create_user, memory::MemoryStore, Store};
///
/// # async fn example() -> Result<(), taskhub_shared::store::StoreError> {
/// let store = MemoryStore::new();
/// let (user, created) = find_or_create_user(&store, "a@x.com").await?;
/// assert!(created);
///
/// let (again, created) = find_or_create_user(&store, "a@x.com").await?;
/// assert!(!created);
/// assert_eq!(user.id, again.id);
/// # Ok(())
/// # }
/// ```

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use tracing::debug;

use crate::models::{
    task::{DeleteOutcome, NewTask, Task, TaskId, TaskPatch, UpdateOutcome},
    user::User,
};

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Unique constraint violated
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Store cannot be reached
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Maps sqlx unique violations to `Conflict`
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return StoreError::Conflict(
                    db_err
                        .constraint()
                        .unwrap_or("unique constraint")
                        .to_string(),
                );
            }
        }
        StoreError::Database(err)
    }
}

/// Store result type alias
pub type StoreResult<T> = Result<T, StoreError>;

/// Operations over the `users` and `tasks` collections
#[async_trait]
pub trait Store: Send + Sync {
    /// Backend name for logs and health output
    fn name(&self) -> &'static str;

    /// Cheap connectivity probe
    async fn ping(&self) -> StoreResult<()>;

    /// Finds a user by exact email
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Inserts a user holding only `email`
    ///
    /// Fails with `StoreError::Conflict` if the email already exists.
    async fn insert_user(&self, email: &str) -> StoreResult<User>;

    /// Inserts a task owned by `owner`
    async fn insert_task(&self, owner: &str, task: NewTask) -> StoreResult<Task>;

    /// Finds one task by id, restricted to `owner`
    async fn find_task(&self, owner: &str, id: TaskId) -> StoreResult<Option<Task>>;

    /// Lists all tasks owned by `owner`, oldest first
    async fn list_tasks(&self, owner: &str) -> StoreResult<Vec<Task>>;

    /// Updates the supplied fields of a task, or creates it if `id` is unknown
    ///
    /// A created task holds exactly the patch fields plus its owner.
    /// Returns `None` when `id` exists but belongs to another owner.
    async fn upsert_task(
        &self,
        owner: &str,
        id: TaskId,
        patch: TaskPatch,
    ) -> StoreResult<Option<UpdateOutcome>>;

    /// Deletes one task by id, restricted to `owner`
    ///
    /// An unknown id yields `deleted_count: 0`, not an error.
    async fn delete_task(&self, owner: &str, id: TaskId) -> StoreResult<DeleteOutcome>;
}

/// Returns the user for `email`, creating it on first sight
///
/// The boolean is `true` when the user was created by this call. Losing an
/// insert race to a concurrent sign-in falls back to reading the winner.
pub async fn find_or_create_user(store: &dyn Store, email: &str) -> StoreResult<(User, bool)> {
    if let Some(user) = store.find_user_by_email(email).await? {
        debug!(user_id = %user.id, "Existing user signed in");
        return Ok((user, false));
    }

    match store.insert_user(email).await {
        Ok(user) => {
            debug!(user_id = %user.id, "Created user on first sign-in");
            Ok((user, true))
        }
        Err(StoreError::Conflict(constraint)) => {
            debug!(constraint = %constraint, "Lost user insert race, re-reading");
            store
                .find_user_by_email(email)
                .await?
                .map(|user| (user, false))
                .ok_or(StoreError::Conflict(constraint))
        }
        Err(e) => Err(e),
    }
}
