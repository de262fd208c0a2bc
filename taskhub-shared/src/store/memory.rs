/// In-memory store
///
/// Keeps both collections in `tokio::sync::RwLock`-guarded maps. Used by the
/// API test suite and for running the server without PostgreSQL
/// (`STORE_BACKEND=memory`). Data lives only as long as the process.
///
/// The store can be switched into an unavailable state to exercise the error
/// paths of callers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::models::{
    task::{DeleteOutcome, NewTask, Task, TaskId, TaskPatch, UpdateOutcome},
    user::User,
};

/// Process-local implementation of [`Store`]
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, User>>,
    tasks: RwLock<HashMap<Uuid, Task>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent operation fail with `StoreError::Unavailable`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of stored tasks across all owners
    pub async fn task_count(&self) -> usize {
        self.tasks.read().await.len()
    }

    fn check(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("memory store marked unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> StoreResult<()> {
        self.check()
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.check()?;
        Ok(self.users.read().await.get(email).cloned())
    }

    async fn insert_user(&self, email: &str) -> StoreResult<User> {
        self.check()?;
        let mut users = self.users.write().await;
        if users.contains_key(email) {
            return Err(StoreError::Conflict("users_email_key".to_string()));
        }
        let user = User::new(email);
        users.insert(email.to_string(), user.clone());
        Ok(user)
    }

    async fn insert_task(&self, owner: &str, task: NewTask) -> StoreResult<Task> {
        self.check()?;
        let task = TaskPatch::from(task).into_task(TaskId::new(), owner, Utc::now());
        self.tasks.write().await.insert(task.id, task.clone());
        Ok(task)
    }

    async fn find_task(&self, owner: &str, id: TaskId) -> StoreResult<Option<Task>> {
        self.check()?;
        Ok(self
            .tasks
            .read()
            .await
            .get(&id.0)
            .filter(|task| task.user_email == owner)
            .cloned())
    }

    async fn list_tasks(&self, owner: &str) -> StoreResult<Vec<Task>> {
        self.check()?;
        let mut tasks: Vec<Task> = self
            .tasks
            .read()
            .await
            .values()
            .filter(|task| task.user_email == owner)
            .cloned()
            .collect();
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(tasks)
    }

    async fn upsert_task(
        &self,
        owner: &str,
        id: TaskId,
        patch: TaskPatch,
    ) -> StoreResult<Option<UpdateOutcome>> {
        self.check()?;
        let mut tasks = self.tasks.write().await;

        if let Some(existing) = tasks.get_mut(&id.0) {
            if existing.user_email != owner {
                return Ok(None);
            }
            let modified = patch.changes(existing);
            if modified {
                patch.apply_to(existing);
                existing.updated_at = Utc::now();
            }
            return Ok(Some(UpdateOutcome {
                matched_count: 1,
                modified_count: u64::from(modified),
                upserted_id: None,
                task: existing.clone(),
            }));
        }

        let task = patch.into_task(id, owner, Utc::now());
        tasks.insert(task.id, task.clone());
        Ok(Some(UpdateOutcome {
            matched_count: 0,
            modified_count: 0,
            upserted_id: Some(task.id),
            task,
        }))
    }

    async fn delete_task(&self, owner: &str, id: TaskId) -> StoreResult<DeleteOutcome> {
        self.check()?;
        let mut tasks = self.tasks.write().await;
        let owned = tasks
            .get(&id.0)
            .map(|task| task.user_email == owner)
            .unwrap_or(false);

        let deleted_count = if owned && tasks.remove(&id.0).is_some() { 1 } else { 0 };
        Ok(DeleteOutcome { deleted_count })
    }
}
