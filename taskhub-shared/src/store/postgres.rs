/// PostgreSQL store
///
/// Backs the `users` and `tasks` tables created by the migrations in
/// `migrations/`. Upserts run inside a transaction with a row lock so that
/// the "changed or not" decision and the write see the same row.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::debug;

use super::{Store, StoreError, StoreResult};
use crate::db::pool::health_check;
use crate::models::{
    task::{DeleteOutcome, NewTask, Task, TaskId, TaskPatch, UpdateOutcome},
    user::User,
};

const TASK_COLUMNS: &str = "id, title, description, priority, deadline, category, status, \
                            user_email, created_at, updated_at";

/// sqlx-backed implementation of [`Store`]
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wraps an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> StoreResult<()> {
        health_check(&self.pool).await?;
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn insert_user(&self, email: &str) -> StoreResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email)
            VALUES ($1)
            RETURNING id, email, created_at
            "#,
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)
    }

    async fn insert_task(&self, owner: &str, task: NewTask) -> StoreResult<Task> {
        let query = format!(
            r#"
            INSERT INTO tasks (title, description, priority, deadline, category, status, user_email)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {TASK_COLUMNS}
            "#
        );

        let task = sqlx::query_as::<_, Task>(&query)
            .bind(task.title)
            .bind(task.description)
            .bind(task.priority)
            .bind(task.deadline)
            .bind(task.category)
            .bind(task.status)
            .bind(owner)
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;

        debug!(task_id = %task.id, "Inserted task");
        Ok(task)
    }

    async fn find_task(&self, owner: &str, id: TaskId) -> StoreResult<Option<Task>> {
        let query = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 AND user_email = $2");

        let task = sqlx::query_as::<_, Task>(&query)
            .bind(id.0)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await?;

        Ok(task)
    }

    async fn list_tasks(&self, owner: &str) -> StoreResult<Vec<Task>> {
        let query = format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE user_email = $1 ORDER BY created_at, id"
        );

        let tasks = sqlx::query_as::<_, Task>(&query)
            .bind(owner)
            .fetch_all(&self.pool)
            .await?;

        Ok(tasks)
    }

    async fn upsert_task(
        &self,
        owner: &str,
        id: TaskId,
        patch: TaskPatch,
    ) -> StoreResult<Option<UpdateOutcome>> {
        let mut tx = self.pool.begin().await?;

        let select = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 FOR UPDATE");
        let existing = sqlx::query_as::<_, Task>(&select)
            .bind(id.0)
            .fetch_optional(&mut *tx)
            .await?;

        let outcome = match existing {
            Some(task) if task.user_email != owner => {
                debug!(task_id = %id, "Upsert refused for task owned by another user");
                tx.rollback().await?;
                return Ok(None);
            }
            Some(mut task) => {
                let modified = patch.changes(&task);
                if modified {
                    patch.apply_to(&mut task);
                    let update = format!(
                        r#"
                        UPDATE tasks
                        SET title = $2, description = $3, priority = $4, deadline = $5,
                            category = $6, status = $7, updated_at = NOW()
                        WHERE id = $1
                        RETURNING {TASK_COLUMNS}
                        "#
                    );
                    task = sqlx::query_as::<_, Task>(&update)
                        .bind(task.id)
                        .bind(task.title)
                        .bind(task.description)
                        .bind(task.priority)
                        .bind(task.deadline)
                        .bind(task.category)
                        .bind(task.status)
                        .fetch_one(&mut *tx)
                        .await?;
                }
                UpdateOutcome {
                    matched_count: 1,
                    modified_count: u64::from(modified),
                    upserted_id: None,
                    task,
                }
            }
            None => {
                let fresh = patch.into_task(id, owner, Utc::now());
                let insert = format!(
                    r#"
                    INSERT INTO tasks (id, title, description, priority, deadline, category,
                                       status, user_email, created_at, updated_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
                    RETURNING {TASK_COLUMNS}
                    "#
                );
                let task = sqlx::query_as::<_, Task>(&insert)
                    .bind(fresh.id)
                    .bind(fresh.title)
                    .bind(fresh.description)
                    .bind(fresh.priority)
                    .bind(fresh.deadline)
                    .bind(fresh.category)
                    .bind(fresh.status)
                    .bind(fresh.user_email)
                    .bind(fresh.created_at)
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(StoreError::from_sqlx)?;
                debug!(task_id = %task.id, "Upsert created task");
                UpdateOutcome {
                    matched_count: 0,
                    modified_count: 0,
                    upserted_id: Some(task.id),
                    task,
                }
            }
        };

        tx.commit().await?;
        Ok(Some(outcome))
    }

    async fn delete_task(&self, owner: &str, id: TaskId) -> StoreResult<DeleteOutcome> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_email = $2")
            .bind(id.0)
            .bind(owner)
            .execute(&self.pool)
            .await?;

        Ok(DeleteOutcome {
            deleted_count: result.rows_affected(),
        })
    }
}
