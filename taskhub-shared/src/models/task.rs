/// Task model and its input types
///
/// A task is a flat document owned by a user (via `user_email`). Every
/// descriptive attribute is optional because an update against an unknown id
/// creates a new task containing only the supplied fields.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title TEXT,
///     description TEXT,
///     priority TEXT,
///     deadline TEXT,
///     category TEXT,
///     status TEXT,
///     user_email TEXT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Store-native task identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub Uuid);

/// Raised when a path segment is not a valid task identifier
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid task id: {0}")]
pub struct TaskIdError(pub String);

impl TaskId {
    /// Generates a fresh identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses a raw path segment
    ///
    /// ```
    /// use taskhub_shared::models::task::TaskId;
    ///
    /// assert!(TaskId::parse("67e55044-10b1-426f-9247-bb680e5fe0c8").is_ok());
    /// assert!(TaskId::parse("not-an-id").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, TaskIdError> {
        Uuid::parse_str(raw.trim())
            .map(Self)
            .map_err(|_| TaskIdError(raw.to_string()))
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for TaskId {
    type Err = TaskIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Uuid> for TaskId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

/// Task document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,

    /// Free-form deadline as supplied by the client
    pub deadline: Option<String>,

    pub category: Option<String>,
    pub status: Option<String>,

    /// Owner email
    pub user_email: String,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task
///
/// Ownership is never taken from the body; unknown fields such as `email`
/// or `user_email` are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct NewTask {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,

    #[validate(length(max = 50, message = "Priority must be at most 50 characters"))]
    pub priority: Option<String>,

    #[validate(length(max = 100, message = "Deadline must be at most 100 characters"))]
    pub deadline: Option<String>,

    #[validate(length(max = 100, message = "Category must be at most 100 characters"))]
    pub category: Option<String>,

    #[validate(length(max = 50, message = "Status must be at most 50 characters"))]
    pub status: Option<String>,
}

/// Partial update for a task
///
/// Only `Some` fields are written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct TaskPatch {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,

    #[validate(length(max = 50, message = "Priority must be at most 50 characters"))]
    pub priority: Option<String>,

    #[validate(length(max = 100, message = "Deadline must be at most 100 characters"))]
    pub deadline: Option<String>,

    #[validate(length(max = 100, message = "Category must be at most 100 characters"))]
    pub category: Option<String>,

    #[validate(length(max = 50, message = "Status must be at most 50 characters"))]
    pub status: Option<String>,
}

impl TaskPatch {
    /// True when no field is supplied
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.deadline.is_none()
            && self.category.is_none()
            && self.status.is_none()
    }

    /// True when applying the patch would change `task`
    pub fn changes(&self, task: &Task) -> bool {
        fn differs(new: &Option<String>, old: &Option<String>) -> bool {
            new.is_some() && new != old
        }

        differs(&self.title, &task.title)
            || differs(&self.description, &task.description)
            || differs(&self.priority, &task.priority)
            || differs(&self.deadline, &task.deadline)
            || differs(&self.category, &task.category)
            || differs(&self.status, &task.status)
    }

    /// Writes the supplied fields onto `task`, leaving the rest untouched
    pub fn apply_to(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = Some(title);
        }
        if let Some(description) = self.description {
            task.description = Some(description);
        }
        if let Some(priority) = self.priority {
            task.priority = Some(priority);
        }
        if let Some(deadline) = self.deadline {
            task.deadline = Some(deadline);
        }
        if let Some(category) = self.category {
            task.category = Some(category);
        }
        if let Some(status) = self.status {
            task.status = Some(status);
        }
    }

    /// Builds a brand-new task holding exactly the supplied fields
    pub fn into_task(self, id: TaskId, owner: &str, now: DateTime<Utc>) -> Task {
        Task {
            id: id.0,
            title: self.title,
            description: self.description,
            priority: self.priority,
            deadline: self.deadline,
            category: self.category,
            status: self.status,
            user_email: owner.to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl From<NewTask> for TaskPatch {
    fn from(task: NewTask) -> Self {
        Self {
            title: Some(task.title),
            description: task.description,
            priority: task.priority,
            deadline: task.deadline,
            category: task.category,
            status: task.status,
        }
    }
}

/// Result of an upsert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOutcome {
    /// 1 when an existing task matched the id, else 0
    pub matched_count: u64,

    /// 1 when the matched task actually changed, else 0
    pub modified_count: u64,

    /// Set when no task matched and a new one was created
    pub upserted_id: Option<Uuid>,

    /// The task as stored after the operation
    pub task: Task,
}

/// Result of a delete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOutcome {
    /// Number of tasks removed (0 or 1)
    pub deleted_count: u64,
}
