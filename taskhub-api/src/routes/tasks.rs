/// Task endpoints
///
/// All routes here sit behind the token gate and the email-match guard, so
/// every handler receives the verified owner through [`AuthContext`] and
/// passes it to the store. Ownership is never read from the request body.
///
/// # Endpoints
///
/// - `POST   /tasks?email=`     - create a task (201)
/// - `GET    /tasks?email=`     - list the caller's tasks
/// - `GET    /tasks/:id?email=` - fetch one task (404 if absent)
/// - `PUT    /tasks/:id?email=` - upsert supplied fields
/// - `DELETE /tasks/:id?email=` - delete; `deleted_count` is 0 when absent
///
/// A path id that is not a valid task id is rejected with 400.

use crate::{
    app::AppState,
    error::{validate_request, ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use taskhub_shared::{
    auth::middleware::AuthContext,
    models::task::{DeleteOutcome, NewTask, Task, TaskId, TaskPatch, UpdateOutcome},
};

/// Create a task owned by the caller
pub async fn create_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<NewTask>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    validate_request(&req)?;

    let task = state
        .bounded("insert_task", state.store.insert_task(&auth.email, req))
        .await?;

    tracing::info!(task_id = %task.id, "Task created");
    Ok((StatusCode::CREATED, Json(task)))
}

/// List the caller's tasks, oldest first
pub async fn list_tasks(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<Vec<Task>>> {
    let tasks = state
        .bounded("list_tasks", state.store.list_tasks(&auth.email))
        .await?;

    tracing::debug!(count = tasks.len(), "Listed tasks");
    Ok(Json(tasks))
}

/// Fetch one of the caller's tasks
pub async fn get_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> ApiResult<Json<Task>> {
    let id = TaskId::parse(&id)?;

    state
        .bounded("find_task", state.store.find_task(&auth.email, id))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Task {} not found", id)))
}

/// Update the supplied fields of a task, creating it when the id is unknown
pub async fn update_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
    Json(patch): Json<TaskPatch>,
) -> ApiResult<Json<UpdateOutcome>> {
    let id = TaskId::parse(&id)?;
    validate_request(&patch)?;

    let outcome = state
        .bounded("upsert_task", state.store.upsert_task(&auth.email, id, patch))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Task {} not found", id)))?;

    tracing::info!(
        task_id = %id,
        matched = outcome.matched_count,
        modified = outcome.modified_count,
        upserted = outcome.upserted_id.is_some(),
        "Task upserted"
    );
    Ok(Json(outcome))
}

/// Delete one of the caller's tasks
pub async fn delete_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteOutcome>> {
    let id = TaskId::parse(&id)?;

    let outcome = state
        .bounded("delete_task", state.store.delete_task(&auth.email, id))
        .await?;

    tracing::info!(task_id = %id, deleted = outcome.deleted_count, "Task delete processed");
    Ok(Json(outcome))
}
