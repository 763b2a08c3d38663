// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Task endpoints.
//!
//! Regular users see and modify only their own tasks; admins act on every
//! task. Ownership is checked through [`OwnershipEnforcer`] after the task
//! is loaded, so a missing task is 404 for everyone.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;

use crate::{
    auth::{Auth, Principal},
    error::ApiError,
    models::{MessageResponse, PaginationQuery, TaskCreate},
    state::AppState,
    storage::{OwnershipEnforcer, StorageError, StoredTask, TaskStatusQuery},
};

/// Load a task and check that `principal` may act on it.
fn load_task(state: &AppState, task_id: &str, principal: &Principal) -> Result<StoredTask, ApiError> {
    let task = state.tasks().get(task_id).map_err(|e| match e {
        StorageError::NotFound(_) => ApiError::TaskNotFound,
        other => other.into(),
    })?;

    if let Err(e) = task.verify_access(principal) {
        tracing::info!(user_id = %principal.id, task_id = %task.id, "Task access denied");
        return Err(e.into());
    }
    Ok(task)
}

fn save_task(state: &AppState, task: &StoredTask) -> Result<(), ApiError> {
    state.tasks().update(task).map_err(|e| match e {
        StorageError::NotFound(_) => ApiError::TaskNotFound,
        other => other.into(),
    })
}

#[utoipa::path(
    get,
    path = "/tasks",
    tag = "Tasks",
    params(PaginationQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Visible tasks, oldest first", body = [StoredTask]),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_tasks(
    Auth(principal): Auth,
    State(state): State<AppState>,
    Query(page): Query<PaginationQuery>,
) -> Result<Json<Vec<StoredTask>>, ApiError> {
    let tasks = if principal.is_admin {
        state.tasks().list_all()?
    } else {
        state.tasks().list_by_owner(&principal.id)?
    };
    Ok(Json(page.apply(tasks)))
}

#[utoipa::path(
    post,
    path = "/tasks",
    tag = "Tasks",
    request_body = TaskCreate,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Created task", body = StoredTask),
        (status = 401, description = "Not authenticated"),
        (status = 422, description = "Empty title")
    )
)]
pub async fn create_task(
    Auth(principal): Auth,
    State(state): State<AppState>,
    Json(request): Json<TaskCreate>,
) -> Result<Json<StoredTask>, ApiError> {
    request.validate()?;

    let task = StoredTask::new(principal.id.clone(), request.title, request.description);
    state.tasks().create(&task)?;

    tracing::info!(user_id = %principal.id, task_id = %task.id, "Task created");
    Ok(Json(task))
}

#[utoipa::path(
    get,
    path = "/tasks/{task_id}",
    tag = "Tasks",
    params(("task_id" = String, Path, description = "Task ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Task", body = StoredTask),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Task not found")
    )
)]
pub async fn get_task(
    Auth(principal): Auth,
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<StoredTask>, ApiError> {
    Ok(Json(load_task(&state, &task_id, &principal)?))
}

/// Replace a task's title and description.
#[utoipa::path(
    put,
    path = "/tasks/{task_id}",
    tag = "Tasks",
    params(("task_id" = String, Path, description = "Task ID")),
    request_body = TaskCreate,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Updated task", body = StoredTask),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Task not found"),
        (status = 422, description = "Empty title")
    )
)]
pub async fn update_task(
    Auth(principal): Auth,
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    Json(request): Json<TaskCreate>,
) -> Result<Json<StoredTask>, ApiError> {
    request.validate()?;

    let _guard = state.write_guard().await;
    let mut task = load_task(&state, &task_id, &principal)?;
    task.title = request.title;
    task.description = request.description;
    task.updated_at = Utc::now();
    save_task(&state, &task)?;

    Ok(Json(task))
}

#[utoipa::path(
    delete,
    path = "/tasks/{task_id}",
    tag = "Tasks",
    params(("task_id" = String, Path, description = "Task ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Task deleted", body = MessageResponse),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Task not found")
    )
)]
pub async fn delete_task(
    Auth(principal): Auth,
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let _guard = state.write_guard().await;
    let task = load_task(&state, &task_id, &principal)?;
    state.tasks().delete(&task.id).map_err(|e| match e {
        StorageError::NotFound(_) => ApiError::TaskNotFound,
        other => other.into(),
    })?;

    tracing::info!(user_id = %principal.id, task_id = %task.id, "Task deleted");
    Ok(Json(MessageResponse::new("Task deleted successfully")))
}

/// Move a task to another workflow state.
#[utoipa::path(
    patch,
    path = "/tasks/{task_id}/status",
    tag = "Tasks",
    params(
        ("task_id" = String, Path, description = "Task ID"),
        TaskStatusQuery
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Updated task", body = StoredTask),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Task not found")
    )
)]
pub async fn update_task_status(
    Auth(principal): Auth,
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    Query(query): Query<TaskStatusQuery>,
) -> Result<Json<StoredTask>, ApiError> {
    let _guard = state.write_guard().await;
    let mut task = load_task(&state, &task_id, &principal)?;
    task.status = query.status;
    task.updated_at = Utc::now();
    save_task(&state, &task)?;

    Ok(Json(task))
}
