// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints.
//!
//! `GET /users/me` is open to any authenticated user; everything else is
//! admin only.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;

use crate::{
    auth::{AdminOnly, Auth, AuthError, Principal},
    error::ApiError,
    models::{MessageResponse, PaginationQuery, UserUpdate},
    state::AppState,
    storage::{StorageError, StoredUser},
};

fn load_user(state: &AppState, user_id: &str) -> Result<StoredUser, ApiError> {
    state.users().get(user_id).map_err(|e| match e {
        StorageError::NotFound(_) => ApiError::from(AuthError::UserNotFound),
        other => other.into(),
    })
}

/// Get the current authenticated user.
#[utoipa::path(
    get,
    path = "/users/me",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User information", body = Principal),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_current_user(Auth(principal): Auth) -> Json<Principal> {
    Json(principal)
}

/// List users, oldest first.
#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    params(PaginationQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Users", body = [Principal]),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)")
    )
)]
pub async fn list_users(
    AdminOnly(_admin): AdminOnly,
    State(state): State<AppState>,
    Query(page): Query<PaginationQuery>,
) -> Result<Json<Vec<Principal>>, ApiError> {
    let users = state.users().list_all()?;
    let users = page.apply(users).into_iter().map(Principal::from).collect();
    Ok(Json(users))
}

/// Get a user by ID.
#[utoipa::path(
    get,
    path = "/users/{user_id}",
    tag = "Users",
    params(("user_id" = String, Path, description = "User ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User", body = Principal),
        (status = 403, description = "Not authorized (admin required)"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    AdminOnly(_admin): AdminOnly,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Principal>, ApiError> {
    Ok(Json(load_user(&state, &user_id)?.into()))
}

/// Partially update a user. Also the only way to grant or revoke admin.
#[utoipa::path(
    put,
    path = "/users/{user_id}",
    tag = "Users",
    params(("user_id" = String, Path, description = "User ID")),
    request_body = UserUpdate,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Updated user", body = Principal),
        (status = 403, description = "Not authorized (admin required)"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Username or email already taken"),
        (status = 422, description = "Invalid field value")
    )
)]
pub async fn update_user(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(update): Json<UserUpdate>,
) -> Result<Json<Principal>, ApiError> {
    update.validate()?;

    let password_hash = match &update.password {
        Some(password) => Some(state.auth.hash_password(password).await?),
        None => None,
    };

    let _guard = state.write_guard().await;
    let mut user = load_user(&state, &user_id)?;

    if let Some(username) = update.username {
        user.username = username;
    }
    if let Some(email) = update.email {
        user.email = email;
    }
    if let Some(hash) = password_hash {
        user.password_hash = hash;
    }
    if let Some(is_admin) = update.is_admin {
        if is_admin != user.is_admin {
            tracing::info!(
                admin_id = %admin.id,
                user_id = %user.id,
                is_admin,
                "Admin flag changed"
            );
        }
        user.is_admin = is_admin;
    }
    user.updated_at = Utc::now();

    match state.users().update(&user) {
        Ok(()) => Ok(Json(user.into())),
        Err(StorageError::AlreadyExists(_)) => Err(ApiError::UserAlreadyExists),
        Err(StorageError::NotFound(_)) => Err(AuthError::UserNotFound.into()),
        Err(e) => Err(e.into()),
    }
}

/// Delete a user. Their tasks are kept.
#[utoipa::path(
    delete,
    path = "/users/{user_id}",
    tag = "Users",
    params(("user_id" = String, Path, description = "User ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 403, description = "Not authorized (admin required)"),
        (status = 404, description = "User not found")
    )
)]
pub async fn delete_user(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let _guard = state.write_guard().await;
    state.users().delete(&user_id).map_err(|e| match e {
        StorageError::NotFound(_) => ApiError::from(AuthError::UserNotFound),
        other => other.into(),
    })?;

    tracing::info!(admin_id = %admin.id, user_id = %user_id, "User deleted");
    Ok(Json(MessageResponse::new("User deleted successfully")))
}
