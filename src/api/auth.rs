// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Registration and login endpoints.

use axum::{extract::State, Form, Json};

use crate::{
    auth::Principal,
    error::ApiError,
    models::{LoginForm, TokenResponse, UserCreate},
    state::AppState,
    storage::{StorageError, StoredUser},
};

/// Register a new (non-admin) user.
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Auth",
    request_body = UserCreate,
    responses(
        (status = 200, description = "User created", body = Principal),
        (status = 409, description = "Username or email already taken"),
        (status = 422, description = "Invalid username, email or password")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<UserCreate>,
) -> Result<Json<Principal>, ApiError> {
    payload.validate()?;

    let password_hash = state.auth.hash_password(&payload.password).await?;
    let user = StoredUser::new(payload.username, payload.email, password_hash);

    let _guard = state.write_guard().await;
    match state.users().create(&user) {
        Ok(()) => {}
        Err(StorageError::AlreadyExists(_)) => {
            tracing::info!("Registration rejected: username or email taken");
            return Err(ApiError::UserAlreadyExists);
        }
        Err(e) => return Err(e.into()),
    }

    tracing::info!(user_id = %user.id, "User registered");
    Ok(Json(user.into()))
}

/// Exchange a username and password for a bearer token.
#[utoipa::path(
    post,
    path = "/auth/token",
    tag = "Auth",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Access token", body = TokenResponse),
        (status = 401, description = "Invalid username or password")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Json<TokenResponse>, ApiError> {
    let principal = state
        .auth
        .authenticate(&state.users(), &form.username, &form.password)
        .await?;
    let issued = state.auth.issue_token(&principal, None)?;

    Ok(Json(TokenResponse::bearer(issued.token)))
}
