// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{get, patch, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::Principal,
    models::{LoginForm, MessageResponse, TaskCreate, TokenResponse, UserCreate, UserUpdate},
    state::AppState,
    storage::{StoredTask, TaskStatus},
};

pub mod auth;
pub mod health;
pub mod tasks;
pub mod users;

pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .route("/auth/register", post(auth::register))
        .route("/auth/token", post(auth::login))
        .route("/users", get(users::list_users))
        .route("/users/me", get(users::get_current_user))
        .route(
            "/users/{user_id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route(
            "/tasks/{task_id}",
            get(tasks::get_task)
                .put(tasks::update_task)
                .delete(tasks::delete_task),
        )
        .route("/tasks/{task_id}/status", patch(tasks::update_task_status))
        .with_state(state);

    routes
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

/// Registers the `bearer_auth` scheme referenced by protected paths.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::root,
        health::health,
        auth::register,
        auth::login,
        users::get_current_user,
        users::list_users,
        users::get_user,
        users::update_user,
        users::delete_user,
        tasks::list_tasks,
        tasks::create_task,
        tasks::get_task,
        tasks::update_task,
        tasks::delete_task,
        tasks::update_task_status
    ),
    components(
        schemas(
            Principal,
            UserCreate,
            UserUpdate,
            LoginForm,
            TokenResponse,
            MessageResponse,
            TaskCreate,
            StoredTask,
            TaskStatus,
            health::HealthResponse,
            health::HealthChecks,
            health::RootResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and storage checks"),
        (name = "Auth", description = "Registration and token issuance"),
        (name = "Users", description = "Current user and admin user management"),
        (name = "Tasks", description = "Task tracking with owner/admin access")
    )
)]
pub struct ApiDoc;
