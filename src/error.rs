// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::auth::AuthError;
use crate::storage::StorageError;

/// Handler-level errors.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("User with this username or email already exists")]
    UserAlreadyExists,
    #[error("Task not found")]
    TaskNotFound,
    #[error("{0}")]
    Validation(String),
    #[error("Database error")]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
    error_code: &'static str,
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::UserAlreadyExists => "user_exists",
            ApiError::TaskNotFound => "task_not_found",
            ApiError::Validation(_) => "validation_error",
            ApiError::Storage(_) => "database_error",
            ApiError::Auth(e) => e.error_code(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::UserAlreadyExists => StatusCode::CONFLICT,
            ApiError::TaskNotFound => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Auth(e) => e.status_code(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Auth(e) => e.into_response(),
            other => {
                if let ApiError::Storage(e) = &other {
                    tracing::error!(error = %e, "Storage operation failed");
                }

                let body = Json(ErrorBody {
                    message: other.to_string(),
                    error_code: other.error_code(),
                });
                (other.status_code(), body).into_response()
            }
        }
    }
}
