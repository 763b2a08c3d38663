// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Authentication and authorization failures.
///
/// Messages are deliberately generic: none of them says which part of a
/// credential or token was wrong.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown username or wrong password at login
    #[error("Invalid username or password")]
    InvalidCredentials,
    /// Malformed, tampered or expired token, or no subject claim
    #[error("Token is invalid or expired")]
    InvalidToken,
    /// Principal lookup miss outside the login path
    #[error("User not found")]
    UserNotFound,
    /// Admin-only or foreign-resource action by a regular user
    #[error("You do not have enough permissions to perform this action")]
    InsufficientPermission,
    /// No authorization header present
    #[error("Authorization header is required")]
    MissingAuthHeader,
    /// Authorization header is not `Bearer <token>`
    #[error("Invalid authorization header format (expected 'Bearer <token>')")]
    InvalidAuthHeader,
    /// Hashing, signing or configuration failure
    #[error("Internal authentication error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolution: Option<&'static str>,
    error_code: &'static str,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::InvalidToken => "invalid_token",
            AuthError::UserNotFound => "user_not_found",
            AuthError::InsufficientPermission => "insufficient_permissions",
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::Internal(_) => "server_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentials
            | AuthError::InvalidToken
            | AuthError::MissingAuthHeader
            | AuthError::InvalidAuthHeader => StatusCode::UNAUTHORIZED,
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::InsufficientPermission => StatusCode::FORBIDDEN,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            AuthError::Internal(detail) => {
                tracing::error!(error = %detail, "Authentication subsystem failure");
                "Oops! Something went wrong".to_string()
            }
            other => other.to_string(),
        };
        let resolution = match self {
            AuthError::InvalidToken => Some("Please get a new token"),
            _ => None,
        };

        let mut response = (
            status,
            Json(AuthErrorBody {
                message,
                resolution,
                error_code: self.error_code(),
            }),
        )
            .into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                axum::http::header::WWW_AUTHENTICATE,
                axum::http::HeaderValue::from_static("Bearer"),
            );
        }
        response
    }
}
