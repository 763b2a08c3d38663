// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for authenticated principals.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(principal): Auth) -> impl IntoResponse {
//!     // principal is the live user record, minus the password hash
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use super::{AuthError, Principal};
use crate::state::AppState;

/// Extractor for authenticated principals.
///
/// Reads `Authorization: Bearer <token>`, validates the token and loads the
/// principal from the user store.
pub struct Auth(pub Principal);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // Another extractor may already have resolved this request
        if let Some(principal) = parts.extensions.get::<Principal>().cloned() {
            return Ok(Auth(principal));
        }

        let token = bearer_token(parts)?;
        let principal = state.auth.resolve(&state.users(), token).await?;

        parts.extensions.insert(principal.clone());
        Ok(Auth(principal))
    }
}

/// Extractor that additionally requires the admin flag.
pub struct AdminOnly(pub Principal);

impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Auth(principal) = Auth::from_request_parts(parts, state).await?;

        if let Err(e) = state.auth.require_admin(&principal) {
            tracing::info!(user_id = %principal.id, "Admin route denied");
            return Err(e);
        }

        Ok(AdminOnly(principal))
    }
}

/// Pull the token out of the Authorization header. The scheme name is
/// matched case-insensitively.
fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let (scheme, token) = header
        .split_once(' ')
        .ok_or(AuthError::InvalidAuthHeader)?;
    let token = token.trim();

    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AuthError::InvalidAuthHeader);
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_state;
    use crate::storage::StoredUser;
    use axum::http::Request;

    fn parts_with_header(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/test");
        if let Some(value) = value {
            builder = builder.header("Authorization", value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    async fn seed_user(state: &AppState, username: &str, is_admin: bool) -> Principal {
        let hash = state.auth.hash_password("pw").await.unwrap();
        let mut user = StoredUser::new(username, format!("{username}@example.com"), hash);
        user.is_admin = is_admin;
        state.users().create(&user).unwrap();
        user.into()
    }

    #[tokio::test]
    async fn auth_extractor_requires_auth_header() {
        let (state, _dir) = test_state();
        let mut parts = parts_with_header(None);

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::MissingAuthHeader)));
    }

    #[tokio::test]
    async fn auth_extractor_rejects_other_schemes() {
        let (state, _dir) = test_state();
        for value in ["Basic abc", "Bearer", "Bearer   ", "token"] {
            let mut parts = parts_with_header(Some(value));
            let result = Auth::from_request_parts(&mut parts, &state).await;
            assert!(matches!(result, Err(AuthError::InvalidAuthHeader)), "{value}");
        }
    }

    #[tokio::test]
    async fn auth_extractor_resolves_valid_token() {
        let (state, _dir) = test_state();
        let principal = seed_user(&state, "alice", false).await;
        let token = state.auth.issue_token(&principal, None).unwrap().token;

        let mut parts = parts_with_header(Some(&format!("bearer {token}")));
        let Auth(resolved) = Auth::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(resolved.id, principal.id);
        assert!(parts.extensions.get::<Principal>().is_some());
    }

    #[tokio::test]
    async fn auth_extractor_rejects_bad_token() {
        let (state, _dir) = test_state();
        let mut parts = parts_with_header(Some("Bearer not.a.token"));

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn admin_only_rejects_non_admin() {
        let (state, _dir) = test_state();
        let principal = seed_user(&state, "bob", false).await;
        let token = state.auth.issue_token(&principal, None).unwrap().token;

        let mut parts = parts_with_header(Some(&format!("Bearer {token}")));
        let result = AdminOnly::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::InsufficientPermission)));
    }

    #[tokio::test]
    async fn admin_only_accepts_admin() {
        let (state, _dir) = test_state();
        let principal = seed_user(&state, "root", true).await;
        let token = state.auth.issue_token(&principal, None).unwrap().token;

        let mut parts = parts_with_header(Some(&format!("Bearer {token}")));
        let AdminOnly(admin) = AdminOnly::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert!(admin.is_admin);
    }
}
