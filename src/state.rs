// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use crate::auth::AuthCore;
use crate::config::SeedAdmin;
use crate::error::ApiError;
use crate::storage::{FileStorage, StorageError, StoredUser, TaskRepository, UserRepository};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    storage: Arc<FileStorage>,
    pub auth: Arc<AuthCore>,
    /// Serializes check-then-write sequences (uniqueness checks, task
    /// read-modify-write). Reads never take it.
    writes: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(storage: FileStorage, auth: AuthCore) -> Self {
        Self {
            storage: Arc::new(storage),
            auth: Arc::new(auth),
            writes: Arc::new(Mutex::new(())),
        }
    }

    pub fn storage(&self) -> &FileStorage {
        &self.storage
    }

    pub fn users(&self) -> UserRepository<'_> {
        UserRepository::new(&self.storage)
    }

    pub fn tasks(&self) -> TaskRepository<'_> {
        TaskRepository::new(&self.storage)
    }

    /// Hold this while performing a write that depends on a prior read.
    pub async fn write_guard(&self) -> MutexGuard<'_, ()> {
        self.writes.lock().await
    }

    /// Create the configured admin account if no user has its username.
    ///
    /// Returns `true` when an account was created. An existing user with the
    /// same name is left untouched, admin or not.
    pub async fn seed_admin(&self, seed: &SeedAdmin) -> Result<bool, ApiError> {
        if let Some(existing) = self.users().find_by_username(&seed.username)? {
            if !existing.is_admin {
                tracing::warn!(
                    user_id = %existing.id,
                    "Seed admin username belongs to a regular user; not promoting"
                );
            }
            return Ok(false);
        }

        let hash = self.auth.hash_password(&seed.password).await?;
        let mut user = StoredUser::new(seed.username.clone(), seed.email.clone(), hash);
        user.is_admin = true;

        let _guard = self.write_guard().await;
        match self.users().create(&user) {
            Ok(()) => {
                tracing::info!(user_id = %user.id, "Seeded admin account");
                Ok(true)
            }
            Err(StorageError::AlreadyExists(_)) => Err(ApiError::UserAlreadyExists),
            Err(e) => Err(e.into()),
        }
    }
}

/// State over a throwaway data directory with cheap hashing parameters.
#[cfg(test)]
pub(crate) fn test_state() -> (AppState, tempfile::TempDir) {
    use crate::auth::{password::test_params, AuthSettings};
    use crate::storage::StoragePaths;

    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let mut storage = FileStorage::new(StoragePaths::new(temp_dir.path()));
    storage.initialize().expect("Failed to initialize storage");

    let auth = AuthCore::new(AuthSettings {
        secret: "test-secret".to_string(),
        algorithm: jsonwebtoken::Algorithm::HS256,
        access_token_ttl: chrono::Duration::minutes(30),
        hashing: test_params(),
    })
    .expect("Failed to build auth core");

    (AppState::new(storage, auth), temp_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed() -> SeedAdmin {
        SeedAdmin {
            username: "root".to_string(),
            email: "root@example.com".to_string(),
            password: "changeme123".to_string(),
        }
    }

    #[tokio::test]
    async fn seed_admin_creates_once() {
        let (state, _dir) = test_state();

        assert!(state.seed_admin(&seed()).await.unwrap());
        assert!(!state.seed_admin(&seed()).await.unwrap());

        let users = state.users().list_all().unwrap();
        assert_eq!(users.len(), 1);
        assert!(users[0].is_admin);
        assert!(state
            .auth
            .authenticate(&state.users(), "root", "changeme123")
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn seed_admin_does_not_promote_existing_user() {
        let (state, _dir) = test_state();
        let hash = state.auth.hash_password("whatever1").await.unwrap();
        state
            .users()
            .create(&StoredUser::new("root", "squatter@example.com", hash))
            .unwrap();

        assert!(!state.seed_admin(&seed()).await.unwrap());
        let existing = state.users().find_by_username("root").unwrap().unwrap();
        assert!(!existing.is_admin);
    }

    #[tokio::test]
    async fn seed_admin_email_clash_is_conflict() {
        let (state, _dir) = test_state();
        let hash = state.auth.hash_password("whatever1").await.unwrap();
        state
            .users()
            .create(&StoredUser::new("someone", "root@example.com", hash))
            .unwrap();

        let result = state.seed_admin(&seed()).await;
        assert!(matches!(result, Err(ApiError::UserAlreadyExists)));
    }
}
