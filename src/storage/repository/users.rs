// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User repository.
//!
//! Each user is a JSON file under `<data>/users/{user_id}.json`. Lookups by
//! username or email scan the directory; uniqueness of both is enforced on
//! create and update.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::super::{paths::is_valid_record_id, FileStorage, StorageError, StorageResult};
use crate::auth::PrincipalStore;

/// User record as persisted.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredUser {
    /// Unique user identifier (UUID)
    pub id: String,
    /// Unique login name
    pub username: String,
    /// Unique email address
    pub email: String,
    /// Argon2 PHC string
    pub password_hash: String,
    /// Whether the user may act on every resource
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredUser {
    /// Build a fresh non-admin record with a new id.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            is_admin: false,
            created_at: now,
            updated_at: now,
        }
    }
}

// The hash must never reach logs, so Debug is written out by hand.
impl fmt::Debug for StoredUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredUser")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("is_admin", &self.is_admin)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Repository for user operations.
pub struct UserRepository<'a> {
    storage: &'a FileStorage,
}

impl<'a> UserRepository<'a> {
    pub fn new(storage: &'a FileStorage) -> Self {
        Self { storage }
    }

    pub fn exists(&self, user_id: &str) -> bool {
        is_valid_record_id(user_id) && self.storage.exists(self.storage.paths().user(user_id))
    }

    /// Get a user by ID.
    pub fn get(&self, user_id: &str) -> StorageResult<StoredUser> {
        if !self.exists(user_id) {
            return Err(StorageError::NotFound(format!("User {user_id}")));
        }
        self.storage.read_json(self.storage.paths().user(user_id))
    }

    /// Find a user by exact username.
    pub fn find_by_username(&self, username: &str) -> StorageResult<Option<StoredUser>> {
        Ok(self
            .list_all()?
            .into_iter()
            .find(|user| user.username == username))
    }

    /// Find a user by exact email.
    pub fn find_by_email(&self, email: &str) -> StorageResult<Option<StoredUser>> {
        Ok(self.list_all()?.into_iter().find(|user| user.email == email))
    }

    /// Create a new user.
    ///
    /// Fails with `AlreadyExists` if the id, username or email is taken.
    pub fn create(&self, user: &StoredUser) -> StorageResult<()> {
        if self.exists(&user.id) {
            return Err(StorageError::AlreadyExists(format!("User {}", user.id)));
        }
        self.ensure_unique(user)?;

        self.storage
            .write_json(self.storage.paths().user(&user.id), user)
    }

    /// Overwrite an existing user. Username and email must stay unique.
    pub fn update(&self, user: &StoredUser) -> StorageResult<()> {
        if !self.exists(&user.id) {
            return Err(StorageError::NotFound(format!("User {}", user.id)));
        }
        self.ensure_unique(user)?;

        self.storage
            .write_json(self.storage.paths().user(&user.id), user)
    }

    /// Delete a user.
    pub fn delete(&self, user_id: &str) -> StorageResult<()> {
        if !self.exists(user_id) {
            return Err(StorageError::NotFound(format!("User {user_id}")));
        }
        self.storage.delete(self.storage.paths().user(user_id))
    }

    /// All users, oldest first.
    pub fn list_all(&self) -> StorageResult<Vec<StoredUser>> {
        let ids = self
            .storage
            .list_files(self.storage.paths().users_dir(), "json")?;

        let mut users = Vec::with_capacity(ids.len());
        for id in ids {
            match self.get(&id) {
                Ok(user) => users.push(user),
                Err(e) => tracing::warn!(user_id = %id, error = %e, "Skipping unreadable user record"),
            }
        }
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        Ok(users)
    }

    fn ensure_unique(&self, candidate: &StoredUser) -> StorageResult<()> {
        let clash = self.list_all()?.into_iter().any(|other| {
            other.id != candidate.id
                && (other.username == candidate.username || other.email == candidate.email)
        });

        if clash {
            return Err(StorageError::AlreadyExists(
                "User with username or email".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl PrincipalStore for UserRepository<'_> {
    async fn find_by_username(&self, username: &str) -> StorageResult<Option<StoredUser>> {
        UserRepository::find_by_username(self, username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StoragePaths;
    use tempfile::TempDir;

    fn test_storage() -> (FileStorage, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let mut storage = FileStorage::new(StoragePaths::new(temp_dir.path()));
        storage.initialize().expect("Failed to initialize");
        (storage, temp_dir)
    }

    fn test_user(username: &str) -> StoredUser {
        StoredUser::new(username, format!("{username}@example.com"), "$argon2id$fake")
    }

    #[test]
    fn create_and_get_user() {
        let (storage, _dir) = test_storage();
        let repo = UserRepository::new(&storage);

        let user = test_user("alice");
        repo.create(&user).unwrap();

        let loaded = repo.get(&user.id).unwrap();
        assert_eq!(loaded, user);
        assert!(!loaded.is_admin);
    }

    #[test]
    fn find_by_username_and_email() {
        let (storage, _dir) = test_storage();
        let repo = UserRepository::new(&storage);

        let alice = test_user("alice");
        repo.create(&alice).unwrap();
        repo.create(&test_user("bob")).unwrap();

        let found = repo.find_by_username("alice").unwrap().unwrap();
        assert_eq!(found.id, alice.id);
        assert!(repo.find_by_username("Alice").unwrap().is_none());

        let found = repo.find_by_email("bob@example.com").unwrap().unwrap();
        assert_eq!(found.username, "bob");
    }

    #[test]
    fn create_rejects_duplicate_username_or_email() {
        let (storage, _dir) = test_storage();
        let repo = UserRepository::new(&storage);
        repo.create(&test_user("alice")).unwrap();

        let same_name = StoredUser::new("alice", "other@example.com", "h");
        assert!(matches!(
            repo.create(&same_name),
            Err(StorageError::AlreadyExists(_))
        ));

        let same_email = StoredUser::new("alicia", "alice@example.com", "h");
        assert!(matches!(
            repo.create(&same_email),
            Err(StorageError::AlreadyExists(_))
        ));
    }

    #[test]
    fn update_allows_keeping_own_username() {
        let (storage, _dir) = test_storage();
        let repo = UserRepository::new(&storage);

        let mut alice = test_user("alice");
        repo.create(&alice).unwrap();
        repo.create(&test_user("bob")).unwrap();

        alice.is_admin = true;
        repo.update(&alice).unwrap();
        assert!(repo.get(&alice.id).unwrap().is_admin);

        alice.username = "bob".to_string();
        assert!(matches!(
            repo.update(&alice),
            Err(StorageError::AlreadyExists(_))
        ));
    }

    #[test]
    fn delete_removes_user() {
        let (storage, _dir) = test_storage();
        let repo = UserRepository::new(&storage);

        let user = test_user("carol");
        repo.create(&user).unwrap();
        repo.delete(&user.id).unwrap();

        assert!(!repo.exists(&user.id));
        assert!(matches!(repo.delete(&user.id), Err(StorageError::NotFound(_))));
    }

    #[test]
    fn debug_output_redacts_hash() {
        let user = StoredUser::new("dave", "dave@example.com", "$argon2id$v=19$secret");
        let rendered = format!("{user:?}");
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("secret"));
    }
}
