// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Users and tasks are persisted as one JSON file per record under the
//! configured data directory.
//!
//! ## Storage Layout
//!
//! ```text
//! <DATA_DIR>/
//!   users/
//!     {user_id}.json   # StoredUser (includes the argon2 hash, never served)
//!   tasks/
//!     {task_id}.json   # StoredTask
//! ```

pub mod files;
pub mod ownership;
pub mod paths;
pub mod repository;

pub use files::{FileStorage, StorageError, StorageResult};
pub use ownership::{OwnedResource, OwnershipEnforcer};
pub use paths::StoragePaths;
pub use repository::{
    StoredTask, StoredUser, TaskRepository, TaskStatus, TaskStatusQuery, UserRepository,
};
