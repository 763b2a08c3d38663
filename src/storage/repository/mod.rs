// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository layer providing typed access to file storage.
//!
//! Each repository provides CRUD operations for a specific entity type,
//! using the FileStorage for all file operations.

pub mod tasks;
pub mod users;

pub use tasks::{StoredTask, TaskRepository, TaskStatus, TaskStatusQuery};
pub use users::{StoredUser, UserRepository};
