// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Task repository.
//!
//! Tasks are stored one per file under `<data>/tasks/{task_id}.json`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::super::{paths::is_valid_record_id, FileStorage, OwnedResource, StorageError, StorageResult};

/// Workflow state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

/// Query string for `PATCH /tasks/{task_id}/status`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TaskStatusQuery {
    /// New status.
    pub status: TaskStatus,
}

/// Task as persisted and returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct StoredTask {
    /// Unique task identifier (UUID)
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    /// Minutes logged against the task
    #[serde(default)]
    pub total_minutes: i64,
    /// Owning user ID
    pub user_id: String,
    /// Admin who assigned the task, if any
    #[serde(default)]
    pub assigned_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredTask {
    /// New `todo` task owned by `user_id`.
    pub fn new(user_id: impl Into<String>, title: impl Into<String>, description: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            description,
            status: TaskStatus::Todo,
            total_minutes: 0,
            user_id: user_id.into(),
            assigned_by: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl OwnedResource for StoredTask {
    fn owner_user_id(&self) -> &str {
        &self.user_id
    }
}

/// Repository for task operations.
pub struct TaskRepository<'a> {
    storage: &'a FileStorage,
}

impl<'a> TaskRepository<'a> {
    pub fn new(storage: &'a FileStorage) -> Self {
        Self { storage }
    }

    pub fn exists(&self, task_id: &str) -> bool {
        is_valid_record_id(task_id) && self.storage.exists(self.storage.paths().task(task_id))
    }

    /// Get a task by ID.
    pub fn get(&self, task_id: &str) -> StorageResult<StoredTask> {
        if !self.exists(task_id) {
            return Err(StorageError::NotFound(format!("Task {task_id}")));
        }
        self.storage.read_json(self.storage.paths().task(task_id))
    }

    /// Create a new task.
    pub fn create(&self, task: &StoredTask) -> StorageResult<()> {
        if self.exists(&task.id) {
            return Err(StorageError::AlreadyExists(format!("Task {}", task.id)));
        }
        self.storage
            .write_json(self.storage.paths().task(&task.id), task)
    }

    /// Overwrite an existing task.
    pub fn update(&self, task: &StoredTask) -> StorageResult<()> {
        if !self.exists(&task.id) {
            return Err(StorageError::NotFound(format!("Task {}", task.id)));
        }
        self.storage
            .write_json(self.storage.paths().task(&task.id), task)
    }

    /// Delete a task.
    pub fn delete(&self, task_id: &str) -> StorageResult<()> {
        if !self.exists(task_id) {
            return Err(StorageError::NotFound(format!("Task {task_id}")));
        }
        self.storage.delete(self.storage.paths().task(task_id))
    }

    /// List all tasks regardless of owner, oldest first. For admin use only.
    pub fn list_all(&self) -> StorageResult<Vec<StoredTask>> {
        let ids = self
            .storage
            .list_files(self.storage.paths().tasks_dir(), "json")?;

        let mut tasks = Vec::with_capacity(ids.len());
        for id in ids {
            match self.get(&id) {
                Ok(task) => tasks.push(task),
                Err(e) => tracing::warn!(task_id = %id, error = %e, "Skipping unreadable task"),
            }
        }
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        Ok(tasks)
    }

    /// List tasks owned by a user, oldest first.
    pub fn list_by_owner(&self, user_id: &str) -> StorageResult<Vec<StoredTask>> {
        Ok(self
            .list_all()?
            .into_iter()
            .filter(|task| task.user_id == user_id)
            .collect())
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

    #[test]
    fn create_and_get_task() {
        let (storage, _dir) = test_storage();
        let repo = TaskRepository::new(&storage);

        let task = StoredTask::new("user-1", "Write docs", Some("API reference".to_string()));
        repo.create(&task).unwrap();

        let loaded = repo.get(&task.id).unwrap();
        assert_eq!(loaded, task);
        assert_eq!(loaded.status, TaskStatus::Todo);
        assert_eq!(loaded.total_minutes, 0);
    }

    #[test]
    fn list_by_owner_filters_correctly() {
        let (storage, _dir) = test_storage();
        let repo = TaskRepository::new(&storage);

        for i in 1..=3 {
            repo.create(&StoredTask::new("user-1", format!("task {i}"), None))
                .unwrap();
        }
        repo.create(&StoredTask::new("user-2", "other", None)).unwrap();

        assert_eq!(repo.list_by_owner("user-1").unwrap().len(), 3);
        assert_eq!(repo.list_by_owner("user-2").unwrap().len(), 1);
        assert_eq!(repo.list_all().unwrap().len(), 4);
    }

    #[test]
    fn update_changes_status() {
        let (storage, _dir) = test_storage();
        let repo = TaskRepository::new(&storage);

        let mut task = StoredTask::new("user-1", "Ship it", None);
        repo.create(&task).unwrap();

        task.status = TaskStatus::InProgress;
        repo.update(&task).unwrap();
        assert_eq!(repo.get(&task.id).unwrap().status, TaskStatus::InProgress);
    }

    #[test]
    fn delete_missing_task_is_not_found() {
        let (storage, _dir) = test_storage();
        let repo = TaskRepository::new(&storage);
        assert!(matches!(repo.delete("missing"), Err(StorageError::NotFound(_))));
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            r#""in_progress""#
        );
        let parsed: TaskStatus = serde_json::from_str(r#""done""#).unwrap();
        assert_eq!(parsed, TaskStatus::Done);
    }
}
