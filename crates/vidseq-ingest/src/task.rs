//! Owned task registry.
//!
//! Replaces the process-global mutable maps of a naive implementation with
//! an explicitly owned object passed to the orchestrator and the transport
//! layer; created at process start, entries reach a terminal state and stay
//! queryable until pruned.

use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use vidseq_core::{TaskRecord, TaskState};

/// Registry of ingestion and search tasks.
#[derive(Default)]
pub struct TaskRegistry {
    tasks: RwLock<HashMap<Uuid, TaskRecord>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new task, returning its identifier.
    pub async fn create(&self, video_path: Option<String>) -> Uuid {
        let id = Uuid::new_v4();
        let record = TaskRecord {
            id,
            state: TaskState::Created,
            created_at: Utc::now(),
            video_path,
        };
        self.tasks.write().await.insert(id, record);
        debug!(task_id = %id, "Task created");
        id
    }

    /// Move a task to a new state. Unknown ids are ignored (the task may
    /// have been pruned).
    pub async fn set_state(&self, id: Uuid, state: TaskState) {
        if let Some(record) = self.tasks.write().await.get_mut(&id) {
            debug!(task_id = %id, from = ?record.state, to = ?state, "Task state change");
            record.state = state;
        }
    }

    /// Fetch a task snapshot.
    pub async fn get(&self, id: Uuid) -> Option<TaskRecord> {
        self.tasks.read().await.get(&id).cloned()
    }

    /// Drop all terminal tasks, returning how many were pruned.
    pub async fn prune_terminal(&self) -> usize {
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|_, t| !t.state.is_terminal());
        before - tasks.len()
    }

    /// Number of tracked tasks.
    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_then_get() {
        let registry = TaskRegistry::new();
        let id = registry.create(Some("videos/a.mp4".to_string())).await;

        let record = registry.get(id).await.unwrap();
        assert_eq!(record.state, TaskState::Created);
        assert_eq!(record.video_path.as_deref(), Some("videos/a.mp4"));
    }

    #[tokio::test]
    async fn state_transitions_are_recorded() {
        let registry = TaskRegistry::new();
        let id = registry.create(None).await;

        registry.set_state(id, TaskState::Running).await;
        assert_eq!(registry.get(id).await.unwrap().state, TaskState::Running);

        registry.set_state(id, TaskState::Completed).await;
        assert_eq!(registry.get(id).await.unwrap().state, TaskState::Completed);
    }

    #[tokio::test]
    async fn set_state_on_unknown_id_is_ignored() {
        let registry = TaskRegistry::new();
        registry.set_state(Uuid::new_v4(), TaskState::Failed).await;
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn prune_removes_only_terminal_tasks() {
        let registry = TaskRegistry::new();
        let running = registry.create(None).await;
        let done = registry.create(None).await;

        registry.set_state(running, TaskState::Running).await;
        registry.set_state(done, TaskState::Completed).await;

        assert_eq!(registry.prune_terminal().await, 1);
        assert!(registry.get(running).await.is_some());
        assert!(registry.get(done).await.is_none());
    }
}
