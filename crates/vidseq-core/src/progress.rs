//! Per-task progress channel registry.
//!
//! A process-wide mapping from task identifier to a single live observer.
//! At most one observer per task: a second subscription silently replaces
//! the first (last-writer-wins), matching the single-client-per-task usage
//! pattern. Delivery is best-effort: a failed send is logged and the entry
//! removed; it never raises into the publisher.

use std::collections::HashMap;

use tokio::sync::{mpsc, Mutex};
use tracing::debug;
use uuid::Uuid;

use crate::defaults::PROGRESS_CHANNEL_CAPACITY;
use crate::models::ProgressEvent;

/// Registry of per-task progress observers.
#[derive(Default)]
pub struct ProgressRegistry {
    observers: Mutex<HashMap<Uuid, mpsc::Sender<ProgressEvent>>>,
}

impl ProgressRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the (sole) observer for a task, returning its receiver.
    ///
    /// Replaces any existing observer: the previous sender is dropped, so
    /// the previous receiver sees its channel close and receives nothing
    /// further.
    pub async fn subscribe(&self, task_id: Uuid) -> mpsc::Receiver<ProgressEvent> {
        let (tx, rx) = mpsc::channel(PROGRESS_CHANNEL_CAPACITY);
        let replaced = self.observers.lock().await.insert(task_id, tx).is_some();
        if replaced {
            debug!(task_id = %task_id, "Replaced existing progress observer");
        }
        rx
    }

    /// Remove a task's observer entry (observer disconnected).
    ///
    /// Removing the observer does not affect the underlying task; future
    /// publishes for the id become no-ops.
    pub async fn unsubscribe(&self, task_id: Uuid) {
        self.observers.lock().await.remove(&task_id);
    }

    /// Deliver an event to the task's observer, if any.
    ///
    /// Terminal events (`progress` of `-1` or `100`) drop the observer
    /// entry after the delivery attempt, successful or not.
    pub async fn publish(&self, task_id: Uuid, event: ProgressEvent) {
        let terminal = event.is_terminal();
        let sender = self.observers.lock().await.get(&task_id).cloned();

        if let Some(tx) = sender {
            if tx.send(event).await.is_err() {
                debug!(task_id = %task_id, "Progress observer gone, dropping entry");
                self.observers.lock().await.remove(&task_id);
                return;
            }
        }

        if terminal {
            self.observers.lock().await.remove(&task_id);
        }
    }

    /// Number of live observer entries.
    pub async fn observer_count(&self) -> usize {
        self.observers.lock().await.len()
    }
}
