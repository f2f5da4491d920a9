//! In-memory task and push-notification-config storage for the demo target.
//!
//! Thread-safe via `tokio::sync::RwLock`. All data is lost when the server
//! stops.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::debug;

use crate::types::{Message, PushNotificationConfig, Task, TaskState, TaskStatus};

/// Why a cancel request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelError {
    NotFound,
    /// The task already reached a terminal state.
    NotCancelable(TaskState),
}

/// Tasks keyed by id plus push configs keyed by task id.
#[derive(Debug, Default)]
pub struct DemoStore {
    tasks: RwLock<HashMap<String, Task>>,
    push_configs: RwLock<HashMap<String, Vec<PushNotificationConfig>>>,
}

impl DemoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a task in `state` whose history starts with `message`.
    pub async fn create(&self, state: TaskState, message: Message) -> Task {
        let mut task = Task::new(state);
        let message = Message {
            task_id: Some(task.id.clone()),
            context_id: Some(task.context_id.clone()),
            ..message
        };
        task.history = Some(vec![message]);
        self.save(task.clone()).await;
        task
    }

    pub async fn save(&self, task: Task) {
        debug!(task_id = %task.id, state = ?task.status.state, "task saved");
        self.tasks.write().await.insert(task.id.clone(), task);
    }

    /// Task by id with at most `history_length` trailing history entries.
    pub async fn get(&self, task_id: &str, history_length: Option<usize>) -> Option<Task> {
        let mut task = self.tasks.read().await.get(task_id).cloned()?;
        if let (Some(limit), Some(history)) = (history_length, task.history.as_mut()) {
            let skip = history.len().saturating_sub(limit);
            history.drain(..skip);
        }
        Some(task)
    }

    /// Move a task to `state`, returning the updated task.
    pub async fn transition(&self, task_id: &str, state: TaskState) -> Option<Task> {
        let mut tasks = self.tasks.write().await;
        let task = tasks.get_mut(task_id)?;
        task.status = TaskStatus::now(state);
        Some(task.clone())
    }

    pub async fn cancel(&self, task_id: &str) -> Result<Task, CancelError> {
        let mut tasks = self.tasks.write().await;
        let task = tasks.get_mut(task_id).ok_or(CancelError::NotFound)?;
        if task.status.state.is_terminal() {
            return Err(CancelError::NotCancelable(task.status.state));
        }
        task.status = TaskStatus::now(TaskState::Canceled);
        debug!(task_id = %task_id, "task canceled");
        Ok(task.clone())
    }

    /// Store a push config for an existing task, assigning an id if it has none.
    pub async fn set_push(
        &self,
        task_id: &str,
        mut config: PushNotificationConfig,
    ) -> Option<PushNotificationConfig> {
        if !self.tasks.read().await.contains_key(task_id) {
            return None;
        }
        let id = config
            .id
            .get_or_insert_with(|| uuid::Uuid::new_v4().to_string())
            .clone();
        let mut configs = self.push_configs.write().await;
        let entries = configs.entry(task_id.to_string()).or_default();
        entries.retain(|c| c.id.as_deref() != Some(id.as_str()));
        entries.push(config.clone());
        Some(config)
    }

    /// The config with `config_id`, or the first one for the task.
    pub async fn get_push(
        &self,
        task_id: &str,
        config_id: Option<&str>,
    ) -> Option<PushNotificationConfig> {
        let configs = self.push_configs.read().await;
        let entries = configs.get(task_id)?;
        match config_id {
            Some(id) => entries.iter().find(|c| c.id.as_deref() == Some(id)).cloned(),
            None => entries.first().cloned(),
        }
    }

    pub async fn list_push(&self, task_id: &str) -> Vec<PushNotificationConfig> {
        self.push_configs
            .read()
            .await
            .get(task_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Remove a config; `true` when something was removed.
    pub async fn delete_push(&self, task_id: &str, config_id: &str) -> bool {
        let mut configs = self.push_configs.write().await;
        let Some(entries) = configs.get_mut(task_id) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|c| c.id.as_deref() != Some(config_id));
        before != entries.len()
    }
}
