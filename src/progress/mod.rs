use serde::{Serialize, Deserialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use crate::error::EngineError;
use crate::storage;

/// One scored interaction for a user in a category.
/// Events are immutable once written; ordering is chronological with
/// ties broken by insertion order.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ProgressEvent {
    pub user_id: String,
    pub category: String,
    pub score: f64,
    pub total_questions: u32,
    #[serde(default)]
    pub metrics: HashMap<String, f64>,
    pub timestamp: i64,
}

/// Append-only store of progress events, one JSON line per event.
pub struct ProgressStore {
    path: PathBuf,
}

impl ProgressStore {
    pub fn new(data_dir: &Path) -> Self {
        ProgressStore {
            path: data_dir.join("progress.jsonl"),
        }
    }

    /// Append a progress event
    pub async fn append(&self, event: &ProgressEvent) -> Result<(), EngineError> {
        storage::append_line(&self.path, event).await
    }

    /// Load all events in chronological order (stable sort keeps
    /// insertion order for equal timestamps)
    pub async fn load_all(&self) -> Result<Vec<ProgressEvent>, EngineError> {
        let mut events: Vec<ProgressEvent> = storage::load_lines(&self.path).await?;
        events.sort_by_key(|e| e.timestamp);
        Ok(events)
    }

    /// Load one user's history, optionally filtered by category
    pub async fn load_history(
        &self,
        user_id: &str,
        category: Option<&str>,
    ) -> Result<Vec<ProgressEvent>, EngineError> {
        let events = self.load_all().await?;
        Ok(events
            .into_iter()
            .filter(|e| {
                e.user_id == user_id
                    && category.map(|c| e.category == c).unwrap_or(true)
            })
            .collect())
    }

    /// Load every user's events for a category (pooled model training)
    pub async fn load_category(&self, category: &str) -> Result<Vec<ProgressEvent>, EngineError> {
        let events = self.load_all().await?;
        Ok(events
            .into_iter()
            .filter(|e| e.category == category)
            .collect())
    }
}
