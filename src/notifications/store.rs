use std::path::{Path, PathBuf};
use chrono::Utc;
use crate::error::EngineError;
use crate::notifications::{Notification, NotificationDraft};
use crate::storage;

/// Persisted per-user notifications, one JSON line each. Append-only
/// except for the read flag.
pub struct NotificationStore {
    path: PathBuf,
}

impl NotificationStore {
    pub fn new(data_dir: &Path) -> Self {
        NotificationStore {
            path: data_dir.join("notifications.jsonl"),
        }
    }

    /// Persist freshly generated notifications for a user, assigning
    /// ids past the highest one already stored.
    pub async fn append_batch(
        &self,
        user_id: &str,
        drafts: Vec<NotificationDraft>,
    ) -> Result<Vec<Notification>, EngineError> {
        if drafts.is_empty() {
            return Ok(Vec::new());
        }

        let existing: Vec<Notification> = storage::load_lines(&self.path).await?;
        let mut next_id = existing.iter().map(|n| n.id).max().unwrap_or(0) + 1;
        let timestamp = Utc::now().timestamp();

        let mut created = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let notification = Notification {
                id: next_id,
                user_id: user_id.to_string(),
                title: draft.title,
                message: draft.message,
                kind: draft.kind,
                read: false,
                timestamp,
            };
            storage::append_line(&self.path, &notification).await?;
            created.push(notification);
            next_id += 1;
        }

        Ok(created)
    }

    /// List a user's notifications, newest first
    pub async fn list_for_user(
        &self,
        user_id: &str,
        unread_only: bool,
    ) -> Result<Vec<Notification>, EngineError> {
        let mut notifications: Vec<Notification> = storage::load_lines(&self.path)
            .await?
            .into_iter()
            .filter(|n| n.user_id == user_id && (!unread_only || !n.read))
            .collect();
        notifications.sort_by_key(|n| std::cmp::Reverse(n.timestamp));
        Ok(notifications)
    }

    /// Flip a notification's read flag. Returns false when the id is
    /// unknown.
    pub async fn mark_read(&self, id: u64) -> Result<bool, EngineError> {
        let mut notifications: Vec<Notification> = storage::load_lines(&self.path).await?;

        let mut found = false;
        for notification in notifications.iter_mut() {
            if notification.id == id {
                notification.read = true;
                found = true;
            }
        }

        if found {
            storage::write_all_lines(&self.path, &notifications).await?;
        } else {
            tracing::debug!(id = id, "mark_read: unknown notification id");
        }

        Ok(found)
    }
}
