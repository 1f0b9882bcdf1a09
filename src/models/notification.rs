// SPDX-License-Identifier: MIT

//! Notification models, raw and aggregated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw notification row as stored.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: u64,
    /// Recipient
    pub user_id: u64,
    /// "recipe_liked", "recipe_approved", "recipe_rejected",
    /// "chat_message", "broadcast", ...
    pub kind: String,
    /// User who triggered the notification, if any
    pub actor_id: Option<u64>,
    /// Display name of the actor, denormalized at write time
    pub actor_name: Option<String>,
    /// "recipe", "conversation", ... paired with `object_id`
    pub object_type: Option<String>,
    pub object_id: Option<u64>,
    pub title: String,
    pub body: Option<String>,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }
}

/// One entry in the aggregated notification feed.
///
/// Unread rows sharing (kind, object_type, object_id) are merged into a
/// single entry; `row_ids` keeps the underlying rows so the client can mark
/// the whole group read at once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedNotification {
    /// Id of the newest merged row
    pub id: u64,
    pub kind: String,
    pub object_type: Option<String>,
    pub object_id: Option<u64>,
    pub title: String,
    pub body: Option<String>,
    /// Distinct actor names, most recent first
    pub actors: Vec<String>,
    /// Ids of every merged row
    pub row_ids: Vec<u64>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}
