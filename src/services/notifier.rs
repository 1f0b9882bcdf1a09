// SPDX-License-Identifier: MIT

//! Notification creation, aggregation and fan-out.
//!
//! Raw rows are stored one per event. The feed the API returns merges
//! unread rows that share (kind, object_type, object_id) into a single
//! entry with de-duplicated actors and a combined title; rows that are
//! already read stay one entry each.

use crate::db::notifications::NewNotification;
use crate::db::Db;
use crate::error::AppError;
use crate::models::{AggregatedNotification, Notification};
use crate::services::push::{PushEvent, PushService};
use std::collections::HashMap;
use std::sync::Arc;

/// Kinds whose titles are rebuilt from actors when rows merge.
fn verb_phrase(kind: &str) -> Option<&'static str> {
    match kind {
        "recipe_liked" => Some("liked your recipe"),
        "recipe_favorited" => Some("favorited your recipe"),
        "recipe_purchased" => Some("purchased your recipe"),
        "chat_message" => Some("sent you a message"),
        _ => None,
    }
}

/// Title for a merged group: "Alice liked your recipe",
/// "Alice and Bob liked your recipe", "Alice and 2 others liked your recipe".
fn format_title(actors: &[String], verb: &str) -> String {
    match actors {
        [] => verb.to_string(),
        [a] => format!("{} {}", a, verb),
        [a, b] => format!("{} and {} {}", a, b, verb),
        [a, rest @ ..] => format!("{} and {} others {}", a, rest.len(), verb),
    }
}

/// Merge notification rows (given newest first) into the feed shape.
///
/// Rows without an object id never merge; a broadcast is always its own
/// entry. Actor order inside a group follows row recency.
pub fn aggregate(rows: Vec<Notification>) -> Vec<AggregatedNotification> {
    let mut entries: Vec<AggregatedNotification> = Vec::new();
    // (kind, object_type, object_id) -> index into entries
    let mut groups: HashMap<(String, Option<String>, u64), usize> = HashMap::new();

    for row in rows {
        let mergeable = !row.is_read() && row.object_id.is_some();

        if mergeable {
            let key = (
                row.kind.clone(),
                row.object_type.clone(),
                row.object_id.unwrap_or_default(),
            );
            if let Some(&idx) = groups.get(&key) {
                let entry = &mut entries[idx];
                entry.row_ids.push(row.id);
                if let Some(actor) = row.actor_name {
                    if !entry.actors.contains(&actor) {
                        entry.actors.push(actor);
                    }
                }
                if let Some(verb) = verb_phrase(&entry.kind) {
                    entry.title = format_title(&entry.actors, verb);
                }
                continue;
            }
            groups.insert(key, entries.len());
        }

        let actors: Vec<String> = row.actor_name.clone().into_iter().collect();
        let title = match verb_phrase(&row.kind) {
            Some(verb) if !actors.is_empty() => format_title(&actors, verb),
            _ => row.title.clone(),
        };

        entries.push(AggregatedNotification {
            id: row.id,
            kind: row.kind,
            object_type: row.object_type,
            object_id: row.object_id,
            title,
            body: row.body,
            actors,
            row_ids: vec![row.id],
            read: row.read_at.is_some(),
            created_at: row.created_at,
        });
    }

    entries
}

/// Stores notifications and pushes them to connected clients.
#[derive(Clone)]
pub struct NotifierService {
    db: Db,
    push: Arc<PushService>,
}

impl NotifierService {
    pub fn new(db: Db, push: Arc<PushService>) -> Self {
        Self { db, push }
    }

    /// Store a notification row and deliver it over WebSocket.
    pub async fn notify(&self, new: NewNotification) -> Result<Notification, AppError> {
        let row = self.db.create_notification(&new).await?;

        let delivered = self.push.send_to_user(
            row.user_id,
            &PushEvent {
                event: "notification".to_string(),
                payload: serde_json::to_value(&row)
                    .map_err(|e| AppError::Internal(e.into()))?,
            },
        );
        tracing::debug!(
            user_id = row.user_id,
            kind = %row.kind,
            delivered,
            "Notification stored and pushed"
        );
        Ok(row)
    }

    /// Store the same broadcast for many users, pushing to each.
    pub async fn broadcast(
        &self,
        user_ids: &[u64],
        title: &str,
        body: Option<&str>,
    ) -> Result<u32, AppError> {
        let mut created = 0u32;
        for &user_id in user_ids {
            let result = self
                .notify(NewNotification {
                    user_id,
                    kind: "broadcast".to_string(),
                    actor_id: None,
                    actor_name: None,
                    object_type: None,
                    object_id: None,
                    title: title.to_string(),
                    body: body.map(str::to_string),
                })
                .await;
            match result {
                Ok(_) => created += 1,
                Err(err) => {
                    tracing::warn!(user_id, error = %err, "Broadcast insert failed, continuing");
                }
            }
        }
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn row(
        id: u64,
        kind: &str,
        actor: Option<&str>,
        object_id: Option<u64>,
        read: bool,
    ) -> Notification {
        let created_at = Utc::now() - Duration::minutes(id as i64);
        Notification {
            id,
            user_id: 1,
            kind: kind.to_string(),
            actor_id: actor.map(|_| id),
            actor_name: actor.map(str::to_string),
            object_type: object_id.map(|_| "recipe".to_string()),
            object_id,
            title: format!("row {}", id),
            body: None,
            read_at: read.then(Utc::now),
            created_at,
        }
    }

    #[test]
    fn test_merges_same_object() {
        let rows = vec![
            row(3, "recipe_liked", Some("Alice"), Some(10), false),
            row(2, "recipe_liked", Some("Bob"), Some(10), false),
            row(1, "recipe_liked", Some("Cara"), Some(10), false),
        ];
        let feed = aggregate(rows);

        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].id, 3);
        assert_eq!(feed[0].actors, vec!["Alice", "Bob", "Cara"]);
        assert_eq!(feed[0].row_ids, vec![3, 2, 1]);
        assert_eq!(feed[0].title, "Alice and 2 others liked your recipe");
    }

    #[test]
    fn test_two_actor_title() {
        let rows = vec![
            row(2, "recipe_liked", Some("Alice"), Some(10), false),
            row(1, "recipe_liked", Some("Bob"), Some(10), false),
        ];
        let feed = aggregate(rows);
        assert_eq!(feed[0].title, "Alice and Bob liked your recipe");
    }

    #[test]
    fn test_duplicate_actor_deduplicated() {
        let rows = vec![
            row(2, "recipe_liked", Some("Alice"), Some(10), false),
            row(1, "recipe_liked", Some("Alice"), Some(10), false),
        ];
        let feed = aggregate(rows);

        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].actors, vec!["Alice"]);
        assert_eq!(feed[0].title, "Alice liked your recipe");
        assert_eq!(feed[0].row_ids, vec![2, 1]);
    }

    #[test]
    fn test_different_objects_do_not_merge() {
        let rows = vec![
            row(2, "recipe_liked", Some("Alice"), Some(10), false),
            row(1, "recipe_liked", Some("Bob"), Some(11), false),
        ];
        let feed = aggregate(rows);
        assert_eq!(feed.len(), 2);
    }

    #[test]
    fn test_read_rows_stay_separate() {
        let rows = vec![
            row(2, "recipe_liked", Some("Alice"), Some(10), true),
            row(1, "recipe_liked", Some("Bob"), Some(10), true),
        ];
        let feed = aggregate(rows);

        assert_eq!(feed.len(), 2);
        assert!(feed.iter().all(|e| e.read));
    }

    #[test]
    fn test_broadcast_never_merges() {
        let mut a = row(2, "broadcast", None, None, false);
        a.title = "Maintenance tonight".to_string();
        let mut b = row(1, "broadcast", None, None, false);
        b.title = "New feature".to_string();

        let feed = aggregate(vec![a, b]);
        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0].title, "Maintenance tonight");
    }

    #[test]
    fn test_unknown_kind_keeps_stored_title() {
        let rows = vec![row(1, "recipe_approved", None, Some(10), false)];
        let feed = aggregate(rows);
        assert_eq!(feed[0].title, "row 1");
    }

    #[tokio::test]
    async fn test_broadcast_continues_past_storage_failures() {
        let notifier = NotifierService::new(Db::new_mock(), Arc::new(PushService::new()));
        let created = notifier
            .broadcast(&[1, 2, 3], "Maintenance tonight", None)
            .await
            .unwrap();
        assert_eq!(created, 0);
    }
}
