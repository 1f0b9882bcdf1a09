// SPDX-License-Identifier: MIT

//! In-process WebSocket connection registry.
//!
//! Each connected client registers an unbounded channel keyed by user id;
//! a user may hold several connections (tabs, devices). Delivery is
//! best-effort: a closed channel is dropped on the next send.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

/// Event pushed to connected clients as a JSON frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushEvent {
    /// "notification", "chat_message", "broadcast"
    pub event: String,
    pub payload: serde_json::Value,
}

struct Connection {
    conn_id: u64,
    sender: mpsc::UnboundedSender<String>,
}

/// Registry of live WebSocket connections.
#[derive(Default)]
pub struct PushService {
    clients: DashMap<u64, Vec<Connection>>,
    next_conn_id: AtomicU64,
}

impl PushService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection for a user; returns the connection id and the
    /// receiving end the socket task drains.
    pub fn register(&self, user_id: u64) -> (u64, mpsc::UnboundedReceiver<String>) {
        let conn_id = self.next_conn_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::unbounded_channel();
        self.clients
            .entry(user_id)
            .or_default()
            .push(Connection { conn_id, sender });
        tracing::debug!(user_id, conn_id, "WebSocket client registered");
        (conn_id, receiver)
    }

    /// Remove a connection when its socket closes.
    pub fn unregister(&self, user_id: u64, conn_id: u64) {
        if let Some(mut connections) = self.clients.get_mut(&user_id) {
            connections.retain(|c| c.conn_id != conn_id);
        }
        self.clients.remove_if(&user_id, |_, v| v.is_empty());
        tracing::debug!(user_id, conn_id, "WebSocket client unregistered");
    }

    /// Whether the user has at least one live connection.
    pub fn is_online(&self, user_id: u64) -> bool {
        self.clients
            .get(&user_id)
            .map(|c| !c.is_empty())
            .unwrap_or(false)
    }

    /// Send an event to every connection of one user. Returns the number of
    /// connections reached.
    pub fn send_to_user(&self, user_id: u64, event: &PushEvent) -> usize {
        let frame = match serde_json::to_string(event) {
            Ok(frame) => frame,
            Err(err) => {
                tracing::error!(error = %err, "Failed to serialize push event");
                return 0;
            }
        };

        let mut delivered = 0;
        if let Some(mut connections) = self.clients.get_mut(&user_id) {
            connections.retain(|c| {
                if c.sender.send(frame.clone()).is_ok() {
                    delivered += 1;
                    true
                } else {
                    false
                }
            });
        }
        delivered
    }

    /// Send an event to several users.
    pub fn send_to_users(&self, user_ids: &[u64], event: &PushEvent) -> usize {
        user_ids
            .iter()
            .map(|&id| self.send_to_user(id, event))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event() -> PushEvent {
        PushEvent {
            event: "notification".to_string(),
            payload: serde_json::json!({"id": 1}),
        }
    }

    #[tokio::test]
    async fn test_register_and_deliver() {
        let push = PushService::new();
        let (_, mut rx) = push.register(7);

        assert!(push.is_online(7));
        assert_eq!(push.send_to_user(7, &event()), 1);

        let frame = rx.recv().await.unwrap();
        let parsed: PushEvent = serde_json::from_str(&frame).unwrap();
        assert_eq!(parsed.event, "notification");
    }

    #[tokio::test]
    async fn test_multiple_connections_per_user() {
        let push = PushService::new();
        let (_, mut rx_a) = push.register(7);
        let (_, mut rx_b) = push.register(7);

        assert_eq!(push.send_to_user(7, &event()), 2);
        assert!(rx_a.recv().await.is_some());
        assert!(rx_b.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_unregister_removes_connection() {
        let push = PushService::new();
        let (conn_id, _rx) = push.register(7);
        push.unregister(7, conn_id);

        assert!(!push.is_online(7));
        assert_eq!(push.send_to_user(7, &event()), 0);
    }

    #[tokio::test]
    async fn test_dropped_receiver_is_pruned() {
        let push = PushService::new();
        let (_, rx) = push.register(7);
        drop(rx);

        assert_eq!(push.send_to_user(7, &event()), 0);
    }

    #[tokio::test]
    async fn test_send_to_offline_user() {
        let push = PushService::new();
        assert_eq!(push.send_to_user(99, &event()), 0);
    }
}
