// SPDX-License-Identifier: MIT

//! Chat conversation and message models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ChatMessage {
    pub id: u64,
    pub conversation_id: u64,
    pub sender_id: u64,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}

/// Conversation as listed for a user: the other participants, the last
/// message and how many messages the user has not read yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: u64,
    pub participant_ids: Vec<u64>,
    pub participant_names: Vec<String>,
    pub last_message: Option<ChatMessage>,
    pub unread_count: u32,
}
