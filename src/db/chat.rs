// SPDX-License-Identifier: MIT

//! Chat conversation and message operations.

use super::{soft_empty, Db};
use crate::error::AppError;
use crate::models::chat::{ChatMessage, ConversationSummary};

impl Db {
    /// Find the direct conversation between two users, creating it if needed.
    pub async fn find_or_create_conversation(
        &self,
        user_a: u64,
        user_b: u64,
    ) -> Result<u64, AppError> {
        let existing: Option<(u64,)> = sqlx::query_as(
            "SELECT p1.conversation_id FROM chat_participants p1 \
             JOIN chat_participants p2 ON p1.conversation_id = p2.conversation_id \
             WHERE p1.user_id = ? AND p2.user_id = ? LIMIT 1",
        )
        .bind(user_a)
        .bind(user_b)
        .fetch_optional(self.pool()?)
        .await?;

        if let Some((id,)) = existing {
            return Ok(id);
        }

        let mut tx = self.pool()?.begin().await?;
        let conversation = sqlx::query(
            "INSERT INTO chat_conversations (created_at) VALUES (UTC_TIMESTAMP())",
        )
        .execute(&mut *tx)
        .await?;
        let conversation_id = conversation.last_insert_id();

        for user_id in [user_a, user_b] {
            sqlx::query(
                "INSERT INTO chat_participants (conversation_id, user_id, last_read_at) \
                 VALUES (?, ?, UTC_TIMESTAMP())",
            )
            .bind(conversation_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(conversation_id)
    }

    /// Whether the user belongs to the conversation.
    pub async fn is_participant(
        &self,
        conversation_id: u64,
        user_id: u64,
    ) -> Result<bool, AppError> {
        let row: Option<(u64,)> = sqlx::query_as(
            "SELECT user_id FROM chat_participants WHERE conversation_id = ? AND user_id = ?",
        )
        .bind(conversation_id)
        .bind(user_id)
        .fetch_optional(self.pool()?)
        .await?;
        Ok(row.is_some())
    }

    /// Other participants of a conversation.
    pub async fn other_participants(
        &self,
        conversation_id: u64,
        user_id: u64,
    ) -> Result<Vec<u64>, AppError> {
        let rows: Vec<(u64,)> = sqlx::query_as(
            "SELECT user_id FROM chat_participants WHERE conversation_id = ? AND user_id <> ?",
        )
        .bind(conversation_id)
        .bind(user_id)
        .fetch_all(self.pool()?)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Conversations for a user with participants, last message and unread
    /// count. One query per section; conversation lists are small.
    pub async fn list_conversations(
        &self,
        user_id: u64,
    ) -> Result<Vec<ConversationSummary>, AppError> {
        let conversation_ids: Vec<(u64,)> = match sqlx::query_as(
            "SELECT conversation_id FROM chat_participants WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_all(self.pool()?)
        .await
        {
            Ok(rows) => rows,
            Err(err) if super::is_schema_drift(&err) => Vec::new(),
            Err(err) => return Err(err.into()),
        };

        let mut summaries = Vec::with_capacity(conversation_ids.len());
        for (conversation_id,) in conversation_ids {
            let participants: Vec<(u64, String)> = sqlx::query_as(
                "SELECT u.id, u.name FROM users u \
                 JOIN chat_participants p ON p.user_id = u.id \
                 WHERE p.conversation_id = ? AND u.id <> ?",
            )
            .bind(conversation_id)
            .bind(user_id)
            .fetch_all(self.pool()?)
            .await?;

            let last_message = sqlx::query_as::<_, ChatMessage>(
                "SELECT * FROM chat_messages WHERE conversation_id = ? \
                 ORDER BY id DESC LIMIT 1",
            )
            .bind(conversation_id)
            .fetch_optional(self.pool()?)
            .await?;

            let unread: (i64,) = sqlx::query_as(
                "SELECT COUNT(*) FROM chat_messages m \
                 JOIN chat_participants p ON p.conversation_id = m.conversation_id \
                 WHERE m.conversation_id = ? AND p.user_id = ? \
                 AND m.sender_id <> ? AND m.sent_at > p.last_read_at",
            )
            .bind(conversation_id)
            .bind(user_id)
            .bind(user_id)
            .fetch_one(self.pool()?)
            .await?;

            let (participant_ids, participant_names) = participants.into_iter().unzip();
            summaries.push(ConversationSummary {
                id: conversation_id,
                participant_ids,
                participant_names,
                last_message,
                unread_count: unread.0 as u32,
            });
        }

        // Most recently active first
        summaries.sort_by(|a, b| {
            let a_key = a.last_message.as_ref().map(|m| m.sent_at);
            let b_key = b.last_message.as_ref().map(|m| m.sent_at);
            b_key.cmp(&a_key)
        });
        Ok(summaries)
    }

    /// Messages in a conversation, oldest first, keyset-paginated by id.
    pub async fn list_messages(
        &self,
        conversation_id: u64,
        before_id: Option<u64>,
        limit: u32,
    ) -> Result<Vec<ChatMessage>, AppError> {
        let mut sql = String::from("SELECT * FROM chat_messages WHERE conversation_id = ?");
        if before_id.is_some() {
            sql.push_str(" AND id < ?");
        }
        sql.push_str(" ORDER BY id DESC LIMIT ?");

        let mut query = sqlx::query_as::<_, ChatMessage>(&sql).bind(conversation_id);
        if let Some(before) = before_id {
            query = query.bind(before);
        }
        query = query.bind(limit);

        let mut messages = soft_empty(query.fetch_all(self.pool()?).await, "chat_messages")?;
        messages.reverse();
        Ok(messages)
    }

    /// Store a message and advance the sender's read marker.
    pub async fn add_message(
        &self,
        conversation_id: u64,
        sender_id: u64,
        body: &str,
    ) -> Result<ChatMessage, AppError> {
        let mut tx = self.pool()?.begin().await?;
        let result = sqlx::query(
            "INSERT INTO chat_messages (conversation_id, sender_id, body, sent_at) \
             VALUES (?, ?, ?, UTC_TIMESTAMP())",
        )
        .bind(conversation_id)
        .bind(sender_id)
        .bind(body)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE chat_participants SET last_read_at = UTC_TIMESTAMP() \
             WHERE conversation_id = ? AND user_id = ?",
        )
        .bind(conversation_id)
        .bind(sender_id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        let message = sqlx::query_as::<_, ChatMessage>("SELECT * FROM chat_messages WHERE id = ?")
            .bind(result.last_insert_id())
            .fetch_one(self.pool()?)
            .await?;
        Ok(message)
    }

    /// Advance the reader's marker after fetching messages.
    pub async fn mark_conversation_read(
        &self,
        conversation_id: u64,
        user_id: u64,
    ) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE chat_participants SET last_read_at = UTC_TIMESTAMP() \
             WHERE conversation_id = ? AND user_id = ?",
        )
        .bind(conversation_id)
        .bind(user_id)
        .execute(self.pool()?)
        .await?;
        Ok(())
    }
}
