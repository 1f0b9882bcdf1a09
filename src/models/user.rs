//! User model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Roles stored in `users.role`.
pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";

/// Account statuses stored in `users.status`.
pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_SUSPENDED: &str = "suspended";

/// User row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: u64,
    pub email: String,
    /// Argon2 hash, never exposed in responses
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    /// "user" or "admin"
    pub role: String,
    /// "active" or "suspended"
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub last_active: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }

    pub fn is_suspended(&self) -> bool {
        self.status == STATUS_SUSPENDED
    }
}
