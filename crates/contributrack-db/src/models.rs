// Database row and input types; these map directly to SQLite rows.
// Distinct from contributrack-types API models to keep the DB layer independent.

use chrono::{DateTime, Utc};

/// A chat message as seen on the wire, before any local ids are resolved.
#[derive(Debug, Clone)]
pub struct ObservedMessage {
    pub guild_id: String,
    pub guild_name: String,
    pub channel_id: String,
    pub channel_name: Option<String>,
    pub author_id: String,
    pub author_name: Option<String>,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub attachments: Vec<NewAttachment>,
}

#[derive(Debug, Clone, Default)]
pub struct NewAttachment {
    pub attachment_id: String,
    pub filename: String,
    pub url: String,
    pub content_type: Option<String>,
    pub size: Option<i64>,
    pub height: Option<i64>,
    pub width: Option<i64>,
    pub description: Option<String>,
    pub ephemeral: Option<bool>,
    pub duration: Option<f64>,
}

/// Local ids assigned while recording one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedMessage {
    pub server_id: i64,
    pub channel_id: i64,
    pub user_id: i64,
    pub message_id: i64,
    pub attachment_count: usize,
}

pub struct MessageRow {
    pub content: String,
    pub timestamp: String,
    pub author_name: String,
}

pub struct NewUserContribution {
    pub repo_name: String,
    pub username: String,
    pub total_commits: i64,
    pub lines_added: i64,
    pub lines_deleted: i64,
    pub date: String,
}

pub struct UserContributionRow {
    pub id: i64,
    pub repo_name: String,
    pub username: String,
    pub total_commits: i64,
    pub lines_added: i64,
    pub lines_deleted: i64,
    pub date: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCounts {
    pub servers: i64,
    pub channels: i64,
    pub users: i64,
    pub messages: i64,
    pub attachments: i64,
    pub user_contributions: i64,
}
