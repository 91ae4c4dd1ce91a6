use crate::models::{
    MessageRow, NewAttachment, NewUserContribution, ObservedMessage, RecordedMessage, StoreCounts,
    UserContributionRow,
};
use crate::{Database, TIMESTAMP_FORMAT};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use contributrack_types::DateRange;
use contributrack_types::models::ChannelMessage;
use rusqlite::{Connection, OptionalExtension};
use tracing::debug;

impl Database {
    // -- Get-or-create --

    pub fn get_or_create_server(&self, guild_id: &str, name: &str) -> Result<i64> {
        self.with_conn(|conn| upsert_server(conn, guild_id, name))
    }

    pub fn get_or_create_channel(
        &self,
        server_id: i64,
        discord_channel_id: &str,
        name: Option<&str>,
    ) -> Result<i64> {
        self.with_conn(|conn| upsert_channel(conn, server_id, discord_channel_id, name))
    }

    pub fn get_or_create_user(&self, discord_user_id: &str, name: Option<&str>) -> Result<i64> {
        self.with_conn(|conn| upsert_user(conn, discord_user_id, name))
    }

    // -- Messages --

    pub fn store_message(
        &self,
        channel_id: i64,
        user_id: i64,
        content: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<i64> {
        self.with_conn(|conn| insert_message(conn, channel_id, user_id, content, timestamp))
    }

    pub fn store_attachment(&self, message_id: i64, attachment: &NewAttachment) -> Result<i64> {
        self.with_conn(|conn| insert_attachment(conn, message_id, attachment))
    }

    /// Resolve (or create) the server, channel and user behind a message, then
    /// append the message and its attachments. All-or-nothing.
    pub fn record_message(&self, observed: &ObservedMessage) -> Result<RecordedMessage> {
        self.with_tx(|conn| {
            let server_id = upsert_server(conn, &observed.guild_id, &observed.guild_name)?;
            let channel_id = upsert_channel(
                conn,
                server_id,
                &observed.channel_id,
                observed.channel_name.as_deref(),
            )?;
            let user_id = upsert_user(conn, &observed.author_id, observed.author_name.as_deref())?;
            let message_id =
                insert_message(conn, channel_id, user_id, &observed.content, observed.timestamp)?;

            for attachment in &observed.attachments {
                insert_attachment(conn, message_id, attachment)?;
            }

            Ok(RecordedMessage {
                server_id,
                channel_id,
                user_id,
                message_id,
                attachment_count: observed.attachments.len(),
            })
        })
    }

    /// Local id of a channel by its platform id, if it has been seen.
    pub fn find_channel(&self, discord_channel_id: &str) -> Result<Option<i64>> {
        self.with_conn(|conn| {
            let id = conn
                .query_row(
                    "SELECT id FROM channels WHERE discord_channel_id = ?1",
                    [discord_channel_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(id)
        })
    }

    /// Messages of one channel inside `range`, oldest first.
    pub fn messages_in_range(&self, channel_id: i64, range: &DateRange) -> Result<Vec<ChannelMessage>> {
        // Stored timestamps are whole seconds: round the start up, the end down.
        let start = range
            .start
            .map(|t| ceil_to_second(t).format(TIMESTAMP_FORMAT).to_string());
        let end = range.end.map(|t| t.format(TIMESTAMP_FORMAT).to_string());

        let rows = self.with_conn(|conn| query_messages_in_range(conn, channel_id, start, end))?;

        rows.into_iter()
            .map(|row| {
                let timestamp = parse_timestamp(&row.timestamp)?;
                Ok(ChannelMessage {
                    author: row.author_name,
                    content: row.content,
                    timestamp,
                })
            })
            .collect()
    }

    // -- Contribution snapshots --

    pub fn insert_user_contribution(&self, row: &NewUserContribution) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO user_contributions (repo_name, username, total_commits, lines_added, lines_deleted, date)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    row.repo_name,
                    row.username,
                    row.total_commits,
                    row.lines_added,
                    row.lines_deleted,
                    row.date,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn user_contributions(&self, username: &str) -> Result<Vec<UserContributionRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, repo_name, username, total_commits, lines_added, lines_deleted, date
                 FROM user_contributions
                 WHERE username = ?1
                 ORDER BY id",
            )?;
            let rows = stmt
                .query_map([username], |row| {
                    Ok(UserContributionRow {
                        id: row.get(0)?,
                        repo_name: row.get(1)?,
                        username: row.get(2)?,
                        total_commits: row.get(3)?,
                        lines_added: row.get(4)?,
                        lines_deleted: row.get(5)?,
                        date: row.get(6)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn counts(&self) -> Result<StoreCounts> {
        self.with_conn(|conn| {
            let count = |table: &str| -> Result<i64> {
                let n = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))?;
                Ok(n)
            };
            Ok(StoreCounts {
                servers: count("servers")?,
                channels: count("channels")?,
                users: count("users")?,
                messages: count("messages")?,
                attachments: count("attachments")?,
                user_contributions: count("user_contributions")?,
            })
        })
    }
}

// Each upsert is an insert-or-ignore against the natural-key unique index
// followed by a lookup, so a repeated key always yields the first row's id.

fn upsert_server(conn: &Connection, guild_id: &str, name: &str) -> Result<i64> {
    let inserted = conn.execute(
        "INSERT INTO servers (discord_guild_id, name) VALUES (?1, ?2)
         ON CONFLICT(discord_guild_id) DO NOTHING",
        (guild_id, name),
    )?;
    if inserted > 0 {
        debug!(guild_id, "Created server");
    }
    let id = conn.query_row(
        "SELECT id FROM servers WHERE discord_guild_id = ?1",
        [guild_id],
        |row| row.get(0),
    )?;
    Ok(id)
}

fn upsert_channel(
    conn: &Connection,
    server_id: i64,
    discord_channel_id: &str,
    name: Option<&str>,
) -> Result<i64> {
    let inserted = conn.execute(
        "INSERT INTO channels (server_id, discord_channel_id, name) VALUES (?1, ?2, ?3)
         ON CONFLICT(discord_channel_id) DO NOTHING",
        rusqlite::params![server_id, discord_channel_id, name],
    )?;
    if inserted > 0 {
        debug!(discord_channel_id, "Created channel");
    }
    let id = conn.query_row(
        "SELECT id FROM channels WHERE discord_channel_id = ?1",
        [discord_channel_id],
        |row| row.get(0),
    )?;
    Ok(id)
}

fn upsert_user(conn: &Connection, discord_user_id: &str, name: Option<&str>) -> Result<i64> {
    let inserted = conn.execute(
        "INSERT INTO users (discord_user_id, name) VALUES (?1, ?2)
         ON CONFLICT(discord_user_id) DO NOTHING",
        rusqlite::params![discord_user_id, name],
    )?;
    if inserted > 0 {
        debug!(discord_user_id, "Created user");
    }
    let id = conn.query_row(
        "SELECT id FROM users WHERE discord_user_id = ?1",
        [discord_user_id],
        |row| row.get(0),
    )?;
    Ok(id)
}

fn insert_message(
    conn: &Connection,
    channel_id: i64,
    user_id: i64,
    content: &str,
    timestamp: DateTime<Utc>,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO messages (channel_id, user_id, content, timestamp) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![
            channel_id,
            user_id,
            content,
            timestamp.format(TIMESTAMP_FORMAT).to_string()
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn insert_attachment(conn: &Connection, message_id: i64, a: &NewAttachment) -> Result<i64> {
    conn.execute(
        "INSERT INTO attachments (message_id, attachment_id, filename, url, content_type, size, height, width, description, ephemeral, duration)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        rusqlite::params![
            message_id,
            a.attachment_id,
            a.filename,
            a.url,
            a.content_type,
            a.size,
            a.height,
            a.width,
            a.description,
            a.ephemeral,
            a.duration,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn query_messages_in_range(
    conn: &Connection,
    channel_id: i64,
    start: Option<String>,
    end: Option<String>,
) -> Result<Vec<MessageRow>> {
    let mut stmt = conn.prepare(
        "SELECT m.content, m.timestamp, u.name
         FROM messages m
         LEFT JOIN users u ON m.user_id = u.id
         WHERE m.channel_id = ?1
           AND (?2 IS NULL OR m.timestamp >= ?2)
           AND (?3 IS NULL OR m.timestamp <= ?3)
         ORDER BY m.timestamp, m.id",
    )?;

    let rows = stmt
        .query_map(rusqlite::params![channel_id, start, end], |row| {
            Ok(MessageRow {
                content: row.get(0)?,
                timestamp: row.get(1)?,
                author_name: row
                    .get::<_, Option<String>>(2)?
                    .unwrap_or_else(|| "unknown".to_string()),
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn ceil_to_second(t: DateTime<Utc>) -> DateTime<Utc> {
    let nanos = t.timestamp_subsec_nanos();
    if nanos == 0 {
        return t;
    }
    t - Duration::nanoseconds(i64::from(nanos)) + Duration::seconds(1)
}

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone; they are UTC.
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map(|ndt| ndt.and_utc())
        .with_context(|| format!("Corrupt timestamp '{}'", raw))
}
