use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (event store)");
        conn.execute_batch(
            "
            CREATE TABLE servers (
                id                  INTEGER PRIMARY KEY AUTOINCREMENT,
                discord_guild_id    TEXT NOT NULL UNIQUE,
                name                TEXT NOT NULL,
                created_at          TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE channels (
                id                  INTEGER PRIMARY KEY AUTOINCREMENT,
                server_id           INTEGER NOT NULL REFERENCES servers(id),
                discord_channel_id  TEXT NOT NULL UNIQUE,
                name                TEXT,
                created_at          TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE users (
                id                  INTEGER PRIMARY KEY AUTOINCREMENT,
                discord_user_id     TEXT NOT NULL UNIQUE,
                name                TEXT,
                created_at          TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE messages (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                channel_id  INTEGER NOT NULL REFERENCES channels(id),
                user_id     INTEGER NOT NULL REFERENCES users(id),
                content     TEXT NOT NULL,
                timestamp   TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_messages_channel_time
                ON messages(channel_id, timestamp);

            CREATE TABLE attachments (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                message_id      INTEGER NOT NULL REFERENCES messages(id),
                attachment_id   TEXT NOT NULL,
                filename        TEXT NOT NULL,
                url             TEXT NOT NULL,
                content_type    TEXT,
                size            INTEGER,
                height          INTEGER,
                width           INTEGER,
                description     TEXT,
                ephemeral       INTEGER,
                duration        REAL,
                created_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE user_contributions (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                repo_name       TEXT NOT NULL,
                username        TEXT NOT NULL,
                total_commits   INTEGER NOT NULL,
                lines_added     INTEGER NOT NULL,
                lines_deleted   INTEGER NOT NULL,
                date            TEXT NOT NULL DEFAULT (date('now'))
            );

            CREATE INDEX idx_user_contributions_user
                ON user_contributions(username, repo_name);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        run(&conn).unwrap();

        let version: i64 = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(version, 1);
        assert_eq!(rows, 1);
    }
}
