//! Serenity event handler that records every guild message.

use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use serenity::all::{Attachment, Channel, ChannelId, GatewayIntents, GuildId, Message, Ready, UserId};
use serenity::async_trait;
use serenity::client::{Context, EventHandler};
use tracing::{debug, error, info, warn};

use contributrack_db::Database;
use contributrack_db::models::{NewAttachment, ObservedMessage};

pub struct Recorder {
    db: Arc<Database>,
    bot_id: OnceLock<UserId>,
}

impl Recorder {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            bot_id: OnceLock::new(),
        }
    }

    pub fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT
    }
}

#[async_trait]
impl EventHandler for Recorder {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        let _ = self.bot_id.set(ready.user.id);
        info!("Logged in as {} ({} guilds)", ready.user.name, ready.guilds.len());
    }

    async fn message(&self, ctx: Context, msg: Message) {
        let Some(guild_id) = target_guild(self.bot_id.get().copied(), msg.author.id, msg.guild_id) else {
            debug!(author = %msg.author.name, "Skipping own or direct message");
            return;
        };

        let channel_name = match msg.channel_id.to_channel(&ctx).await {
            Ok(Channel::Guild(channel)) => Some(channel.name),
            Ok(_) => None,
            Err(e) => {
                warn!(channel_id = %msg.channel_id, "Could not resolve channel name: {}", e);
                None
            }
        };

        let observed = observed_message(
            guild_id,
            msg.channel_id,
            channel_name,
            (msg.author.id, &msg.author.name),
            &msg.content,
            msg.timestamp.unix_timestamp(),
            msg.attachments.iter().map(attachment_row).collect(),
        );

        let db = self.db.clone();
        match tokio::task::spawn_blocking(move || db.record_message(&observed)).await {
            Ok(Ok(recorded)) => debug!(
                message_id = recorded.message_id,
                attachments = recorded.attachment_count,
                "Recorded message"
            ),
            Ok(Err(e)) => error!(message = %msg.id, "Failed to record message: {:#}", e),
            Err(e) => error!("spawn_blocking join error: {}", e),
        }
    }
}

/// Guild a message should be recorded under. `None` for the bot's own
/// messages and for direct messages.
pub(crate) fn target_guild(
    bot_id: Option<UserId>,
    author: UserId,
    guild: Option<GuildId>,
) -> Option<GuildId> {
    if bot_id == Some(author) {
        return None;
    }
    guild
}

pub(crate) fn observed_message(
    guild_id: GuildId,
    channel_id: ChannelId,
    channel_name: Option<String>,
    (author_id, author_name): (UserId, &str),
    content: &str,
    unix_secs: i64,
    attachments: Vec<NewAttachment>,
) -> ObservedMessage {
    ObservedMessage {
        guild_id: guild_id.get().to_string(),
        guild_name: server_name(guild_id.get()),
        channel_id: channel_id.get().to_string(),
        channel_name,
        author_id: author_id.get().to_string(),
        author_name: Some(author_name.to_string()),
        content: content.to_string(),
        timestamp: message_time(unix_secs),
        attachments,
    }
}

/// Display name stored for a guild the first time it is seen.
pub fn server_name(guild_id: u64) -> String {
    format!("server-{}", guild_id)
}

fn message_time(unix_secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(unix_secs, 0).unwrap_or_else(Utc::now)
}

fn attachment_row(a: &Attachment) -> NewAttachment {
    NewAttachment {
        attachment_id: a.id.get().to_string(),
        filename: a.filename.clone(),
        url: a.url.clone(),
        content_type: a.content_type.clone(),
        size: Some(i64::from(a.size)),
        height: a.height.map(i64::from),
        width: a.width.map(i64::from),
        description: a.description.clone(),
        ephemeral: Some(a.ephemeral),
        duration: a.duration_secs,
    }
}
