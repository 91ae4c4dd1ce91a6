mod analyze;
mod handler;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use serenity::Client;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use contributrack_db::Database;
use contributrack_jira::{JiraClient, JiraConfig};
use contributrack_llm::{LlmConfig, Summarizer};
use contributrack_types::DateRange;

use crate::handler::Recorder;

#[derive(Parser)]
#[command(name = "contributrack-discord", version, about = "Discord recorder and channel analysis")]
struct Cli {
    /// SQLite store shared with the HTTP server.
    #[arg(long, env = "CONTRIBUTRACK_DB_PATH", default_value = "contributrack.db", global = true)]
    db: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Connect to Discord and record every guild message.
    Run {
        #[arg(long, env = "DISCORD_API_KEY", hide_env_values = true)]
        token: String,
        /// Directory for the daily-rolling `discord.log`.
        #[arg(long, default_value = "logs")]
        log_dir: PathBuf,
    },
    /// Summarize a recorded channel and file its action items in Jira.
    Analyze(AnalyzeArgs),
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Local channel id.
    #[arg(long, required_unless_present = "discord_channel", conflicts_with = "discord_channel")]
    channel: Option<i64>,
    /// Discord snowflake of the channel, resolved through the store.
    #[arg(long)]
    discord_channel: Option<String>,
    #[arg(long)]
    start: Option<String>,
    #[arg(long)]
    end: Option<String>,
    /// Print the analysis without creating Jira issues.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    match cli.command {
        Command::Run { token, log_dir } => {
            let _guard = init_logging(Some(&log_dir));
            let db = Arc::new(Database::open(&cli.db)?);
            run_bot(&token, db).await
        }
        Command::Analyze(args) => {
            let _guard = init_logging(None);
            let db = Arc::new(Database::open(&cli.db)?);
            run_analysis(args, db).await
        }
    }
}

/// Console logging, plus a daily-rolling file when `log_dir` is given. The
/// returned guard flushes the file writer on drop.
fn init_logging(log_dir: Option<&PathBuf>) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "contributrack=debug,serenity=warn".into());

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "discord.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    guard
}

async fn run_bot(token: &str, db: Arc<Database>) -> anyhow::Result<()> {
    if token.trim().is_empty() {
        bail!("DISCORD_API_KEY is empty");
    }

    let intents = Recorder::intents();
    info!("Building Discord client with intents: {:?}", intents);
    let mut client = Client::builder(token, intents)
        .event_handler(Recorder::new(db))
        .await
        .context("failed to build Discord client")?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down...");
            shard_manager.shutdown_all().await;
        }
    });

    client.start().await.context("Discord client error")?;
    Ok(())
}

async fn run_analysis(args: AnalyzeArgs, db: Arc<Database>) -> anyhow::Result<()> {
    let range = DateRange::parse(args.start.as_deref(), args.end.as_deref())?;

    let channel_id = match (args.channel, args.discord_channel) {
        (Some(id), _) => id,
        (None, Some(snowflake)) => {
            let lookup_db = db.clone();
            let lookup = snowflake.clone();
            tokio::task::spawn_blocking(move || lookup_db.find_channel(&lookup))
                .await
                .context("spawn_blocking failed")??
                .with_context(|| format!("channel {} has never been recorded", snowflake))?
        }
        (None, None) => bail!("either --channel or --discord-channel is required"),
    };

    let summarizer = Summarizer::new(LlmConfig::from_env()?.build()?);
    let jira = if args.dry_run {
        None
    } else {
        match JiraConfig::from_env() {
            Ok(config) => Some(JiraClient::new(config)?),
            Err(e) => {
                warn!("Jira not configured, action items will not be filed: {}", e);
                None
            }
        }
    };

    info!(
        channel_id,
        period = %range.describe(),
        model = summarizer.model_name(),
        "Analyzing channel"
    );
    let outcome = analyze::analyze_channel(db, channel_id, range, &summarizer, jira.as_ref()).await?;

    match &outcome.analysis {
        Some(analysis) => println!("{}", serde_json::to_string_pretty(analysis)?),
        None => println!("No messages in channel {} for {}", channel_id, range.describe()),
    }
    for key in &outcome.created_issues {
        info!("Created {}", key);
    }
    Ok(())
}
