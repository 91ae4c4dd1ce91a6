use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use contributrack_api::{AppStateInner, router};
use contributrack_db::Database;
use contributrack_github::{GithubAnalytics, GithubAppConfig, GithubClient};
use contributrack_llm::{LlmConfig, Summarizer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "contributrack=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let api_key = std::env::var("APP_API_KEY").unwrap_or_default();
    if api_key.trim().is_empty() || api_key == "change-me" {
        bail!("APP_API_KEY must be set to a non-placeholder value");
    }
    let db_path = std::env::var("CONTRIBUTRACK_DB_PATH").unwrap_or_else(|_| "contributrack.db".into());
    let host = std::env::var("CONTRIBUTRACK_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("CONTRIBUTRACK_PORT")
        .unwrap_or_else(|_| "8080".into())
        .parse()
        .context("CONTRIBUTRACK_PORT must be a port number")?;

    let github_config = GithubAppConfig::from_env()?;
    let llm_config = LlmConfig::from_env()?;

    // Init database
    let db = Arc::new(Database::open(&PathBuf::from(&db_path))?);

    // Integrations
    let client = GithubClient::new(github_config)?;
    let summarizer = Summarizer::new(llm_config.build()?);
    info!("Using model {}", summarizer.model_name());
    let analytics = GithubAnalytics::new(client, summarizer, db);

    let app = router(Arc::new(AppStateInner { api_key, analytics }))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("ContribuTrack server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
