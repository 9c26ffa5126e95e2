//! melody-chat - Chat-driven playlist assistant
//!
//! Receives chat messages on `POST /`, gathers mood and genre, and answers
//! with a generated playlist plus a link to it in the music catalog.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use melody_chat::catalog::{AccountAuthorization, SpotifyClient};
use melody_chat::conversation::ConversationOrchestrator;
use melody_chat::generation::{LlmProxyClient, SamplingParams};
use melody_chat::pipeline::{PlaylistPublisher, TrackResolver};
use melody_chat::{build_router, AppState};
use melody_common::config::{default_config_file, LoggingConfig, TomlConfig, CONFIG_PATH_ENV};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Command-line arguments for melody-chat
#[derive(Parser, Debug)]
#[command(name = "melody-chat")]
#[command(about = "Chat-driven playlist assistant")]
#[command(version)]
struct Args {
    /// Path to config.toml
    #[arg(short, long, env = CONFIG_PATH_ENV)]
    config: Option<PathBuf>,

    /// Address to bind (overrides config file)
    #[arg(long, env = "MELODY_HOST")]
    host: Option<String>,

    /// Port to listen on (overrides config file)
    #[arg(short, long, env = "MELODY_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Credentials usually live in .env next to the binary
    let dotenv_path = dotenv::dotenv().ok();

    let args = Args::parse();

    let config_path = args.config.clone().or_else(default_config_file);
    let mut config = TomlConfig::load(config_path.as_deref())
        .context("Failed to load configuration")?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    init_tracing(&config.logging)?;

    info!(
        "Starting Melody chat (melody-chat) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    match &config_path {
        Some(path) => info!("Config file: {}", path.display()),
        None => warn!("No config file found, using built-in defaults and environment"),
    }
    if let Some(path) = dotenv_path {
        info!("Loaded environment from {}", path.display());
    }

    config.validate().context("Invalid configuration")?;

    let timeout = config.http_timeout();
    let generator = Arc::new(LlmProxyClient::new(
        config.generation.endpoint.clone().unwrap_or_default(),
        config.generation.api_key.clone().unwrap_or_default(),
        timeout,
    )?);

    let spotify = Arc::new(SpotifyClient::new(&config.catalog, timeout)?);
    let publisher = PlaylistPublisher::new(
        spotify.clone(),
        config.catalog.owner_user_id.clone().unwrap_or_default(),
        config.catalog.playlist_description.clone(),
    );
    info!(
        "Playlists will be created for catalog account '{}'",
        publisher.owner()
    );

    let orchestrator = Arc::new(ConversationOrchestrator::new(
        generator,
        SamplingParams::from(&config.generation),
        TrackResolver::new(spotify.clone()),
        publisher,
    ));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    if !spotify.is_authorized().await {
        warn!(
            "No owner refresh token configured; open http://{}/authorize to grant playlist access",
            addr
        );
    }

    let state = AppState::new(orchestrator, spotify);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("melody-chat listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing from the logging config
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},tower_http=info", logging.level)));

    match &logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down");
        },
    }
}
