use anyhow::{Context, Result};
use avatar_core::{CoreConfig, ModelSlot, Outbound, Router};
use avatar_service::config::Config;
use avatar_service::headless::HeadlessFrontend;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::fmt::time::ChronoLocal;

/// Drives an avatar backend session without a screen, logging what the avatar would do.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Backend WebSocket endpoint, overrides AVATAR_WS_URL
    #[arg(long)]
    ws_url: Option<String>,

    /// Origin relative model URLs resolve against, overrides AVATAR_BASE_URL
    #[arg(long)]
    base_url: Option<String>,

    /// Read settings from this file instead of `.env` and the environment
    #[arg(long)]
    env_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    // --- 1. Load Configuration ---
    let config = match &args.env_file {
        Some(path) => Config::from_file(path),
        None => Config::from_env(),
    }
    .context("Failed to load application configuration")?
    .with_overrides(args.ws_url, args.base_url);

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .init();

    tracing::info!("Configuration loaded successfully. Starting avatar service...");

    // --- 3. Connect to the backend ---
    let transport_config = avatar_realtime::Config::builder()
        .with_ws_url(&config.ws_url)
        .with_base_url(&config.base_url)
        .build();
    let client =
        avatar_realtime::connect_with_config(avatar_realtime::DEFAULT_CHANNEL_CAPACITY, transport_config)
            .await
            .context("Failed to connect to the avatar backend")?;
    let events = client.server_events()?;
    let outbound: Arc<dyn Outbound> = Arc::new(client.sender()?);

    // --- 4. Wire the router ---
    let slot = ModelSlot::new();
    let frontend = HeadlessFrontend::new(slot.clone(), config.auto_start_mic);
    let core_config = CoreConfig::builder()
        .with_base_url(client.config().base_url())
        .with_playback_timeout(config.playback_timeout)
        .build();
    let router = Router::new(core_config, frontend.collaborators(outbound), slot);
    let watcher = router.spawn_completion_watcher();

    tokio::select! {
        _ = router.run(events) => {
            tracing::info!("Backend connection closed");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl-C, shutting down...");
            router.interrupt_controller().interrupt(false);
        }
    }
    watcher.abort();

    match client.stats() {
        Ok(stats) => match serde_json::to_string(&stats) {
            Ok(json) => tracing::info!("Transport stats: {}", json),
            Err(e) => tracing::warn!("Failed to serialize stats: {}", e),
        },
        Err(e) => tracing::warn!("Failed to read stats: {}", e),
    }
    tracing::info!("Shutting down...");
    Ok(())
}
