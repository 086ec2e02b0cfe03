//! Headless front end for the lifesync Game of Life client.
//!
//! Reads one command per line from stdin (see [`lifesync_engine::intent`]
//! for the grammar), runs the sync engine against the configured server,
//! and logs every display snapshot through `tracing`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `lifesync.yaml` (or `LIFESYNC_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Build the HTTP transport and the engine
//! 4. Start the stdin, Ctrl-C, and display tasks
//! 5. Run the engine until `quit`, stdin EOF, or Ctrl-C

use std::path::PathBuf;

use anyhow::Context;
use lifesync_client::HttpTransport;
use lifesync_core::config::{LifesyncConfig, LoggingConfig};
use lifesync_engine::{EngineError, Intent, SyncEngine};
use lifesync_types::DisplaySnapshot;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};
use tracing::{info, trace, warn};
use tracing_subscriber::EnvFilter;

/// Intents buffered between the input tasks and the engine.
const INTENT_BUFFER: usize = 64;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, logging, or engine setup fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration. Logging is not up yet, so report where from
    //    once it is.
    let (config, source) = load_config()?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);
    info!(
        source = %source,
        base_url = config.server.base_url,
        columns = config.grid.columns,
        rows = config.grid.rows,
        mode = ?config.poll.mode,
        tick_ms = config.poll.tick_ms,
        "configuration loaded"
    );

    // 3. Build transport and engine.
    let transport = HttpTransport::from_config(&config.server).map_err(EngineError::from)?;
    let engine = SyncEngine::new(&config, transport)?;
    let display = engine.subscribe();

    // 4. Input and output tasks.
    let (intent_tx, intent_rx) = mpsc::channel(INTENT_BUFFER);
    tokio::spawn(read_commands(intent_tx.clone()));
    tokio::spawn(forward_ctrl_c(intent_tx));
    tokio::spawn(log_display(display));

    // 5. Run.
    let summary = tokio::spawn(engine.run(intent_rx))
        .await
        .context("sync engine task failed")?;

    info!(
        reason = ?summary.reason,
        ticks = summary.ticks,
        dispatched = summary.dispatched,
        resolved = summary.resolved,
        failed = summary.failed,
        pending = summary.pending,
        population = summary.final_view.population(),
        "lifesync shutdown complete"
    );
    Ok(())
}

/// Load configuration from `LIFESYNC_CONFIG` or `lifesync.yaml`.
///
/// A missing file is not an error: defaults are used, with environment
/// overrides still applied.
fn load_config() -> Result<(LifesyncConfig, String), EngineError> {
    let path = std::env::var_os("LIFESYNC_CONFIG")
        .map_or_else(|| PathBuf::from("lifesync.yaml"), PathBuf::from);
    if path.exists() {
        let config = LifesyncConfig::from_file(&path)?;
        Ok((config, path.display().to_string()))
    } else {
        let mut config = LifesyncConfig::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok((config, "defaults".to_owned()))
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Parse stdin lines into intents. EOF shuts the engine down.
async fn read_commands(intents: mpsc::Sender<Intent>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "failed to read stdin");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<Intent>() {
            Ok(intent) => {
                if intents.send(intent).await.is_err() {
                    return;
                }
            }
            Err(e) => warn!(input = line, error = %e, "ignoring command"),
        }
    }
    info!("stdin closed, shutting down");
    let _ = intents.send(Intent::Shutdown).await;
}

/// Turn Ctrl-C into a shutdown intent.
async fn forward_ctrl_c(intents: mpsc::Sender<Intent>) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("interrupt received, shutting down");
            let _ = intents.send(Intent::Shutdown).await;
        }
        Err(e) => warn!(error = %e, "failed to listen for Ctrl-C"),
    }
}

/// Log each display snapshot: a one-line summary at info when something
/// user-visible changed, the full snapshot as JSON at trace.
async fn log_display(mut display: watch::Receiver<DisplaySnapshot>) {
    let mut last_line = None;
    while display.changed().await.is_ok() {
        let view = display.borrow_and_update().clone();
        let line = (
            view.population(),
            view.run_state,
            view.last_error.clone(),
            view.last_status.clone(),
            view.last_meta.as_ref().and_then(|meta| meta.block),
        );
        if last_line.as_ref() != Some(&line) {
            info!(
                population = line.0,
                run_state = line.1.as_str(),
                last_error = ?line.2,
                last_status = ?line.3,
                block = ?line.4,
                pending = view.pending_requests,
                next_sync_in = view.countdown_secs,
                "display updated"
            );
            last_line = Some(line);
        }
        if let Ok(json) = serde_json::to_string(&view) {
            trace!(snapshot = json, "display snapshot");
        }
    }
}
