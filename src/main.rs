//! Slippi Live
//!
//! Follows a WebSocket relay of the console stream (or replays a captured
//! envelope log) and logs decoded match events. The relay is a separate
//! bridge; the console's own ENet port is not supported.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::io::BufReader;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use slippi_live::{
    game::LiveEvent,
    network::{pump_lines, run_relay, ConnectionConfig, Processor},
    LiveSession, VERSION,
};

#[cfg(feature = "debug-tracing")]
const DEFAULT_LOG_LEVEL: &str = "trace";
#[cfg(not(feature = "debug-tracing"))]
const DEFAULT_LOG_LEVEL: &str = "info";

/// Live decoder for the console event stream.
///
/// Connects to a WebSocket relay that bridges the console's stream, not to the
/// console itself (the console speaks ENet on port 51441).
#[derive(Parser, Debug)]
#[command(
    name = "slippi-live",
    version,
    about = "Live decoder for a WebSocket relay of the console event stream"
)]
struct Args {
    /// WebSocket relay host (overrides SLIPPI_HOST)
    #[arg(long)]
    host: Option<String>,

    /// WebSocket relay port, default 51442 (overrides SLIPPI_PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Replay newline-delimited JSON envelopes from a file, or `-` for stdin
    #[arg(long)]
    input: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = DEFAULT_LOG_LEVEL)]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .context("invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Slippi Live v{}", VERSION);
    info!("Started at {}", chrono::Local::now().to_rfc3339());

    let mut config = ConnectionConfig::from_env();
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    let processor = Processor::spawn(LiveSession::new(), config.queue_capacity, config.event_capacity)
        .context("failed to start processing thread")?;
    let mut events = processor.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => log_event(&event),
                Err(RecvError::Lagged(skipped)) => warn!("Event log lagging, skipped {}", skipped),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let tx = processor.sender();
    match args.input {
        Some(path) if path.as_os_str() == "-" => {
            let forwarded = pump_lines(BufReader::new(tokio::io::stdin()), &tx).await?;
            info!("Replayed {} envelopes from stdin", forwarded);
        }
        Some(path) => {
            let file = tokio::fs::File::open(&path)
                .await
                .with_context(|| format!("failed to open {}", path.display()))?;
            let forwarded = pump_lines(BufReader::new(file), &tx).await?;
            info!("Replayed {} envelopes from {}", forwarded, path.display());
        }
        None => {
            let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
            let relay = tokio::spawn(run_relay(config, tx.clone(), shutdown_rx));

            tokio::signal::ctrl_c().await?;
            let _ = shutdown_tx.send(());
            relay.await??;
        }
    }

    drop(tx);
    tokio::task::spawn_blocking(move || processor.join()).await?;
    printer.await?;

    info!("Shutdown complete");
    Ok(())
}

fn log_event(event: &LiveEvent) {
    match event {
        LiveEvent::PlayerStat { .. } => match serde_json::to_string(event) {
            Ok(json) => debug!("{}", json),
            Err(e) => warn!("Failed to serialize event: {}", e),
        },
        LiveEvent::GameEnded { method, lras_player_index, placements } => info!(
            "Game ended: {:?}, quitter {}, placements {:?}",
            method, lras_player_index, placements
        ),
        other => info!("Event: {}", other.name()),
    }
}
