//! Connection Collaborators
//!
//! Sources of envelopes for the processing thread:
//! - [`pump_lines`] replays newline-delimited JSON (capture files, stdin).
//! - [`run_relay`] follows a WebSocket relay of the console stream and
//!   reconnects whenever it drops. Only one connection attempt is in flight
//!   at a time.
//!
//! The relay is not the console. The console serves its stream over ENet on
//! port 51441; a relay process has to bridge it to WebSocket first.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use crate::network::envelope::{Envelope, EnvelopeError};
use crate::network::worker::Inbound;
use crate::DEFAULT_RELAY_PORT;

/// Connection errors.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// WebSocket transport failure.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Input read failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Envelope could not be encoded.
    #[error("Envelope error: {0}")]
    Envelope(#[from] EnvelopeError),

    /// Relay did not answer in time.
    #[error("Connect timed out after {0:?}")]
    Timeout(Duration),

    /// Processing thread is gone.
    #[error("Processing queue closed")]
    ChannelClosed,
}

/// Connection configuration for the WebSocket relay.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Relay host.
    pub host: String,
    /// Relay port (never the console's ENet port 51441).
    pub port: u16,
    /// Time allowed for one connection attempt.
    pub connect_timeout: Duration,
    /// Pause between a dropped connection and the next attempt.
    pub reconnect_delay: Duration,
    /// Capacity of the envelope queue to the processing thread.
    pub queue_capacity: usize,
    /// Capacity of the live event broadcast.
    pub event_capacity: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_RELAY_PORT,
            connect_timeout: Duration::from_secs(5),
            reconnect_delay: Duration::from_secs(1),
            queue_capacity: 256,
            event_capacity: 1024,
        }
    }
}

impl ConnectionConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("SLIPPI_HOST").unwrap_or(defaults.host),
            port: std::env::var("SLIPPI_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            connect_timeout: std::env::var("SLIPPI_CONNECT_TIMEOUT_MS")
                .ok()
                .and_then(|ms| ms.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.connect_timeout),
            ..defaults
        }
    }

    /// WebSocket URL of the relay.
    pub fn url(&self) -> String {
        format!("ws://{}:{}", self.host, self.port)
    }
}

/// Forward newline-delimited JSON envelopes until end of input.
///
/// Malformed lines are logged and skipped. Returns the number of envelopes
/// forwarded.
pub async fn pump_lines<R>(reader: R, tx: &mpsc::Sender<Inbound>) -> Result<usize, ConnectionError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut forwarded = 0;
    let mut line_number = 0;

    while let Some(line) = lines.next_line().await? {
        line_number += 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match Envelope::from_json(line) {
            Ok(envelope) => {
                tx.send(Inbound::Envelope(envelope))
                    .await
                    .map_err(|_| ConnectionError::ChannelClosed)?;
                forwarded += 1;
            }
            Err(e) => warn!("Skipping line {}: {}", line_number, e),
        }
    }

    debug!("Input exhausted after {} lines", line_number);
    Ok(forwarded)
}

/// Follow the relay until `shutdown` fires or the processing queue closes.
///
/// Every lost connection is reported to the processor as
/// [`Inbound::Disconnect`] before the next attempt.
pub async fn run_relay(
    config: ConnectionConfig,
    tx: mpsc::Sender<Inbound>,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), ConnectionError> {
    loop {
        tokio::select! {
            result = connect_once(&config, &tx) => match result {
                Ok(()) => info!("Relay closed the connection"),
                Err(ConnectionError::ChannelClosed) => return Err(ConnectionError::ChannelClosed),
                Err(e) => warn!("Relay connection failed: {}", e),
            },
            _ = shutdown.recv() => {
                info!("Shutdown signal received");
                return Ok(());
            }
        }

        tx.send(Inbound::Disconnect)
            .await
            .map_err(|_| ConnectionError::ChannelClosed)?;

        tokio::select! {
            _ = tokio::time::sleep(config.reconnect_delay) => {}
            _ = shutdown.recv() => {
                info!("Shutdown signal received");
                return Ok(());
            }
        }
    }
}

/// One connection: handshake, then forward frames until the relay closes.
async fn connect_once(
    config: &ConnectionConfig,
    tx: &mpsc::Sender<Inbound>,
) -> Result<(), ConnectionError> {
    let url = config.url();
    info!("Connecting to {}", url);

    let (ws_stream, _) = tokio::time::timeout(config.connect_timeout, connect_async(url.as_str()))
        .await
        .map_err(|_| ConnectionError::Timeout(config.connect_timeout))??;
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let request = Envelope::ConnectRequest { cursor: 0 }.to_json()?;
    ws_sender.send(Message::Text(request)).await?;

    while let Some(msg) = ws_receiver.next().await {
        let text = match msg? {
            Message::Text(text) => text,
            Message::Binary(data) => match String::from_utf8(data) {
                Ok(text) => text,
                Err(_) => {
                    debug!("Ignoring non-UTF-8 binary frame");
                    continue;
                }
            },
            Message::Close(_) => break,
            _ => continue,
        };

        match Envelope::from_json(&text) {
            Ok(envelope) => tx
                .send(Inbound::Envelope(envelope))
                .await
                .map_err(|_| ConnectionError::ChannelClosed)?,
            Err(e) => debug!("Invalid envelope from relay: {}", e),
        }
    }

    Ok(())
}
