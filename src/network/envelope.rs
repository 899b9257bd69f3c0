//! Envelope Messages
//!
//! JSON messages exchanged with the console. Binary game data travels as a
//! base64 `payload` inside `game_event` envelopes.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Envelope parsing errors.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// Not a valid JSON envelope.
    #[error("malformed envelope: {0}")]
    Json(#[from] serde_json::Error),

    /// Payload is not valid base64.
    #[error("malformed payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// One message from (or to) the console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Envelope {
    /// Handshake request, sent by us.
    ConnectRequest {
        /// Stream position to resume from, 0 for a fresh connection.
        cursor: u64,
    },

    /// Handshake acknowledgement.
    ConnectReply {
        /// Console nickname.
        #[serde(default)]
        nick: String,
        /// Console version.
        #[serde(default)]
        version: String,
        /// Stream position the console will send from.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cursor: Option<u64>,
    },

    /// A match started; primes the cursor for its first chunk.
    StartGame {
        /// Position of this message.
        #[serde(default)]
        cursor: u64,
        /// Where the first chunk of the match starts.
        #[serde(default)]
        next_cursor: u64,
    },

    /// One chunk of the binary event stream.
    GameEvent {
        /// Where this chunk starts.
        cursor: u64,
        /// Where the next chunk starts.
        next_cursor: u64,
        /// Base64-encoded chunk.
        payload: String,
    },

    /// The match ended.
    EndGame,

    /// Anything else; logged and ignored.
    #[serde(other)]
    Unknown,
}

impl Envelope {
    /// Build a `game_event` envelope around raw bytes.
    pub fn game_event(cursor: u64, next_cursor: u64, bytes: &[u8]) -> Self {
        Envelope::GameEvent {
            cursor,
            next_cursor,
            payload: STANDARD.encode(bytes),
        }
    }

    /// Deserialize from a JSON string. Trailing NULs sent by some console
    /// builds are ignored.
    pub fn from_json(s: &str) -> Result<Self, EnvelopeError> {
        Ok(serde_json::from_str(s.trim_end_matches('\0').trim())?)
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> Result<String, EnvelopeError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decoded binary chunk of a `game_event`.
    pub fn decode_payload(&self) -> Result<Option<Vec<u8>>, EnvelopeError> {
        match self {
            Envelope::GameEvent { payload, .. } => Ok(Some(STANDARD.decode(payload)?)),
            _ => Ok(None),
        }
    }

    /// Envelope name as it appears in the `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Envelope::ConnectRequest { .. } => "connect_request",
            Envelope::ConnectReply { .. } => "connect_reply",
            Envelope::StartGame { .. } => "start_game",
            Envelope::GameEvent { .. } => "game_event",
            Envelope::EndGame => "end_game",
            Envelope::Unknown => "unknown",
        }
    }
}
