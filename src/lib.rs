//! # Slippi Live
//!
//! Live decoder for the console event stream: match metadata, per-frame
//! player state and technique statistics, reconstructed in real time from
//! base64 chunks inside JSON envelopes.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        SLIPPI LIVE                           │
//! ├──────────────────────────────────────────────────────────────┤
//! │  core/            - Byte-level primitives                    │
//! │  ├── cursor.rs    - In-order stream buffer                   │
//! │  ├── reader.rs    - Big-endian reads, DecodeError            │
//! │  └── text.rs      - Shift-JIS / UTF-8 fixed-width text       │
//! │                                                              │
//! │  protocol/        - Wire protocol                            │
//! │  ├── command.rs   - Command ids, payload size table          │
//! │  ├── sequencer.rs - Cursor-ordered chunk intake              │
//! │  ├── demux.rs     - Command state machine, split messages    │
//! │  └── records/     - Game start, pre/post frame, game end     │
//! │                                                              │
//! │  game/            - Match state and analytics                │
//! │  ├── state.rs     - Game and player information              │
//! │  ├── analyzer.rs  - L-cancel, ledge, falling, wavedash, mash │
//! │  ├── events.rs    - Change events                            │
//! │  └── lifecycle.rs - Connected / in-game state machine        │
//! │                                                              │
//! │  network/         - Boundary collaborators                   │
//! │  ├── envelope.rs  - JSON envelopes                           │
//! │  ├── worker.rs    - Processing thread                        │
//! │  └── connection.rs- Relay client, line replay                │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Threading
//!
//! Decoding is single-threaded and pull-based. One processing thread owns
//! the [`LiveSession`]; the I/O side only forwards envelopes to it and reads
//! events and snapshots back.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod network;
pub mod protocol;

// Re-export commonly used types
pub use crate::core::{DecodeError, StreamCursor, TextCodec};
pub use crate::game::{AnalyzerConfig, GameInformation, LiveEvent, LiveSession, SessionSnapshot, StatChange};
pub use crate::network::{ConnectionConfig, Envelope, Inbound, Processor};
pub use crate::protocol::{Command, CommandDemux, FrameSequencer, PayloadSizeTable, Record};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Player slots in a match
pub const NUM_PLAYERS: usize = 4;

/// Default port of the WebSocket relay.
///
/// The relay is a separate process that forwards the console's envelopes
/// over WebSocket. The console itself listens on 51441 with ENet, which this
/// crate does not speak, so the relay must not default to that port.
pub const DEFAULT_RELAY_PORT: u16 = 51442;
