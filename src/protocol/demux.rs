//! Command Demultiplexer
//!
//! Pull-based state machine over the [`StreamCursor`]:
//!
//! ```text
//! AwaitingCommand ──read id──▶ AwaitingPayload(id, len) ──len bytes buffered──▶ dispatch
//!        ▲                                                                         │
//!        └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each call to [`CommandDemux::step`] makes at most one command's worth of
//! progress. Callers loop until [`Step::Waiting`], which is the backpressure
//! point: more bytes must arrive from the sequencer first.

use tracing::{debug, trace, warn};

use crate::core::cursor::StreamCursor;
use crate::core::reader::DecodeError;
use crate::core::text::TextCodec;
use crate::protocol::command::{Command, PayloadSizeTable, SPLIT_TRAILER_LEN};
use crate::protocol::records::{GameEnd, GameStart, PostFrameData, PreFrameData, Record};

/// Outcome of one demultiplexer step.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// No progress: the pending command is not fully buffered yet, or an
    /// unrecognised command was drained.
    Waiting,
    /// A command (or split fragment) was consumed. Carries the decoded record
    /// when the command has analytics value.
    Consumed(Option<Record>),
    /// A command was consumed but its payload did not decode. The stream
    /// position has still advanced past it.
    Failed {
        /// Id the payload was dispatched under.
        command: u8,
        /// Decode failure.
        error: DecodeError,
    },
}

/// Splits the byte stream into commands and dispatches them to decoders.
#[derive(Debug, Clone)]
pub struct CommandDemux {
    sizes: PayloadSizeTable,
    codec: TextCodec,
    /// Command id read but whose payload is not consumed yet.
    pending: Option<u8>,
    /// Payload being assembled (split-message fragments accumulate here).
    accumulated: Vec<u8>,
}

impl CommandDemux {
    /// Demultiplexer with default payload sizes and the legacy text codec.
    pub fn new() -> Self {
        Self::with_codec(TextCodec::legacy())
    }

    /// Demultiplexer with a specific text codec.
    pub fn with_codec(codec: TextCodec) -> Self {
        Self {
            sizes: PayloadSizeTable::with_defaults(),
            codec,
            pending: None,
            accumulated: Vec::new(),
        }
    }

    /// Current payload size table.
    pub fn sizes(&self) -> &PayloadSizeTable {
        &self.sizes
    }

    /// Command id waiting for its payload, if any.
    pub fn pending(&self) -> Option<u8> {
        self.pending
    }

    /// Whether a split message is partially assembled.
    pub fn is_mid_fragment(&self) -> bool {
        !self.accumulated.is_empty()
    }

    /// Forget the pending command and any partial split message.
    pub fn reset(&mut self) {
        self.pending = None;
        self.accumulated.clear();
    }

    /// Reset and restore the default size table (fresh connection).
    pub fn reset_session(&mut self) {
        self.reset();
        self.sizes = PayloadSizeTable::with_defaults();
    }

    /// Make progress on at most one command.
    pub fn step(&mut self, cursor: &mut StreamCursor) -> Step {
        let id = match self.pending {
            Some(id) => id,
            None => match cursor.read_u8() {
                Ok(id) => {
                    self.pending = Some(id);
                    id
                }
                Err(_) => return Step::Waiting,
            },
        };

        if id == Command::MessageSizes.id() {
            return self.step_message_sizes(cursor);
        }

        let Some(declared) = self.sizes.get(id) else {
            self.drain_unknown(id, cursor);
            return Step::Waiting;
        };

        if cursor.available() < declared {
            trace!(
                "Command 0x{:02x} needs {} bytes, only {} received yet",
                id,
                declared,
                cursor.available()
            );
            return Step::Waiting;
        }

        let payload = match cursor.read_bytes(declared) {
            Ok(payload) => payload,
            Err(_) => return Step::Waiting,
        };
        self.pending = None;

        if id != Command::SplitMessage.id() {
            self.accumulated.extend_from_slice(payload);
            return self.dispatch(id);
        }

        if declared < SPLIT_TRAILER_LEN {
            self.accumulated.clear();
            return Step::Failed {
                command: id,
                error: DecodeError::Truncated {
                    command: id,
                    needed: SPLIT_TRAILER_LEN,
                    actual: declared,
                },
            };
        }

        let (chunk, trailer) = payload.split_at(declared - SPLIT_TRAILER_LEN);
        let inner = trailer[0];
        let total_size = u16::from_be_bytes([trailer[1], trailer[2]]);
        let is_last = trailer[3] != 0;
        self.accumulated.extend_from_slice(chunk);

        trace!(
            "Split message fragment for 0x{:02x}: {} bytes (size field {}), last: {}",
            inner,
            chunk.len(),
            total_size,
            is_last
        );

        if is_last {
            self.dispatch(inner)
        } else {
            Step::Consumed(None)
        }
    }

    /// The size announcement carries its own length byte.
    fn step_message_sizes(&mut self, cursor: &mut StreamCursor) -> Step {
        let Some(len) = cursor.peek(0).map(usize::from) else {
            return Step::Waiting;
        };
        let needed = len.max(1);
        if cursor.available() < needed {
            trace!("Payload size event needs {} bytes, only {} received yet", needed, cursor.available());
            return Step::Waiting;
        }

        self.pending = None;
        match cursor.read_bytes(needed) {
            Ok(payload) => self.accumulated.extend_from_slice(payload),
            Err(_) => return Step::Waiting,
        }
        self.dispatch(Command::MessageSizes.id())
    }

    fn drain_unknown(&mut self, id: u8, cursor: &mut StreamCursor) {
        let available = cursor.available();
        if let Ok(bytes) = cursor.read_bytes(available) {
            debug!("Skip unknown command 0x{:02x} with payload size {}", id, available);
            trace!("Skipped bytes: {}", hex::encode(&bytes[..bytes.len().min(64)]));
        }
        self.pending = None;
    }

    /// Decode the accumulated payload as command `id` and clear it.
    fn dispatch(&mut self, id: u8) -> Step {
        let payload = std::mem::take(&mut self.accumulated);

        let decoded = match Command::from_id(id) {
            Some(Command::GameStart) => GameStart::decode(&payload, &self.codec)
                .map(|start| Some(Record::GameStart(Box::new(start)))),
            Some(Command::PreFrame) => {
                PreFrameData::decode(&payload).map(|pre| Some(Record::PreFrame(Box::new(pre))))
            }
            Some(Command::PostFrame) => {
                PostFrameData::decode(&payload).map(|post| Some(Record::PostFrame(Box::new(post))))
            }
            Some(Command::GameEnd) => GameEnd::decode(&payload).map(|end| Some(Record::GameEnd(end))),
            Some(Command::MessageSizes) => {
                // First byte is the length byte.
                let body = payload.get(1..).unwrap_or_default();
                self.sizes.apply_announcement(body).map(|applied| {
                    debug!("Applied {} payload sizes", applied);
                    None
                })
            }
            Some(Command::SplitMessage) => {
                warn!("Split message wraps another split message, ignoring");
                Ok(None)
            }
            Some(
                Command::FrameStart
                | Command::ItemUpdate
                | Command::FrameBookend
                | Command::GeckoList,
            ) => Ok(None),
            None => {
                warn!("Command 0x{:02x} not implemented", id);
                Ok(None)
            }
        };

        // Keep the allocation for the next command.
        self.accumulated = payload;
        self.accumulated.clear();

        match decoded {
            Ok(record) => Step::Consumed(record),
            Err(error) => Step::Failed { command: id, error },
        }
    }
}

impl Default for CommandDemux {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::testutil::{
        command, size_announcement, split_message, GameStartBuilder, PostFrameBuilder,
        PreFrameBuilder,
    };
    use proptest::prelude::*;

    /// Step until the demux reports `Waiting`, collecting non-waiting steps.
    fn drain(demux: &mut CommandDemux, cursor: &mut StreamCursor) -> Vec<Step> {
        let mut steps = Vec::new();
        loop {
            match demux.step(cursor) {
                Step::Waiting => return steps,
                step => steps.push(step),
            }
        }
    }

    fn records(steps: Vec<Step>) -> Vec<Record> {
        steps
            .into_iter()
            .filter_map(|s| match s {
                Step::Consumed(Some(r)) => Some(r),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_multiple_commands_in_one_chunk() {
        let mut demux = CommandDemux::new();
        let mut cursor = StreamCursor::new();

        let mut bytes = command(0x37, &PreFrameBuilder::new(1, 0).build());
        bytes.extend(command(0x38, &PostFrameBuilder::new(1, 0).build()));
        bytes.extend(command(0x3C, &[0u8; 8]));
        cursor.append(&bytes);

        let steps = drain(&mut demux, &mut cursor);
        assert_eq!(steps.len(), 3);
        assert!(matches!(steps[0], Step::Consumed(Some(Record::PreFrame(_)))));
        assert!(matches!(steps[1], Step::Consumed(Some(Record::PostFrame(_)))));
        assert_eq!(steps[2], Step::Consumed(None));
        assert_eq!(cursor.available(), 0);
        assert_eq!(demux.pending(), None);
    }

    #[test]
    fn test_starvation_then_resume() {
        let mut demux = CommandDemux::new();
        let mut cursor = StreamCursor::new();
        let bytes = command(0x39, &[0x02, 0xFF, 0, 1, 0xFF, 0xFF]);

        cursor.append(&bytes[..3]);
        assert_eq!(demux.step(&mut cursor), Step::Waiting);
        assert_eq!(demux.pending(), Some(0x39));
        assert_eq!(cursor.available(), 2);

        cursor.append(&bytes[3..]);
        let steps = drain(&mut demux, &mut cursor);
        assert!(matches!(steps.as_slice(), [Step::Consumed(Some(Record::GameEnd(_)))]));
    }

    #[test]
    fn test_size_announcement_applies_before_dispatch() {
        let mut demux = CommandDemux::new();
        let mut cursor = StreamCursor::new();

        // Shrink the frame bookend to 4 bytes.
        let mut bytes = size_announcement(&[(0x36, 760), (0x3C, 4)]);
        bytes.extend(command(0x3C, &[1, 2, 3, 4]));
        bytes.extend(command(0x3C, &[5, 6, 7, 8]));
        cursor.append(&bytes);

        let steps = drain(&mut demux, &mut cursor);
        assert_eq!(steps, vec![Step::Consumed(None); 3]);
        assert_eq!(demux.sizes().get(0x3C), Some(4));
        assert!(demux.sizes().is_announced());
    }

    #[test]
    fn test_size_announcement_split_across_chunks() {
        let mut demux = CommandDemux::new();
        let mut cursor = StreamCursor::new();
        let bytes = size_announcement(&[(0x37, 64), (0x38, 80), (0x39, 6)]);

        cursor.append(&bytes[..4]);
        assert_eq!(demux.step(&mut cursor), Step::Waiting);
        cursor.append(&bytes[4..]);
        assert_eq!(demux.step(&mut cursor), Step::Consumed(None));
        assert_eq!(demux.sizes().get(0x38), Some(80));
        assert_eq!(cursor.available(), 0);
    }

    #[test]
    fn test_unknown_command_drains_buffer() {
        let mut demux = CommandDemux::new();
        let mut cursor = StreamCursor::new();
        cursor.append(&[0x45, 1, 2, 3, 4, 5]);

        assert_eq!(demux.step(&mut cursor), Step::Waiting);
        assert_eq!(cursor.available(), 0);
        assert_eq!(demux.pending(), None);

        // The stream keeps working afterwards.
        cursor.append(&command(0x3C, &[0u8; 8]));
        assert_eq!(demux.step(&mut cursor), Step::Consumed(None));
    }

    #[test]
    fn test_split_message_reassembles_game_start() {
        let payload = GameStartBuilder::new().seed(77).player(0, 9, 0).build();

        let mut direct = CommandDemux::new();
        let mut cursor = StreamCursor::new();
        cursor.append(&command(0x36, &payload));
        let expected = records(drain(&mut direct, &mut cursor));

        let mut demux = CommandDemux::new();
        let mut cursor = StreamCursor::new();
        let fragments = split_message(0x36, &payload, 512);
        assert_eq!(fragments.len(), 2);

        cursor.append(&fragments[0]);
        assert_eq!(drain(&mut demux, &mut cursor), vec![Step::Consumed(None)]);
        assert!(demux.is_mid_fragment());

        cursor.append(&fragments[1]);
        let assembled = records(drain(&mut demux, &mut cursor));
        assert_eq!(assembled, expected);
        assert!(!demux.is_mid_fragment());
    }

    #[test]
    fn test_decode_failure_still_advances() {
        let mut demux = CommandDemux::new();
        let mut cursor = StreamCursor::new();

        // Announce a pre-frame size too small for the layout.
        let mut bytes = size_announcement(&[(0x37, 10)]);
        bytes.extend(command(0x37, &[0u8; 10]));
        bytes.extend(command(0x3C, &[0u8; 8]));
        cursor.append(&bytes);

        let steps = drain(&mut demux, &mut cursor);
        assert_eq!(steps.len(), 3);
        assert!(matches!(
            steps[1],
            Step::Failed { command: 0x37, error: DecodeError::Truncated { .. } }
        ));
        assert_eq!(steps[2], Step::Consumed(None));
    }

    #[test]
    fn test_reset_session_restores_defaults() {
        let mut demux = CommandDemux::new();
        let mut cursor = StreamCursor::new();
        cursor.append(&size_announcement(&[(0x37, 10)]));
        drain(&mut demux, &mut cursor);
        assert_eq!(demux.sizes().get(0x37), Some(10));

        cursor.append(&[0x36]);
        demux.step(&mut cursor);
        assert_eq!(demux.pending(), Some(0x36));

        demux.reset_session();
        assert_eq!(demux.pending(), None);
        assert_eq!(demux.sizes().get(0x37), Some(64));
        assert!(!demux.sizes().is_announced());
    }

    proptest! {
        #[test]
        fn prop_fragmented_payload_decodes_identically(
            chunk in 8usize..400,
            seed in any::<u32>(),
            character in 0u8..26,
            split_at in 1usize..64,
        ) {
            let payload = GameStartBuilder::new()
                .seed(seed)
                .player(1, character, 0)
                .build();

            let mut cursor = StreamCursor::new();
            let mut direct = CommandDemux::new();
            cursor.append(&command(0x36, &payload));
            let expected = records(drain(&mut direct, &mut cursor));
            prop_assert_eq!(expected.len(), 1);

            let mut bytes = size_announcement(&[(0x10, (chunk + SPLIT_TRAILER_LEN) as u16)]);
            for fragment in split_message(0x36, &payload, chunk) {
                bytes.extend(fragment);
            }

            // Deliver the wire bytes in arbitrary pieces.
            let mut demux = CommandDemux::new();
            let mut cursor = StreamCursor::new();
            let mut decoded = Vec::new();
            for piece in bytes.chunks(split_at) {
                cursor.append(piece);
                decoded.extend(records(drain(&mut demux, &mut cursor)));
            }

            prop_assert_eq!(decoded, expected);
            prop_assert_eq!(cursor.available(), 0);
        }
    }
}
