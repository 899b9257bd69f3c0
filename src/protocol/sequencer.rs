//! Frame Sequencer
//!
//! Admits stream chunks into the [`StreamCursor`] strictly in cursor order.
//! Every chunk is framed by `(start, next)`: `start` must equal the `next`
//! advertised by the previous chunk (or by the start-game envelope for the
//! first chunk of a match). Out-of-order chunks are rejected and dropped; the
//! stream stays where it was until a correctly sequenced chunk arrives.

use thiserror::Error;
use tracing::warn;

use crate::core::cursor::StreamCursor;

/// Sequencing failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError {
    /// Chunk does not start where the previous one ended.
    #[error("cursor mismatch: expected {expected}, got {actual}")]
    CursorMismatch {
        /// Start the sequencer was waiting for.
        expected: u64,
        /// Start the chunk carried.
        actual: u64,
    },
}

/// Cursor-ordered intake in front of the byte stream.
#[derive(Debug, Default, Clone)]
pub struct FrameSequencer {
    cursor: StreamCursor,
    /// Next chunk start we accept. `None` until a match primes it.
    expected: Option<u64>,
    /// Chunks accepted since the last reset.
    accepted: u64,
    /// Chunks rejected since the last reset.
    rejected: u64,
}

impl FrameSequencer {
    /// Sequencer with an empty stream and no cursor expectation.
    pub fn new() -> Self {
        Self::default()
    }

    /// The byte stream accepted chunks are appended to.
    pub fn cursor(&self) -> &StreamCursor {
        &self.cursor
    }

    /// Mutable access for the demultiplexer.
    pub fn cursor_mut(&mut self) -> &mut StreamCursor {
        &mut self.cursor
    }

    /// Next chunk start that will be accepted.
    pub fn expected(&self) -> Option<u64> {
        self.expected
    }

    /// Chunks accepted since the last reset.
    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    /// Chunks rejected since the last reset.
    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    /// Set the cursor the next chunk must start at.
    pub fn prime(&mut self, next: u64) {
        self.expected = Some(next);
    }

    /// Admit a chunk framed by `[start, next)`.
    ///
    /// When no expectation is set yet, the first chunk is accepted as-is and
    /// its cursor adopted.
    pub fn feed(&mut self, start: u64, next: u64, bytes: &[u8]) -> Result<(), SequenceError> {
        if let Some(expected) = self.expected {
            if start != expected {
                self.rejected += 1;
                warn!(
                    "Dropping chunk of {} bytes: cursor {} does not match expected {}",
                    bytes.len(),
                    start,
                    expected
                );
                return Err(SequenceError::CursorMismatch { expected, actual: start });
            }
        }

        self.cursor.append(bytes);
        self.expected = Some(next);
        self.accepted += 1;
        Ok(())
    }

    /// Drop buffered bytes and counters. The cursor expectation is kept so
    /// the next match continues where the stream left off.
    pub fn reset(&mut self) {
        self.cursor.reset();
        self.accepted = 0;
        self.rejected = 0;
    }

    /// Forget the cursor expectation (fresh connection).
    pub fn forget_cursor(&mut self) {
        self.expected = None;
    }
}
