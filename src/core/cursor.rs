//! Stream Cursor
//!
//! In-order byte buffer assembled from stream chunks. Chunks are appended at
//! the back, commands are read from the front. The number of buffered but
//! unread bytes ("available bytes") is always `buffer.len() - position`.

use crate::core::reader::{DecodeError, DecodeResult};

/// Consumed bytes kept before the buffer is compacted.
const COMPACT_THRESHOLD: usize = 64 * 1024;

/// Append-only byte buffer with a read offset.
#[derive(Debug, Default, Clone)]
pub struct StreamCursor {
    buffer: Vec<u8>,
    position: usize,
    /// Bytes consumed since the last reset (survives compaction).
    consumed: u64,
}

impl StreamCursor {
    /// Create an empty cursor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk at the back of the stream.
    pub fn append(&mut self, bytes: &[u8]) {
        self.compact();
        self.buffer.extend_from_slice(bytes);
    }

    /// Buffered bytes not yet read.
    #[inline]
    pub fn available(&self) -> usize {
        self.buffer.len() - self.position
    }

    /// Total bytes read since the last reset.
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Look at an unread byte without consuming it.
    pub fn peek(&self, offset: usize) -> Option<u8> {
        self.buffer.get(self.position + offset).copied()
    }

    /// Read one unsigned byte.
    pub fn read_u8(&mut self) -> DecodeResult<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    /// Read one signed byte.
    pub fn read_i8(&mut self) -> DecodeResult<i8> {
        Ok(self.read_u8()? as i8)
    }

    /// Read a big-endian `u16`.
    pub fn read_u16(&mut self) -> DecodeResult<u16> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Read exactly `len` bytes.
    pub fn read_bytes(&mut self, len: usize) -> DecodeResult<&[u8]> {
        if len > self.available() {
            return Err(DecodeError::UnexpectedEof {
                needed: len,
                available: self.available(),
            });
        }
        let start = self.position;
        self.position += len;
        self.consumed += len as u64;
        Ok(&self.buffer[start..self.position])
    }

    /// Discard up to `len` unread bytes, returning how many were dropped.
    pub fn skip(&mut self, len: usize) -> usize {
        let len = len.min(self.available());
        self.position += len;
        self.consumed += len as u64;
        len
    }

    /// Drop every buffered byte and rewind to an empty stream.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.position = 0;
        self.consumed = 0;
    }

    /// Release already-read bytes once enough of them pile up.
    fn compact(&mut self) {
        if self.position >= COMPACT_THRESHOLD {
            self.buffer.drain(..self.position);
            self.position = 0;
        }
    }
}
