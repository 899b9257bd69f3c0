//! Big-endian slice reader for fixed-layout records.
//!
//! Every read is bounds-checked. A short buffer yields
//! [`DecodeError::UnexpectedEof`] instead of a panic, so a malformed command
//! can only fail its own decode.

use thiserror::Error;

/// Result type for record decoding.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Errors raised while decoding bytes from the event stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// A read ran past the end of the available bytes.
    #[error("unexpected end of data: needed {needed} bytes, {available} available")]
    UnexpectedEof {
        /// Bytes the read required.
        needed: usize,
        /// Bytes that were left.
        available: usize,
    },

    /// A record named a player slot outside `0..NUM_PLAYERS`.
    #[error("invalid player index {0}")]
    InvalidPlayerIndex(u8),

    /// A command payload was shorter than its fixed layout.
    #[error("command 0x{command:02x} truncated: layout needs {needed} bytes, payload has {actual}")]
    Truncated {
        /// Command id.
        command: u8,
        /// Minimum payload length of the layout.
        needed: usize,
        /// Actual payload length.
        actual: usize,
    },
}

/// Cursor over a borrowed byte slice.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// Create a reader positioned at the start of `data`.
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes left to read.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Current offset from the start of the slice.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Whether every byte has been consumed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn ensure(&self, needed: usize) -> DecodeResult<()> {
        if needed > self.remaining() {
            return Err(DecodeError::UnexpectedEof {
                needed,
                available: self.remaining(),
            });
        }
        Ok(())
    }

    /// Borrow the next `len` bytes.
    pub fn read_slice(&mut self, len: usize) -> DecodeResult<&'a [u8]> {
        self.ensure(len)?;
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    /// Copy the next `N` bytes into an array.
    pub fn read_array<const N: usize>(&mut self) -> DecodeResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_slice(N)?);
        Ok(out)
    }

    /// Skip `len` bytes.
    pub fn skip(&mut self, len: usize) -> DecodeResult<()> {
        self.read_slice(len).map(|_| ())
    }

    /// Read an unsigned byte.
    pub fn read_u8(&mut self) -> DecodeResult<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    /// Read a signed byte.
    pub fn read_i8(&mut self) -> DecodeResult<i8> {
        Ok(i8::from_be_bytes(self.read_array()?))
    }

    /// Read a byte as a boolean (any non-zero value is `true`).
    pub fn read_bool(&mut self) -> DecodeResult<bool> {
        Ok(self.read_u8()? != 0)
    }

    /// Read a big-endian `u16`.
    pub fn read_u16(&mut self) -> DecodeResult<u16> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    /// Read a big-endian `u32`.
    pub fn read_u32(&mut self) -> DecodeResult<u32> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    /// Read a big-endian `i32`.
    pub fn read_i32(&mut self) -> DecodeResult<i32> {
        Ok(i32::from_be_bytes(self.read_array()?))
    }

    /// Read a big-endian single-precision float.
    pub fn read_f32(&mut self) -> DecodeResult<f32> {
        Ok(f32::from_be_bytes(self.read_array()?))
    }
}
