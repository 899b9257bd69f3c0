//! Byte-level primitives.
//!
//! Everything here is protocol-agnostic: buffering, big-endian reads and
//! fixed-width text decoding.

pub mod cursor;
pub mod reader;
pub mod text;

// Re-export core types
pub use cursor::StreamCursor;
pub use reader::{ByteReader, DecodeError, DecodeResult};
pub use text::TextCodec;
