//! Wire protocol: command framing, sequencing and record decoding.
//!
//! Bytes flow `FrameSequencer` → `StreamCursor` → `CommandDemux` → `Record`.

pub mod command;
pub mod demux;
pub mod records;
pub mod sequencer;

#[cfg(test)]
pub(crate) mod testutil;

pub use command::{Command, PayloadSizeTable};
pub use demux::{CommandDemux, Step};
pub use records::Record;
pub use sequencer::{FrameSequencer, SequenceError};
