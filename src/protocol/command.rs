//! Command Ids and Payload Sizes
//!
//! Every command in the event stream is a one-byte id followed by a payload
//! whose length is negotiated at stream start by the message-sizes command.

use tracing::{debug, warn};

use crate::core::reader::{ByteReader, DecodeResult};

/// Commands known to the event stream protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Command {
    /// Wrapper carrying one fragment of an oversized command.
    SplitMessage = 0x10,
    /// Payload size announcement.
    MessageSizes = 0x35,
    /// Match metadata.
    GameStart = 0x36,
    /// Per-player inputs before the frame is simulated.
    PreFrame = 0x37,
    /// Per-player state after the frame is simulated.
    PostFrame = 0x38,
    /// Match result.
    GameEnd = 0x39,
    /// Frame header (seed, scene frame counter).
    FrameStart = 0x3A,
    /// Projectile/item state.
    ItemUpdate = 0x3B,
    /// Frame trailer.
    FrameBookend = 0x3C,
    /// Codes loaded by the console.
    GeckoList = 0x3D,
}

impl Command {
    /// Highest command id this decoder accepts. Anything above is drained.
    pub const HIGHEST: u8 = Command::GeckoList as u8;

    /// Map a raw id to a known command.
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0x10 => Some(Self::SplitMessage),
            0x35 => Some(Self::MessageSizes),
            0x36 => Some(Self::GameStart),
            0x37 => Some(Self::PreFrame),
            0x38 => Some(Self::PostFrame),
            0x39 => Some(Self::GameEnd),
            0x3A => Some(Self::FrameStart),
            0x3B => Some(Self::ItemUpdate),
            0x3C => Some(Self::FrameBookend),
            0x3D => Some(Self::GeckoList),
            _ => None,
        }
    }

    /// Raw id byte.
    #[inline]
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Whether an id lies inside the accepted range.
    #[inline]
    pub fn is_legal(id: u8) -> bool {
        id <= Self::HIGHEST
    }
}

/// Trailer bytes appended to every split-message payload.
pub const SPLIT_TRAILER_LEN: usize = 4;

/// Sizes sent by current console builds. Later games in a session may omit
/// the announcement, so these are in place before the first one arrives.
const DEFAULT_SIZES: [(Command, u16); 9] = [
    (Command::SplitMessage, 516),
    (Command::GameStart, 760),
    (Command::PreFrame, 64),
    (Command::PostFrame, 84),
    (Command::GameEnd, 6),
    (Command::FrameStart, 12),
    (Command::ItemUpdate, 44),
    (Command::FrameBookend, 8),
    (Command::GeckoList, 54480),
];

/// Declared payload length per command id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PayloadSizeTable {
    sizes: [u16; Command::HIGHEST as usize + 1],
    announced: bool,
}

impl PayloadSizeTable {
    /// Table seeded with the known default sizes.
    pub fn with_defaults() -> Self {
        let mut sizes = [0u16; Command::HIGHEST as usize + 1];
        for (command, size) in DEFAULT_SIZES {
            sizes[command.id() as usize] = size;
        }
        Self { sizes, announced: false }
    }

    /// Declared payload length, or `None` for ids above [`Command::HIGHEST`].
    pub fn get(&self, id: u8) -> Option<usize> {
        self.sizes.get(id as usize).map(|&s| s as usize)
    }

    /// Override the length of one command id. Out-of-range ids are ignored.
    pub fn set(&mut self, id: u8, size: u16) -> bool {
        match self.sizes.get_mut(id as usize) {
            Some(slot) => {
                *slot = size;
                true
            }
            None => false,
        }
    }

    /// Whether a size announcement has been applied.
    pub fn is_announced(&self) -> bool {
        self.announced
    }

    /// Apply the body of a message-sizes command.
    ///
    /// `body` is everything after the length byte: `(len - 1) / 3` triples of
    /// `(command id: u8, size: u16)`. Entries for ids above the legal range
    /// are skipped with a warning, the rest overwrite the current sizes.
    /// Returns the number of entries applied.
    pub fn apply_announcement(&mut self, body: &[u8]) -> DecodeResult<usize> {
        let mut reader = ByteReader::new(body);
        let mut applied = 0;

        for _ in 0..body.len() / 3 {
            let id = reader.read_u8()?;
            let size = reader.read_u16()?;

            if !Command::is_legal(id) {
                warn!("Unknown command 0x{:02x} in payload size event, skipping", id);
                continue;
            }

            debug!("Size for command 0x{:02x} = {}", id, size);
            self.set(id, size);
            applied += 1;
        }

        self.announced = true;
        Ok(applied)
    }
}

impl Default for PayloadSizeTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_seeded() {
        let table = PayloadSizeTable::with_defaults();
        assert_eq!(table.get(0x36), Some(760));
        assert_eq!(table.get(0x37), Some(64));
        assert_eq!(table.get(0x38), Some(84));
        assert_eq!(table.get(0x39), Some(6));
        assert_eq!(table.get(0x10), Some(516));
        assert_eq!(table.get(0x3D), Some(54480));
        assert!(!table.is_announced());
    }

    #[test]
    fn test_ids_above_highest_have_no_size() {
        let mut table = PayloadSizeTable::with_defaults();
        assert_eq!(table.get(0x3E), None);
        assert_eq!(table.get(0x45), None);
        assert!(!table.set(0x45, 36));
    }

    #[test]
    fn test_announcement_overrides_defaults() {
        let mut table = PayloadSizeTable::with_defaults();
        let body = [
            0x36, 0x01, 0xA4, // game start = 420
            0x37, 0x00, 0x3F, // pre-frame = 63
        ];

        assert_eq!(table.apply_announcement(&body).unwrap(), 2);
        assert_eq!(table.get(0x36), Some(420));
        assert_eq!(table.get(0x37), Some(63));
        // Untouched entries keep their defaults.
        assert_eq!(table.get(0x38), Some(84));
        assert!(table.is_announced());
    }

    #[test]
    fn test_announcement_skips_unknown_ids() {
        let mut table = PayloadSizeTable::with_defaults();
        let body = [
            0x40, 0x00, 0x10, // beyond the legal range
            0x39, 0x00, 0x07,
        ];

        assert_eq!(table.apply_announcement(&body).unwrap(), 1);
        assert_eq!(table.get(0x39), Some(7));
        assert_eq!(table.get(0x40), None);
    }

    #[test]
    fn test_command_ids() {
        for id in 0u8..=255 {
            if let Some(command) = Command::from_id(id) {
                assert_eq!(command.id(), id);
                assert!(Command::is_legal(id));
            }
        }
        assert_eq!(Command::HIGHEST, 0x3D);
    }
}
