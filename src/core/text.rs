//! Fixed-width text fields.
//!
//! Names, tags and connect codes are stored in the console's legacy
//! double-byte encoding (Shift-JIS). Unique ids and match ids are UTF-8.
//! All fields are NUL-terminated inside their fixed width.

use encoding_rs::{Encoding, UTF_8};
use tracing::warn;

/// Label of the console's legacy text encoding.
pub const LEGACY_LABEL: &[u8] = b"Shift_JIS";

/// Full-width number sign used in connect codes.
const FULLWIDTH_HASH: char = '\u{FF03}';

/// Decoder for fixed-width text fields.
#[derive(Debug, Clone, Copy)]
pub struct TextCodec {
    legacy: &'static Encoding,
}

impl TextCodec {
    /// Codec for the console's legacy encoding.
    ///
    /// Falls back to UTF-8 with a warning if the label cannot be resolved.
    pub fn legacy() -> Self {
        Self::for_label(LEGACY_LABEL)
    }

    /// Codec for an arbitrary encoding label.
    pub fn for_label(label: &[u8]) -> Self {
        let legacy = Encoding::for_label(label).unwrap_or_else(|| {
            warn!(
                "Could not find {} codec, falling back to UTF-8",
                String::from_utf8_lossy(label)
            );
            UTF_8
        });
        Self { legacy }
    }

    /// Name of the encoding used for legacy fields.
    pub fn encoding_name(&self) -> &'static str {
        self.legacy.name()
    }

    /// Decode a legacy-encoded field.
    pub fn decode_legacy(&self, raw: &[u8]) -> String {
        let (text, _) = self.legacy.decode_without_bom_handling(until_nul(raw));
        text.into_owned()
    }

    /// Decode a connect code, normalising the full-width `#`.
    pub fn decode_code(&self, raw: &[u8]) -> String {
        self.decode_legacy(raw).replace(FULLWIDTH_HASH, "#")
    }
}

impl Default for TextCodec {
    fn default() -> Self {
        Self::legacy()
    }
}

/// Decode a UTF-8 field.
pub fn decode_utf8(raw: &[u8]) -> String {
    String::from_utf8_lossy(until_nul(raw)).into_owned()
}

fn until_nul(raw: &[u8]) -> &[u8] {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    &raw[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_codec_resolves() {
        let codec = TextCodec::legacy();
        assert_eq!(codec.encoding_name(), "Shift_JIS");
    }

    #[test]
    fn test_unknown_label_falls_back_to_utf8() {
        let codec = TextCodec::for_label(b"no-such-encoding");
        assert_eq!(codec.encoding_name(), "UTF-8");
        assert_eq!(codec.decode_legacy(b"abc\0zzz"), "abc");
    }

    #[test]
    fn test_decode_stops_at_nul() {
        let codec = TextCodec::legacy();
        let mut raw = [0u8; 16];
        raw[..4].copy_from_slice(b"Fox!");
        raw[6] = b'x';
        assert_eq!(codec.decode_legacy(&raw), "Fox!");
    }

    #[test]
    fn test_shift_jis_katakana() {
        // "マルス" in Shift-JIS.
        let raw = [0x83, 0x7D, 0x83, 0x8B, 0x83, 0x58, 0x00];
        assert_eq!(TextCodec::legacy().decode_legacy(&raw), "マルス");
    }

    #[test]
    fn test_code_fullwidth_hash_replaced() {
        // "ABC＃123": full-width number sign is 0x81 0x94 in Shift-JIS.
        let raw = [b'A', b'B', b'C', 0x81, 0x94, b'1', b'2', b'3', 0, 0];
        assert_eq!(TextCodec::legacy().decode_code(&raw), "ABC#123");
    }

    #[test]
    fn test_utf8_field() {
        assert_eq!(decode_utf8(b"mode.ranked-2024\0\0\0"), "mode.ranked-2024");
        assert_eq!(decode_utf8(&[0u8; 29]), "");
    }
}
