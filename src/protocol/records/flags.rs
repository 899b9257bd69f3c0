//! Bit-packed button words and post-frame state flags.
//!
//! Bit positions are part of the wire format. Decoding goes through the
//! explicit masks below, never through the memory layout of a struct.

use serde::Serialize;

/// Masks for the button words (processed `u32`, physical `u16`).
pub mod mask {
    /// D-pad left.
    pub const DPAD_LEFT: u32 = 0x0000_0001;
    /// D-pad right.
    pub const DPAD_RIGHT: u32 = 0x0000_0002;
    /// D-pad down.
    pub const DPAD_DOWN: u32 = 0x0000_0004;
    /// D-pad up.
    pub const DPAD_UP: u32 = 0x0000_0008;
    /// Z.
    pub const Z: u32 = 0x0000_0010;
    /// R (digital).
    pub const R: u32 = 0x0000_0020;
    /// L (digital).
    pub const L: u32 = 0x0000_0040;
    /// A.
    pub const A: u32 = 0x0000_0100;
    /// B.
    pub const B: u32 = 0x0000_0200;
    /// X.
    pub const X: u32 = 0x0000_0400;
    /// Y.
    pub const Y: u32 = 0x0000_0800;
    /// Start.
    pub const START: u32 = 0x0000_1000;
    /// Joystick tilted up.
    pub const JOYSTICK_UP: u32 = 0x0001_0000;
    /// Joystick tilted down.
    pub const JOYSTICK_DOWN: u32 = 0x0002_0000;
    /// Joystick tilted left.
    pub const JOYSTICK_LEFT: u32 = 0x0004_0000;
    /// Joystick tilted right.
    pub const JOYSTICK_RIGHT: u32 = 0x0008_0000;
    /// C-stick up.
    pub const CSTICK_UP: u32 = 0x0010_0000;
    /// C-stick down.
    pub const CSTICK_DOWN: u32 = 0x0020_0000;
    /// C-stick left.
    pub const CSTICK_LEFT: u32 = 0x0040_0000;
    /// C-stick right.
    pub const CSTICK_RIGHT: u32 = 0x0080_0000;
    /// Either analog trigger held.
    pub const ANY_TRIGGER: u32 = 0x8000_0000;
}

#[inline]
fn has(bits: u32, mask: u32) -> bool {
    bits & mask != 0
}

/// Digital controller buttons.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Buttons {
    /// D-pad left
    pub dpad_left: bool,
    /// D-pad right
    pub dpad_right: bool,
    /// D-pad down
    pub dpad_down: bool,
    /// D-pad up
    pub dpad_up: bool,
    /// Z button
    pub z: bool,
    /// R digital press
    pub r: bool,
    /// L digital press
    pub l: bool,
    /// A button
    pub a: bool,
    /// B button
    pub b: bool,
    /// X button
    pub x: bool,
    /// Y button
    pub y: bool,
    /// Start button
    pub start: bool,
}

impl Buttons {
    /// Decode from a button word (physical `u16` widened, or processed `u32`).
    pub fn from_bits(bits: u32) -> Self {
        Self {
            dpad_left: has(bits, mask::DPAD_LEFT),
            dpad_right: has(bits, mask::DPAD_RIGHT),
            dpad_down: has(bits, mask::DPAD_DOWN),
            dpad_up: has(bits, mask::DPAD_UP),
            z: has(bits, mask::Z),
            r: has(bits, mask::R),
            l: has(bits, mask::L),
            a: has(bits, mask::A),
            b: has(bits, mask::B),
            x: has(bits, mask::X),
            y: has(bits, mask::Y),
            start: has(bits, mask::START),
        }
    }
}

/// Buttons after the game's own input processing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ProcessedButtons {
    /// Digital buttons, same bits as the physical word
    pub buttons: Buttons,
    /// Main stick tilted up
    pub joystick_up: bool,
    /// Main stick tilted down
    pub joystick_down: bool,
    /// Main stick tilted left
    pub joystick_left: bool,
    /// Main stick tilted right
    pub joystick_right: bool,
    /// C-stick tilted up
    pub cstick_up: bool,
    /// C-stick tilted down
    pub cstick_down: bool,
    /// C-stick tilted left
    pub cstick_left: bool,
    /// C-stick tilted right
    pub cstick_right: bool,
    /// L, R or Z pressed far enough to register
    pub any_trigger: bool,
}

impl ProcessedButtons {
    /// Decode from the processed button word.
    pub fn from_bits(bits: u32) -> Self {
        Self {
            buttons: Buttons::from_bits(bits),
            joystick_up: has(bits, mask::JOYSTICK_UP),
            joystick_down: has(bits, mask::JOYSTICK_DOWN),
            joystick_left: has(bits, mask::JOYSTICK_LEFT),
            joystick_right: has(bits, mask::JOYSTICK_RIGHT),
            cstick_up: has(bits, mask::CSTICK_UP),
            cstick_down: has(bits, mask::CSTICK_DOWN),
            cstick_left: has(bits, mask::CSTICK_LEFT),
            cstick_right: has(bits, mask::CSTICK_RIGHT),
            any_trigger: has(bits, mask::ANY_TRIGGER),
        }
    }
}

/// Number of state flag bytes in a post-frame record.
pub const STATE_FLAG_BYTES: usize = 5;

/// One state flag: byte index within the five flag bytes, and bit mask.
type FlagBit = (usize, u8);

const REFLECT_ACTIVE: FlagBit = (0, 0x10);
const INTANGIBLE: FlagBit = (1, 0x04);
const FAST_FALLING: FlagBit = (1, 0x08);
const IN_HITLAG: FlagBit = (1, 0x20);
const SHIELD_ACTIVE: FlagBit = (2, 0x80);
const IN_HITSTUN: FlagBit = (3, 0x02);
const TOUCHING_SHIELD: FlagBit = (3, 0x04);
const POWERSHIELD_ACTIVE: FlagBit = (3, 0x20);
const FOLLOWER: FlagBit = (4, 0x08);
const SLEEPING: FlagBit = (4, 0x10);
const DEAD: FlagBit = (4, 0x40);
const OFFSCREEN: FlagBit = (4, 0x80);

/// Named view of the five post-frame state flag bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StateFlags {
    /// Reflect bubble out
    pub reflect_active: bool,
    /// Cannot be hit
    pub intangible: bool,
    /// Fast-falling (reported one frame late)
    pub fast_falling: bool,
    /// Frozen in hitlag
    pub in_hitlag: bool,
    /// Shield up
    pub shield_active: bool,
    /// In hitstun
    pub in_hitstun: bool,
    /// Hitbox touching a shield
    pub touching_shield: bool,
    /// Powershield window
    pub powershield_active: bool,
    /// Secondary Ice Climber
    pub follower: bool,
    /// Inactive, e.g. Sheik/Zelda's other half
    pub sleeping: bool,
    /// KO'd
    pub dead: bool,
    /// Outside the camera
    pub offscreen: bool,
}

impl StateFlags {
    /// Decode from the raw flag bytes.
    pub fn from_bytes(raw: [u8; STATE_FLAG_BYTES]) -> Self {
        let bit = |(index, mask): FlagBit| raw[index] & mask != 0;
        Self {
            reflect_active: bit(REFLECT_ACTIVE),
            intangible: bit(INTANGIBLE),
            fast_falling: bit(FAST_FALLING),
            in_hitlag: bit(IN_HITLAG),
            shield_active: bit(SHIELD_ACTIVE),
            in_hitstun: bit(IN_HITSTUN),
            touching_shield: bit(TOUCHING_SHIELD),
            powershield_active: bit(POWERSHIELD_ACTIVE),
            follower: bit(FOLLOWER),
            sleeping: bit(SLEEPING),
            dead: bit(DEAD),
            offscreen: bit(OFFSCREEN),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_physical_buttons() {
        let buttons = Buttons::from_bits(u32::from(0x0210u16));
        assert!(buttons.z);
        assert!(buttons.b);
        assert!(!buttons.a);
        assert!(!buttons.start);
    }

    #[test]
    fn test_processed_buttons() {
        let processed = ProcessedButtons::from_bits(0x8001_0100);
        assert!(processed.any_trigger);
        assert!(processed.joystick_up);
        assert!(processed.buttons.a);
        assert!(!processed.cstick_down);
        assert!(!processed.buttons.z);
    }

    #[test]
    fn test_state_flags_bit_positions() {
        let flags = StateFlags::from_bytes([0x10, 0x00, 0x00, 0x00, 0x00]);
        assert_eq!(flags, StateFlags { reflect_active: true, ..Default::default() });

        let flags = StateFlags::from_bytes([0x00, 0x2C, 0x80, 0x00, 0x00]);
        assert!(flags.intangible);
        assert!(flags.fast_falling);
        assert!(flags.in_hitlag);
        assert!(flags.shield_active);
        assert!(!flags.reflect_active);

        let flags = StateFlags::from_bytes([0x00, 0x00, 0x00, 0x26, 0xD8]);
        assert!(flags.in_hitstun);
        assert!(flags.touching_shield);
        assert!(flags.powershield_active);
        assert!(flags.follower);
        assert!(flags.sleeping);
        assert!(flags.dead);
        assert!(flags.offscreen);
    }

    #[test]
    fn test_unrelated_bits_ignored() {
        let flags = StateFlags::from_bytes([0xEF, 0xD3, 0x7F, 0xD9, 0x27]);
        assert_eq!(flags, StateFlags::default());
    }
}
