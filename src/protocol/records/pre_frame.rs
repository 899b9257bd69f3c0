//! Pre-frame update: one player's inputs before the frame is simulated.

use serde::Serialize;

use crate::core::reader::{ByteReader, DecodeError, DecodeResult};
use crate::protocol::command::Command;
use crate::protocol::records::flags::{Buttons, ProcessedButtons};

/// Bytes the layout below occupies.
pub const PRE_FRAME_LEN: usize = 0x40;

/// Decoded pre-frame record.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PreFrameData {
    /// Frame index; the first playable frame is -39.
    pub frame_number: i32,
    /// Player slot, 0 to 3.
    pub player_index: u8,
    /// Set for the secondary Ice Climber.
    pub is_follower: bool,
    /// Game RNG seed at the start of the frame.
    pub random_seed: u32,
    /// Action state before the frame.
    pub action_state_id: u16,
    /// Horizontal position.
    pub position_x: f32,
    /// Vertical position.
    pub position_y: f32,
    /// -1.0 facing left, 1.0 facing right.
    pub facing_direction: f32,
    /// Processed main stick X in [-1, 1].
    pub joystick_x: f32,
    /// Processed main stick Y in [-1, 1].
    pub joystick_y: f32,
    /// Processed C-stick X in [-1, 1].
    pub cstick_x: f32,
    /// Processed C-stick Y in [-1, 1].
    pub cstick_y: f32,
    /// Processed analog trigger, the larger of L and R.
    pub trigger: f32,
    /// Buttons after the game's input processing.
    pub processed_buttons: ProcessedButtons,
    /// Buttons as read from the controller.
    pub physical_buttons: Buttons,
    /// Raw L trigger pressure.
    pub physical_l_trigger: f32,
    /// Raw R trigger pressure.
    pub physical_r_trigger: f32,
    /// Analog X modifier used by controller fixes.
    pub ucf_x: i8,
    /// Damage percent.
    pub percent: f32,
    /// Analog Y modifier used by controller fixes.
    pub ucf_y: i8,
}

impl PreFrameData {
    /// Decode a pre-frame payload.
    pub fn decode(payload: &[u8]) -> DecodeResult<Self> {
        if payload.len() < PRE_FRAME_LEN {
            return Err(DecodeError::Truncated {
                command: Command::PreFrame.id(),
                needed: PRE_FRAME_LEN,
                actual: payload.len(),
            });
        }

        let mut r = ByteReader::new(payload);
        Ok(Self {
            frame_number: r.read_i32()?,
            player_index: r.read_u8()?,
            is_follower: r.read_bool()?,
            random_seed: r.read_u32()?,
            action_state_id: r.read_u16()?,
            position_x: r.read_f32()?,
            position_y: r.read_f32()?,
            facing_direction: r.read_f32()?,
            joystick_x: r.read_f32()?,
            joystick_y: r.read_f32()?,
            cstick_x: r.read_f32()?,
            cstick_y: r.read_f32()?,
            trigger: r.read_f32()?,
            processed_buttons: ProcessedButtons::from_bits(r.read_u32()?),
            physical_buttons: Buttons::from_bits(u32::from(r.read_u16()?)),
            physical_l_trigger: r.read_f32()?,
            physical_r_trigger: r.read_f32()?,
            ucf_x: r.read_i8()?,
            percent: r.read_f32()?,
            ucf_y: r.read_i8()?,
        })
    }

    /// Whether an L-cancel input (either trigger, or Z) is held.
    pub fn l_cancel_input(&self) -> bool {
        self.processed_buttons.any_trigger || self.physical_buttons.z
    }
}
