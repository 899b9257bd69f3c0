//! Post-frame update: one player's state after the frame is simulated.

use serde::Serialize;

use crate::core::reader::{ByteReader, DecodeError, DecodeResult};
use crate::protocol::command::Command;
use crate::protocol::records::flags::{StateFlags, STATE_FLAG_BYTES};

/// Bytes required by the base layout.
pub const POST_FRAME_LEN: usize = 0x50;

/// L-cancel result reported by the game.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum LCancelStatus {
    /// No L-cancel window this frame (or the value was not recognised).
    #[default]
    Unknown,
    /// L-cancel hit the window.
    Successful,
    /// L-cancel missed the window.
    Unsuccessful,
}

impl LCancelStatus {
    /// Map the wire byte.
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Successful,
            2 => Self::Unsuccessful,
            _ => Self::Unknown,
        }
    }
}

/// Decoded post-frame record.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PostFrameData {
    /// Frame index.
    pub frame_number: i32,
    /// Player slot, 0 to 3.
    pub player_index: u8,
    /// Set for the secondary Ice Climber.
    pub is_follower: bool,
    /// Internal character id.
    pub character_id: u8,
    /// Action state after the frame.
    pub action_state_id: u16,
    /// Horizontal position.
    pub position_x: f32,
    /// Vertical position.
    pub position_y: f32,
    /// -1.0 facing left, 1.0 facing right.
    pub facing_direction: f32,
    /// Damage percent.
    pub percent: f32,
    /// Shield health, 60.0 when full.
    pub shield_size: f32,
    /// Attack that last connected.
    pub last_hit_attack_id: u8,
    /// Hits in the current combo, as counted by the game.
    pub combo_count: u8,
    /// Slot of the player that last hit this one.
    pub last_hit_by: u8,
    /// Stocks remaining.
    pub stocks: u8,
    /// Frames spent in the current action state.
    pub action_state_frame_counter: f32,
    /// Decoded state flag bytes.
    pub flags: StateFlags,
    /// Action-state specific value (e.g. hitstun remaining).
    pub misc_action_state: f32,
    /// True while off the ground.
    pub airborne: bool,
    /// Id of the last ground touched.
    pub last_ground_id: u16,
    /// Jumps left, including the grounded jump.
    pub jumps_remaining: u8,
    /// L-cancel outcome for this frame.
    pub l_cancel_status: LCancelStatus,
    /// 0 vulnerable, 1 invulnerable, 2 intangible.
    pub hurtbox_collision_state: u8,
    /// Horizontal air speed from the player's own movement.
    pub self_induced_air_x_speed: f32,
    /// Vertical speed from the player's own movement. Negative is downward.
    pub self_induced_y_speed: f32,
    /// Horizontal knockback speed.
    pub attack_based_x_speed: f32,
    /// Vertical knockback speed.
    pub attack_based_y_speed: f32,
    /// Ground speed from the player's own movement.
    pub self_induced_ground_x_speed: f32,
    /// Hitlag left, 0.0 when not in hitlag.
    pub hitlag_frames_remaining: f32,
    /// Animation being played.
    pub animation_index: u32,
    /// Present on newer builds only.
    pub instance_hit_by: Option<u16>,
    /// Present on newer builds only.
    pub instance_id: Option<u16>,
}

impl PostFrameData {
    /// Decode a post-frame payload.
    pub fn decode(payload: &[u8]) -> DecodeResult<Self> {
        if payload.len() < POST_FRAME_LEN {
            return Err(DecodeError::Truncated {
                command: Command::PostFrame.id(),
                needed: POST_FRAME_LEN,
                actual: payload.len(),
            });
        }

        let mut r = ByteReader::new(payload);
        let mut post = Self {
            frame_number: r.read_i32()?,
            player_index: r.read_u8()?,
            is_follower: r.read_bool()?,
            character_id: r.read_u8()?,
            action_state_id: r.read_u16()?,
            position_x: r.read_f32()?,
            position_y: r.read_f32()?,
            facing_direction: r.read_f32()?,
            percent: r.read_f32()?,
            shield_size: r.read_f32()?,
            last_hit_attack_id: r.read_u8()?,
            combo_count: r.read_u8()?,
            last_hit_by: r.read_u8()?,
            stocks: r.read_u8()?,
            action_state_frame_counter: r.read_f32()?,
            flags: StateFlags::from_bytes(r.read_array::<STATE_FLAG_BYTES>()?),
            misc_action_state: r.read_f32()?,
            airborne: r.read_bool()?,
            last_ground_id: r.read_u16()?,
            jumps_remaining: r.read_u8()?,
            l_cancel_status: LCancelStatus::from_u8(r.read_u8()?),
            hurtbox_collision_state: r.read_u8()?,
            self_induced_air_x_speed: r.read_f32()?,
            self_induced_y_speed: r.read_f32()?,
            attack_based_x_speed: r.read_f32()?,
            attack_based_y_speed: r.read_f32()?,
            self_induced_ground_x_speed: r.read_f32()?,
            hitlag_frames_remaining: r.read_f32()?,
            animation_index: r.read_u32()?,
            instance_hit_by: None,
            instance_id: None,
        };

        if r.remaining() >= 4 {
            post.instance_hit_by = Some(r.read_u16()?);
            post.instance_id = Some(r.read_u16()?);
        }

        Ok(post)
    }
}
