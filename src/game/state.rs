//! Game State Definitions
//!
//! Match metadata and per-slot player information. A `GameInformation` is
//! created from a decoded game start and is owned exclusively by the session;
//! consumers see clones through snapshots and events.

use serde::Serialize;

use crate::protocol::records::{
    GameStart, Language, LCancelStatus, PlayerStart, PostFrameData, PreFrameData,
};
use crate::NUM_PLAYERS;

// =============================================================================
// PLAYER STATS
// =============================================================================

/// Live derived statistics of one slot.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PlayerStats {
    /// Combo counter reported by the game.
    pub combo_count: u8,
    /// Outcome of the last L-cancel window.
    pub l_cancel_status: LCancelStatus,
    /// Frames since the L-cancel input was last pressed.
    pub frames_since_l_cancel_attempt: u32,
    /// Remaining ledge intangibility frames.
    pub intangibility_frames: u32,
    /// Airborne and moving down.
    pub falling: bool,
    /// Fast-fall flag from the last post-frame.
    pub fast_falling: bool,
    /// Frames spent falling in the current (or last) fall.
    pub falling_frames: u32,
    /// Airdodge frames before the last detected wavedash landing, `0` if none.
    pub wavedash_frames: u32,
    /// Wavedash angle in degrees, within `[0, 90]`.
    pub wavedash_angle: f32,
    /// Character-gated special-button mash counter.
    pub mash_count: u32,
}

// =============================================================================
// FRAME MEMORY
// =============================================================================

/// Current and previous frame records of one slot.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameMemory {
    /// Pre-frame of the frame being assembled.
    pub current_pre: Option<PreFrameData>,
    /// Post-frame of the frame being assembled.
    pub current_post: Option<PostFrameData>,
    /// Pre-frame of the last analyzed frame.
    pub previous_pre: Option<PreFrameData>,
    /// Post-frame of the last analyzed frame.
    pub previous_post: Option<PostFrameData>,
}

impl FrameMemory {
    /// Both records of the current frame have arrived.
    pub fn is_ready(&self) -> bool {
        self.current_pre.is_some() && self.current_post.is_some()
    }

    /// Move current records to previous and clear the current slots.
    pub fn rotate(&mut self) {
        if let Some(pre) = self.current_pre.take() {
            self.previous_pre = Some(pre);
        }
        if let Some(post) = self.current_post.take() {
            self.previous_post = Some(post);
        }
    }
}

// =============================================================================
// PLAYER INFORMATION
// =============================================================================

/// One slot: static identity plus live stats.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PlayerInformation {
    /// Slot index, 0 to 3.
    pub slot: usize,
    /// Static identity from the game start.
    #[serde(flatten)]
    pub identity: PlayerStart,
    /// Live derived statistics.
    pub stats: PlayerStats,
    /// Frame records awaiting analysis.
    #[serde(skip)]
    pub frames: FrameMemory,
}

impl PlayerInformation {
    /// Slot populated from the game start.
    pub fn new(slot: usize, identity: PlayerStart) -> Self {
        Self {
            slot,
            identity,
            ..Self::default()
        }
    }

    /// Whether the slot is occupied.
    pub fn is_present(&self) -> bool {
        self.identity.player_type != crate::protocol::records::PlayerType::Empty
    }
}

// =============================================================================
// GAME INFORMATION
// =============================================================================

/// Metadata of the running match.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GameInformation {
    /// Replay format version, `"{major}.{minor}.{patch} ({build})"`.
    pub version: String,
    /// Initial RNG seed.
    pub random_seed: u32,
    /// Stage id.
    pub stage_id: u16,
    /// PAL version of the game.
    pub is_pal: bool,
    /// Pokémon Stadium transformations disabled.
    pub is_frozen_ps: bool,
    /// Scene within the major scene.
    pub minor_scene: u8,
    /// Menu mode the match was started from.
    pub major_scene: u8,
    /// Console menu language.
    pub language: Language,
    /// Online match id, empty offline.
    pub match_id: String,
    /// Game number within the set.
    pub game_number: u32,
    /// Tiebreaker number.
    pub tiebreaker_number: u32,
    /// All four slots, occupied or not.
    pub players: [PlayerInformation; NUM_PLAYERS],
}

impl GameInformation {
    /// Build fresh match state from a decoded game start.
    pub fn from_start(start: GameStart) -> Self {
        let GameStart {
            version,
            stage_id,
            random_seed,
            is_pal,
            is_frozen_ps,
            minor_scene,
            major_scene,
            language,
            match_id,
            game_number,
            tiebreaker_number,
            players,
        } = start;

        let mut slot = 0;
        let players = players.map(|identity| {
            let player = PlayerInformation::new(slot, identity);
            slot += 1;
            player
        });

        Self {
            version,
            random_seed,
            stage_id,
            is_pal,
            is_frozen_ps,
            minor_scene,
            major_scene,
            language,
            match_id,
            game_number,
            tiebreaker_number,
            players,
        }
    }

    /// Player in a slot, if the index is valid.
    pub fn player(&self, slot: usize) -> Option<&PlayerInformation> {
        self.players.get(slot)
    }

    /// Mutable player in a slot, if the index is valid.
    pub fn player_mut(&mut self, slot: usize) -> Option<&mut PlayerInformation> {
        self.players.get_mut(slot)
    }

    /// Occupied slots.
    pub fn active_players(&self) -> impl Iterator<Item = &PlayerInformation> {
        self.players.iter().filter(|p| p.is_present())
    }
}
