//! Live Events
//!
//! Change notifications published by the session. Every derived statistic
//! update maps to exactly one [`StatChange`] variant.

use serde::Serialize;

use crate::protocol::records::{GameEndMethod, LCancelStatus};
use crate::NUM_PLAYERS;

/// One statistic of one slot changed.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "stat", content = "value", rename_all = "snake_case")]
pub enum StatChange {
    /// Combo counter reported by the game.
    ComboCount(u8),
    /// L-cancel outcome reported by the game.
    LCancel(LCancelStatus),
    /// Frames since the last L-cancel input started.
    FramesSinceLCancelAttempt(u32),
    /// Ledge intangibility frames left.
    IntangibilityFrames(u32),
    /// Airborne and moving down.
    Falling(bool),
    /// Fast-fall flag.
    FastFalling(bool),
    /// Frames spent falling.
    FallingFrames(u32),
    /// Wavedash detected on landing, or cleared.
    Wavedash {
        /// Airdodge frames before landing, 0 when cleared.
        frames: u32,
        /// Angle below the horizontal in degrees, within `[0, 90]`.
        angle: f32,
    },
    /// Presses counted by the mash rule.
    MashCount(u32),
}

/// Outbound notification.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveEvent {
    /// Connectivity flag flipped.
    ConnectedChanged {
        /// New connectivity flag.
        connected: bool,
        /// Console nickname, when connected.
        nick: Option<String>,
        /// Console version, when connected.
        version: Option<String>,
    },

    /// Game-running flag flipped.
    GameRunningChanged {
        /// New game-running flag.
        running: bool,
    },

    /// A game start was decoded and game information created.
    GameStarted,

    /// A game end was decoded.
    GameEnded {
        /// How the match ended.
        method: GameEndMethod,
        /// Slot that quit with LRA+Start, -1 if nobody did.
        lras_player_index: i8,
        /// Placement per slot; negative when not placed.
        placements: [i8; NUM_PLAYERS],
    },

    /// Game information was replaced or cleared.
    GameInfoChanged,

    /// A slot's derived statistic changed.
    PlayerStat {
        /// Player slot, 0 to 3.
        slot: usize,
        /// The statistic and its new value.
        change: StatChange,
    },
}

impl LiveEvent {
    /// Event name as it appears in the serialized `type` tag.
    pub fn name(&self) -> &'static str {
        match self {
            LiveEvent::ConnectedChanged { .. } => "connected_changed",
            LiveEvent::GameRunningChanged { .. } => "game_running_changed",
            LiveEvent::GameStarted => "game_started",
            LiveEvent::GameEnded { .. } => "game_ended",
            LiveEvent::GameInfoChanged => "game_info_changed",
            LiveEvent::PlayerStat { .. } => "player_stat",
        }
    }
}
