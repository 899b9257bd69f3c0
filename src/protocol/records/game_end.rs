//! Game end: how the match finished and the final placements.

use serde::Serialize;

use crate::core::reader::{ByteReader, DecodeError, DecodeResult};
use crate::protocol::command::Command;
use crate::NUM_PLAYERS;

/// Bytes the layout occupies.
pub const GAME_END_LEN: usize = 2 + NUM_PLAYERS;

/// How a match ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum GameEndMethod {
    /// Ended without a result (older builds).
    Unresolved,
    /// Timer ran out.
    Time,
    /// Stocks ran out.
    Game,
    /// Ended with a result (older builds).
    Resolved,
    /// Quit out, LRA+Start.
    NoContest,
    /// Value this crate does not know.
    Other(u8),
}

impl GameEndMethod {
    /// Map the wire byte.
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Unresolved,
            1 => Self::Time,
            2 => Self::Game,
            3 => Self::Resolved,
            7 => Self::NoContest,
            other => Self::Other(other),
        }
    }
}

/// Decoded game-end record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GameEnd {
    /// How the match ended.
    pub method: GameEndMethod,
    /// Slot of the player who quit (L+R+A+Start), `-1` if nobody did.
    pub lras_player_index: i8,
    /// Per-slot placement, negative for unused slots.
    pub placements: [i8; NUM_PLAYERS],
}

impl GameEnd {
    /// Decode a game-end payload.
    pub fn decode(payload: &[u8]) -> DecodeResult<Self> {
        if payload.len() < GAME_END_LEN {
            return Err(DecodeError::Truncated {
                command: Command::GameEnd.id(),
                needed: GAME_END_LEN,
                actual: payload.len(),
            });
        }

        let mut r = ByteReader::new(payload);
        let method = GameEndMethod::from_u8(r.read_u8()?);
        let lras_player_index = r.read_i8()?;

        let mut placements = [0i8; NUM_PLAYERS];
        for placement in &mut placements {
            *placement = r.read_i8()?;
        }

        Ok(Self {
            method,
            lras_player_index,
            placements,
        })
    }

    /// Slot that quit out, if any.
    pub fn quitter(&self) -> Option<usize> {
        usize::try_from(self.lras_player_index)
            .ok()
            .filter(|&i| i < NUM_PLAYERS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_game_end() {
        let payload = [0x02, 0xFF, 0x00, 0x01, 0xFF, 0xFF];
        let end = GameEnd::decode(&payload).unwrap();

        assert_eq!(end.method, GameEndMethod::Game);
        assert_eq!(end.lras_player_index, -1);
        assert_eq!(end.placements, [0, 1, -1, -1]);
        assert_eq!(end.quitter(), None);
    }

    #[test]
    fn test_quitter_index() {
        let end = GameEnd::decode(&[0x07, 0x01, 0x01, 0x00, 0xFF, 0xFF]).unwrap();
        assert_eq!(end.method, GameEndMethod::NoContest);
        assert_eq!(end.quitter(), Some(1));
    }

    #[test]
    fn test_unknown_method_preserved() {
        let end = GameEnd::decode(&[0x05, 0xFF, 0, 0, 0, 0]).unwrap();
        assert_eq!(end.method, GameEndMethod::Other(5));
    }

    #[test]
    fn test_short_payload() {
        assert!(matches!(
            GameEnd::decode(&[0x02]),
            Err(DecodeError::Truncated { command: 0x39, needed: 6, actual: 1 })
        ));
    }
}
