//! Game start: match metadata and the static identity of every slot.

use serde::Serialize;

use crate::core::reader::{ByteReader, DecodeError, DecodeResult};
use crate::core::text::{decode_utf8, TextCodec};
use crate::protocol::command::Command;
use crate::NUM_PLAYERS;

/// Bytes the layout below occupies.
pub const GAME_START_LEN: usize = 0x2F8;

/// Length of the raw game-info block.
pub const GAME_INFO_BLOCK_LEN: usize = 312;
/// Stage id (`u16`) inside the game-info block.
const STAGE_OFFSET: usize = 0x0E;
/// First per-slot entry inside the game-info block.
const PLAYER_BLOCK_OFFSET: usize = 0x60;
/// Distance between per-slot entries.
const PLAYER_BLOCK_STRIDE: usize = 0x24;

/// Width of the in-game name tag field.
pub const NAME_TAG_LEN: usize = 16;
/// Width of the display name field.
pub const DISPLAY_NAME_LEN: usize = 31;
/// Width of the connect code field.
pub const CONNECT_CODE_LEN: usize = 10;
/// Width of the unique id field.
pub const UNIQUE_ID_LEN: usize = 29;
/// Width of the match id field.
pub const MATCH_ID_LEN: usize = 51;

/// Who occupies a slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum PlayerType {
    /// Human player
    Human,
    /// Computer player
    Cpu,
    /// Demo (attract mode) player
    Demo,
    /// Nobody in the slot
    #[default]
    Empty,
    /// Unknown type byte
    Other(u8),
}

impl PlayerType {
    /// Map the wire byte.
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Human,
            1 => Self::Cpu,
            2 => Self::Demo,
            3 => Self::Empty,
            other => Self::Other(other),
        }
    }
}

/// Controller assist applied by the console.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum ControllerFix {
    /// No fix
    #[default]
    Off,
    /// Universal Controller Fix
    Ucf,
    /// Dween's controller fix
    Dween,
    /// Unknown fix value
    Other(u32),
}

impl ControllerFix {
    /// Map the wire value.
    pub fn from_u32(value: u32) -> Self {
        match value {
            0 => Self::Off,
            1 => Self::Ucf,
            2 => Self::Dween,
            other => Self::Other(other),
        }
    }
}

/// Menu language of the console.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum Language {
    /// Japanese menus
    Japanese,
    /// English menus
    #[default]
    English,
    /// Unknown language byte
    Other(u8),
}

impl Language {
    /// Map the wire byte.
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Japanese,
            1 => Self::English,
            other => Self::Other(other),
        }
    }
}

/// Static identity of one slot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PlayerStart {
    /// External character id.
    pub character_id: u8,
    /// Who controls the slot.
    pub player_type: PlayerType,
    /// Stocks at match start.
    pub starting_stocks: u8,
    /// Costume (color) index.
    pub costume_index: u8,
    /// Dashback controller fix.
    pub dashback_fix: ControllerFix,
    /// Shield drop controller fix.
    pub shield_drop_fix: ControllerFix,
    /// In-game name tag.
    pub name_tag: String,
    /// Online display name.
    pub display_name: String,
    /// Online connect code, e.g. `ABCD#123`.
    pub connect_code: String,
    /// Online account id.
    pub unique_id: String,
}

/// Decoded game-start record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GameStart {
    /// `"{major}.{minor}.{patch} ({build})"`.
    pub version: String,
    /// Stage the match is played on.
    pub stage_id: u16,
    /// Initial RNG seed.
    pub random_seed: u32,
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
    /// Tiebreaker number, 0 when not a tiebreaker.
    pub tiebreaker_number: u32,
    /// Per-slot identity, indexed by slot.
    pub players: [PlayerStart; NUM_PLAYERS],
}

impl GameStart {
    /// Decode a game-start payload.
    pub fn decode(payload: &[u8], codec: &TextCodec) -> DecodeResult<Self> {
        if payload.len() < GAME_START_LEN {
            return Err(DecodeError::Truncated {
                command: Command::GameStart.id(),
                needed: GAME_START_LEN,
                actual: payload.len(),
            });
        }

        let mut r = ByteReader::new(payload);
        let mut start = Self::default();

        let [major, minor, patch, build] = r.read_array::<4>()?;
        start.version = format!("{major}.{minor}.{patch} ({build})");

        let block = r.read_slice(GAME_INFO_BLOCK_LEN)?;
        decode_game_info_block(block, &mut start)?;

        start.random_seed = r.read_u32()?;

        for player in &mut start.players {
            player.dashback_fix = ControllerFix::from_u32(r.read_u32()?);
            player.shield_drop_fix = ControllerFix::from_u32(r.read_u32()?);
        }

        for player in &mut start.players {
            player.name_tag = codec.decode_legacy(r.read_slice(NAME_TAG_LEN)?);
        }

        start.is_pal = r.read_bool()?;
        start.is_frozen_ps = r.read_bool()?;
        start.minor_scene = r.read_u8()?;
        start.major_scene = r.read_u8()?;

        for player in &mut start.players {
            player.display_name = codec.decode_legacy(r.read_slice(DISPLAY_NAME_LEN)?);
        }
        for player in &mut start.players {
            player.connect_code = codec.decode_code(r.read_slice(CONNECT_CODE_LEN)?);
        }
        for player in &mut start.players {
            player.unique_id = decode_utf8(r.read_slice(UNIQUE_ID_LEN)?);
        }

        start.language = Language::from_u8(r.read_u8()?);
        start.match_id = decode_utf8(r.read_slice(MATCH_ID_LEN)?);
        start.game_number = r.read_u32()?;
        start.tiebreaker_number = r.read_u32()?;

        Ok(start)
    }
}

fn decode_game_info_block(block: &[u8], start: &mut GameStart) -> DecodeResult<()> {
    let mut r = ByteReader::new(block);
    r.skip(STAGE_OFFSET)?;
    start.stage_id = r.read_u16()?;

    for (i, player) in start.players.iter_mut().enumerate() {
        let mut r = ByteReader::new(block);
        r.skip(PLAYER_BLOCK_OFFSET + i * PLAYER_BLOCK_STRIDE)?;
        player.character_id = r.read_u8()?;
        player.player_type = PlayerType::from_u8(r.read_u8()?);
        player.starting_stocks = r.read_u8()?;
        player.costume_index = r.read_u8()?;
    }

    Ok(())
}
