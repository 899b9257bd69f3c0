//! Wire builders shared by the unit tests.

use crate::protocol::command::Command;
use crate::protocol::records::game_start::{
    CONNECT_CODE_LEN, DISPLAY_NAME_LEN, GAME_START_LEN, MATCH_ID_LEN, NAME_TAG_LEN, UNIQUE_ID_LEN,
};

// =============================================================================
// Command Framing
// =============================================================================

/// `[id][payload]`.
pub fn command(id: u8, payload: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(payload.len() + 1);
    bytes.push(id);
    bytes.extend_from_slice(payload);
    bytes
}

/// Message-sizes command announcing the given `(id, size)` entries.
pub fn size_announcement(entries: &[(u8, u16)]) -> Vec<u8> {
    let len = 1 + 3 * entries.len();
    let mut bytes = vec![Command::MessageSizes.id(), len as u8];
    for (id, size) in entries {
        bytes.push(*id);
        bytes.extend_from_slice(&size.to_be_bytes());
    }
    bytes
}

/// Wrap `payload` in split-message fragments carrying `chunk` data bytes
/// each. The last fragment is zero padded. One `Vec` per fragment.
pub fn split_message(inner: u8, payload: &[u8], chunk: usize) -> Vec<Vec<u8>> {
    let total = payload.chunks(chunk).count();
    payload
        .chunks(chunk)
        .enumerate()
        .map(|(i, data)| {
            let mut bytes = vec![Command::SplitMessage.id()];
            bytes.extend_from_slice(data);
            bytes.resize(1 + chunk, 0);
            bytes.push(inner);
            bytes.extend_from_slice(&(data.len() as u16).to_be_bytes());
            bytes.push(u8::from(i + 1 == total));
            bytes
        })
        .collect()
}

/// Game-end payload.
pub fn game_end(method: u8, lras: i8, placements: [i8; 4]) -> Vec<u8> {
    let mut bytes = vec![method, lras as u8];
    bytes.extend(placements.iter().map(|&p| p as u8));
    bytes
}

// =============================================================================
// Pre-Frame
// =============================================================================

#[derive(Clone, Debug, Default)]
pub struct PreFrameBuilder {
    frame: i32,
    index: u8,
    follower: bool,
    action_state: u16,
    position: (f32, f32),
    processed: u32,
    physical: u16,
    percent: f32,
    ucf: (i8, i8),
}

impl PreFrameBuilder {
    pub fn new(frame: i32, index: u8) -> Self {
        Self { frame, index, ..Self::default() }
    }

    pub fn follower(mut self, follower: bool) -> Self {
        self.follower = follower;
        self
    }

    pub fn action_state(mut self, state: u16) -> Self {
        self.action_state = state;
        self
    }

    pub fn position(mut self, x: f32, y: f32) -> Self {
        self.position = (x, y);
        self
    }

    pub fn processed_buttons(mut self, bits: u32) -> Self {
        self.processed = bits;
        self
    }

    pub fn physical_buttons(mut self, bits: u16) -> Self {
        self.physical = bits;
        self
    }

    pub fn percent(mut self, percent: f32) -> Self {
        self.percent = percent;
        self
    }

    pub fn ucf(mut self, x: i8, y: i8) -> Self {
        self.ucf = (x, y);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut b = Vec::with_capacity(0x40);
        b.extend(self.frame.to_be_bytes());
        b.push(self.index);
        b.push(u8::from(self.follower));
        b.extend(0u32.to_be_bytes()); // seed
        b.extend(self.action_state.to_be_bytes());
        b.extend(self.position.0.to_be_bytes());
        b.extend(self.position.1.to_be_bytes());
        b.extend(1.0f32.to_be_bytes()); // facing
        for _ in 0..5 {
            b.extend(0f32.to_be_bytes()); // sticks, trigger
        }
        b.extend(self.processed.to_be_bytes());
        b.extend(self.physical.to_be_bytes());
        b.extend(0f32.to_be_bytes());
        b.extend(0f32.to_be_bytes());
        b.push(self.ucf.0 as u8);
        b.extend(self.percent.to_be_bytes());
        b.push(self.ucf.1 as u8);
        b
    }
}

// =============================================================================
// Post-Frame
// =============================================================================

#[derive(Clone, Debug, Default)]
pub struct PostFrameBuilder {
    frame: i32,
    index: u8,
    follower: bool,
    character: u8,
    action_state: u16,
    combo: u8,
    stocks: u8,
    state_frame: f32,
    flags: [u8; 5],
    airborne: bool,
    l_cancel: u8,
    speeds: (f32, f32, f32),
    animation: u32,
}

impl PostFrameBuilder {
    pub fn new(frame: i32, index: u8) -> Self {
        Self { frame, index, stocks: 4, ..Self::default() }
    }

    pub fn follower(mut self, follower: bool) -> Self {
        self.follower = follower;
        self
    }

    pub fn character(mut self, character: u8) -> Self {
        self.character = character;
        self
    }

    pub fn action_state(mut self, state: u16) -> Self {
        self.action_state = state;
        self
    }

    pub fn combo(mut self, combo: u8) -> Self {
        self.combo = combo;
        self
    }

    pub fn stocks(mut self, stocks: u8) -> Self {
        self.stocks = stocks;
        self
    }

    pub fn state_frame(mut self, counter: f32) -> Self {
        self.state_frame = counter;
        self
    }

    pub fn flags(mut self, flags: [u8; 5]) -> Self {
        self.flags = flags;
        self
    }

    pub fn airborne(mut self, airborne: bool) -> Self {
        self.airborne = airborne;
        self
    }

    pub fn l_cancel(mut self, status: u8) -> Self {
        self.l_cancel = status;
        self
    }

    /// Self-induced air X, self-induced Y and self-induced ground X speed.
    pub fn speeds(mut self, air_x: f32, y_self: f32, ground_x: f32) -> Self {
        self.speeds = (air_x, y_self, ground_x);
        self
    }

    pub fn animation(mut self, index: u32) -> Self {
        self.animation = index;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut b = Vec::with_capacity(84);
        b.extend(self.frame.to_be_bytes());
        b.push(self.index);
        b.push(u8::from(self.follower));
        b.push(self.character);
        b.extend(self.action_state.to_be_bytes());
        b.extend(0f32.to_be_bytes()); // x
        b.extend(0f32.to_be_bytes()); // y
        b.extend(1.0f32.to_be_bytes()); // facing
        b.extend(0f32.to_be_bytes()); // percent
        b.extend(60.0f32.to_be_bytes()); // shield
        b.push(0); // last attack
        b.push(self.combo);
        b.push(0); // last hit by
        b.push(self.stocks);
        b.extend(self.state_frame.to_be_bytes());
        b.extend(self.flags);
        b.extend(0f32.to_be_bytes()); // misc
        b.push(u8::from(self.airborne));
        b.extend(0u16.to_be_bytes()); // last ground
        b.push(1); // jumps
        b.push(self.l_cancel);
        b.push(0); // hurtbox
        b.extend(self.speeds.0.to_be_bytes());
        b.extend(self.speeds.1.to_be_bytes());
        b.extend(0f32.to_be_bytes()); // attack x
        b.extend(0f32.to_be_bytes()); // attack y
        b.extend(self.speeds.2.to_be_bytes());
        b.extend(0f32.to_be_bytes()); // hitlag
        b.extend(self.animation.to_be_bytes());
        b.extend(0u16.to_be_bytes());
        b.extend(0u16.to_be_bytes());
        b
    }
}

// =============================================================================
// Game Start
// =============================================================================

const BLOCK: usize = 4;
const SEED: usize = BLOCK + 312;
const FIXES: usize = SEED + 4;
const NAME_TAGS: usize = FIXES + 32;
const FLAGS: usize = NAME_TAGS + 4 * NAME_TAG_LEN;
const DISPLAY_NAMES: usize = FLAGS + 4;
const CONNECT_CODES: usize = DISPLAY_NAMES + 4 * DISPLAY_NAME_LEN;
const UNIQUE_IDS: usize = CONNECT_CODES + 4 * CONNECT_CODE_LEN;
const LANGUAGE: usize = UNIQUE_IDS + 4 * UNIQUE_ID_LEN;
const MATCH_ID: usize = LANGUAGE + 1;
const GAME_NUMBER: usize = MATCH_ID + MATCH_ID_LEN;

#[derive(Clone, Debug)]
pub struct GameStartBuilder {
    bytes: Vec<u8>,
}

impl GameStartBuilder {
    /// Empty slots, version 3.16.0, English.
    pub fn new() -> Self {
        let mut builder = Self { bytes: vec![0u8; GAME_START_LEN] };
        builder = builder.version([3, 16, 0, 0]).language(1);
        for slot in 0..4 {
            builder = builder.player(slot, 0, 3);
        }
        builder
    }

    fn put(mut self, offset: usize, data: &[u8]) -> Self {
        self.bytes[offset..offset + data.len()].copy_from_slice(data);
        self
    }

    fn put_text(self, offset: usize, max: usize, text: &[u8]) -> Self {
        let len = text.len().min(max);
        self.put(offset, &text[..len])
    }

    pub fn version(self, version: [u8; 4]) -> Self {
        self.put(0, &version)
    }

    pub fn stage(self, stage: u16) -> Self {
        self.put(BLOCK + 0x0E, &stage.to_be_bytes())
    }

    pub fn seed(self, seed: u32) -> Self {
        self.put(SEED, &seed.to_be_bytes())
    }

    /// Character (external id) and player type of a slot.
    pub fn player(self, slot: usize, character: u8, player_type: u8) -> Self {
        self.put(BLOCK + 0x60 + slot * 0x24, &[character, player_type, 4, 0])
    }

    pub fn controller_fix(self, slot: usize, dashback: u32, shield_drop: u32) -> Self {
        let mut data = dashback.to_be_bytes().to_vec();
        data.extend(shield_drop.to_be_bytes());
        self.put(FIXES + slot * 8, &data)
    }

    pub fn name_tag(self, slot: usize, raw: &[u8]) -> Self {
        self.put_text(NAME_TAGS + slot * NAME_TAG_LEN, NAME_TAG_LEN, raw)
    }

    pub fn scenes(self, minor: u8, major: u8) -> Self {
        self.put(FLAGS + 2, &[minor, major])
    }

    pub fn display_name(self, slot: usize, raw: &[u8]) -> Self {
        self.put_text(DISPLAY_NAMES + slot * DISPLAY_NAME_LEN, DISPLAY_NAME_LEN, raw)
    }

    pub fn connect_code(self, slot: usize, raw: &[u8]) -> Self {
        self.put_text(CONNECT_CODES + slot * CONNECT_CODE_LEN, CONNECT_CODE_LEN, raw)
    }

    pub fn unique_id(self, slot: usize, raw: &[u8]) -> Self {
        self.put_text(UNIQUE_IDS + slot * UNIQUE_ID_LEN, UNIQUE_ID_LEN, raw)
    }

    pub fn language(self, language: u8) -> Self {
        self.put(LANGUAGE, &[language])
    }

    pub fn match_id(self, raw: &[u8]) -> Self {
        self.put_text(MATCH_ID, MATCH_ID_LEN, raw)
    }

    pub fn game_number(self, game: u32, tiebreaker: u32) -> Self {
        let mut data = game.to_be_bytes().to_vec();
        data.extend(tiebreaker.to_be_bytes());
        self.put(GAME_NUMBER, &data)
    }

    pub fn build(&self) -> Vec<u8> {
        self.bytes.clone()
    }
}

impl Default for GameStartBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[test]
fn test_game_start_layout_fills_payload() {
    assert_eq!(GAME_NUMBER + 8, GAME_START_LEN);
}
