//! Fixed-layout record decoders.
//!
//! Each decoder is stateless: it maps one complete command payload to a
//! record. All multi-byte fields are big-endian, all floats single precision.

pub mod flags;
pub mod game_end;
pub mod game_start;
pub mod post_frame;
pub mod pre_frame;

pub use flags::{Buttons, ProcessedButtons, StateFlags};
pub use game_end::{GameEnd, GameEndMethod};
pub use game_start::{ControllerFix, GameStart, Language, PlayerStart, PlayerType};
pub use post_frame::{LCancelStatus, PostFrameData};
pub use pre_frame::PreFrameData;

/// A decoded command with analytics value.
#[derive(Clone, Debug, PartialEq)]
pub enum Record {
    /// Match metadata; starts a new game.
    GameStart(Box<GameStart>),
    /// One slot's inputs for a frame.
    PreFrame(Box<PreFrameData>),
    /// One slot's state after a frame.
    PostFrame(Box<PostFrameData>),
    /// Match result.
    GameEnd(GameEnd),
}
