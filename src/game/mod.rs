//! Game Module
//!
//! Match state, technique analytics and the session lifecycle.
//!
//! ## Module Structure
//!
//! - `state`: Game information, per-slot identity, stats and frame memory
//! - `analyzer`: Per-player technique detection
//! - `events`: Change events published to consumers
//! - `lifecycle`: Connection/game state machine owning all decoder state

pub mod analyzer;
pub mod events;
pub mod lifecycle;
pub mod state;

// Re-export key types
pub use analyzer::{Analyzer, AnalyzerConfig, MashRule};
pub use events::{LiveEvent, StatChange};
pub use lifecycle::{LifecycleState, LiveSession, SessionError, SessionSnapshot};
pub use state::{GameInformation, PlayerInformation, PlayerStats};
