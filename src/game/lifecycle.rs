//! Game Lifecycle Controller
//!
//! ```text
//! Disconnected ──connect_reply──▶ Connected ──start_game / game_event──▶ InGame
//!      ▲                              ▲                                    │
//!      │                              └──────────────end_game──────────────┘
//!      └──────────────────disconnect (from Connected or InGame)
//! ```
//!
//! `LiveSession` owns every piece of mutable decoder state: the sequencer,
//! the demultiplexer (with its size table), the analyzer and the current
//! game. It is driven by one caller at a time; events accumulate in an
//! internal queue drained with [`LiveSession::drain_events`].

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::core::reader::DecodeError;
use crate::core::text::TextCodec;
use crate::game::analyzer::{Analyzer, AnalyzerConfig};
use crate::game::events::LiveEvent;
use crate::game::state::{GameInformation, PlayerInformation};
use crate::network::envelope::{Envelope, EnvelopeError};
use crate::protocol::demux::{CommandDemux, Step};
use crate::protocol::records::{GameEnd, PostFrameData, PreFrameData, Record};
use crate::protocol::sequencer::{FrameSequencer, SequenceError};
use crate::NUM_PLAYERS;

/// Errors reported for a single envelope. None of them end the session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Chunk arrived out of order and was dropped.
    #[error(transparent)]
    Sequence(#[from] SequenceError),

    /// Envelope payload could not be decoded.
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
}

/// Connection lifecycle state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// No console connection.
    #[default]
    Disconnected,
    /// Connected, no game running.
    Connected,
    /// A game is running.
    InGame,
}

/// Counters kept for diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SessionCounters {
    /// Chunks admitted by the sequencer.
    pub chunks_accepted: u64,
    /// Chunks dropped for cursor mismatch.
    pub chunks_rejected: u64,
    /// Commands consumed (including split fragments).
    pub commands: u64,
    /// Commands whose payload failed to decode.
    pub decode_failures: u64,
}

/// Read-only view of the session for polling consumers.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SessionSnapshot {
    /// Lifecycle state.
    pub state: LifecycleState,
    /// Connectivity flag.
    pub connected: bool,
    /// Game-running flag.
    pub game_running: bool,
    /// Console nickname from the connect reply.
    pub nick: Option<String>,
    /// Console version from the connect reply.
    pub console_version: Option<String>,
    /// Current game, if one has started.
    pub game: Option<GameInformation>,
    /// Diagnostic counters.
    pub counters: SessionCounters,
}

/// Single-owner live decoding session.
#[derive(Debug)]
pub struct LiveSession {
    state: LifecycleState,
    nick: Option<String>,
    console_version: Option<String>,
    sequencer: FrameSequencer,
    demux: CommandDemux,
    analyzer: Analyzer,
    game: Option<GameInformation>,
    counters: SessionCounters,
    events: Vec<LiveEvent>,
}

impl LiveSession {
    /// Session with default analyzer settings.
    pub fn new() -> Self {
        Self::with_config(AnalyzerConfig::default(), TextCodec::legacy())
    }

    /// Session with explicit analyzer configuration and text codec.
    pub fn with_config(config: AnalyzerConfig, codec: TextCodec) -> Self {
        Self {
            state: LifecycleState::Disconnected,
            nick: None,
            console_version: None,
            sequencer: FrameSequencer::new(),
            demux: CommandDemux::with_codec(codec),
            analyzer: Analyzer::new(config),
            game: None,
            counters: SessionCounters::default(),
            events: Vec::new(),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// True unless disconnected.
    pub fn is_connected(&self) -> bool {
        self.state != LifecycleState::Disconnected
    }

    /// True while in a game.
    pub fn is_game_running(&self) -> bool {
        self.state == LifecycleState::InGame
    }

    /// Current game, once a game start has been decoded.
    pub fn game(&self) -> Option<&GameInformation> {
        self.game.as_ref()
    }

    /// Diagnostic counters for the current game.
    pub fn counters(&self) -> SessionCounters {
        self.counters
    }

    /// Chunk sequencer and its buffered bytes.
    pub fn sequencer(&self) -> &FrameSequencer {
        &self.sequencer
    }

    /// Command demultiplexer state.
    pub fn demux(&self) -> &CommandDemux {
        &self.demux
    }

    /// Take every event queued since the last drain.
    pub fn drain_events(&mut self) -> Vec<LiveEvent> {
        std::mem::take(&mut self.events)
    }

    /// Clone of the observable state.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            connected: self.is_connected(),
            game_running: self.is_game_running(),
            nick: self.nick.clone(),
            console_version: self.console_version.clone(),
            game: self.game.clone(),
            counters: self.counters,
        }
    }

    // =========================================================================
    // Envelope Dispatch
    // =========================================================================

    /// Apply one inbound envelope.
    pub fn handle(&mut self, envelope: &Envelope) -> Result<(), SessionError> {
        match envelope {
            Envelope::ConnectReply { nick, version, .. } => {
                self.connect(nick, version);
                Ok(())
            }
            Envelope::StartGame { cursor, next_cursor } => {
                self.start_game(*cursor, *next_cursor);
                Ok(())
            }
            Envelope::GameEvent { cursor, next_cursor, .. } => {
                let bytes = envelope.decode_payload()?.unwrap_or_default();
                self.game_event(*cursor, *next_cursor, &bytes)?;
                Ok(())
            }
            Envelope::EndGame => {
                self.end_game();
                Ok(())
            }
            Envelope::ConnectRequest { .. } => {
                debug!("Ignoring outbound connect_request envelope");
                Ok(())
            }
            Envelope::Unknown => {
                debug!("Ignoring envelope of unknown type");
                Ok(())
            }
        }
    }

    /// Connect acknowledgement.
    pub fn connect(&mut self, nick: &str, version: &str) {
        info!("Connected to {} (version {})", nick, version);
        self.nick = Some(nick.to_string());
        self.console_version = Some(version.to_string());

        if self.state == LifecycleState::Disconnected {
            self.state = LifecycleState::Connected;
        }
        self.events.push(LiveEvent::ConnectedChanged {
            connected: true,
            nick: self.nick.clone(),
            version: self.console_version.clone(),
        });
    }

    /// Match start: set the cursor the first chunk must carry.
    pub fn start_game(&mut self, cursor: u64, next_cursor: u64) {
        debug!("Start game at cursor {} (next {})", cursor, next_cursor);
        self.sequencer.prime(next_cursor);
        self.enter_game();
    }

    /// Feed one chunk of the binary stream and decode every complete command.
    ///
    /// Returns the number of records decoded. A cursor mismatch drops the
    /// chunk and leaves all state untouched.
    pub fn game_event(
        &mut self,
        cursor: u64,
        next_cursor: u64,
        bytes: &[u8],
    ) -> Result<usize, SequenceError> {
        if self.state == LifecycleState::Disconnected {
            warn!("Game event received while disconnected, ignoring");
            return Ok(0);
        }

        let admitted = self.sequencer.feed(cursor, next_cursor, bytes);
        self.counters.chunks_accepted = self.sequencer.accepted();
        self.counters.chunks_rejected = self.sequencer.rejected();
        admitted?;

        self.enter_game();
        Ok(self.pump())
    }

    /// Match end: full reset of buffering and game state.
    pub fn end_game(&mut self) {
        debug!("End game");
        self.reset_game();
        if self.state == LifecycleState::InGame {
            self.state = LifecycleState::Connected;
            self.events.push(LiveEvent::GameRunningChanged { running: false });
        }
    }

    /// Explicit disconnect. Returns `false` when already disconnected.
    pub fn disconnect(&mut self) -> bool {
        if self.state == LifecycleState::Disconnected {
            info!("Disconnect requested while not connected");
            return false;
        }

        self.end_game();
        self.demux.reset_session();
        self.sequencer.forget_cursor();
        self.nick = None;
        self.console_version = None;
        self.state = LifecycleState::Disconnected;
        self.events.push(LiveEvent::ConnectedChanged {
            connected: false,
            nick: None,
            version: None,
        });
        info!("Disconnected");
        true
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn enter_game(&mut self) {
        if self.state == LifecycleState::Connected {
            self.state = LifecycleState::InGame;
            self.events.push(LiveEvent::GameRunningChanged { running: true });
        }
    }

    /// Discard stream and game state. Idempotent.
    fn reset_game(&mut self) {
        self.sequencer.reset();
        self.demux.reset();
        self.counters = SessionCounters::default();
        if self.game.take().is_some() {
            self.events.push(LiveEvent::GameInfoChanged);
        }
    }

    /// Drain every fully buffered command.
    fn pump(&mut self) -> usize {
        let mut records = 0;
        loop {
            match self.demux.step(self.sequencer.cursor_mut()) {
                Step::Waiting => break,
                Step::Consumed(None) => self.counters.commands += 1,
                Step::Consumed(Some(record)) => {
                    self.counters.commands += 1;
                    records += 1;
                    self.apply(record);
                }
                Step::Failed { command, error } => {
                    self.counters.commands += 1;
                    self.counters.decode_failures += 1;
                    error!("Failed to decode command 0x{:02x}: {}", command, error);
                }
            }
        }
        records
    }

    fn apply(&mut self, record: Record) {
        match record {
            Record::GameStart(start) => {
                info!(
                    "Game started: version {}, stage {}, seed {:#010x}",
                    start.version, start.stage_id, start.random_seed
                );
                self.game = Some(GameInformation::from_start(*start));
                self.events.push(LiveEvent::GameInfoChanged);
                self.events.push(LiveEvent::GameStarted);
            }
            Record::PreFrame(pre) => self.apply_pre_frame(*pre),
            Record::PostFrame(post) => self.apply_post_frame(*post),
            Record::GameEnd(end) => self.apply_game_end(end),
        }
    }

    fn apply_pre_frame(&mut self, pre: PreFrameData) {
        if pre.is_follower {
            return;
        }
        let slot = pre.player_index;
        if let Some(player) = self.slot_mut(slot) {
            player.frames.current_pre = Some(pre);
            self.analyze(usize::from(slot));
        }
    }

    fn apply_post_frame(&mut self, post: PostFrameData) {
        if post.is_follower {
            return;
        }
        let slot = post.player_index;
        if let Some(player) = self.slot_mut(slot) {
            player.frames.current_post = Some(post);
            self.analyze(usize::from(slot));
        }
    }

    fn apply_game_end(&mut self, end: GameEnd) {
        info!("Game ended: {:?}, placements {:?}", end.method, end.placements);
        self.events.push(LiveEvent::GameEnded {
            method: end.method,
            lras_player_index: end.lras_player_index,
            placements: end.placements,
        });
    }

    fn slot_mut(&mut self, slot: u8) -> Option<&mut PlayerInformation> {
        let Some(game) = self.game.as_mut() else {
            debug!("Frame record for slot {} before game start, ignoring", slot);
            return None;
        };
        if usize::from(slot) >= NUM_PLAYERS {
            self.counters.decode_failures += 1;
            error!("{}", DecodeError::InvalidPlayerIndex(slot));
            return None;
        }
        game.player_mut(usize::from(slot))
    }

    fn analyze(&mut self, slot: usize) {
        let Some(player) = self.game.as_mut().and_then(|g| g.player_mut(slot)) else {
            return;
        };
        for change in self.analyzer.analyze(player) {
            self.events.push(LiveEvent::PlayerStat { slot, change });
        }
    }
}

impl Default for LiveSession {
    fn default() -> Self {
        Self::new()
    }
}
