//! Per-Player Analyzer
//!
//! Derives live technique statistics from one slot's frame records. Runs once
//! per frame after both the pre-frame and post-frame record of the slot have
//! arrived, then rotates the records to "previous".
//!
//! Every step compares the new value against the published one and emits a
//! [`StatChange`] only when it differs.

use std::ops::RangeInclusive;

use crate::game::events::StatChange;
use crate::game::state::{PlayerInformation, PlayerStats};
use crate::protocol::records::{PostFrameData, PreFrameData};

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Action state id of hanging on the ledge.
pub const ACTION_CLIFF_WAIT: u16 = 0xFD;
/// Action state id of landing out of an airdodge.
pub const ACTION_LANDING_FALL_SPECIAL: u16 = 0x2B;
/// Internal character id of Luigi.
pub const CHARACTER_LUIGI: u8 = 17;

/// Character-gated mash counting.
#[derive(Clone, Debug, PartialEq)]
pub struct MashRule {
    /// Internal character id the rule applies to.
    pub character_id: u8,
    /// Action states in which presses are counted.
    pub action_states: RangeInclusive<u16>,
}

impl Default for MashRule {
    fn default() -> Self {
        Self {
            character_id: CHARACTER_LUIGI,
            // Cyclone, grounded and aerial.
            action_states: 0x16B..=0x16C,
        }
    }
}

/// Configuration for technique detection.
#[derive(Clone, Debug, PartialEq)]
pub struct AnalyzerConfig {
    /// Action state that grants ledge intangibility
    pub ledge_wait_state: u16,
    /// Intangibility frames granted on ledge grab
    pub intangibility_window: u32,
    /// Landing state that ends a wavedash
    pub wavedash_landing_state: u16,
    /// Ground speed right after an airdodge
    pub airdodge_initial_speed: f64,
    /// Per-frame airdodge speed decay
    pub airdodge_decay: f64,
    /// Maximum distance from an integer frame count
    pub integer_tolerance: f64,
    /// Mash counting, `None` to disable
    pub mash: Option<MashRule>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            ledge_wait_state: ACTION_CLIFF_WAIT,
            intangibility_window: 31,
            wavedash_landing_state: ACTION_LANDING_FALL_SPECIAL,
            airdodge_initial_speed: 3.1,
            airdodge_decay: 0.9,
            integer_tolerance: 0.001,
            mash: Some(MashRule::default()),
        }
    }
}

// =============================================================================
// ANALYZER
// =============================================================================

/// Stateless technique detector; all state lives in [`PlayerInformation`].
#[derive(Clone, Debug, Default)]
pub struct Analyzer {
    config: AnalyzerConfig,
}

impl Analyzer {
    /// Create an analyzer with the given detection settings.
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    /// Detection settings in use.
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze the slot's current frame if both records are present.
    ///
    /// Returns the statistics that changed, in publication order. Returns an
    /// empty list (and leaves the frame memory untouched) while the frame is
    /// incomplete.
    pub fn analyze(&self, player: &mut PlayerInformation) -> Vec<StatChange> {
        let mut changes = Vec::new();
        if !player.frames.is_ready() {
            return changes;
        }

        let frames = &player.frames;
        if let (Some(pre), Some(post)) = (&frames.current_pre, &frames.current_post) {
            let frame = Frame {
                pre,
                post,
                previous_pre: frames.previous_pre.as_ref(),
                previous_post: frames.previous_post.as_ref(),
            };
            let stats = &mut player.stats;

            self.l_cancel(&frame, stats, &mut changes);
            self.intangibility(&frame, stats, &mut changes);
            self.falling(&frame, stats, &mut changes);
            self.wavedash(&frame, stats, &mut changes);
            self.mash(&frame, stats, &mut changes);

            if update(&mut stats.combo_count, post.combo_count) {
                changes.push(StatChange::ComboCount(post.combo_count));
            }
            if update(&mut stats.l_cancel_status, post.l_cancel_status) {
                changes.push(StatChange::LCancel(post.l_cancel_status));
            }
        }

        player.frames.rotate();
        changes
    }

    fn l_cancel(&self, frame: &Frame<'_>, stats: &mut PlayerStats, changes: &mut Vec<StatChange>) {
        let attempt = frame.pre.l_cancel_input();
        let was_attempt = frame.previous_pre.is_some_and(PreFrameData::l_cancel_input);

        let since = if attempt && !was_attempt {
            0
        } else {
            stats.frames_since_l_cancel_attempt.saturating_add(1)
        };
        if update(&mut stats.frames_since_l_cancel_attempt, since) {
            changes.push(StatChange::FramesSinceLCancelAttempt(since));
        }
    }

    fn intangibility(
        &self,
        frame: &Frame<'_>,
        stats: &mut PlayerStats,
        changes: &mut Vec<StatChange>,
    ) {
        let ledge = self.config.ledge_wait_state;
        let entered = frame.post.action_state_id == ledge
            && frame.previous_post.is_none_or(|p| p.action_state_id != ledge);

        let remaining = if entered && stats.intangibility_frames == 0 {
            self.config.intangibility_window
        } else {
            stats.intangibility_frames.saturating_sub(1)
        };
        if update(&mut stats.intangibility_frames, remaining) {
            changes.push(StatChange::IntangibilityFrames(remaining));
        }
    }

    fn falling(&self, frame: &Frame<'_>, stats: &mut PlayerStats, changes: &mut Vec<StatChange>) {
        let post = frame.post;
        let falling = post.airborne && post.self_induced_y_speed < 0.0;
        let was_falling = stats.falling;

        // The fast-fall flag arrives one frame late; the counter skips the
        // frame it turns on.
        let fast_falling = post.flags.fast_falling;
        let fast_fall_started = fast_falling && !stats.fast_falling;
        if update(&mut stats.fast_falling, fast_falling) {
            changes.push(StatChange::FastFalling(fast_falling));
        }

        let falling_frames = if falling && !was_falling {
            0
        } else if falling && !fast_fall_started {
            stats.falling_frames.saturating_add(1)
        } else {
            stats.falling_frames
        };
        if update(&mut stats.falling, falling) {
            changes.push(StatChange::Falling(falling));
        }
        if update(&mut stats.falling_frames, falling_frames) {
            changes.push(StatChange::FallingFrames(falling_frames));
        }
    }

    fn wavedash(&self, frame: &Frame<'_>, stats: &mut PlayerStats, changes: &mut Vec<StatChange>) {
        let post = frame.post;
        let landing = post.action_state_id == self.config.wavedash_landing_state
            && post.action_state_frame_counter.abs() < f32::EPSILON;

        let (frames, angle) = if landing {
            self.wavedash_sample(post).unwrap_or((0, 0.0))
        } else {
            (0, 0.0)
        };

        let changed = stats.wavedash_frames != frames || stats.wavedash_angle != angle;
        if changed {
            stats.wavedash_frames = frames;
            stats.wavedash_angle = angle;
            changes.push(StatChange::Wavedash { frames, angle });
        }
    }

    /// Airdodge frames and angle implied by the landing speed, if the speed
    /// fits the airdodge decay curve.
    pub fn wavedash_sample(&self, post: &PostFrameData) -> Option<(u32, f32)> {
        let x = f64::from(post.self_induced_ground_x_speed);
        let y = f64::from(post.self_induced_y_speed);
        let magnitude = x.hypot(y);

        let t = (magnitude / self.config.airdodge_initial_speed).ln()
            / self.config.airdodge_decay.ln();
        if !t.is_finite() || t < 0.0 {
            return None;
        }

        let rounded = t.round();
        if (t - rounded).abs() > self.config.integer_tolerance {
            return None;
        }

        let mut angle = y.atan2(x).to_degrees().abs();
        if angle > 90.0 {
            angle = 180.0 - angle;
        }

        Some((rounded as u32, angle as f32))
    }

    fn mash(&self, frame: &Frame<'_>, stats: &mut PlayerStats, changes: &mut Vec<StatChange>) {
        let Some(rule) = &self.config.mash else {
            return;
        };
        let post = frame.post;

        let count = if post.character_id == rule.character_id
            && rule.action_states.contains(&post.action_state_id)
        {
            let pressed = frame.pre.physical_buttons.b;
            let was_pressed = frame.previous_pre.is_some_and(|p| p.physical_buttons.b);
            let sped_up = frame
                .previous_post
                .is_some_and(|prev| downward_speed(post) > downward_speed(prev));

            if pressed && !was_pressed && sped_up {
                stats.mash_count.saturating_add(1)
            } else {
                stats.mash_count
            }
        } else {
            0
        };

        if update(&mut stats.mash_count, count) {
            changes.push(StatChange::MashCount(count));
        }
    }
}

/// Records the analysis steps read.
struct Frame<'a> {
    pre: &'a PreFrameData,
    post: &'a PostFrameData,
    previous_pre: Option<&'a PreFrameData>,
    previous_post: Option<&'a PostFrameData>,
}

fn downward_speed(post: &PostFrameData) -> f32 {
    (-post.self_induced_y_speed).max(0.0)
}

/// Store `value`, reporting whether it differs from the old one.
fn update<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}
