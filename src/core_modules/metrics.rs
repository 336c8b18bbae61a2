// THEORY:
// The `MetricsTracker` measures the player, not the game. It gives the run its
// physics vocabulary: how fast the avatar is moving sideways, the fastest it has
// moved, and how long the player took to respond to a new obstacle.
//
// 1.  **Speed**: the avatar's horizontal displacement between two display frames
//     divided by the elapsed time. The elapsed time is floored so a pair of frames
//     with the same timestamp cannot divide by zero.
// 2.  **Reaction Time**: an obstacle spawn is the stimulus. The response is the
//     first target move larger than the deadband. The reference target only
//     advances on such deliberate moves, so slow drift never adds up to a fake
//     response.

use crate::config::MetricsConfig;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct MetricsTracker {
    deadband_px: f32,
    min_dt: Duration,
    last_position: Option<(f32, Instant)>,
    speed: f32,
    max_speed: f32,
    stimulus_at: Option<Instant>,
    reaction: Option<Duration>,
    previous_target_x: f32,
}

impl MetricsTracker {
    pub fn new(config: &MetricsConfig, initial_target_x: f32) -> Self {
        Self {
            deadband_px: config.reaction_deadband_px,
            min_dt: Duration::from_secs_f32(config.min_dt_ms.max(0.001) / 1000.0),
            last_position: None,
            speed: 0.0,
            max_speed: 0.0,
            stimulus_at: None,
            reaction: None,
            previous_target_x: initial_target_x,
        }
    }

    /// A new obstacle is a new stimulus; the last measurement no longer applies.
    pub fn on_obstacle_spawn(&mut self, now: Instant) {
        self.stimulus_at = Some(now);
        self.reaction = None;
    }

    /// Feeds the current target. Returns the reaction time when this move answers
    /// a pending stimulus.
    pub fn observe_target(&mut self, target_x: f32, now: Instant) -> Option<Duration> {
        if (target_x - self.previous_target_x).abs() <= self.deadband_px {
            return None;
        }
        self.previous_target_x = target_x;

        let stimulus = self.stimulus_at.take()?;
        let elapsed = now.saturating_duration_since(stimulus);
        let reaction = Duration::from_millis((elapsed.as_secs_f64() * 1000.0).round() as u64);
        debug!(reaction_ms = reaction.as_millis() as u64, "reaction recorded");
        self.reaction = Some(reaction);
        Some(reaction)
    }

    /// Feeds the avatar position and returns the instantaneous speed in px/s.
    pub fn observe_position(&mut self, x: f32, now: Instant) -> f32 {
        if let Some((last_x, last_at)) = self.last_position {
            let dt = now.saturating_duration_since(last_at).max(self.min_dt);
            self.speed = (x - last_x).abs() / dt.as_secs_f32();
            self.max_speed = self.max_speed.max(self.speed);
        }
        self.last_position = Some((x, now));
        self.speed
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    pub fn reaction(&self) -> Option<Duration> {
        self.reaction
    }

    pub fn awaiting_reaction(&self) -> bool {
        self.stimulus_at.is_some()
    }

    pub fn reset(&mut self, initial_target_x: f32) {
        self.last_position = None;
        self.speed = 0.0;
        self.max_speed = 0.0;
        self.stimulus_at = None;
        self.reaction = None;
        self.previous_target_x = initial_target_x;
    }
}
