// THEORY:
// All tuning lives here. The motion thresholds, smoothing weights and jump gates
// were found empirically against real webcams; they are defaults, not truths, so
// every one of them can be overridden from a JSON file. Each nested section maps
// onto one component of the runner, and `Capabilities` switches whole features on
// or off so a single core covers the simple and the rich variants of the game.

use crate::error::{Result, RunnerError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Feature switches for the configurable core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    /// Spawn coins; picking one up pauses the run for a quiz.
    pub coins_and_quiz: bool,
    /// Track the vertical centroid and turn upward jerks into jumps.
    pub jump_detection: bool,
    /// Weight each active pixel by its luma delta instead of counting it once.
    pub weighted_centroid: bool,
    /// Scale smoothing and easing gains with activity / distance.
    pub adaptive_follow: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            coins_and_quiz: true,
            jump_detection: true,
            weighted_centroid: true,
            adaptive_follow: true,
        }
    }
}

/// Frame differencing, centroid and smoothing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Width of the downscaled analysis frame in pixels.
    pub analysis_width: u32,
    /// Height of the downscaled analysis frame in pixels.
    pub analysis_height: u32,
    /// Mirror the camera horizontally so moving right steers right.
    pub mirror: bool,
    /// A pixel is active when its luma delta is strictly greater than this.
    pub motion_threshold: u8,
    /// Frames with this many qualifying active pixels or fewer carry no signal.
    pub min_active_pixels: u32,
    /// Fraction of the frame height ignored at the top (ceiling).
    pub crop_top_frac: f32,
    /// Fraction of the frame height ignored at the bottom (floor clutter).
    pub crop_bottom_frac: f32,
    /// Only every `sample_stride`-th row and column is inspected.
    pub sample_stride: u32,
    /// Fixed horizontal blend factor.
    pub follow_weight: f32,
    /// Adaptive blend: `base + active / activity_scale`, capped.
    pub adaptive_weight_base: f32,
    pub adaptive_activity_scale: f32,
    pub adaptive_weight_cap: f32,
    /// Raw moves smaller than this are treated as jitter.
    pub dead_zone: f32,
    /// Vertical blend factor.
    pub vertical_weight: f32,
    /// Minimum one-frame upward move of the smoothed y for a jump.
    pub jump_delta: f32,
    /// The smoothed y must be above (less than) this for a jump.
    pub jump_high_enough_y: f32,
    pub jump_cooldown_ms: u64,
    /// Jumps need strictly more active pixels than this.
    pub jump_min_active_pixels: u32,
    /// Jumps are rejected above this count (lighting change, camera shake).
    pub jump_max_active_pixels: u32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            analysis_width: 160,
            analysis_height: 120,
            mirror: true,
            motion_threshold: 26,
            min_active_pixels: 50,
            crop_top_frac: 0.05,
            crop_bottom_frac: 0.2,
            sample_stride: 2,
            follow_weight: 0.4,
            adaptive_weight_base: 0.3,
            adaptive_activity_scale: 2000.0,
            adaptive_weight_cap: 0.8,
            dead_zone: 0.004,
            vertical_weight: 0.5,
            jump_delta: 0.06,
            jump_high_enough_y: 0.45,
            jump_cooldown_ms: 700,
            jump_min_active_pixels: 120,
            jump_max_active_pixels: 1500,
        }
    }
}

impl MotionConfig {
    pub fn jump_cooldown(&self) -> Duration {
        Duration::from_millis(self.jump_cooldown_ms)
    }
}

/// Avatar mapping and easing parameters (track pixels).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub min_x: f32,
    pub max_x: f32,
    /// Vertical line the avatar runs on.
    pub lane_y: f32,
    pub radius: f32,
    /// Fixed proportional easing gain.
    pub follow_gain: f32,
    /// Adaptive gain: `base + distance * per_px`, capped.
    pub adaptive_gain_base: f32,
    pub adaptive_gain_per_px: f32,
    pub adaptive_gain_cap: f32,
    /// Remaining distance below which the avatar snaps onto its target.
    pub snap_epsilon: f32,
    /// Simulation ticks a jump keeps the avatar clear of obstacles.
    pub jump_air_ticks: u32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            min_x: 70.0,
            max_x: 350.0,
            lane_y: 550.0,
            radius: 18.0,
            follow_gain: 0.42,
            adaptive_gain_base: 0.3,
            adaptive_gain_per_px: 0.004,
            adaptive_gain_cap: 0.85,
            snap_epsilon: 0.5,
            jump_air_ticks: 40,
        }
    }
}

/// Spawn schedule, difficulty ramp and hit tolerances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub track_width: f32,
    pub track_height: f32,
    pub obstacle_spawn_interval: u64,
    pub coin_spawn_interval: u64,
    pub obstacle_base_speed: f32,
    pub obstacle_speed_variance: f32,
    pub obstacle_speed_ramp: f32,
    pub obstacle_max_speed: f32,
    pub obstacle_spawn_y: f32,
    pub obstacle_size: f32,
    pub obstacle_retire_margin: f32,
    pub coin_base_speed: f32,
    pub coin_speed_variance: f32,
    pub coin_spawn_y: f32,
    pub coin_radius: f32,
    pub coin_retire_margin: f32,
    pub collision_tolerance_x: f32,
    pub coin_tolerance_x: f32,
    pub coin_tolerance_y: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            track_width: 420.0,
            track_height: 640.0,
            obstacle_spawn_interval: 65,
            coin_spawn_interval: 210,
            obstacle_base_speed: 1.6,
            obstacle_speed_variance: 0.8,
            obstacle_speed_ramp: 0.012,
            obstacle_max_speed: 3.2,
            obstacle_spawn_y: -50.0,
            obstacle_size: 48.0,
            obstacle_retire_margin: 60.0,
            coin_base_speed: 2.2,
            coin_speed_variance: 0.7,
            coin_spawn_y: -30.0,
            coin_radius: 14.0,
            coin_retire_margin: 40.0,
            collision_tolerance_x: 34.0,
            coin_tolerance_x: 28.0,
            coin_tolerance_y: 30.0,
        }
    }
}

/// Speed / reaction-time measurement and readout cadence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Target moves larger than this (px) count as a response.
    pub reaction_deadband_px: f32,
    /// Floor on Δt when computing speed.
    pub min_dt_ms: f32,
    /// Reactions faster than this earn the "great reflexes" prompt.
    pub quick_reaction_ms: u64,
    pub readout_refresh_ms: u64,
    pub readout_every_ticks: u64,
    /// Movement readout refreshes every N frames with a signal.
    pub movement_readout_every: u64,
    /// Consecutive quiet frames before the "move left/right" hint.
    pub no_motion_hint_after: u64,
    pub concept_rotate_ms: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            reaction_deadband_px: 8.0,
            min_dt_ms: 1.0,
            quick_reaction_ms: 450,
            readout_refresh_ms: 120,
            readout_every_ticks: 3,
            movement_readout_every: 8,
            no_motion_hint_after: 10,
            concept_rotate_ms: 8000,
        }
    }
}

/// Scheduler cadence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Display refresh period.
    pub display_interval_ms: u64,
    /// Delay before polling the camera again.
    pub camera_poll_ms: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            display_interval_ms: 16,
            camera_poll_ms: 8,
        }
    }
}

impl ScheduleConfig {
    pub fn display_interval(&self) -> Duration {
        Duration::from_millis(self.display_interval_ms.max(1))
    }

    pub fn camera_poll(&self) -> Duration {
        Duration::from_millis(self.camera_poll_ms.max(1))
    }
}

/// Configuration for the whole runner.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub capabilities: Capabilities,
    pub motion: MotionConfig,
    pub player: PlayerConfig,
    pub simulation: SimulationConfig,
    pub metrics: MetricsConfig,
    pub schedule: ScheduleConfig,
}

impl GameConfig {
    /// Parses a (possibly partial) JSON document; missing fields keep their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: GameConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Rejects configurations that would divide by zero or overshoot.
    pub fn validate(&self) -> Result<()> {
        let m = &self.motion;
        if m.analysis_width == 0 || m.analysis_height == 0 {
            return Err(RunnerError::Config("analysis frame must be non-empty".into()));
        }
        if m.sample_stride == 0 {
            return Err(RunnerError::Config("sample_stride must be at least 1".into()));
        }
        if !(0.0..1.0).contains(&m.crop_top_frac)
            || !(0.0..1.0).contains(&m.crop_bottom_frac)
            || m.crop_top_frac + m.crop_bottom_frac >= 1.0
        {
            return Err(RunnerError::Config("crop fractions must leave a non-empty band".into()));
        }
        for (name, weight) in [
            ("follow_weight", m.follow_weight),
            ("adaptive_weight_cap", m.adaptive_weight_cap),
            ("vertical_weight", m.vertical_weight),
        ] {
            if !(weight > 0.0 && weight <= 1.0) {
                return Err(RunnerError::Config(format!("{name} must be in (0, 1]")));
            }
        }
        if m.adaptive_activity_scale <= 0.0 {
            return Err(RunnerError::Config("adaptive_activity_scale must be positive".into()));
        }
        if m.jump_max_active_pixels <= m.jump_min_active_pixels {
            return Err(RunnerError::Config("jump activity ceiling must exceed the floor".into()));
        }

        let p = &self.player;
        if p.min_x >= p.max_x {
            return Err(RunnerError::Config("player min_x must be below max_x".into()));
        }
        for (name, gain) in [("follow_gain", p.follow_gain), ("adaptive_gain_cap", p.adaptive_gain_cap)] {
            if !(gain > 0.0 && gain <= 1.0) {
                return Err(RunnerError::Config(format!("{name} must be in (0, 1]")));
            }
        }

        let s = &self.simulation;
        if s.obstacle_spawn_interval == 0 || s.coin_spawn_interval == 0 {
            return Err(RunnerError::Config("spawn intervals must be positive".into()));
        }
        if s.obstacle_max_speed < s.obstacle_base_speed {
            return Err(RunnerError::Config("obstacle_max_speed must not be below the base speed".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        GameConfig::default().validate().expect("default config must validate");
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = GameConfig::from_json(
            r#"{ "motion": { "motion_threshold": 18 }, "capabilities": { "jump_detection": false } }"#,
        )
        .expect("partial config parses");

        assert_eq!(config.motion.motion_threshold, 18);
        assert_eq!(config.motion.min_active_pixels, 50);
        assert!(!config.capabilities.jump_detection);
        assert!(config.capabilities.coins_and_quiz);
        assert_eq!(config.simulation.obstacle_spawn_interval, 65);
    }

    #[test]
    fn rejects_overshooting_gain() {
        let mut config = GameConfig::default();
        config.player.follow_gain = 1.5;
        assert!(matches!(config.validate(), Err(RunnerError::Config(_))));
    }

    #[test]
    fn rejects_empty_crop_band() {
        let err = GameConfig::from_json(r#"{ "motion": { "crop_top_frac": 0.6, "crop_bottom_frac": 0.5 } }"#);
        assert!(matches!(err, Err(RunnerError::Config(_))));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(GameConfig::from_json("{ not json"), Err(RunnerError::ConfigParse(_))));
    }
}
