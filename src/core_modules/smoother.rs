// THEORY:
// The `smoother` module turns the jumpy per-frame centroid into a control signal a
// player can actually steer with, and recognises the one discrete gesture the game
// understands: a jump.
//
// Key architectural principles:
// 1.  **Exponential Memory**: `MotionSmoother` keeps a single `SmoothedSignal` and
//     blends every new sample into it. There is no window to manage and the signal
//     never decays on its own: when a frame carries no signal, nothing changes.
// 2.  **Activity-Aware Trust**: With adaptive follow the blend weight grows with the
//     number of active pixels (up to a cap). A decisive step registers quickly,
//     while noise-level drift barely moves the signal. A small dead-zone skips
//     updates that are pure jitter.
// 3.  **Edge-Triggered Gestures**: `JumpDetector` compares the previous and current
//     smoothed y. A jump is a one-shot event followed by a mandatory refractory
//     period; continued qualifying motion inside the cooldown never re-fires it.
// 4.  **Bounded Output**: Inputs are clamped before blending and outputs after, so
//     the signal is always inside [0, 1] whatever the estimator produced.

use crate::config::MotionConfig;
use crate::core_modules::centroid::MotionSample;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

/// The smoothed control signal, both components in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmoothedSignal {
    pub x: f32,
    pub y: f32,
}

impl Default for SmoothedSignal {
    fn default() -> Self {
        Self { x: 0.5, y: 0.5 }
    }
}

#[derive(Debug, Clone)]
pub struct MotionSmoother {
    follow_weight: f32,
    adaptive: Option<AdaptiveWeight>,
    dead_zone: f32,
    vertical_weight: f32,
    signal: SmoothedSignal,
}

#[derive(Debug, Clone, Copy)]
struct AdaptiveWeight {
    base: f32,
    activity_scale: f32,
    cap: f32,
}

impl MotionSmoother {
    pub fn new(config: &MotionConfig, adaptive: bool) -> Self {
        Self {
            follow_weight: config.follow_weight,
            adaptive: adaptive.then_some(AdaptiveWeight {
                base: config.adaptive_weight_base,
                activity_scale: config.adaptive_activity_scale,
                cap: config.adaptive_weight_cap,
            }),
            dead_zone: config.dead_zone,
            vertical_weight: config.vertical_weight,
            signal: SmoothedSignal::default(),
        }
    }

    /// How much a sample with `active_pixels` is trusted, in (0, 1].
    pub fn follow_weight(&self, active_pixels: u32) -> f32 {
        match self.adaptive {
            Some(a) => (a.base + active_pixels as f32 / a.activity_scale).min(a.cap).clamp(0.0, 1.0),
            None => self.follow_weight.clamp(0.0, 1.0),
        }
    }

    /// Blends one sample into the signal and returns the result.
    pub fn update(&mut self, sample: &MotionSample) -> SmoothedSignal {
        let raw_x = sample.centroid_x.clamp(0.0, 1.0);
        let dx = raw_x - self.signal.x;
        if dx.abs() >= self.dead_zone {
            let weight = self.follow_weight(sample.active_pixels);
            self.signal.x = (self.signal.x + dx * weight).clamp(0.0, 1.0);
        }

        if let Some(raw_y) = sample.centroid_y {
            let dy = raw_y.clamp(0.0, 1.0) - self.signal.y;
            if dy.abs() >= self.dead_zone {
                self.signal.y = (self.signal.y + dy * self.vertical_weight.clamp(0.0, 1.0)).clamp(0.0, 1.0);
            }
        }

        self.signal
    }

    pub fn signal(&self) -> SmoothedSignal {
        self.signal
    }

    pub fn reset(&mut self) {
        self.signal = SmoothedSignal::default();
    }
}

/// Recognises upward jerks of the smoothed vertical signal.
#[derive(Debug, Clone)]
pub struct JumpDetector {
    jump_delta: f32,
    high_enough_y: f32,
    cooldown: Duration,
    min_active_pixels: u32,
    max_active_pixels: u32,
    last_jump: Option<Instant>,
}

impl JumpDetector {
    pub fn new(config: &MotionConfig) -> Self {
        Self {
            jump_delta: config.jump_delta,
            high_enough_y: config.jump_high_enough_y,
            cooldown: config.jump_cooldown(),
            min_active_pixels: config.jump_min_active_pixels,
            max_active_pixels: config.jump_max_active_pixels,
            last_jump: None,
        }
    }

    /// Returns `true` exactly when a new jump event fires.
    pub fn observe(&mut self, previous_y: f32, current_y: f32, active_pixels: u32, now: Instant) -> bool {
        // y grows downward, so rising means decreasing.
        let rose_fast = previous_y - current_y > self.jump_delta;
        let high_enough = current_y < self.high_enough_y;
        let cooled_down = self
            .last_jump
            .is_none_or(|last| now.saturating_duration_since(last) >= self.cooldown);
        let enough_motion = active_pixels > self.min_active_pixels;
        // Whole-frame changes (lighting, camera shake) light up too many pixels.
        let not_global = active_pixels <= self.max_active_pixels;

        if rose_fast && high_enough && cooled_down && enough_motion && not_global {
            self.last_jump = Some(now);
            debug!(previous_y, current_y, active_pixels, "jump gesture detected");
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.last_jump = None;
    }
}
