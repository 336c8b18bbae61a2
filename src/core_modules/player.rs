// THEORY:
// The `PlayerController` converts the smoothed motion signal into avatar movement.
// It never reads the camera; it only sees the published `SmoothedSignal`.
//
// 1.  **Mapping**: the clamped signal is linearly interpolated between the two
//     track bounds, giving the avatar's target x.
// 2.  **Easing**: every display refresh the avatar closes a fraction of the
//     remaining distance. With a gain of at most 1 it can never pass the target.
//     The adaptive gain grows with distance so big corrections close quickly while
//     small ones stay gentle.
// 3.  **Snap**: once the remaining distance is below a small epsilon the avatar is
//     placed exactly on the target, ending the asymptotic crawl.

use crate::config::PlayerConfig;

/// The avatar. `x` is eased toward `target_x` once per display frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub x: f32,
    pub target_x: f32,
    pub y: f32,
    pub radius: f32,
    air_ticks: u32,
}

impl Player {
    pub fn new(x: f32, y: f32, radius: f32) -> Self {
        Self {
            x,
            target_x: x,
            y,
            radius,
            air_ticks: 0,
        }
    }

    /// Leaves the ground for `ticks` simulation ticks. Ignored while airborne.
    pub fn jump(&mut self, ticks: u32) -> bool {
        if self.is_airborne() {
            return false;
        }
        self.air_ticks = ticks;
        true
    }

    pub fn is_airborne(&self) -> bool {
        self.air_ticks > 0
    }

    /// Advances the airborne countdown by one simulation tick.
    pub fn tick_air(&mut self) {
        self.air_ticks = self.air_ticks.saturating_sub(1);
    }

    pub fn air_ticks(&self) -> u32 {
        self.air_ticks
    }
}

#[derive(Debug, Clone)]
pub struct PlayerController {
    config: PlayerConfig,
    adaptive: bool,
}

impl PlayerController {
    pub fn new(config: PlayerConfig, adaptive: bool) -> Self {
        Self { config, adaptive }
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Linear map from [0, 1] to [min_x, max_x]; out-of-range input is clamped.
    pub fn map_to_track(&self, normalized_x: f32) -> f32 {
        let clamped = normalized_x.clamp(0.0, 1.0);
        self.config.min_x + clamped * (self.config.max_x - self.config.min_x)
    }

    pub fn set_target(&self, player: &mut Player, normalized_x: f32) {
        player.target_x = self.map_to_track(normalized_x);
    }

    /// Proportional gain for a remaining distance, never above 1.
    pub fn gain_for(&self, distance: f32) -> f32 {
        let gain = if self.adaptive {
            (self.config.adaptive_gain_base + distance.abs() * self.config.adaptive_gain_per_px)
                .min(self.config.adaptive_gain_cap)
        } else {
            self.config.follow_gain
        };
        gain.clamp(0.0, 1.0)
    }

    /// One easing step toward the target.
    pub fn ease(&self, player: &mut Player) {
        let dx = player.target_x - player.x;
        if dx.abs() < self.config.snap_epsilon {
            player.x = player.target_x;
            return;
        }
        player.x += dx * self.gain_for(dx);
    }
}
