// THEORY:
// The `Simulator` owns everything that falls down the track. It has no state
// machine of its own: a monotonically increasing tick counter decides when
// obstacles and coins appear, and every tick each entity moves down by its own
// speed until it leaves the bottom of the track.
//
// Difficulty rises with score through the obstacle speed ramp and saturates at
// the configured maximum; random jitter on top keeps waves from looking uniform.

use crate::config::SimulationConfig;
use rand::Rng;
use tracing::debug;

/// Horizontal pixel position of each lane's centre line.
pub const LANE_X: [f32; Lane::COUNT] = [90.0, 210.0, 330.0];

/// A lane index, always 0, 1 or 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Lane(u8);

impl Lane {
    pub const COUNT: usize = 3;

    pub fn new(index: u8) -> Option<Self> {
        ((index as usize) < Self::COUNT).then_some(Lane(index))
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Lane(rng.gen_range(0..Self::COUNT as u8))
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn x(self) -> f32 {
        LANE_X[self.index()]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    pub lane: Lane,
    /// Top edge in track pixels.
    pub y: f32,
    pub speed: f32,
}

impl Obstacle {
    pub fn advance(&mut self) {
        self.y += self.speed;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Coin {
    pub lane: Lane,
    /// Centre in track pixels.
    pub y: f32,
    pub speed: f32,
}

impl Coin {
    pub fn advance(&mut self) {
        self.y += self.speed;
    }
}

/// What the schedule produced on one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpawnEvents {
    pub obstacle: bool,
    pub coin: bool,
}

#[derive(Debug, Clone)]
pub struct Simulator {
    config: SimulationConfig,
    spawn_coins: bool,
    tick: u64,
    obstacles: Vec<Obstacle>,
    coins: Vec<Coin>,
}

impl Simulator {
    pub fn new(config: SimulationConfig, spawn_coins: bool) -> Self {
        Self {
            config,
            spawn_coins,
            tick: 0,
            obstacles: Vec::new(),
            coins: Vec::new(),
        }
    }

    /// Base speed plus the score ramp (saturating), without jitter.
    pub fn ramped_speed(&self, score: u32) -> f32 {
        let c = &self.config;
        let ramp = (score as f32 * c.obstacle_speed_ramp).min(c.obstacle_max_speed - c.obstacle_base_speed);
        c.obstacle_base_speed + ramp.max(0.0)
    }

    pub fn obstacle_speed<R: Rng + ?Sized>(&self, score: u32, rng: &mut R) -> f32 {
        self.ramped_speed(score) + jitter(rng, self.config.obstacle_speed_variance)
    }

    pub fn spawn_obstacle<R: Rng + ?Sized>(&mut self, score: u32, rng: &mut R) -> &Obstacle {
        let obstacle = Obstacle {
            lane: Lane::random(rng),
            y: self.config.obstacle_spawn_y,
            speed: self.obstacle_speed(score, rng),
        };
        debug!(lane = obstacle.lane.index(), speed = obstacle.speed, "obstacle spawned");
        self.obstacles.push(obstacle);
        &self.obstacles[self.obstacles.len() - 1]
    }

    pub fn spawn_coin<R: Rng + ?Sized>(&mut self, rng: &mut R) -> &Coin {
        let coin = Coin {
            lane: Lane::random(rng),
            y: self.config.coin_spawn_y,
            speed: self.config.coin_base_speed + jitter(rng, self.config.coin_speed_variance),
        };
        debug!(lane = coin.lane.index(), speed = coin.speed, "coin spawned");
        self.coins.push(coin);
        &self.coins[self.coins.len() - 1]
    }

    /// One simulation tick: schedule spawns, advance everything, retire what left the track.
    pub fn tick<R: Rng + ?Sized>(&mut self, score: u32, rng: &mut R) -> SpawnEvents {
        self.tick += 1;
        let mut events = SpawnEvents::default();

        if self.tick % self.config.obstacle_spawn_interval == 0 {
            self.spawn_obstacle(score, rng);
            events.obstacle = true;
        }
        if self.spawn_coins && self.tick % self.config.coin_spawn_interval == 0 {
            self.spawn_coin(rng);
            events.coin = true;
        }

        let obstacle_limit = self.config.track_height + self.config.obstacle_retire_margin;
        self.obstacles.iter_mut().for_each(Obstacle::advance);
        self.obstacles.retain(|o| o.y < obstacle_limit);

        let coin_limit = self.config.track_height + self.config.coin_retire_margin;
        self.coins.iter_mut().for_each(Coin::advance);
        self.coins.retain(|c| c.y < coin_limit);

        events
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn coins(&self) -> &[Coin] {
        &self.coins
    }

    pub fn obstacles_mut(&mut self) -> &mut Vec<Obstacle> {
        &mut self.obstacles
    }

    pub fn coins_mut(&mut self) -> &mut Vec<Coin> {
        &mut self.coins
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn reset(&mut self) {
        self.tick = 0;
        self.obstacles.clear();
        self.coins.clear();
    }
}

fn jitter<R: Rng + ?Sized>(rng: &mut R, variance: f32) -> f32 {
    if variance > 0.0 {
        rng.gen_range(0.0..variance)
    } else {
        0.0
    }
}
