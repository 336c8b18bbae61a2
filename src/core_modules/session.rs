// THEORY:
// The `session` module is the top of the game side of the runner. `GameSession`
// is the single aggregate the display loop owns: player, falling entities,
// score, metrics and every readout the UI shows. It consumes the motion side only
// through `MotionReport`s and jump events, and it never waits on anything.
//
// Phases:
//   Ready ──start──▶ Running ──coin──▶ Quiz ──finish_quiz──▶ Running
//                       │                 │
//                       └──collision──▶ GameOver ──start (resets)──▶ Running
//
// Every display tick runs the same fixed order so no stage reads a value another
// stage has not finished writing:
//   1. ease the avatar toward its target,
//   2. feed the target to the reaction timer,
//   3. if running: one simulation tick, coin pickup, then obstacle collision,
//   4. speed metrics, readout refresh,
//   5. concept rotation.
// The quiz sub-state halts simulation ticks only; easing and metrics keep going.

use crate::config::{Capabilities, GameConfig};
use crate::core_modules::collision::{collect_coins, first_collision};
use crate::core_modules::education::{CoachPrompt, Concept, ConceptRotation, random_concept};
use crate::core_modules::metrics::MetricsTracker;
use crate::core_modules::player::{Player, PlayerController};
use crate::core_modules::simulator::{Coin, Obstacle, Simulator};
use crate::core_modules::theme::Theme;
use crate::pipeline::{MotionReport, MotionStatus, SmoothedSignal};
use rand::Rng;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    Ready,
    Running,
    /// Paused on a coin pickup until the quiz is answered.
    Quiz,
    GameOver,
}

/// The one-line status shown to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ready,
    Running,
    TrackingMovement,
    QuizTime,
    GameOver,
    CameraConnected,
    CameraUnavailable,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Status::Ready => "Ready",
            Status::Running => "Running",
            Status::TrackingMovement => "Tracking movement",
            Status::QuizTime => "Quiz time",
            Status::GameOver => "Game over - press reset.",
            Status::CameraConnected => "Camera connected",
            Status::CameraUnavailable => "Camera denied/unavailable",
        };
        write!(f, "Status: {text}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MovementReadout {
    AwaitingCamera,
    MoveInFrontOfCamera,
    Position { x: f32, active_pixels: u32 },
    MoveHint,
    CameraRequired,
}

impl fmt::Display for MovementReadout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Movement: ")?;
        match self {
            MovementReadout::AwaitingCamera => f.write_str("waiting for camera"),
            MovementReadout::MoveInFrontOfCamera => f.write_str("move left/right in front of the camera"),
            MovementReadout::Position { x, active_pixels } => write!(f, "x={x:.2} active={active_pixels}"),
            MovementReadout::MoveHint => f.write_str("move left/right to control the character"),
            MovementReadout::CameraRequired => f.write_str("camera access is required for controls"),
        }
    }
}

/// Speeds rounded to the nearest 5 px/s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpeedReadout {
    pub speed: u32,
    pub max_speed: u32,
}

impl SpeedReadout {
    pub fn new(speed: f32, max_speed: f32) -> Self {
        Self {
            speed: round_to(speed, 5.0),
            max_speed: round_to(max_speed, 5.0),
        }
    }
}

impl fmt::Display for SpeedReadout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Horizontal speed: {} px/s (max {} px/s)", self.speed, self.max_speed)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReactionReadout(pub Option<Duration>);

impl fmt::Display for ReactionReadout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(reaction) => write!(f, "Reaction time: {} ms", reaction.as_millis()),
            None => f.write_str("Reaction time: -- ms"),
        }
    }
}

fn round_to(value: f32, step: f32) -> u32 {
    ((value.max(0.0) / step).round() * step) as u32
}

/// What happened during one display tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutcome {
    pub obstacle_spawned: bool,
    pub coins_collected: usize,
    /// Set on the tick a pickup opened a quiz.
    pub quiz: Option<&'static Concept>,
    pub collided: bool,
    pub reaction: Option<Duration>,
    /// Set when the best score rose and should be persisted.
    pub new_best_score: Option<u32>,
    pub concept_changed: Option<&'static Concept>,
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone)]
pub struct SceneSnapshot {
    pub phase: GamePhase,
    pub status: Status,
    pub score: u32,
    pub best_score: u32,
    pub theme: Theme,
    pub player: Player,
    pub obstacles: Vec<Obstacle>,
    pub coins: Vec<Coin>,
    pub signal: SmoothedSignal,
    pub speed: SpeedReadout,
    pub reaction: ReactionReadout,
    pub movement: MovementReadout,
    pub coach: CoachPrompt,
    pub concept: &'static Concept,
    pub quiz: Option<&'static Concept>,
}

pub struct GameSession<R: Rng> {
    config: GameConfig,
    rng: R,
    phase: GamePhase,
    status: Status,
    score: u32,
    best_score: u32,
    theme: Theme,
    player: Player,
    controller: PlayerController,
    simulator: Simulator,
    metrics: MetricsTracker,
    concepts: ConceptRotation,
    coach: CoachPrompt,
    quiz: Option<&'static Concept>,
    signal: SmoothedSignal,
    movement: MovementReadout,
    speed_readout: SpeedReadout,
    reaction_readout: ReactionReadout,
    readout_ticks: u64,
    last_readout_at: Option<Instant>,
}

impl<R: Rng> GameSession<R> {
    pub fn new(config: GameConfig, best_score: u32, theme: Theme, rng: R, now: Instant) -> Self {
        let player = Self::starting_player(&config);
        let controller = PlayerController::new(config.player.clone(), config.capabilities.adaptive_follow);
        let simulator = Simulator::new(config.simulation.clone(), config.capabilities.coins_and_quiz);
        let metrics = MetricsTracker::new(&config.metrics, player.target_x);
        let concepts = ConceptRotation::new(Duration::from_millis(config.metrics.concept_rotate_ms), now);
        Self {
            config,
            rng,
            phase: GamePhase::Ready,
            status: Status::Ready,
            score: 0,
            best_score,
            theme,
            player,
            controller,
            simulator,
            metrics,
            concepts,
            coach: CoachPrompt::Welcome,
            quiz: None,
            signal: SmoothedSignal::default(),
            movement: MovementReadout::AwaitingCamera,
            speed_readout: SpeedReadout::default(),
            reaction_readout: ReactionReadout::default(),
            readout_ticks: 0,
            last_readout_at: None,
        }
    }

    fn starting_player(config: &GameConfig) -> Player {
        Player::new(config.simulation.track_width / 2.0, config.player.lane_y, config.player.radius)
    }

    /// Starts a run. Ignored while running or in a quiz; after a game over the
    /// session is reset first. Returns whether a run started.
    pub fn start(&mut self, now: Instant) -> bool {
        match self.phase {
            GamePhase::Running | GamePhase::Quiz => return false,
            GamePhase::GameOver => self.reset(now),
            GamePhase::Ready => {}
        }
        self.phase = GamePhase::Running;
        self.status = Status::Running;
        info!(best_score = self.best_score, "run started");
        true
    }

    /// Back to Ready with an empty track. The best score and theme survive.
    pub fn reset(&mut self, now: Instant) {
        self.phase = GamePhase::Ready;
        self.status = Status::Ready;
        self.score = 0;
        self.player = Self::starting_player(&self.config);
        self.simulator.reset();
        self.metrics.reset(self.player.target_x);
        self.coach = CoachPrompt::Welcome;
        self.quiz = None;
        self.signal = SmoothedSignal::default();
        self.speed_readout = SpeedReadout::default();
        self.reaction_readout = ReactionReadout::default();
        self.readout_ticks = 0;
        self.last_readout_at = Some(now);
        info!("session reset");
    }

    /// Takes the newest motion report from the camera loop.
    pub fn apply_motion(&mut self, report: &MotionReport) {
        match report.status {
            MotionStatus::Tracking => {
                self.signal = report.signal;
                self.controller.set_target(&mut self.player, report.signal.x);

                let every = self.config.metrics.movement_readout_every.max(1);
                if report.signal_frames % every == 0 {
                    self.movement = MovementReadout::Position {
                        x: report.signal.x,
                        active_pixels: round_to(report.active_pixels as f32, 20.0),
                    };
                }
                if self.phase == GamePhase::Ready {
                    self.status = Status::TrackingMovement;
                }
            }
            MotionStatus::NoMotion => {
                if report.quiet_frames > self.config.metrics.no_motion_hint_after {
                    self.movement = MovementReadout::MoveHint;
                }
            }
        }
    }

    /// A jump gesture from the camera loop. Only honoured mid-run.
    pub fn register_jump(&mut self) -> bool {
        if !self.config.capabilities.jump_detection || self.phase != GamePhase::Running {
            return false;
        }
        let jumped = self.player.jump(self.config.player.jump_air_ticks);
        if jumped {
            info!(x = self.player.x, "player jumped");
        }
        jumped
    }

    pub fn display_tick(&mut self, now: Instant) -> TickOutcome {
        let mut outcome = TickOutcome::default();

        self.controller.ease(&mut self.player);

        // Target moves made before this tick's spawn must not answer it.
        if let Some(reaction) = self.metrics.observe_target(self.player.target_x, now) {
            self.coach = CoachPrompt::for_reaction(
                reaction,
                Duration::from_millis(self.config.metrics.quick_reaction_ms),
            );
            outcome.reaction = Some(reaction);
        }

        if self.phase == GamePhase::Running {
            self.simulation_tick(now, &mut outcome);
        }

        let speed = self.metrics.observe_position(self.player.x, now);
        self.refresh_readouts(speed, now);

        outcome.concept_changed = self.concepts.poll(now);
        outcome
    }

    fn simulation_tick(&mut self, now: Instant, outcome: &mut TickOutcome) {
        let events = self.simulator.tick(self.score, &mut self.rng);
        self.player.tick_air();

        if events.obstacle {
            outcome.obstacle_spawned = true;
            self.score += 1;
            self.metrics.on_obstacle_spawn(now);
            if self.score > self.best_score {
                self.best_score = self.score;
                outcome.new_best_score = Some(self.best_score);
            }
        }

        if self.quiz.is_none() {
            let collected = collect_coins(self.simulator.coins_mut(), &self.player, &self.config.simulation);
            outcome.coins_collected = collected;
            if collected > 0 && self.config.capabilities.coins_and_quiz {
                let concept = random_concept(&mut self.rng);
                self.quiz = Some(concept);
                self.phase = GamePhase::Quiz;
                self.status = Status::QuizTime;
                outcome.quiz = Some(concept);
                info!(concept = concept.title, "coin collected, quiz opened");
            }
        }

        if !self.player.is_airborne()
            && first_collision(self.simulator.obstacles(), &self.player, &self.config.simulation).is_some()
        {
            self.phase = GamePhase::GameOver;
            self.status = Status::GameOver;
            self.coach = CoachPrompt::GameOver;
            outcome.collided = true;
            info!(score = self.score, best_score = self.best_score, "game over");
        }
    }

    fn refresh_readouts(&mut self, speed: f32, now: Instant) {
        self.readout_ticks += 1;
        let refresh_after = Duration::from_millis(self.config.metrics.readout_refresh_ms);
        let stale = self
            .last_readout_at
            .is_none_or(|at| now.saturating_duration_since(at) > refresh_after);
        if stale || self.readout_ticks % self.config.metrics.readout_every_ticks.max(1) == 0 {
            self.speed_readout = SpeedReadout::new(speed, self.metrics.max_speed());
            self.reaction_readout = ReactionReadout(self.metrics.reaction());
            self.last_readout_at = Some(now);
        }
    }

    /// Answers the open quiz. Resumes the run unless it ended meanwhile.
    pub fn finish_quiz(&mut self, correct: bool) -> bool {
        let Some(concept) = self.quiz.take() else {
            return false;
        };
        self.coach = CoachPrompt::for_quiz(concept, correct);
        if self.phase == GamePhase::Quiz {
            self.phase = GamePhase::Running;
            self.status = Status::Running;
        }
        info!(concept = concept.title, correct, "quiz finished");
        true
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    pub fn camera_connected(&mut self) {
        self.status = Status::CameraConnected;
        self.movement = MovementReadout::MoveInFrontOfCamera;
    }

    pub fn camera_unavailable(&mut self) {
        self.status = Status::CameraUnavailable;
        self.movement = MovementReadout::CameraRequired;
    }

    pub fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            phase: self.phase,
            status: self.status,
            score: self.score,
            best_score: self.best_score,
            theme: self.theme,
            player: self.player.clone(),
            obstacles: self.simulator.obstacles().to_vec(),
            coins: self.simulator.coins().to_vec(),
            signal: self.signal,
            speed: self.speed_readout,
            reaction: self.reaction_readout,
            movement: self.movement,
            coach: self.coach,
            concept: self.concepts.current(),
            quiz: self.quiz,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn best_score(&self) -> u32 {
        self.best_score
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn simulator(&self) -> &Simulator {
        &self.simulator
    }

    pub fn metrics(&self) -> &MetricsTracker {
        &self.metrics
    }

    pub fn coach(&self) -> CoachPrompt {
        self.coach
    }

    pub fn capabilities(&self) -> Capabilities {
        self.config.capabilities
    }
}
