// THEORY:
// The `Scheduler` runs the runner on one thread with two cooperative loops joined
// on the same task. There is no parallel execution and therefore no locking:
//
// 1.  **Camera loop**: owns the video source and the `MotionPipeline`. It polls
//     for a frame, analyzes it and publishes the result on a `watch` channel, which
//     only ever holds the latest analysis. Jump gestures are edge events, so they
//     travel on an unbounded `mpsc` channel where none can be overwritten. When no
//     frame is ready it simply sleeps and polls again. It never pauses for the game.
// 2.  **Display loop**: owns the `GameSession` and every host collaborator. On each
//     interval tick it takes the newest analysis, drains jump events, advances the
//     session one tick, persists a new best score, opens the quiz if needed and
//     renders. Host commands arrive between ticks.
//
// A reset is the only thing flowing from the display loop back to the camera
// loop: a generation counter on a `watch` channel tells the pipeline to forget
// its smoothing. Analyses and jumps already in flight at that moment are
// discarded. Both loops stop when the shutdown signal flips to `true`.

use crate::config::GameConfig;
use crate::core_modules::session::{GamePhase, GameSession};
use crate::core_modules::theme::Theme;
use crate::error::Result;
use crate::interfaces::{KeyValueStore, QuizPresenter, Renderer, VideoSource, load_high_score, save_high_score};
use crate::pipeline::{FrameAnalysis, MotionPipeline};
use image::RgbaImage;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Requests from the host UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Reset,
    QuizFinished { correct: bool },
    SetTheme(Theme),
}

/// How a run of the scheduler ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub phase: GamePhase,
    pub score: u32,
    pub best_score: u32,
    pub display_ticks: u64,
    pub frames_analyzed: u64,
}

pub struct Scheduler<V, D, S, Q> {
    config: GameConfig,
    video: V,
    renderer: D,
    store: S,
    quiz: Q,
}

impl<V, D, S, Q> Scheduler<V, D, S, Q>
where
    V: VideoSource,
    D: Renderer,
    S: KeyValueStore,
    Q: QuizPresenter,
{
    pub fn new(config: GameConfig, video: V, renderer: D, store: S, quiz: Q) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            video,
            renderer,
            store,
            quiz,
        })
    }

    pub fn video(&self) -> &V {
        &self.video
    }

    pub fn renderer(&self) -> &D {
        &self.renderer
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn quiz_presenter(&self) -> &Q {
        &self.quiz
    }

    /// Runs both loops until `shutdown` becomes `true` (or its sender is dropped).
    pub async fn run<R: Rng>(
        &mut self,
        rng: R,
        commands: mpsc::UnboundedReceiver<Command>,
        shutdown: watch::Receiver<bool>,
    ) -> SessionSummary {
        let Self {
            config,
            video,
            renderer,
            store,
            quiz,
        } = self;

        let best_score = load_high_score(&*store);
        let theme = Theme::load(&*store);
        let mut session = GameSession::new(config.clone(), best_score, theme, rng, Instant::now().into_std());
        info!(best_score, %theme, "session loaded");

        let camera_ready = match video.open() {
            Ok(()) => {
                info!("camera connected");
                session.camera_connected();
                true
            }
            Err(err) => {
                warn!(%err, "camera unavailable, motion control disabled");
                session.camera_unavailable();
                false
            }
        };

        let (analysis_tx, analysis_rx) = watch::channel::<Option<FrameAnalysis>>(None);
        let (jump_tx, jump_rx) = mpsc::unbounded_channel::<()>();
        let (reset_tx, reset_rx) = watch::channel(0u64);

        let camera = CameraLoop {
            pipeline: MotionPipeline::new(config),
            poll: config.schedule.camera_poll(),
            analysis_tx,
            jump_tx,
            reset_rx,
            shutdown: shutdown.clone(),
        };
        let display = DisplayLoop {
            interval: config.schedule.display_interval(),
            analysis_rx,
            jump_rx,
            reset_tx,
            commands: Some(commands),
            shutdown,
        };

        let camera_future = async {
            if camera_ready { camera.run(video).await } else { 0 }
        };
        let display_future = display.run(&mut session, renderer, store, quiz);
        let (frames_analyzed, display_ticks) = futures::future::join(camera_future, display_future).await;

        info!(frames_analyzed, display_ticks, score = session.score(), "scheduler stopped");
        SessionSummary {
            phase: session.phase(),
            score: session.score(),
            best_score: session.best_score(),
            display_ticks,
            frames_analyzed,
        }
    }
}

struct CameraLoop {
    pipeline: MotionPipeline,
    poll: Duration,
    analysis_tx: watch::Sender<Option<FrameAnalysis>>,
    jump_tx: mpsc::UnboundedSender<()>,
    reset_rx: watch::Receiver<u64>,
    shutdown: watch::Receiver<bool>,
}

impl CameraLoop {
    async fn run<V: VideoSource>(mut self, video: &mut V) -> u64 {
        let mut frames = 0u64;
        loop {
            if *self.shutdown.borrow() {
                break;
            }
            if self.reset_rx.has_changed().unwrap_or(false) {
                self.reset_rx.borrow_and_update();
                self.pipeline.reset();
                debug!("motion pipeline reset");
            }

            if let Some(frame) = video.current_frame() {
                match self.pipeline.process_frame(&frame, Instant::now().into_std()) {
                    Ok(analysis) => {
                        frames += 1;
                        if analysis.report.jump {
                            let _ = self.jump_tx.send(());
                        }
                        self.analysis_tx.send_replace(Some(analysis));
                    }
                    Err(err) => warn!(%err, "frame rejected"),
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.poll) => {}
                changed = self.shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        frames
    }
}

struct DisplayLoop {
    interval: Duration,
    analysis_rx: watch::Receiver<Option<FrameAnalysis>>,
    jump_rx: mpsc::UnboundedReceiver<()>,
    reset_tx: watch::Sender<u64>,
    commands: Option<mpsc::UnboundedReceiver<Command>>,
    shutdown: watch::Receiver<bool>,
}

impl DisplayLoop {
    async fn run<R, D, S, Q>(
        mut self,
        session: &mut GameSession<R>,
        renderer: &mut D,
        store: &mut S,
        quiz: &mut Q,
    ) -> u64
    where
        R: Rng,
        D: Renderer,
        S: KeyValueStore,
        Q: QuizPresenter,
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut ticks = 0u64;

        loop {
            if *self.shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {}
                changed = self.shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
                command = recv_command(&mut self.commands) => {
                    match command {
                        Some(command) => self.handle_command(command, session, store),
                        None => self.commands = None,
                    }
                    continue;
                }
            }

            let now = Instant::now().into_std();
            let view = self.take_motion(session);
            while self.jump_rx.try_recv().is_ok() {
                session.register_jump();
            }

            let outcome = session.display_tick(now);
            if let Some(best) = outcome.new_best_score {
                if let Err(err) = save_high_score(store, best) {
                    warn!(%err, best, "could not persist high score");
                }
            }
            if let Some(concept) = outcome.quiz {
                quiz.present(concept);
            }

            renderer.draw_scene(&session.snapshot());
            if let Some(view) = view {
                renderer.draw_motion_view(&view);
            }
            ticks += 1;
        }
        ticks
    }

    /// Applies the newest analysis, if one arrived since the last tick.
    fn take_motion<R: Rng>(&mut self, session: &mut GameSession<R>) -> Option<Arc<RgbaImage>> {
        if !self.analysis_rx.has_changed().unwrap_or(false) {
            return None;
        }
        let analysis = self.analysis_rx.borrow_and_update().clone()?;
        session.apply_motion(&analysis.report);
        Some(analysis.visualization)
    }

    fn handle_command<R: Rng, S: KeyValueStore>(
        &mut self,
        command: Command,
        session: &mut GameSession<R>,
        store: &mut S,
    ) {
        let now = Instant::now().into_std();
        debug!(?command, "command received");
        match command {
            Command::Start => {
                let restarting = session.phase() == GamePhase::GameOver;
                if session.start(now) && restarting {
                    self.reset_motion();
                }
            }
            Command::Reset => {
                session.reset(now);
                self.reset_motion();
            }
            Command::QuizFinished { correct } => {
                session.finish_quiz(correct);
            }
            Command::SetTheme(theme) => {
                session.set_theme(theme);
                if let Err(err) = theme.save(store) {
                    warn!(%err, %theme, "could not persist theme");
                }
            }
        }
    }

    /// Asks the camera loop for a fresh pipeline and drops whatever it published
    /// before the reset.
    fn reset_motion(&mut self) {
        self.analysis_rx.borrow_and_update();
        while self.jump_rx.try_recv().is_ok() {}
        self.reset_tx.send_modify(|generation| *generation += 1);
    }
}

async fn recv_command(commands: &mut Option<mpsc::UnboundedReceiver<Command>>) -> Option<Command> {
    match commands {
        Some(receiver) => receiver.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MotionConfig;
    use crate::core_modules::education::Concept;
    use crate::core_modules::session::{SceneSnapshot, Status};
    use crate::interfaces::{HIGH_SCORE_KEY, InMemoryStore, THEME_KEY};
    use crate::pipeline::{MotionReport, MotionStatus, SmoothedSignal};
    use crate::synthetic::SweepCamera;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[derive(Default)]
    struct RecordingRenderer {
        scenes: usize,
        motion_views: usize,
        last: Option<SceneSnapshot>,
    }

    impl Renderer for RecordingRenderer {
        fn draw_scene(&mut self, scene: &SceneSnapshot) {
            self.scenes += 1;
            self.last = Some(scene.clone());
        }

        fn draw_motion_view(&mut self, _view: &RgbaImage) {
            self.motion_views += 1;
        }
    }

    #[derive(Default)]
    struct RecordingQuiz {
        presented: Vec<&'static str>,
    }

    impl QuizPresenter for RecordingQuiz {
        fn present(&mut self, concept: &'static Concept) {
            self.presented.push(concept.title);
        }
    }

    fn small_config() -> GameConfig {
        GameConfig {
            motion: MotionConfig {
                analysis_width: 40,
                analysis_height: 30,
                min_active_pixels: 10,
                jump_min_active_pixels: 20,
                jump_max_active_pixels: 600,
                ..MotionConfig::default()
            },
            ..GameConfig::default()
        }
    }

    type TestScheduler = Scheduler<SweepCamera, RecordingRenderer, InMemoryStore, RecordingQuiz>;

    fn scheduler(camera: SweepCamera, store: InMemoryStore) -> TestScheduler {
        Scheduler::new(
            small_config(),
            camera,
            RecordingRenderer::default(),
            store,
            RecordingQuiz::default(),
        )
        .unwrap()
    }

    async fn drive(
        scheduler: &mut TestScheduler,
        script: Vec<(u64, Command)>,
        stop_after_ms: u64,
    ) -> SessionSummary {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let host = async move {
            for (delay_ms, command) in script {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                command_tx.send(command).unwrap();
            }
            tokio::time::sleep(Duration::from_millis(stop_after_ms)).await;
            shutdown_tx.send(true).unwrap();
        };
        let (summary, ()) = tokio::join!(scheduler.run(StdRng::seed_from_u64(1), command_rx, shutdown_rx), host);
        summary
    }

    #[tokio::test(start_paused = true)]
    async fn display_keeps_running_without_camera() {
        let mut scheduler = scheduler(SweepCamera::new(40, 30).unavailable(), InMemoryStore::new());
        let summary = drive(&mut scheduler, vec![], 500).await;

        assert_eq!(summary.frames_analyzed, 0);
        assert!(summary.display_ticks >= 25);
        let renderer = scheduler.renderer();
        assert_eq!(renderer.scenes as u64, summary.display_ticks);
        assert_eq!(renderer.motion_views, 0);
        assert_eq!(renderer.last.as_ref().map(|s| s.status), Some(Status::CameraUnavailable));
    }

    #[tokio::test(start_paused = true)]
    async fn camera_frames_reach_the_display() {
        let mut scheduler = scheduler(SweepCamera::new(40, 30).with_period(10), InMemoryStore::new());
        let summary = drive(&mut scheduler, vec![], 1_000).await;

        assert!(summary.frames_analyzed >= 60);
        let renderer = scheduler.renderer();
        assert!(renderer.motion_views > 0);
        let scene = renderer.last.as_ref().unwrap();
        assert_eq!(scene.phase, GamePhase::Ready);
        assert_eq!(scene.status, Status::TrackingMovement);
        assert_ne!(scene.signal.x, 0.5);
    }

    #[tokio::test(start_paused = true)]
    async fn frames_that_are_not_ready_are_retried() {
        let camera = SweepCamera::new(40, 30).with_period(10).with_gaps(3);
        let mut scheduler = scheduler(camera, InMemoryStore::new());
        let summary = drive(&mut scheduler, vec![], 1_000).await;

        let camera = scheduler.video();
        assert!(camera.polls() >= 60);
        assert_eq!(summary.frames_analyzed, camera.frames_delivered());
        assert_eq!(camera.polls() - camera.frames_delivered(), camera.polls() / 3);
        let renderer = scheduler.renderer();
        assert!(renderer.motion_views as u64 <= summary.frames_analyzed);
        let scene = renderer.last.as_ref().unwrap();
        assert_eq!(scene.status, Status::TrackingMovement);
        assert_ne!(scene.signal.x, 0.5);
    }

    #[test]
    fn reset_drops_analysis_published_before_it() {
        let config = small_config();
        let (analysis_tx, analysis_rx) = watch::channel::<Option<FrameAnalysis>>(None);
        let (jump_tx, jump_rx) = mpsc::unbounded_channel();
        let (reset_tx, reset_rx) = watch::channel(0u64);
        let (_shutdown_tx, shutdown) = watch::channel(false);
        let mut display = DisplayLoop {
            interval: config.schedule.display_interval(),
            analysis_rx,
            jump_rx,
            reset_tx,
            commands: None,
            shutdown,
        };
        let now = std::time::Instant::now();
        let mut session = GameSession::new(config, 0, Theme::default(), StdRng::seed_from_u64(3), now);
        let mut store = InMemoryStore::new();
        let analysis = |x: f32| FrameAnalysis {
            report: MotionReport {
                status: MotionStatus::Tracking,
                signal: SmoothedSignal { x, y: 0.5 },
                active_pixels: 300,
                jump: true,
                frame_index: 1,
                signal_frames: 1,
                quiet_frames: 0,
            },
            visualization: Arc::new(RgbaImage::new(40, 30)),
        };

        analysis_tx.send_replace(Some(analysis(0.9)));
        jump_tx.send(()).unwrap();
        display.handle_command(Command::Reset, &mut session, &mut store);
        let target = session.player().target_x;

        assert!(display.take_motion(&mut session).is_none());
        assert_eq!(session.player().target_x, target);
        assert!(display.jump_rx.try_recv().is_err());
        assert_eq!(*reset_rx.borrow(), 1);

        analysis_tx.send_replace(Some(analysis(0.1)));
        assert!(display.take_motion(&mut session).is_some());
        assert!(session.player().target_x < target);
    }

    #[tokio::test(start_paused = true)]
    async fn new_best_score_is_persisted() {
        let mut scheduler = scheduler(SweepCamera::new(40, 30).unavailable(), InMemoryStore::new());
        // 65 ticks of 16 ms until the first spawn.
        let summary = drive(&mut scheduler, vec![(0, Command::Start)], 1_500).await;

        assert_eq!(summary.phase, GamePhase::Running);
        assert_eq!(summary.score, 1);
        assert_eq!(scheduler.store().get(HIGH_SCORE_KEY).as_deref(), Some("1"));
    }

    #[tokio::test(start_paused = true)]
    async fn stored_best_score_is_loaded() {
        let mut store = InMemoryStore::new();
        store.set(HIGH_SCORE_KEY, "12").unwrap();
        let mut scheduler = scheduler(SweepCamera::new(40, 30).unavailable(), store);
        let summary = drive(&mut scheduler, vec![(0, Command::Start)], 1_500).await;

        assert_eq!(summary.best_score, 12);
        assert_eq!(scheduler.store().get(HIGH_SCORE_KEY).as_deref(), Some("12"));
    }

    #[tokio::test(start_paused = true)]
    async fn commands_drive_the_session() {
        let mut scheduler = scheduler(SweepCamera::new(40, 30).unavailable(), InMemoryStore::new());
        let script = vec![
            (0, Command::Start),
            (200, Command::SetTheme(Theme::Neon)),
            (200, Command::Reset),
            (50, Command::Start),
            (0, Command::Start),
        ];
        let summary = drive(&mut scheduler, script, 200).await;

        assert_eq!(summary.phase, GamePhase::Running);
        assert_eq!(summary.score, 0);
        assert_eq!(scheduler.store().get(THEME_KEY).as_deref(), Some("neon"));
        let scene = scheduler.renderer().last.as_ref().unwrap();
        assert_eq!(scene.theme, Theme::Neon);
        assert!(scheduler.quiz_presenter().presented.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_shutdown_sender_stops_both_loops() {
        let mut scheduler = scheduler(SweepCamera::new(40, 30), InMemoryStore::new());
        let (_command_tx, command_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        drop(shutdown_tx);
        let summary = scheduler.run(StdRng::seed_from_u64(2), command_rx, shutdown_rx).await;
        assert!(summary.display_ticks <= 1);
    }
}
