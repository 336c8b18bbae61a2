// Demo runner: drives the whole game from a synthetic sweeping camera and logs
// what a real UI would draw.
//
// Usage: motion_runner [config.json] [--seconds N] [--dump-motion-view out.png]
// Logging follows RUST_LOG (default `info`).

use anyhow::{Context, Result};
use image::RgbaImage;
use motion_runner::core_modules::education::Concept;
use motion_runner::core_modules::session::{SceneSnapshot, Status};
use motion_runner::core_modules::utils::image_helper::image_helper::save_png;
use motion_runner::interfaces::{FileStore, QuizPresenter, Renderer};
use motion_runner::synthetic::SweepCamera;
use motion_runner::{Command, GameConfig, Scheduler};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::info;
use tracing_subscriber::EnvFilter;

const STORE_PATH: &str = "motion_runner_store.json";
const QUIZ_ANSWER_DELAY: Duration = Duration::from_millis(900);

struct Options {
    config: Option<PathBuf>,
    seconds: u64,
    dump_motion_view: Option<PathBuf>,
}

fn parse_args() -> Result<Options> {
    let mut options = Options {
        config: None,
        seconds: 10,
        dump_motion_view: None,
    };
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--seconds" => {
                let value = args.next().context("--seconds needs a value")?;
                options.seconds = value.parse().with_context(|| format!("invalid --seconds `{value}`"))?;
            }
            "--dump-motion-view" => {
                options.dump_motion_view = Some(args.next().context("--dump-motion-view needs a path")?.into());
            }
            path => options.config = Some(path.into()),
        }
    }
    Ok(options)
}

/// Logs status and score changes instead of drawing.
#[derive(Default)]
struct LogRenderer {
    last_status: Option<Status>,
    last_score: u32,
    last_view: Option<RgbaImage>,
}

impl Renderer for LogRenderer {
    fn draw_scene(&mut self, scene: &SceneSnapshot) {
        if self.last_status != Some(scene.status) {
            info!("{}", scene.status);
            self.last_status = Some(scene.status);
        }
        if scene.score != self.last_score {
            info!(
                score = scene.score,
                best = scene.best_score,
                x = scene.player.x,
                "{} | {} | {}",
                scene.speed,
                scene.reaction,
                scene.coach
            );
            self.last_score = scene.score;
        }
    }

    fn draw_motion_view(&mut self, view: &RgbaImage) {
        self.last_view = Some(view.clone());
    }
}

/// Answers every quiz after a short pause, right most of the time.
struct AutoQuiz {
    commands: mpsc::UnboundedSender<Command>,
}

impl QuizPresenter for AutoQuiz {
    fn present(&mut self, concept: &'static Concept) {
        let question = &concept.question;
        let choice = if rand::thread_rng().gen_bool(0.75) {
            question.answer
        } else {
            (question.answer + 1) % question.choices.len()
        };
        let correct = question.is_correct(choice);
        info!(
            "{}: {} -> {}",
            concept.title,
            question.prompt,
            question.choices[choice]
        );
        let commands = self.commands.clone();
        tokio::spawn(async move {
            tokio::time::sleep(QUIZ_ANSWER_DELAY).await;
            let _ = commands.send(Command::QuizFinished { correct });
        });
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let options = parse_args()?;
    let config = match &options.config {
        Some(path) => GameConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => GameConfig::default(),
    };

    let camera = SweepCamera::new(config.motion.analysis_width, config.motion.analysis_height)
        .with_period(60)
        .with_hops(150);
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut scheduler = Scheduler::new(
        config,
        camera,
        LogRenderer::default(),
        FileStore::open(STORE_PATH),
        AutoQuiz {
            commands: command_tx.clone(),
        },
    )?;

    command_tx.send(Command::Start)?;
    let run_for = Duration::from_secs(options.seconds);
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(run_for) => info!("demo time elapsed"),
            _ = tokio::signal::ctrl_c() => info!("interrupted"),
        }
        let _ = shutdown_tx.send(true);
    });

    let summary = scheduler.run(StdRng::from_entropy(), command_rx, shutdown_rx).await;
    info!(
        phase = ?summary.phase,
        score = summary.score,
        best = summary.best_score,
        frames = summary.frames_analyzed,
        ticks = summary.display_ticks,
        "run finished"
    );

    if let Some(path) = options.dump_motion_view {
        match &scheduler.renderer().last_view {
            Some(view) => {
                save_png(&path, view).with_context(|| format!("writing {}", path.display()))?;
                info!(path = %path.display(), "motion view saved");
            }
            None => info!("no motion view to save"),
        }
    }

    Ok(())
}
