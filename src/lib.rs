// THEORY:
// This file is the entry point for the `motion_runner` library crate. It exposes
// two halves that meet in the scheduler:
//
// - the motion side: `pipeline::MotionPipeline` turns camera frames into a
//   smoothed control signal and jump events;
// - the game side: `core_modules::session::GameSession` turns that signal into a
//   lane runner with live physics metrics.
//
// `scheduler::Scheduler` runs both as cooperative loops on one thread. Everything
// the core cannot do itself (camera, drawing, storage, quiz overlay) is injected
// through the traits in `interfaces`.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod interfaces;
pub mod pipeline;
pub mod scheduler;
pub mod synthetic;

pub use config::GameConfig;
pub use error::{Result, RunnerError};
pub use pipeline::{MotionPipeline, MotionReport};
pub use scheduler::{Command, Scheduler, SessionSummary};
