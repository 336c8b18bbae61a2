// THEORY:
// A single error type for the whole crate. Almost nothing in the runner is a
// real failure: a missing camera frame, a quiet scene and even a collision are
// normal states. What remains are the few things a host actually has to act on:
// the camera could not be opened, a frame arrived at the wrong size, or the
// configuration does not describe a playable game.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Camera unavailable: {0}")]
    CameraUnavailable(String),

    #[error("Frame size mismatch: expected {expected_width}x{expected_height}, got {width}x{height}")]
    FrameSize {
        expected_width: u32,
        expected_height: u32,
        width: u32,
        height: u32,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RunnerError>;
