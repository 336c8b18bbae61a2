// THEORY:
// The `pipeline` module is the top-level API of the motion side of the runner. It
// encapsulates differencing, centroid estimation, smoothing and jump recognition
// behind a single call: hand it a camera frame, receive a `FrameAnalysis`.
//
// Stages, in strict order for every frame:
//   1. Temporal analysis: `FrameDifferencer` → motion mask + diagnostic view.
//   2. Spatial reduction: `CentroidEstimator` → one `MotionSample` (or none).
//   3. Temporal smoothing: `MotionSmoother` → `SmoothedSignal`.
//   4. Gesture analysis: `JumpDetector` on the previous/current smoothed y.
//
// The pipeline owns the smoothed signal. Consumers only ever see copies of it in
// a `MotionReport`; nothing downstream writes back.

use crate::config::GameConfig;
use crate::core_modules::centroid::{CentroidEstimator, CentroidReading};
use crate::core_modules::frame_differencer::FrameDifferencer;
use crate::core_modules::smoother::{JumpDetector, MotionSmoother};
use crate::error::Result;
use image::RgbaImage;
use std::sync::Arc;
use std::time::Instant;

// Re-export key data structures for the public API.
pub use crate::core_modules::centroid::MotionSample;
pub use crate::core_modules::smoother::SmoothedSignal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionStatus {
    /// Enough activity this frame; the signal was updated.
    Tracking,
    /// Too little activity; the signal was held.
    NoMotion,
}

/// The per-frame output consumed by the game.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionReport {
    pub status: MotionStatus,
    pub signal: SmoothedSignal,
    pub active_pixels: u32,
    /// One-shot jump event fired on this frame.
    pub jump: bool,
    /// Frames analyzed since the last reset.
    pub frame_index: u64,
    /// Frames that carried a signal since the last reset.
    pub signal_frames: u64,
    /// Consecutive frames without a signal.
    pub quiet_frames: u64,
}

/// A report together with its diagnostic visualization.
#[derive(Debug, Clone)]
pub struct FrameAnalysis {
    pub report: MotionReport,
    pub visualization: Arc<RgbaImage>,
}

pub struct MotionPipeline {
    differencer: FrameDifferencer,
    estimator: CentroidEstimator,
    smoother: MotionSmoother,
    jump_detector: Option<JumpDetector>,
    frame_index: u64,
    signal_frames: u64,
    quiet_frames: u64,
}

impl MotionPipeline {
    pub fn new(config: &GameConfig) -> Self {
        let motion = &config.motion;
        let caps = config.capabilities;
        Self {
            differencer: FrameDifferencer::new(
                motion.analysis_width,
                motion.analysis_height,
                motion.motion_threshold,
                motion.mirror,
            ),
            estimator: CentroidEstimator::new(motion, caps.weighted_centroid, caps.jump_detection),
            smoother: MotionSmoother::new(motion, caps.adaptive_follow),
            jump_detector: caps.jump_detection.then(|| JumpDetector::new(motion)),
            frame_index: 0,
            signal_frames: 0,
            quiet_frames: 0,
        }
    }

    pub fn process_frame(&mut self, frame: &RgbaImage, now: Instant) -> Result<FrameAnalysis> {
        // Stage 1: Temporal Analysis
        let difference = self.differencer.process(frame)?;
        self.frame_index += 1;

        // Stage 2: Spatial Reduction
        let reading = self.estimator.estimate(&difference.mask);
        let active_pixels = reading.active_pixels();

        let (status, jump) = match reading {
            CentroidReading::NoSignal { .. } => {
                self.quiet_frames += 1;
                (MotionStatus::NoMotion, false)
            }
            CentroidReading::Signal(sample) => {
                self.quiet_frames = 0;
                self.signal_frames += 1;

                // Stage 3: Temporal Smoothing
                let previous_y = self.smoother.signal().y;
                let signal = self.smoother.update(&sample);

                // Stage 4: Gesture Analysis
                let jump = self
                    .jump_detector
                    .as_mut()
                    .is_some_and(|detector| detector.observe(previous_y, signal.y, active_pixels, now));
                (MotionStatus::Tracking, jump)
            }
        };

        Ok(FrameAnalysis {
            report: MotionReport {
                status,
                signal: self.smoother.signal(),
                active_pixels,
                jump,
                frame_index: self.frame_index,
                signal_frames: self.signal_frames,
                quiet_frames: self.quiet_frames,
            },
            visualization: Arc::new(difference.visualization),
        })
    }

    pub fn signal(&self) -> SmoothedSignal {
        self.smoother.signal()
    }

    /// Back to a centred signal and a cold differencer.
    pub fn reset(&mut self) {
        self.smoother.reset();
        if let Some(detector) = self.jump_detector.as_mut() {
            detector.reset();
        }
        self.differencer.reset();
        self.frame_index = 0;
        self.signal_frames = 0;
        self.quiet_frames = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MotionConfig;
    use image::Rgba;
    use proptest::prelude::*;
    use std::time::Duration;

    fn small_config() -> GameConfig {
        GameConfig {
            motion: MotionConfig {
                analysis_width: 40,
                analysis_height: 30,
                mirror: false,
                crop_top_frac: 0.0,
                crop_bottom_frac: 0.0,
                sample_stride: 1,
                min_active_pixels: 20,
                jump_min_active_pixels: 30,
                jump_max_active_pixels: 600,
                ..MotionConfig::default()
            },
            ..GameConfig::default()
        }
    }

    fn frame_with_block(x0: u32, y0: u32, size: u32) -> RgbaImage {
        let mut frame = RgbaImage::from_pixel(40, 30, Rgba([0, 0, 0, 255]));
        for y in y0..(y0 + size).min(30) {
            for x in x0..(x0 + size).min(40) {
                frame.put_pixel(x, y, Rgba([255, 255, 255, 255]));
            }
        }
        frame
    }

    #[test]
    fn uniform_frames_hold_the_signal() {
        let mut pipeline = MotionPipeline::new(&small_config());
        let now = Instant::now();
        let gray = RgbaImage::from_pixel(40, 30, Rgba([128, 128, 128, 255]));
        pipeline.process_frame(&gray, now).unwrap();
        let analysis = pipeline.process_frame(&gray, now).unwrap();

        assert_eq!(analysis.report.status, MotionStatus::NoMotion);
        assert_eq!(analysis.report.active_pixels, 0);
        assert_eq!(analysis.report.signal, SmoothedSignal::default());
        assert_eq!(analysis.report.quiet_frames, 2);
        assert_eq!(analysis.visualization.dimensions(), (40, 30));
    }

    #[test]
    fn motion_on_the_right_pulls_signal_right() {
        let mut pipeline = MotionPipeline::new(&small_config());
        let now = Instant::now();
        pipeline.process_frame(&frame_with_block(0, 0, 0), now).unwrap();
        let analysis = pipeline.process_frame(&frame_with_block(30, 10, 10), now).unwrap();

        assert_eq!(analysis.report.status, MotionStatus::Tracking);
        assert!(analysis.report.signal.x > 0.5);
        assert_eq!(analysis.report.signal_frames, 1);
        assert_eq!(analysis.report.quiet_frames, 0);
    }

    #[test]
    fn rising_block_triggers_one_jump() {
        let mut pipeline = MotionPipeline::new(&small_config());
        let start = Instant::now();
        let black = frame_with_block(0, 0, 0);
        pipeline.process_frame(&black, start).unwrap();

        // A block flashing high in the frame drags y up sharply.
        let high = frame_with_block(15, 0, 8);
        let first = pipeline.process_frame(&high, start + Duration::from_millis(33)).unwrap();
        assert!(first.report.jump);

        // Flash again right away: still inside the cooldown.
        pipeline.process_frame(&black, start + Duration::from_millis(66)).unwrap();
        let second = pipeline.process_frame(&high, start + Duration::from_millis(99)).unwrap();
        assert!(!second.report.jump);
    }

    #[test]
    fn jump_detection_can_be_disabled() {
        let mut config = small_config();
        config.capabilities.jump_detection = false;
        let mut pipeline = MotionPipeline::new(&config);
        let now = Instant::now();
        pipeline.process_frame(&frame_with_block(0, 0, 0), now).unwrap();
        let analysis = pipeline.process_frame(&frame_with_block(15, 0, 8), now).unwrap();
        assert!(!analysis.report.jump);
        assert_eq!(analysis.report.signal.y, 0.5);
    }

    #[test]
    fn reset_centres_the_signal() {
        let mut pipeline = MotionPipeline::new(&small_config());
        let now = Instant::now();
        pipeline.process_frame(&frame_with_block(0, 0, 0), now).unwrap();
        pipeline.process_frame(&frame_with_block(30, 10, 10), now).unwrap();
        pipeline.reset();
        assert_eq!(pipeline.signal(), SmoothedSignal::default());
    }

    #[test]
    fn reset_restarts_frame_counters() {
        let mut pipeline = MotionPipeline::new(&small_config());
        let now = Instant::now();
        pipeline.process_frame(&frame_with_block(0, 0, 0), now).unwrap();
        pipeline.process_frame(&frame_with_block(30, 10, 10), now).unwrap();
        pipeline.reset();
        let report = pipeline.process_frame(&frame_with_block(30, 10, 10), now).unwrap().report;
        assert_eq!(report.frame_index, 1);
        assert_eq!(report.signal_frames, 0);
        assert_eq!(report.status, MotionStatus::NoMotion);
    }

    proptest! {
        #[test]
        fn sparse_activity_never_moves_the_signal(x in 0u32..20, y in 0u32..26, size in 0u32..5) {
            let mut pipeline = MotionPipeline::new(&small_config());
            let now = Instant::now();
            pipeline.process_frame(&frame_with_block(0, 0, 0), now).unwrap();
            let big = frame_with_block(30, 10, 10);
            pipeline.process_frame(&big, now).unwrap();
            pipeline.process_frame(&big, now).unwrap();
            let before = pipeline.signal();

            // At most 16 new active pixels, below the floor of 20.
            let mut sparse = big.clone();
            for py in y..(y + size).min(30) {
                for px in x..(x + size).min(20) {
                    sparse.put_pixel(px, py, Rgba([255, 255, 255, 255]));
                }
            }
            let held = pipeline.process_frame(&sparse, now).unwrap();
            prop_assert_eq!(held.report.status, MotionStatus::NoMotion);
            prop_assert_eq!(held.report.signal, before);
        }
    }
}
