// THEORY:
// A stand-in camera. `SweepCamera` renders a bright block on a dark background
// that sweeps left and right across the frame, which is exactly the kind of
// motion a player stepping from lane to lane produces. Optionally the block hops
// upward every few sweeps to exercise jump recognition, and some polls can come
// back empty the way a real device does between frames.
//
// It lets the whole runner (pipeline, scheduler, session) be driven end to end
// without hardware, and it is what the demo binary uses when no camera exists.

use crate::error::{Result, RunnerError};
use crate::interfaces::VideoSource;
use image::{Rgba, RgbaImage};

const BACKGROUND: Rgba<u8> = Rgba([30, 30, 30, 255]);
const BLOCK: Rgba<u8> = Rgba([235, 235, 235, 255]);

#[derive(Debug, Clone)]
pub struct SweepCamera {
    width: u32,
    height: u32,
    block: u32,
    period: u64,
    hop_every: Option<u64>,
    gap_every: Option<u64>,
    available: bool,
    opened: bool,
    frame: u64,
    polls: u64,
}

impl SweepCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            block: (width / 5).max(1),
            period: 90,
            hop_every: None,
            gap_every: None,
            available: true,
            opened: false,
            frame: 0,
            polls: 0,
        }
    }

    /// Frames for one full left-right-left sweep.
    pub fn with_period(mut self, frames: u64) -> Self {
        self.period = frames.max(2);
        self
    }

    /// Lifts the block toward the top of the frame for a few frames every `frames`.
    pub fn with_hops(mut self, frames: u64) -> Self {
        self.hop_every = Some(frames.max(1));
        self
    }

    /// Every `polls`-th poll finds no frame ready. The sweep does not advance on
    /// those polls.
    pub fn with_gaps(mut self, polls: u64) -> Self {
        self.gap_every = Some(polls.max(2));
        self
    }

    /// A camera whose `open` always fails.
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Left edge of the block for frame `index`, following a triangle wave.
    pub fn block_x(&self, index: u64) -> u32 {
        let half = self.period / 2;
        let phase = index % self.period;
        let t = if phase < half {
            phase as f32 / half as f32
        } else {
            (self.period - phase) as f32 / (self.period - half) as f32
        };
        (t * self.width.saturating_sub(self.block) as f32).round() as u32
    }

    fn block_y(&self, index: u64) -> u32 {
        let resting = self.height / 2;
        match self.hop_every {
            Some(every) if index % every < 4 => self.height / 10,
            _ => resting,
        }
    }

    /// Polls answered since `open`, frames or not.
    pub fn polls(&self) -> u64 {
        self.polls
    }

    pub fn frames_delivered(&self) -> u64 {
        self.frame
    }

    pub fn render(&self, index: u64) -> RgbaImage {
        let mut frame = RgbaImage::from_pixel(self.width, self.height, BACKGROUND);
        let (x0, y0) = (self.block_x(index), self.block_y(index));
        for y in y0..(y0 + self.block).min(self.height) {
            for x in x0..(x0 + self.block).min(self.width) {
                frame.put_pixel(x, y, BLOCK);
            }
        }
        frame
    }
}

impl VideoSource for SweepCamera {
    fn open(&mut self) -> Result<()> {
        if !self.available {
            return Err(RunnerError::CameraUnavailable("no capture device".into()));
        }
        self.opened = true;
        Ok(())
    }

    fn current_frame(&mut self) -> Option<RgbaImage> {
        if !self.opened {
            return None;
        }
        self.polls += 1;
        if self.gap_every.is_some_and(|every| self.polls % every == 0) {
            return None;
        }
        let frame = self.render(self.frame);
        self.frame += 1;
        Some(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_frames_before_open() {
        let mut camera = SweepCamera::new(40, 30);
        assert!(camera.current_frame().is_none());
        camera.open().unwrap();
        assert_eq!(camera.current_frame().map(|f| f.dimensions()), Some((40, 30)));
    }

    #[test]
    fn unavailable_camera_fails_to_open() {
        let mut camera = SweepCamera::new(40, 30).unavailable();
        assert!(matches!(camera.open(), Err(RunnerError::CameraUnavailable(_))));
        assert!(camera.current_frame().is_none());
    }

    #[test]
    fn gaps_skip_polls_without_skipping_frames() {
        let mut camera = SweepCamera::new(40, 30).with_period(10).with_gaps(3);
        camera.open().unwrap();
        let polled: Vec<Option<u32>> = (0..6)
            .map(|_| camera.current_frame().map(|f| f.enumerate_pixels().find(|p| *p.2 == BLOCK).map_or(0, |p| p.0)))
            .collect();
        assert_eq!(polled[2], None);
        assert_eq!(polled[5], None);
        assert_eq!(
            polled.iter().flatten().copied().collect::<Vec<_>>(),
            (0..4).map(|i| camera.block_x(i)).collect::<Vec<_>>()
        );
        assert_eq!(camera.polls(), 6);
        assert_eq!(camera.frames_delivered(), 4);
    }

    #[test]
    fn block_sweeps_edge_to_edge() {
        let camera = SweepCamera::new(40, 30).with_period(20);
        assert_eq!(camera.block_x(0), 0);
        assert_eq!(camera.block_x(10), 32);
        assert_eq!(camera.block_x(20), 0);
        assert!(camera.block_x(5) > camera.block_x(2));
    }

    #[test]
    fn hops_lift_the_block() {
        let camera = SweepCamera::new(40, 30).with_hops(30);
        assert_eq!(camera.block_y(0), 3);
        assert_eq!(camera.block_y(10), 15);
        let frame = camera.render(0);
        assert_eq!(*frame.get_pixel(0, 3), BLOCK);
        assert_eq!(*frame.get_pixel(0, 20), BACKGROUND);
    }
}
