// THEORY:
// The `FrameDifferencer` is the temporal layer of the motion system. It keeps
// exactly one frame of memory, the previous `LumaBuffer`, and compares each new
// camera frame against it pixel by pixel.
//
// Key architectural principles:
// 1.  **One Frame of History**: A person stepping sideways changes the luma of the
//     pixels along their silhouette between two consecutive frames. That is all the
//     signal the game needs, so no longer history is kept. The previous buffer is
//     replaced wholesale after every analyzed frame.
// 2.  **Binary Mask, Kept Magnitude**: A pixel is "active" when its luma delta is
//     strictly above the threshold. The delta itself is kept in the `MotionMask`
//     so the centroid stage can weight decisive movement above faint change.
// 3.  **Cold Start**: On the very first frame the previous luma is taken to be the
//     current luma, so the first frame always reports zero motion.
// 4.  **Diagnostics Only**: The visualization frame (active pixels tinted, the rest
//     dimmed to 20% of their luma) is handed to the renderer and never read back.

use crate::core_modules::pixel::pixel::{Luma, Pixel};
use crate::error::{Result, RunnerError};
use image::{Rgba, RgbaImage};

/// Colour painted over active pixels in the diagnostic view.
pub const ACTIVE_TINT: Rgba<u8> = Rgba([40, 240, 90, 255]);
/// Inactive pixels are drawn as grey at this fraction of their luma.
pub const INACTIVE_DIM: f32 = 0.2;

/// A dense grid of single-byte luma samples for one analysis frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LumaBuffer {
    width: u32,
    height: u32,
    samples: Vec<Luma>,
}

impl LumaBuffer {
    /// Converts an RGBA frame to luma, optionally mirrored horizontally.
    pub fn from_frame(frame: &RgbaImage, mirror: bool) -> Self {
        let (width, height) = frame.dimensions();
        let mut samples = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                let source_x = if mirror { width - 1 - x } else { x };
                samples.push(Pixel::from(*frame.get_pixel(source_x, y)).luma());
            }
        }
        Self { width, height, samples }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> Luma {
        self.samples[(y * self.width + x) as usize]
    }

    pub fn samples(&self) -> &[Luma] {
        &self.samples
    }
}

/// Per-pixel motion result: the luma delta for active pixels, zero elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MotionMask {
    width: u32,
    height: u32,
    deltas: Vec<u8>,
    active_count: u32,
}

impl MotionMask {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Luma delta of an active pixel; zero when the pixel is inactive.
    pub fn delta(&self, x: u32, y: u32) -> u8 {
        self.deltas[(y * self.width + x) as usize]
    }

    pub fn is_active(&self, x: u32, y: u32) -> bool {
        self.delta(x, y) > 0
    }

    /// Active pixels over the whole frame, before any cropping or sampling.
    pub fn active_count(&self) -> u32 {
        self.active_count
    }
}

/// Everything one differencing pass produces.
#[derive(Debug, Clone)]
pub struct DifferenceOutput {
    pub mask: MotionMask,
    pub visualization: RgbaImage,
}

pub struct FrameDifferencer {
    width: u32,
    height: u32,
    threshold: u8,
    mirror: bool,
    previous: Option<LumaBuffer>,
}

impl FrameDifferencer {
    pub fn new(width: u32, height: u32, threshold: u8, mirror: bool) -> Self {
        Self {
            width,
            height,
            threshold,
            mirror,
            previous: None,
        }
    }

    /// Differences `frame` against the previous analyzed frame.
    /// A frame of the wrong size is rejected and leaves the stored buffer untouched.
    pub fn process(&mut self, frame: &RgbaImage) -> Result<DifferenceOutput> {
        let (width, height) = frame.dimensions();
        if width != self.width || height != self.height {
            return Err(RunnerError::FrameSize {
                expected_width: self.width,
                expected_height: self.height,
                width,
                height,
            });
        }

        let current = LumaBuffer::from_frame(frame, self.mirror);
        let previous = self.previous.as_ref().unwrap_or(&current);

        let mut deltas = Vec::with_capacity(current.samples.len());
        let mut visualization = RgbaImage::new(width, height);
        let mut active_count = 0u32;

        for (index, (&luma, &prev)) in current.samples.iter().zip(previous.samples.iter()).enumerate() {
            let delta = luma.abs_diff(prev);
            let x = index as u32 % width;
            let y = index as u32 / width;

            if delta > self.threshold {
                deltas.push(delta);
                active_count += 1;
                visualization.put_pixel(x, y, ACTIVE_TINT);
            } else {
                deltas.push(0);
                let faded = (luma as f32 * INACTIVE_DIM).round() as u8;
                visualization.put_pixel(x, y, Rgba([faded, faded, faded, 255]));
            }
        }

        self.previous = Some(current);

        Ok(DifferenceOutput {
            mask: MotionMask {
                width,
                height,
                deltas,
                active_count,
            },
            visualization,
        })
    }

    /// Forgets the previous frame; the next frame reports zero motion.
    pub fn reset(&mut self) {
        self.previous = None;
    }

    pub fn previous(&self) -> Option<&LumaBuffer> {
        self.previous.as_ref()
    }
}
