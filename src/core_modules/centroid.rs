// THEORY:
// The `CentroidEstimator` reduces a whole `MotionMask` to a single point: where,
// on average, the scene changed. For a person moving in front of a webcam that
// point follows their torso closely enough to steer an avatar.
//
// Algorithm:
// 1.  **Band Restriction**: Only rows inside `[crop_top * H, H - crop_bottom * H)`
//     are inspected. The ceiling and the floor rarely hold a torso but often hold
//     flicker and clutter.
// 2.  **Sub-sampling**: Only every `stride`-th row and column is visited. Motion
//     regions are large, so this loses nothing but compute.
// 3.  **Magnitude Weighting**: In weighted mode each active pixel contributes its
//     luma delta as weight, exactly like a heat-weighted centre of mass; in simple
//     mode each contributes 1.
// 4.  **Activity Floor**: If no more than `min_active_pixels` qualify, the frame
//     reports `NoSignal`. Camera grain and lighting flicker produce sparse active
//     pixels and must not be mistaken for deliberate motion.

use crate::config::MotionConfig;
use crate::core_modules::frame_differencer::MotionMask;

/// The raw control signal extracted from one analyzed frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSample {
    /// Active pixels inside the sampled band.
    pub active_pixels: u32,
    /// Weighted mean x divided by frame width, in [0, 1].
    pub centroid_x: f32,
    /// Weighted mean y divided by frame height, when vertical tracking is on.
    pub centroid_y: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CentroidReading {
    /// Too little activity; the caller holds its previous signal.
    NoSignal { active_pixels: u32 },
    Signal(MotionSample),
}

impl CentroidReading {
    pub fn active_pixels(&self) -> u32 {
        match self {
            CentroidReading::NoSignal { active_pixels } => *active_pixels,
            CentroidReading::Signal(sample) => sample.active_pixels,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CentroidEstimator {
    crop_top_frac: f32,
    crop_bottom_frac: f32,
    stride: u32,
    min_active_pixels: u32,
    weighted: bool,
    track_vertical: bool,
}

impl CentroidEstimator {
    pub fn new(config: &MotionConfig, weighted: bool, track_vertical: bool) -> Self {
        Self {
            crop_top_frac: config.crop_top_frac,
            crop_bottom_frac: config.crop_bottom_frac,
            stride: config.sample_stride.max(1),
            min_active_pixels: config.min_active_pixels,
            weighted,
            track_vertical,
        }
    }

    /// Rows `[start, end)` that are inspected for a frame of `height` rows.
    pub fn band(&self, height: u32) -> (u32, u32) {
        let start = (height as f32 * self.crop_top_frac).floor() as u32;
        let end = height.saturating_sub((height as f32 * self.crop_bottom_frac).floor() as u32);
        (start.min(height), end.max(start))
    }

    pub fn estimate(&self, mask: &MotionMask) -> CentroidReading {
        let (width, height) = (mask.width(), mask.height());
        let (band_start, band_end) = self.band(height);

        let mut active_pixels = 0u32;
        let mut total_weight = 0.0f64;
        let mut sum_x = 0.0f64;
        let mut sum_y = 0.0f64;

        for y in (band_start..band_end).step_by(self.stride as usize) {
            for x in (0..width).step_by(self.stride as usize) {
                let delta = mask.delta(x, y);
                if delta == 0 {
                    continue;
                }
                let weight = if self.weighted { delta as f64 } else { 1.0 };
                active_pixels += 1;
                total_weight += weight;
                sum_x += x as f64 * weight;
                sum_y += y as f64 * weight;
            }
        }

        if active_pixels <= self.min_active_pixels || total_weight <= 0.0 {
            return CentroidReading::NoSignal { active_pixels };
        }

        let centroid_x = (sum_x / total_weight / width as f64) as f32;
        let centroid_y = self
            .track_vertical
            .then(|| (sum_y / total_weight / height as f64) as f32);

        CentroidReading::Signal(MotionSample {
            active_pixels,
            centroid_x: centroid_x.clamp(0.0, 1.0),
            centroid_y: centroid_y.map(|y| y.clamp(0.0, 1.0)),
        })
    }
}
