//! Coarse dark-region search.
//!
//! Blocks are visited on a regular grid inside the ignored border; each block
//! is scored by the sum of a sparse sample of its pixels. The darkest block's
//! center seeds the rest of the pipeline.

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::config::SeedConfig;
use crate::error::TrackError;

/// Coarse pupil location in frame pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedPoint {
    pub x: u32,
    pub y: u32,
}

impl SeedPoint {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another seed.
    pub fn distance(&self, other: &SeedPoint) -> f64 {
        let dx = self.x as f64 - other.x as f64;
        let dy = self.y as f64 - other.y as f64;
        dx.hypot(dy)
    }
}

/// Smallest frame side that leaves room for one block inside the ignored border.
pub fn min_frame_side(config: &SeedConfig) -> u32 {
    2 * config.ignore_bounds + config.block_size
}

/// Locate the darkest sparse-sampled block.
///
/// Block corners run from `ignore_bounds` up to (exclusive)
/// `side − ignore_bounds − block_size` with step `block_stride`, row-major.
/// The first block with the strictly smallest sum wins ties.
pub fn locate_seed(gray: &GrayImage, config: &SeedConfig) -> Result<SeedPoint, TrackError> {
    let (w, h) = gray.dimensions();
    let min_side = min_frame_side(config);
    let no_seed = TrackError::NoSeed {
        width: w,
        height: h,
        min_side,
    };
    if w < min_side || h < min_side {
        return Err(no_seed);
    }

    let x_end = w - config.ignore_bounds - config.block_size;
    let y_end = h - config.ignore_bounds - config.block_size;
    let stride = config.block_stride as usize;
    let sample = config.sample_stride as usize;

    let mut best: Option<(u32, u32, u32)> = None;
    for y in (config.ignore_bounds..y_end).step_by(stride) {
        for x in (config.ignore_bounds..x_end).step_by(stride) {
            let mut sum = 0u32;
            for dy in (0..config.block_size).step_by(sample) {
                for dx in (0..config.block_size).step_by(sample) {
                    sum += gray.get_pixel(x + dx, y + dy)[0] as u32;
                }
            }
            if best.map_or(true, |(s, _, _)| sum < s) {
                best = Some((sum, x, y));
            }
        }
    }

    let (_, x, y) = best.ok_or(no_seed)?;
    let half = config.block_size / 2;
    Ok(SeedPoint::new(x + half, y + half))
}
