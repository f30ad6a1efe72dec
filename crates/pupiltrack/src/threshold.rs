//! Multi-level inverted thresholding around the seed point.

use image::{GrayImage, Luma};
use serde::{Deserialize, Serialize};

use crate::config::ThresholdConfig;
use crate::seed::SeedPoint;

/// Foreground value in binary masks.
pub const FOREGROUND: u8 = 255;

/// Threshold strictness, ordered from the smallest margin to the largest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdLevel {
    Strict,
    Medium,
    Relaxed,
}

impl ThresholdLevel {
    /// Fixed scan order; earlier levels win score ties.
    pub const ALL: [ThresholdLevel; 3] = [Self::Strict, Self::Medium, Self::Relaxed];

    pub fn index(self) -> usize {
        match self {
            Self::Strict => 0,
            Self::Medium => 1,
            Self::Relaxed => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Medium => "medium",
            Self::Relaxed => "relaxed",
        }
    }
}

impl std::fmt::Display for ThresholdLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Inverted binary threshold: pixels strictly darker than `threshold` become foreground.
pub fn threshold_below(gray: &GrayImage, threshold: u16) -> GrayImage {
    let mut out = GrayImage::new(gray.width(), gray.height());
    for (dst, src) in out.pixels_mut().zip(gray.pixels()) {
        if (src[0] as u16) < threshold {
            *dst = Luma([FOREGROUND]);
        }
    }
    out
}

/// Clear every pixel outside the `size × size` square centered at `seed`,
/// clipped to the frame.
pub fn mask_outside_square(mask: &mut GrayImage, seed: SeedPoint, size: u32) {
    let (w, h) = mask.dimensions();
    let half = size / 2;
    let x0 = seed.x.saturating_sub(half);
    let y0 = seed.y.saturating_sub(half);
    let x1 = seed.x.saturating_add(half).min(w);
    let y1 = seed.y.saturating_add(half).min(h);

    for (x, y, p) in mask.enumerate_pixels_mut() {
        if x < x0 || x >= x1 || y < y0 || y >= y1 {
            *p = Luma([0]);
        }
    }
}

/// Build the strict/medium/relaxed masks for one frame.
///
/// The threshold of each level is the intensity at the seed plus that level's
/// margin. Never fails; masks may be empty.
pub fn threshold_levels(gray: &GrayImage, seed: SeedPoint, config: &ThresholdConfig) -> [GrayImage; 3] {
    let darkest = gray.get_pixel(seed.x, seed.y)[0] as u16;
    ThresholdLevel::ALL.map(|level| {
        let margin = config.margins[level.index()] as u16;
        let mut mask = threshold_below(gray, darkest + margin);
        mask_outside_square(&mut mask, seed, config.mask_size);
        mask
    })
}

/// Number of foreground pixels in a mask.
pub fn foreground_count(mask: &GrayImage) -> usize {
    mask.as_raw().iter().filter(|&&v| v != 0).count()
}
