//! Ellipse-goodness score of a candidate contour.
//!
//! The score rewards contours whose fitted ellipse is both well filled by the
//! mask and closely followed by the contour border:
//!
//! `composite = filled_ratio × border_pixel_count² × border_ratio`

use image::{GrayImage, Luma};
use imageproc::drawing::draw_line_segment_mut;
use serde::{Deserialize, Serialize};

use crate::conic::{fit_ellipse_direct, Ellipse, MIN_FIT_POINTS};
use crate::contour::Contour;

/// Half-width (px) of the perimeter band counted in `border_pixel_count`.
pub const OUTER_BAND_HALF_WIDTH: f64 = 5.0;
/// Half-width (px) of the perimeter band counted in `border_ratio`.
pub const INNER_BAND_HALF_WIDTH: f64 = 2.0;

/// Score components for one candidate. All zero when no ellipse could be fitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    /// Foreground pixels inside the fitted ellipse / ellipse pixel area.
    pub filled_ratio: f64,
    /// Border pixels within the outer band around the ellipse perimeter.
    pub border_pixel_count: usize,
    /// Border pixels within the inner band / all border pixels.
    pub border_ratio: f64,
    pub composite: f64,
}

impl CandidateScore {
    fn new(filled_ratio: f64, border_pixel_count: usize, border_ratio: f64) -> Self {
        let count = border_pixel_count as f64;
        Self {
            filled_ratio,
            border_pixel_count,
            border_ratio,
            composite: filled_ratio * count * count * border_ratio,
        }
    }
}

/// Score plus the ellipse it was computed against.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoredCandidate {
    pub score: CandidateScore,
    pub ellipse: Option<Ellipse>,
}

/// Score `contour` against the (dilated) `mask` it was traced on.
///
/// Contours with fewer than [`MIN_FIT_POINTS`] points, or whose fit is not an
/// ellipse, score zero.
pub fn score_candidate(mask: &GrayImage, contour: &Contour) -> ScoredCandidate {
    if contour.len() < MIN_FIT_POINTS {
        return ScoredCandidate::default();
    }
    let Some(ellipse) = fit_ellipse_direct(&contour.to_f64_points()) else {
        return ScoredCandidate::default();
    };

    let filled_ratio = filled_ratio(mask, &ellipse);

    let border = border_pixels(contour);
    let conic = ellipse.to_conic();
    let mut in_outer = 0usize;
    let mut in_inner = 0usize;
    for &[x, y] in &border {
        let d = conic.sampson_distance(x as f64, y as f64);
        if d <= OUTER_BAND_HALF_WIDTH {
            in_outer += 1;
        }
        if d <= INNER_BAND_HALF_WIDTH {
            in_inner += 1;
        }
    }
    let border_ratio = if border.is_empty() {
        0.0
    } else {
        in_inner as f64 / border.len() as f64
    };

    ScoredCandidate {
        score: CandidateScore::new(filled_ratio, in_outer, border_ratio),
        ellipse: Some(ellipse),
    }
}

/// Fraction of the ellipse's pixel area that is foreground in `mask`.
fn filled_ratio(mask: &GrayImage, ellipse: &Ellipse) -> f64 {
    let (w, h) = mask.dimensions();
    let [bx0, by0, bx1, by1] = ellipse.bounding_box();
    let x0 = bx0.floor().max(0.0) as u32;
    let y0 = by0.floor().max(0.0) as u32;
    let x1 = (bx1.ceil().max(-1.0) as i64 + 1).clamp(0, w as i64) as u32;
    let y1 = (by1.ceil().max(-1.0) as i64 + 1).clamp(0, h as i64) as u32;

    let mut area = 0usize;
    let mut covered = 0usize;
    for y in y0..y1 {
        for x in x0..x1 {
            if ellipse.normalized_radius_sq(x as f64, y as f64) <= 1.0 {
                area += 1;
                if mask.get_pixel(x, y)[0] != 0 {
                    covered += 1;
                }
            }
        }
    }
    if area == 0 {
        return 0.0;
    }
    covered as f64 / area as f64
}

/// Distinct pixels of the closed polyline through the contour points.
pub fn border_pixels(contour: &Contour) -> Vec<[i32; 2]> {
    let [bx, by, bw, bh] = contour.bounding_box();
    if bw <= 0 || bh <= 0 {
        return Vec::new();
    }
    let mut canvas = GrayImage::new(bw as u32, bh as u32);
    let n = contour.len();
    for i in 0..n {
        let [x0, y0] = contour.points[i];
        let [x1, y1] = contour.points[(i + 1) % n];
        draw_line_segment_mut(
            &mut canvas,
            ((x0 - bx) as f32, (y0 - by) as f32),
            ((x1 - bx) as f32, (y1 - by) as f32),
            Luma([255u8]),
        );
    }
    canvas
        .enumerate_pixels()
        .filter(|(_, _, p)| p[0] != 0)
        .map(|(x, y, _)| [x as i32 + bx, y as i32 + by])
        .collect()
}
