//! Contour extraction and candidate selection on binary masks.
//!
//! Masks are dilated to merge fragments, external borders are traced with
//! `imageproc`, and each traced chain is compressed to its direction-change
//! points before filtering by area and bounding-box aspect ratio.

use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::distance_transform::Norm;
use serde::{Deserialize, Serialize};

use crate::config::ContourConfig;

/// Side of the square structuring element used to merge mask fragments.
pub const DILATION_KERNEL: u8 = 5;
/// Number of dilation passes.
pub const DILATION_ITERATIONS: u8 = 2;

/// Closed, ordered border of one connected foreground region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contour {
    /// Pixel coordinates `[x, y]`, in tracing order; the last point connects to the first.
    pub points: Vec<[i32; 2]>,
}

impl Contour {
    pub fn new(points: Vec<[i32; 2]>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Enclosed polygon area (shoelace formula).
    pub fn area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let twice: i64 = (0..n)
            .map(|i| {
                let [x0, y0] = self.points[i];
                let [x1, y1] = self.points[(i + 1) % n];
                x0 as i64 * y1 as i64 - x1 as i64 * y0 as i64
            })
            .sum();
        twice.abs() as f64 / 2.0
    }

    /// Inclusive pixel bounding box `[x, y, width, height]`.
    pub fn bounding_box(&self) -> [i32; 4] {
        let mut min = [i32::MAX; 2];
        let mut max = [i32::MIN; 2];
        for p in &self.points {
            for k in 0..2 {
                min[k] = min[k].min(p[k]);
                max[k] = max[k].max(p[k]);
            }
        }
        if self.points.is_empty() {
            return [0, 0, 0, 0];
        }
        [min[0], min[1], max[0] - min[0] + 1, max[1] - min[1] + 1]
    }

    /// `max(w, h) / min(w, h)` of the bounding box.
    pub fn aspect_ratio(&self) -> f64 {
        let [_, _, w, h] = self.bounding_box();
        let (long, short) = (w.max(h), w.min(h));
        if short <= 0 {
            return f64::INFINITY;
        }
        long as f64 / short as f64
    }

    pub fn to_f64_points(&self) -> Vec<[f64; 2]> {
        self.points
            .iter()
            .map(|&[x, y]| [x as f64, y as f64])
            .collect()
    }
}

/// Dilate with a `DILATION_KERNEL` square, `DILATION_ITERATIONS` times.
///
/// Repeated square dilations compose into one square of the summed radius.
pub fn dilate_mask(mask: &GrayImage) -> GrayImage {
    let radius = (DILATION_KERNEL / 2) * DILATION_ITERATIONS;
    imageproc::morphology::dilate(mask, Norm::LInf, radius)
}

/// Drop consecutive duplicates, including a closing point equal to the first.
fn dedup_closed(points: &mut Vec<[i32; 2]>) {
    points.dedup();
    while points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
}

/// Keep only the points where the chain changes direction.
///
/// Interior points of horizontal, vertical and diagonal runs are removed, so a
/// rectangle reduces to its four corners.
pub fn compress_chain(points: &[[i32; 2]]) -> Vec<[i32; 2]> {
    let mut pts = points.to_vec();
    dedup_closed(&mut pts);
    let n = pts.len();
    if n < 3 {
        return pts;
    }
    (0..n)
        .filter(|&i| {
            let prev = pts[(i + n - 1) % n];
            let cur = pts[i];
            let next = pts[(i + 1) % n];
            let d_in = [cur[0] - prev[0], cur[1] - prev[1]];
            let d_out = [next[0] - cur[0], next[1] - cur[1]];
            d_in != d_out
        })
        .map(|i| pts[i])
        .collect()
}

/// Outer borders of top-level foreground regions, chain-compressed.
///
/// The mask is traced inside a 1 px background frame. `find_contours` labels
/// a region whose first scanned pixel lies in column 0 as a hole, so regions
/// touching the left edge would otherwise be lost.
pub fn external_contours(mask: &GrayImage) -> Vec<Contour> {
    let (w, h) = mask.dimensions();
    let mut padded = GrayImage::new(w + 2, h + 2);
    image::imageops::replace(&mut padded, mask, 1, 1);

    find_contours::<i32>(&padded)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| {
            let raw: Vec<[i32; 2]> = c.points.iter().map(|p| [p.x - 1, p.y - 1]).collect();
            Contour::new(compress_chain(&raw))
        })
        .collect()
}

/// Largest contour passing the area and aspect-ratio filters; the first one
/// traced wins equal areas.
pub fn largest_qualifying(contours: Vec<Contour>, config: &ContourConfig) -> Option<Contour> {
    let mut best: Option<(f64, Contour)> = None;
    for contour in contours {
        let area = contour.area();
        if area < config.min_area || contour.aspect_ratio() > config.max_aspect_ratio {
            continue;
        }
        if best.as_ref().map_or(true, |(a, _)| area > *a) {
            best = Some((area, contour));
        }
    }
    best.map(|(_, c)| c)
}

/// Outcome of candidate selection on one threshold level.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Dilated mask the contour was traced on.
    pub dilated: GrayImage,
    /// Best qualifying contour; `None` is a normal outcome.
    pub contour: Option<Contour>,
}

/// Dilate `mask`, trace external contours, and keep the best qualifying one.
pub fn select_candidate(mask: &GrayImage, config: &ContourConfig) -> Candidate {
    let dilated = dilate_mask(mask);
    let contour = largest_qualifying(external_contours(&dilated), config);
    Candidate { dilated, contour }
}
