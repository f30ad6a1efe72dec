//! Angle-based contour refinement.
//!
//! Every contour point is compared with its neighbors `spacing` steps away
//! along the (circular) contour. Points whose local bend does not point toward
//! the contour centroid are dropped before the final fit; this removes flat
//! runs and notches cut into the pupil edge by eyelids or glints.

use crate::config::RefineConfig;
use crate::contour::Contour;

/// Neighbor offset for a contour of `n` points: `max(1, floor(n × fraction))`.
pub fn neighbor_spacing(n: usize, sample_fraction: f64) -> usize {
    ((n as f64 * sample_fraction).floor() as usize).max(1)
}

/// Filter `contour` down to the points whose bend faces the interior.
///
/// For point `p` with neighbors `prev`/`next`, `v1 = prev − p`, `v2 = next − p`.
/// `p` is kept iff the angle between `v1` and `v2` is defined and
/// `(centroid − p) · (v1 + v2) / 2 >= cos(angle_threshold)`.
/// The output is an order-preserving subset of the input.
pub fn refine_contour(contour: &Contour, config: &RefineConfig) -> Vec<[i32; 2]> {
    let pts = &contour.points;
    let n = pts.len();
    if n == 0 {
        return Vec::new();
    }

    let cx = pts.iter().map(|p| p[0] as f64).sum::<f64>() / n as f64;
    let cy = pts.iter().map(|p| p[1] as f64).sum::<f64>() / n as f64;
    let spacing = neighbor_spacing(n, config.sample_fraction) % n;
    let cos_threshold = config.angle_threshold_deg.to_radians().cos();

    let kept: Vec<[i32; 2]> = (0..n)
        .filter(|&i| {
            let cur = pts[i];
            let prev = pts[(i + n - spacing) % n];
            let next = pts[(i + spacing) % n];
            let v1 = [(prev[0] - cur[0]) as f64, (prev[1] - cur[1]) as f64];
            let v2 = [(next[0] - cur[0]) as f64, (next[1] - cur[1]) as f64];

            let norms = v1[0].hypot(v1[1]) * v2[0].hypot(v2[1]);
            let angle = ((v1[0] * v2[0] + v1[1] * v2[1]) / norms).clamp(-1.0, 1.0).acos();
            if !angle.is_finite() {
                return false;
            }

            let to_centroid = [cx - cur[0] as f64, cy - cur[1] as f64];
            let bend = [(v1[0] + v2[0]) / 2.0, (v1[1] + v2[1]) / 2.0];
            to_centroid[0] * bend[0] + to_centroid[1] * bend[1] >= cos_threshold
        })
        .map(|i| pts[i])
        .collect();

    tracing::trace!("refined contour {} -> {} points (spacing {})", n, kept.len(), spacing);
    kept
}
