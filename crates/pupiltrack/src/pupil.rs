//! Final pupil ellipse fit and the per-frame pupil estimate.

use serde::{Deserialize, Serialize};

use crate::conic::{fit_ellipse_direct, rms_sampson_distance, Ellipse, MIN_FIT_POINTS};
use crate::error::TrackError;

/// Fit an ellipse to refined contour points.
///
/// Fails with [`TrackError::InsufficientPoints`] below [`MIN_FIT_POINTS`] and
/// with [`TrackError::DegenerateFit`] when the solution is not a real ellipse.
pub fn fit_pupil_ellipse(points: &[[i32; 2]]) -> Result<Ellipse, TrackError> {
    if points.len() < MIN_FIT_POINTS {
        return Err(TrackError::InsufficientPoints {
            needed: MIN_FIT_POINTS,
            got: points.len(),
        });
    }
    let pts = to_f64(points);
    fit_ellipse_direct(&pts).ok_or(TrackError::DegenerateFit)
}

fn to_f64(points: &[[i32; 2]]) -> Vec<[f64; 2]> {
    points.iter().map(|&[x, y]| [x as f64, y as f64]).collect()
}

/// Per-frame pupil output.
///
/// Axes are full lengths `(major, minor)`; the angle is the major-axis
/// rotation in degrees. An invalid estimate carries the degenerate ellipse
/// `((0, 0), (0, 0), 0)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PupilEstimate {
    pub center: (f32, f32),
    pub axes: (f32, f32),
    pub angle_deg: f32,
    pub valid: bool,
    /// RMS Sampson distance of the refined points to the ellipse (px).
    pub fit_rms_px: f32,
    /// Number of refined points the ellipse was fitted to.
    pub n_points: usize,
}

impl PupilEstimate {
    pub fn invalid() -> Self {
        Self {
            center: (0.0, 0.0),
            axes: (0.0, 0.0),
            angle_deg: 0.0,
            valid: false,
            fit_rms_px: 0.0,
            n_points: 0,
        }
    }

    /// Build a valid estimate from a fitted ellipse and the points behind it.
    pub fn from_fit(ellipse: &Ellipse, points: &[[i32; 2]]) -> Self {
        let rms = rms_sampson_distance(ellipse, &to_f64(points));
        Self {
            center: (ellipse.cx as f32, ellipse.cy as f32),
            axes: ((2.0 * ellipse.a) as f32, (2.0 * ellipse.b) as f32),
            angle_deg: ellipse.angle.to_degrees() as f32,
            valid: true,
            fit_rms_px: rms as f32,
            n_points: points.len(),
        }
    }
}

impl Default for PupilEstimate {
    fn default() -> Self {
        Self::invalid()
    }
}
