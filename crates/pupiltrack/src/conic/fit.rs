//! Direct least-squares ellipse fitting (Fitzgibbon et al., 1999).

use nalgebra::{DMatrix, Matrix3, Vector6};

use super::eigen::constrained_eigenvector;
use super::types::{ConicCoeffs, Ellipse};

/// Fewest points that determine a conic.
pub const MIN_FIT_POINTS: usize = 5;

/// Fit a conic constrained to be an ellipse.
///
/// Points are shifted to their centroid and scaled to a mean radius of √2
/// before building the design matrix; the result is mapped back to pixel
/// coordinates. Returns `None` for fewer than [`MIN_FIT_POINTS`] points or when
/// the solution is not a proper ellipse (collinear or duplicate points, etc.).
pub fn fit_conic_direct(points: &[[f64; 2]]) -> Option<ConicCoeffs> {
    let n = points.len();
    if n < MIN_FIT_POINTS {
        return None;
    }

    // Shift to the centroid and scale so the mean distance from it is √2.
    // Squared pixel coordinates otherwise dominate the scatter matrix.
    let (mean_x, mean_y, scale) = normalization_params(points);

    // Design matrix D with rows [x², xy, y², x, y, 1] in normalized coords.
    let mut d = DMatrix::<f64>::zeros(n, 6);
    for (i, &[px, py]) in points.iter().enumerate() {
        let x = (px - mean_x) * scale;
        let y = (py - mean_y) * scale;
        d[(i, 0)] = x * x;
        d[(i, 1)] = x * y;
        d[(i, 2)] = y * y;
        d[(i, 3)] = x;
        d[(i, 4)] = y;
        d[(i, 5)] = 1.0;
    }

    // Scatter matrix S = Dᵀ D, partitioned into 3x3 blocks:
    //   S = [S11  S12]
    //       [S21  S22]
    // S11 couples the quadratic terms (A, B, C), S22 the linear terms (D, E, F).
    let s = d.transpose() * &d;
    let s11 = s.fixed_view::<3, 3>(0, 0).into_owned();
    let s12 = s.fixed_view::<3, 3>(0, 3).into_owned();
    let s22 = s.fixed_view::<3, 3>(3, 3).into_owned();

    // C1 encodes 4AC − B² as a quadratic form on (A, B, C).
    let c1 = Matrix3::new(0.0, 0.0, 2.0, 0.0, -1.0, 0.0, 2.0, 0.0, 0.0);

    // Eliminating the linear part gives the reduced eigensystem
    //   (S11 − S12 S22⁻¹ S21) a1 = λ C1 a1
    // solved as C1⁻¹ M a1 = λ a1. C1⁻¹ M is not symmetric; the ellipse is the
    // eigenvector with a1ᵀ C1 a1 > 0.
    let s22_inv = s22.try_inverse()?;
    let reduced = s11 - s12 * s22_inv * s12.transpose();
    let system = c1.try_inverse()? * reduced;

    let a1 = constrained_eigenvector(&system)?;
    // Linear coefficients follow from the quadratic ones: a2 = −S22⁻¹ S21 a1.
    let a2 = -s22_inv * s12.transpose() * a1;

    let normalized = Vector6::new(a1[0], a1[1], a1[2], a2[0], a2[1], a2[2]);
    // Map back to pixel coordinates before the ellipse checks.
    let conic = ConicCoeffs(denormalize_conic(&normalized, mean_x, mean_y, scale));
    if !conic.is_ellipse() {
        return None;
    }
    if !conic.to_ellipse()?.is_valid() {
        return None;
    }
    Some(conic)
}

/// Fit and return the geometric ellipse.
pub fn fit_ellipse_direct(points: &[[f64; 2]]) -> Option<Ellipse> {
    fit_conic_direct(points)?.to_ellipse()
}

/// RMS Sampson distance of `points` to `ellipse`; 0 for an empty set.
pub fn rms_sampson_distance(ellipse: &Ellipse, points: &[[f64; 2]]) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    let conic = ellipse.to_conic();
    let sum_sq: f64 = points
        .iter()
        .map(|&[x, y]| conic.sampson_distance(x, y).powi(2))
        .sum();
    (sum_sq / points.len() as f64).sqrt()
}

/// Centroid and isotropic scale of a point set.
fn normalization_params(points: &[[f64; 2]]) -> (f64, f64, f64) {
    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p[0]).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p[1]).sum::<f64>() / n;
    let mean_dist = points
        .iter()
        .map(|p| (p[0] - mean_x).hypot(p[1] - mean_y))
        .sum::<f64>()
        / n;
    let scale = if mean_dist > 1e-15 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };
    (mean_x, mean_y, scale)
}

/// Substitute x' = s(x − mx), y' = s(y − my) back into the normalized conic.
fn denormalize_conic(c: &Vector6<f64>, mx: f64, my: f64, s: f64) -> [f64; 6] {
    let [a_, b_, c_, d_, e_, f_] = [c[0], c[1], c[2], c[3], c[4], c[5]];
    let s2 = s * s;

    let a = a_ * s2;
    let b = b_ * s2;
    let c = c_ * s2;
    let d = -2.0 * a_ * s2 * mx - b_ * s2 * my + d_ * s;
    let e = -b_ * s2 * mx - 2.0 * c_ * s2 * my + e_ * s;
    let f =
        a_ * s2 * mx * mx + b_ * s2 * mx * my + c_ * s2 * my * my - d_ * s * mx - e_ * s * my + f_;

    [a, b, c, d, e, f]
}
