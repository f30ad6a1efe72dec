//! Conic coefficients, geometric ellipses, and conversions between them.

use serde::{Deserialize, Serialize};

/// General conic `A x² + B xy + C y² + D x + E y + F = 0`, stored as `[A, B, C, D, E, F]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConicCoeffs(pub [f64; 6]);

/// Geometric ellipse in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ellipse {
    /// Center x.
    pub cx: f64,
    /// Center y.
    pub cy: f64,
    /// Semi-major axis length.
    pub a: f64,
    /// Semi-minor axis length.
    pub b: f64,
    /// Rotation of the major axis from +x, in radians (−π/2, π/2].
    pub angle: f64,
}

impl ConicCoeffs {
    /// Algebraic distance of a point to this conic.
    pub fn algebraic_distance(&self, x: f64, y: f64) -> f64 {
        let [a, b, c, d, e, f] = self.0;
        a * x * x + b * x * y + c * y * y + d * x + e * y + f
    }

    /// `true` when the discriminant `B² − 4AC` is negative.
    pub fn is_ellipse(&self) -> bool {
        let [a, b, c, ..] = self.0;
        b * b - 4.0 * a * c < 0.0
    }

    /// First-order geometric distance of a point to the conic curve.
    pub fn sampson_distance(&self, x: f64, y: f64) -> f64 {
        let [ca, cb, cc, cd, ce, _] = self.0;
        let alg = self.algebraic_distance(x, y);
        let gx = 2.0 * ca * x + cb * y + cd;
        let gy = cb * x + 2.0 * cc * y + ce;
        let grad_sq = gx * gx + gy * gy;
        if grad_sq < 1e-30 {
            return alg.abs();
        }
        alg.abs() / grad_sq.sqrt()
    }

    /// Convert to geometric parameters. `None` if the conic is not a real ellipse.
    pub fn to_ellipse(self) -> Option<Ellipse> {
        conic_to_ellipse(&self)
    }
}

impl Ellipse {
    /// Positive finite semi-axes and finite center/angle.
    pub fn is_valid(&self) -> bool {
        self.a > 0.0
            && self.b > 0.0
            && self.a.is_finite()
            && self.b.is_finite()
            && self.cx.is_finite()
            && self.cy.is_finite()
            && self.angle.is_finite()
    }

    pub fn to_conic(self) -> ConicCoeffs {
        ellipse_to_conic(&self)
    }

    /// Squared normalized radius of a point in the ellipse frame; `<= 1` inside.
    pub fn normalized_radius_sq(&self, x: f64, y: f64) -> f64 {
        let (sin_a, cos_a) = self.angle.sin_cos();
        let dx = x - self.cx;
        let dy = y - self.cy;
        let u = cos_a * dx + sin_a * dy;
        let v = -sin_a * dx + cos_a * dy;
        (u * u) / (self.a * self.a) + (v * v) / (self.b * self.b)
    }

    /// Axis-aligned bounding box `[x_min, y_min, x_max, y_max]`.
    pub fn bounding_box(&self) -> [f64; 4] {
        let (sin_a, cos_a) = self.angle.sin_cos();
        let hx = ((self.a * cos_a).powi(2) + (self.b * sin_a).powi(2)).sqrt();
        let hy = ((self.a * sin_a).powi(2) + (self.b * cos_a).powi(2)).sqrt();
        [self.cx - hx, self.cy - hy, self.cx + hx, self.cy + hy]
    }

    /// Sample `n` points on the boundary.
    pub fn sample_points(&self, n: usize) -> Vec<[f64; 2]> {
        let (sin_a, cos_a) = self.angle.sin_cos();
        (0..n)
            .map(|i| {
                let t = 2.0 * std::f64::consts::PI * (i as f64) / (n as f64);
                let px = self.a * t.cos();
                let py = self.b * t.sin();
                [
                    self.cx + cos_a * px - sin_a * py,
                    self.cy + sin_a * px + cos_a * py,
                ]
            })
            .collect()
    }
}

/// Convert general conic coefficients to a geometric ellipse.
pub fn conic_to_ellipse(c: &ConicCoeffs) -> Option<Ellipse> {
    let [a, b, c_coeff, d, e, f] = c.0;

    let disc = b * b - 4.0 * a * c_coeff;
    if disc >= 0.0 {
        return None;
    }

    // Center from the gradient-zero system:
    //   2A·cx + B·cy + D = 0
    //   B·cx + 2C·cy + E = 0
    let denom = -disc;
    let cx = (b * e - 2.0 * c_coeff * d) / denom;
    let cy = (b * d - 2.0 * a * e) / denom;

    let angle = if (a - c_coeff).abs() < 1e-15 {
        if b > 0.0 {
            std::f64::consts::FRAC_PI_4
        } else if b < 0.0 {
            -std::f64::consts::FRAC_PI_4
        } else {
            0.0
        }
    } else {
        0.5 * b.atan2(a - c_coeff)
    };

    let sum = a + c_coeff;
    let diff = ((a - c_coeff).powi(2) + b * b).sqrt();
    let lambda1 = (sum + diff) / 2.0;
    let lambda2 = (sum - diff) / 2.0;

    let f_center = c.algebraic_distance(cx, cy);
    if f_center.abs() < 1e-15 {
        return None;
    }

    let a_sq = -f_center / lambda1;
    let b_sq = -f_center / lambda2;
    if a_sq <= 0.0 || b_sq <= 0.0 {
        return None;
    }

    let (semi_a, semi_b) = (a_sq.sqrt(), b_sq.sqrt());
    let (semi_a, semi_b, angle) = if semi_a >= semi_b {
        (semi_a, semi_b, angle)
    } else {
        (semi_b, semi_a, angle + std::f64::consts::FRAC_PI_2)
    };

    Some(Ellipse {
        cx,
        cy,
        a: semi_a,
        b: semi_b,
        angle: normalize_angle(angle),
    })
}

/// Convert a geometric ellipse to conic coefficients (scaled so that F' = −1 at the center).
pub fn ellipse_to_conic(e: &Ellipse) -> ConicCoeffs {
    let (sin_a, cos_a) = e.angle.sin_cos();
    let a2 = e.a * e.a;
    let b2 = e.b * e.b;

    let ca = cos_a * cos_a / a2 + sin_a * sin_a / b2;
    let cb = 2.0 * cos_a * sin_a * (1.0 / a2 - 1.0 / b2);
    let cc = sin_a * sin_a / a2 + cos_a * cos_a / b2;
    let cd = -2.0 * ca * e.cx - cb * e.cy;
    let ce = -cb * e.cx - 2.0 * cc * e.cy;
    let cf = ca * e.cx * e.cx + cb * e.cx * e.cy + cc * e.cy * e.cy - 1.0;

    ConicCoeffs([ca, cb, cc, cd, ce, cf])
}

fn normalize_angle(mut angle: f64) -> f64 {
    use std::f64::consts::{FRAC_PI_2, PI};
    while angle > FRAC_PI_2 {
        angle -= PI;
    }
    while angle <= -FRAC_PI_2 {
        angle += PI;
    }
    angle
}
