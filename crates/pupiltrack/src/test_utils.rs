//! Synthetic frames for unit tests.

use image::{GrayImage, Luma};

/// Render a solid disk on a flat background.
///
/// Pixels with `(x − cx)² + (y − cy)² <= radius²` get `disk_pix`.
pub(crate) fn draw_disk_image(
    w: u32,
    h: u32,
    center: [f32; 2],
    radius: f32,
    disk_pix: u8,
    bg_pix: u8,
) -> GrayImage {
    draw_ellipse_image(w, h, center, [radius, radius], 0.0, disk_pix, bg_pix)
}

/// Render a solid rotated ellipse with semi-axes `axes` and rotation `angle` (radians).
pub(crate) fn draw_ellipse_image(
    w: u32,
    h: u32,
    center: [f32; 2],
    axes: [f32; 2],
    angle: f32,
    fg_pix: u8,
    bg_pix: u8,
) -> GrayImage {
    let (s, c) = angle.sin_cos();
    GrayImage::from_fn(w, h, |x, y| {
        let dx = x as f32 - center[0];
        let dy = y as f32 - center[1];
        let u = c * dx + s * dy;
        let v = -s * dx + c * dy;
        let r = (u / axes[0]).powi(2) + (v / axes[1]).powi(2);
        Luma([if r <= 1.0 { fg_pix } else { bg_pix }])
    })
}

pub(crate) fn uniform_image(w: u32, h: u32, pix: u8) -> GrayImage {
    GrayImage::from_pixel(w, h, Luma([pix]))
}

/// Binary mask (0/255) with a filled axis-aligned rectangle `[x0, x1) × [y0, y1)`.
pub(crate) fn rect_mask(w: u32, h: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> GrayImage {
    GrayImage::from_fn(w, h, |x, y| {
        let inside = x >= x0 && x < x1 && y >= y0 && y < y1;
        Luma([if inside { 255 } else { 0 }])
    })
}
