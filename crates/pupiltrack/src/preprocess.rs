//! Frame normalization: luma conversion, aspect-ratio crop, digital zoom.

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage};

use crate::config::PreprocessConfig;

/// Center-crop to the `width:height` aspect ratio, then resize to exactly
/// `width × height`.
pub fn crop_to_aspect_ratio(frame: &GrayImage, width: u32, height: u32) -> GrayImage {
    let (w, h) = frame.dimensions();
    if (w, h) == (width, height) || w == 0 || h == 0 || width == 0 || height == 0 {
        return frame.clone();
    }

    let target = width as f64 / height as f64;
    let current = w as f64 / h as f64;
    let (cw, ch) = if current > target {
        (((h as f64 * target).round() as u32).clamp(1, w), h)
    } else {
        (w, ((w as f64 / target).round() as u32).clamp(1, h))
    };
    let x0 = (w - cw) / 2;
    let y0 = (h - ch) / 2;

    let cropped = imageops::crop_imm(frame, x0, y0, cw, ch).to_image();
    if (cw, ch) == (width, height) {
        return cropped;
    }
    imageops::resize(&cropped, width, height, FilterType::Triangle)
}

/// Magnify around `center` (frame center when `None`) by `factor`.
///
/// The `w/factor × h/factor` window is clipped at the frame edges, so it
/// shrinks near the right and bottom borders, and the clipped window is
/// resized back to the frame size. Factors `<= 1` return the frame unchanged.
pub fn zoom(frame: &GrayImage, factor: f32, center: Option<[u32; 2]>) -> GrayImage {
    let (w, h) = frame.dimensions();
    if !(factor > 1.0) || w == 0 || h == 0 {
        return frame.clone();
    }
    let [cx, cy] = center.unwrap_or([w / 2, h / 2]);
    let zw = ((w as f32 / factor).round() as u32).clamp(1, w);
    let zh = ((h as f32 / factor).round() as u32).clamp(1, h);
    let x0 = cx.saturating_sub(zw / 2).min(w - 1);
    let y0 = cy.saturating_sub(zh / 2).min(h - 1);
    let x1 = x0.saturating_add(zw).min(w);
    let y1 = y0.saturating_add(zh).min(h);

    let window = imageops::crop_imm(frame, x0, y0, x1 - x0, y1 - y0).to_image();
    imageops::resize(&window, w, h, FilterType::Triangle)
}

/// Convert a decoded image into a session frame.
pub fn prepare_frame(image: &DynamicImage, config: &PreprocessConfig) -> GrayImage {
    let gray = image.to_luma8();
    let sized = crop_to_aspect_ratio(&gray, config.frame_width, config.frame_height);
    zoom(&sized, config.zoom_factor, config.zoom_center)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::draw_disk_image;
    use image::Luma;

    #[test]
    fn wide_frame_is_cropped_symmetrically() {
        // 800x480 with a marker column in each 80 px margin.
        let img = GrayImage::from_fn(800, 480, |x, _| {
            if x < 80 || x >= 720 {
                Luma([0])
            } else {
                Luma([200])
            }
        });
        let out = crop_to_aspect_ratio(&img, 640, 480);
        assert_eq!(out.dimensions(), (640, 480));
        assert!(out.pixels().all(|p| p[0] == 200));
    }

    #[test]
    fn tall_frame_is_resized_to_target() {
        let img = GrayImage::from_pixel(300, 400, Luma([90]));
        let out = crop_to_aspect_ratio(&img, 640, 480);
        assert_eq!(out.dimensions(), (640, 480));
        assert_eq!(out.get_pixel(320, 240)[0], 90);
    }

    #[test]
    fn unit_zoom_is_identity() {
        let img = draw_disk_image(64, 48, [32.0, 24.0], 8.0, 0, 255);
        assert_eq!(zoom(&img, 1.0, None), img);
        assert_eq!(zoom(&img, 0.5, None), img);
    }

    #[test]
    fn zoom_magnifies_the_center() {
        let img = draw_disk_image(200, 200, [100.0, 100.0], 20.0, 0, 255);
        let out = zoom(&img, 2.0, None);
        assert_eq!(out.dimensions(), (200, 200));
        let dark = |im: &GrayImage| im.pixels().filter(|p| p[0] < 128).count() as f64;
        let ratio = dark(&out) / dark(&img);
        assert!((3.5..4.5).contains(&ratio), "area ratio {}", ratio);
    }

    #[test]
    fn zoom_window_is_clamped_to_the_frame() {
        let img = GrayImage::from_fn(100, 100, |x, y| Luma([(x + y) as u8]));
        let out = zoom(&img, 2.0, Some([0, 0]));
        // Window anchored at the top-left corner.
        assert!(out.get_pixel(0, 0)[0] < 3);
    }

    #[test]
    fn zoom_window_shrinks_at_the_far_edge() {
        let img = GrayImage::from_fn(100, 100, |x, y| Luma([(x + y) as u8]));
        // 50x50 window centered on (100, 100) is clipped to [75, 100)².
        let out = zoom(&img, 2.0, Some([100, 100]));
        assert_eq!(out.dimensions(), (100, 100));
        assert!(out.get_pixel(0, 0)[0] >= 145, "got {}", out.get_pixel(0, 0)[0]);
        assert!(out.get_pixel(99, 99)[0] >= 195);
    }

    #[test]
    fn zoom_center_outside_the_frame_keeps_one_pixel() {
        let img = GrayImage::from_fn(100, 100, |x, y| Luma([(x + y) as u8]));
        let out = zoom(&img, 2.0, Some([500, 500]));
        assert_eq!(out.dimensions(), (100, 100));
        assert!(out.pixels().all(|p| p[0] == 198));
    }

    #[test]
    fn prepare_frame_converts_and_sizes() {
        let rgb = DynamicImage::new_rgb8(1280, 720);
        let cfg = PreprocessConfig::default();
        let out = prepare_frame(&rgb, &cfg);
        assert_eq!(out.dimensions(), (640, 480));
    }
}
