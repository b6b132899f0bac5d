//! Cropping vehicle images out of camera frames.

use image::RgbImage;
use image::imageops;
use tracing::{trace, warn};

use crate::tracker::Rect;

/// Camera frame handed to the event detector.
pub type Frame = RgbImage;

/// Crop `frame` to a normalized box.
///
/// Pixel bounds are clamped so the crop is always at least 1x1 and inside the
/// frame. A box that cannot be mapped to pixels yields a copy of the whole
/// frame instead.
pub fn crop_box(frame: &Frame, bbox: &Rect) -> Frame {
    let (width, height) = frame.dimensions();
    let corners = bbox.to_tlbr();

    if width == 0 || height == 0 || !corners.iter().all(|v| v.is_finite()) {
        warn!(width, height, ?corners, "cannot crop frame, keeping the full frame");
        return frame.clone();
    }

    let (fw, fh) = (i64::from(width), i64::from(height));
    let x1 = ((corners[0] * width as f32) as i64).clamp(0, fw - 1);
    let y1 = ((corners[1] * height as f32) as i64).clamp(0, fh - 1);
    let x2 = ((corners[2] * width as f32) as i64).clamp(x1 + 1, fw);
    let y2 = ((corners[3] * height as f32) as i64).clamp(y1 + 1, fh);

    // All four values are within 0..=u32::MAX after clamping.
    let (x, y, w, h) = (x1 as u32, y1 as u32, (x2 - x1) as u32, (y2 - y1) as u32);
    trace!(x, y, w, h, "cropped frame");
    imageops::crop_imm(frame, x, y, w, h).to_image()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn frame(width: u32, height: u32) -> Frame {
        RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 0]))
    }

    #[test]
    fn test_crop_maps_normalized_box_to_pixels() {
        let img = frame(100, 50);
        let crop = crop_box(&img, &Rect::from_tlbr(0.25, 0.25, 0.5, 0.75));

        // 12.5 and 37.5 truncate to 12 and 37
        assert_eq!(crop.dimensions(), (25, 25));
        assert_eq!(crop.get_pixel(0, 0), &Rgb([25, 12, 0]));
    }

    #[test]
    fn test_crop_is_at_least_one_pixel() {
        let img = frame(100, 100);

        let crop = crop_box(&img, &Rect::from_tlbr(0.5, 0.5, 0.5, 0.5));
        assert_eq!(crop.dimensions(), (1, 1));

        let crop = crop_box(&img, &Rect::from_tlbr(1.0, 1.0, 1.2, 1.2));
        assert_eq!(crop.dimensions(), (1, 1));
        assert_eq!(crop.get_pixel(0, 0), &Rgb([99, 99, 0]));
    }

    #[test]
    fn test_invalid_box_falls_back_to_full_frame() {
        let img = frame(8, 6);
        let crop = crop_box(&img, &Rect::new(f32::NAN, 0.0, 0.5, 0.5));
        assert_eq!(crop, img);
    }
}
