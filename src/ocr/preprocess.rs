use image::imageops::{self, FilterType};
use image::{GrayImage, ImageBuffer, Luma, Rgba, RgbaImage};

use crate::session::config::{OcrConfig, PixelRect};

/// Converts image to binary by keeping only bright pixels.
///
/// Pixels where R > threshold AND G > threshold AND B > threshold become black (text).
/// All other pixels become white (background).
///
/// Broadcast overlays draw white digits over darker graphics, so this
/// isolates the readout from the background.
pub fn threshold_bright_pixels(img: &RgbaImage, threshold: u8) -> GrayImage {
    let (width, height) = img.dimensions();
    let mut output = ImageBuffer::new(width, height);

    for (x, y, pixel) in img.enumerate_pixels() {
        let Rgba([r, g, b, _]) = *pixel;
        let value = if r > threshold && g > threshold && b > threshold {
            0u8
        } else {
            255u8
        };
        output.put_pixel(x, y, Luma([value]));
    }

    output
}

/// Crops a pixel rectangle from the frame, clamped to the frame bounds.
///
/// Returns `None` when nothing of the rectangle lies inside the frame.
pub fn crop_pixels(img: &RgbaImage, rect: &PixelRect) -> Option<RgbaImage> {
    let (w, h) = img.dimensions();

    let x0 = rect.x1.min(w);
    let y0 = rect.y1.min(h);
    let x1 = rect.x2.min(w);
    let y1 = rect.y2.min(h);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }

    Some(imageops::crop_imm(img, x0, y0, x1 - x0, y1 - y0).to_image())
}

/// Scales the crop up so its height is at least `min_height`.
fn upscale(img: GrayImage, min_height: u32) -> GrayImage {
    let (w, h) = img.dimensions();
    if h == 0 || h >= min_height {
        return img;
    }
    let scale = min_height as f32 / h as f32;
    let new_w = ((w as f32 * scale).round() as u32).max(1);
    imageops::resize(&img, new_w, min_height, FilterType::CatmullRom)
}

/// Full preprocessing for one text region: crop, grayscale or binarize,
/// upscale.
pub fn prepare_region(frame: &RgbaImage, rect: &PixelRect, options: &OcrConfig) -> Option<GrayImage> {
    let cropped = crop_pixels(frame, rect)?;
    let gray = match options.threshold {
        Some(threshold) => threshold_bright_pixels(&cropped, threshold),
        None => imageops::grayscale(&cropped),
    };
    Some(upscale(gray, options.min_height))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(w: u32, h: u32) -> RgbaImage {
        ImageBuffer::from_fn(w, h, |x, y| Rgba([x as u8, y as u8, 0, 255]))
    }

    #[test]
    fn test_crop_pixels() {
        let img = gradient(100, 200);
        let rect = PixelRect { x1: 10, y1: 50, x2: 60, y2: 70 };
        let cropped = crop_pixels(&img, &rect).unwrap();

        assert_eq!(cropped.dimensions(), (50, 20));
        // Top-left pixel should be (10, 50) from original
        assert_eq!(cropped.get_pixel(0, 0)[0], 10);
        assert_eq!(cropped.get_pixel(0, 0)[1], 50);
    }

    #[test]
    fn test_crop_pixels_clamps() {
        let img = gradient(100, 100);
        let rect = PixelRect { x1: 90, y1: 90, x2: 150, y2: 150 };
        assert_eq!(crop_pixels(&img, &rect).unwrap().dimensions(), (10, 10));
    }

    #[test]
    fn test_crop_pixels_outside_frame() {
        let img = gradient(100, 100);
        let rect = PixelRect { x1: 120, y1: 0, x2: 150, y2: 10 };
        assert!(crop_pixels(&img, &rect).is_none());
        let inverted = PixelRect { x1: 50, y1: 50, x2: 40, y2: 60 };
        assert!(crop_pixels(&img, &inverted).is_none());
    }

    #[test]
    fn test_threshold_bright_pixels() {
        let mut img: RgbaImage = ImageBuffer::new(3, 1);
        img.put_pixel(0, 0, Rgba([100, 100, 100, 255]));
        img.put_pixel(1, 0, Rgba([250, 250, 250, 255]));
        img.put_pixel(2, 0, Rgba([250, 250, 100, 255]));

        let result = threshold_bright_pixels(&img, 190);

        assert_eq!(result.get_pixel(0, 0)[0], 255, "Dark pixel should become white");
        assert_eq!(result.get_pixel(1, 0)[0], 0, "Bright pixel should become black");
        assert_eq!(result.get_pixel(2, 0)[0], 255, "Partially dark pixel should become white");
    }

    #[test]
    fn test_prepare_region_upscales_small_crops() {
        let img = gradient(100, 100);
        let rect = PixelRect { x1: 0, y1: 0, x2: 40, y2: 12 };
        let options = OcrConfig { threshold: None, min_height: 48 };

        let prepared = prepare_region(&img, &rect, &options).unwrap();
        assert_eq!(prepared.dimensions(), (160, 48));
    }

    #[test]
    fn test_prepare_region_keeps_tall_crops() {
        let img = gradient(100, 100);
        let rect = PixelRect { x1: 0, y1: 0, x2: 40, y2: 60 };
        let options = OcrConfig { threshold: Some(190), min_height: 48 };

        let prepared = prepare_region(&img, &rect, &options).unwrap();
        assert_eq!(prepared.dimensions(), (40, 60));
    }
}
