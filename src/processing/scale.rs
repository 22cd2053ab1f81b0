//! # Upload Downscaling
//!
//! Phone and DSLR photos are far larger than a captioning model needs. Before
//! upload the longest side is clamped to a configured maximum:
//!
//! - aspect ratio is preserved
//! - images that already fit are passed through byte-for-byte
//! - nothing is ever upscaled, and each side is at least 1px
//!
//! Resampling runs on RGBA8 buffers through `fast_image_resize`. JPEG input is
//! written back as JPEG; every other format is written as PNG.

use std::io::Cursor;

use fast_image_resize as fir;
use fir::images::{TypedImage, TypedImageRef};
use fir::pixels::U8x4;
use fir::{ResizeOptions, Resizer};
use image::{DynamicImage, ImageFormat, RgbaImage};

use crate::error::{PoetryError, PoetryResult};

/// A 2D size in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Size {
    pub w: u32,
    pub h: u32,
}

/// Output size that fits `input` within `max_long` on its longest side.
pub fn fit_long_side(input: Size, max_long: u32) -> Size {
    let (w, h) = (input.w as f64, input.h as f64);
    let long = w.max(h).max(1.0);
    let s = (max_long as f64 / long).min(1.0); // don't upscale
    Size {
        w: ((w * s).round() as u32).max(1),
        h: ((h * s).round() as u32).max(1),
    }
}

/// Shrink encoded image bytes so the longest side is at most `max_long`.
///
/// Returns `Ok(None)` when the image already fits, so the caller can keep the
/// original bytes.
pub fn downscale(bytes: &[u8], max_long: u32) -> PoetryResult<Option<Vec<u8>>> {
    let format = image::guess_format(bytes)
        .map_err(|e| PoetryError::image("format detection", e.to_string()))?;
    let decoded = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| PoetryError::image("decoding", e.to_string()))?;

    let input = Size {
        w: decoded.width(),
        h: decoded.height(),
    };
    let out = fit_long_side(input, max_long);
    if out == input {
        return Ok(None);
    }

    tracing::debug!(
        "Downscaling {}x{} -> {}x{} before upload",
        input.w,
        input.h,
        out.w,
        out.h
    );

    let rgba = decoded.to_rgba8();
    let resized = resize_rgba(rgba.as_raw(), input, out)?;
    let resized = RgbaImage::from_raw(out.w, out.h, resized)
        .ok_or_else(|| PoetryError::image("resizing", "output buffer has the wrong length"))?;

    let mut encoded = Vec::new();
    let mut cursor = Cursor::new(&mut encoded);
    match format {
        // The JPEG encoder has no alpha channel.
        ImageFormat::Jpeg => DynamicImage::ImageRgba8(resized)
            .to_rgb8()
            .write_to(&mut cursor, ImageFormat::Jpeg)?,
        _ => resized.write_to(&mut cursor, ImageFormat::Png)?,
    }

    Ok(Some(encoded))
}

fn resize_rgba(src_rgba: &[u8], src: Size, out: Size) -> PoetryResult<Vec<u8>> {
    let src_view = TypedImageRef::<U8x4>::from_buffer(src.w, src.h, src_rgba)
        .map_err(|e| PoetryError::image("resizing", e.to_string()))?;

    let mut dst = vec![0u8; (out.w as usize) * (out.h as usize) * 4];
    {
        let mut dst_view = TypedImage::<U8x4>::from_buffer(out.w, out.h, &mut dst)
            .map_err(|e| PoetryError::image("resizing", e.to_string()))?;
        let mut resizer = Resizer::new();
        resizer
            .resize_typed::<U8x4>(&src_view, &mut dst_view, &ResizeOptions::new())
            .map_err(|e| PoetryError::image("resizing", e.to_string()))?;
    }

    Ok(dst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgb, RgbImage, Rgba};

    fn png(w: u32, h: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(w, h, Rgba([10, 120, 200, 255]));
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn test_fit_long_side_preserves_aspect() {
        let out = fit_long_side(Size { w: 1920, h: 1080 }, 640);
        assert_eq!(out, Size { w: 640, h: 360 });

        let out = fit_long_side(Size { w: 1080, h: 1920 }, 640);
        assert_eq!(out, Size { w: 360, h: 640 });
    }

    #[test]
    fn test_fit_long_side_never_upscales() {
        let input = Size { w: 320, h: 240 };
        assert_eq!(fit_long_side(input, 1024), input);
    }

    #[test]
    fn test_fit_long_side_keeps_one_pixel_minimum() {
        let out = fit_long_side(Size { w: 4000, h: 1 }, 100);
        assert_eq!(out, Size { w: 100, h: 1 });
    }

    #[test]
    fn test_downscale_passes_small_images_through() {
        assert!(downscale(&png(64, 48), 640).unwrap().is_none());
    }

    #[test]
    fn test_downscale_shrinks_png() {
        let scaled = downscale(&png(200, 100), 50).unwrap().unwrap();
        assert_eq!(image::guess_format(&scaled).unwrap(), ImageFormat::Png);
        let decoded = image::load_from_memory(&scaled).unwrap();
        assert_eq!(decoded.dimensions(), (50, 25));
    }

    #[test]
    fn test_downscale_keeps_jpeg_as_jpeg() {
        let img = RgbImage::from_pixel(120, 160, Rgb([30, 30, 30]));
        let mut jpeg = Vec::new();
        img.write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)
            .unwrap();

        let scaled = downscale(&jpeg, 80).unwrap().unwrap();
        assert_eq!(image::guess_format(&scaled).unwrap(), ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&scaled).unwrap();
        assert_eq!(decoded.dimensions(), (60, 80));
    }
}
