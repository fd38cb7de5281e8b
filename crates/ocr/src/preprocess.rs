use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Failed to load image: {0}")]
    Load(#[from] image::ImageError),
    #[error("Failed to encode processed image: {0}")]
    Encode(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreprocessOptions {
    /// When false, images are handed to the OCR backend untouched.
    pub enabled: bool,
    /// Longest side, in pixels, before the image is scaled down.
    pub max_dimension: u32,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self { enabled: true, max_dimension: 2800 }
    }
}

/// Decode an uploaded label photo, normalize it and return PNG bytes for OCR.
/// Returns the input unchanged when preprocessing is disabled.
pub fn prepare_label_image(
    data: &[u8],
    opts: &PreprocessOptions,
) -> Result<Vec<u8>, PreprocessError> {
    if !opts.enabled {
        return Ok(data.to_vec());
    }
    let img = image::load_from_memory(data)?;
    encode_png(normalize(img, opts.max_dimension))
}

/// Downscale, grayscale, then stretch contrast to the full 0..=255 range.
fn normalize(img: DynamicImage, max_dimension: u32) -> DynamicImage {
    let img = if img.width() > max_dimension || img.height() > max_dimension {
        img.resize(max_dimension, max_dimension, image::imageops::FilterType::Lanczos3)
    } else {
        img
    };

    let gray: GrayImage = img.to_luma8();
    let (lo, hi) = gray
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])));

    if lo == hi {
        return DynamicImage::ImageLuma8(gray);
    }

    let span = u32::from(hi - lo);
    let stretched: GrayImage = ImageBuffer::from_fn(gray.width(), gray.height(), |x, y| {
        let p = gray.get_pixel(x, y)[0];
        Luma([(u32::from(p - lo) * 255 / span) as u8])
    });

    DynamicImage::ImageLuma8(stretched)
}

fn encode_png(img: DynamicImage) -> Result<Vec<u8>, PreprocessError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| PreprocessError::Encode(e.to_string()))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_of(img: GrayImage) -> Vec<u8> {
        let mut buf = Vec::new();
        DynamicImage::ImageLuma8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn faint_label_is_stretched_to_full_range() {
        // Ink at 110, paper at 140.
        let img: GrayImage =
            ImageBuffer::from_fn(20, 4, |x, _| Luma([if x % 2 == 0 { 110 } else { 140 }]));
        let out = normalize(DynamicImage::ImageLuma8(img), 2800).to_luma8();
        let min = out.pixels().map(|p| p[0]).min().unwrap();
        let max = out.pixels().map(|p| p[0]).max().unwrap();
        assert_eq!((min, max), (0, 255));
    }

    #[test]
    fn blank_image_does_not_panic() {
        let img: GrayImage = ImageBuffer::from_fn(8, 8, |_, _| Luma([77]));
        let out = normalize(DynamicImage::ImageLuma8(img), 2800);
        assert_eq!((out.width(), out.height()), (8, 8));
    }

    #[test]
    fn oversized_photo_is_scaled_down() {
        let img: GrayImage = ImageBuffer::from_fn(400, 100, |_, _| Luma([200]));
        let out = normalize(DynamicImage::ImageLuma8(img), 200);
        assert!(out.width() <= 200 && out.height() <= 200);
    }

    #[test]
    fn prepared_output_is_png() {
        let data = png_of(ImageBuffer::from_fn(4, 4, |_, _| Luma([100])));
        let out = prepare_label_image(&data, &PreprocessOptions::default()).unwrap();
        assert_eq!(&out[..4], b"\x89PNG");
    }

    #[test]
    fn disabled_preprocessing_passes_bytes_through() {
        let opts = PreprocessOptions { enabled: false, ..Default::default() };
        let out = prepare_label_image(b"not an image", &opts).unwrap();
        assert_eq!(out, b"not an image");
    }

    #[test]
    fn undecodable_bytes_fail_to_load() {
        let err = prepare_label_image(b"definitely not an image", &PreprocessOptions::default());
        assert!(matches!(err, Err(PreprocessError::Load(_))));
    }
}
