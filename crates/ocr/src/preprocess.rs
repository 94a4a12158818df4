use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
use std::io::Cursor;
use thiserror::Error;

use crate::config::PreprocessConfig;
use crate::types::PreprocessingMethod;

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Failed to load image: {0}")]
    Load(#[from] image::ImageError),
    #[error("Image has no pixels ({width}x{height})")]
    Empty { width: u32, height: u32 },
    #[error("Failed to encode processed image: {0}")]
    Encode(String),
}

/// One enhanced copy of the input, tagged with how it was produced.
#[derive(Debug, Clone)]
pub struct PreprocessedImage {
    pub method: PreprocessingMethod,
    pub image: DynamicImage,
}

/// Decode raw image bytes (JPEG / PNG / WEBP / …).
pub fn load_image(data: &[u8]) -> Result<DynamicImage, PreprocessError> {
    let img = image::load_from_memory(data)?;
    ensure_non_empty(&img)?;
    Ok(img)
}

/// Produce every variant in `PreprocessingMethod::ALL` order. The original is
/// always first; an enhancement that fails is left out rather than failing
/// the whole run.
pub fn preprocess(
    image: &DynamicImage,
    config: &PreprocessConfig,
) -> Result<Vec<PreprocessedImage>, PreprocessError> {
    ensure_non_empty(image)?;

    let mut variants = Vec::with_capacity(PreprocessingMethod::ALL.len());
    for method in PreprocessingMethod::ALL {
        match apply(method, image, config) {
            Ok(image) => variants.push(PreprocessedImage { method, image }),
            Err(e) => tracing::warn!("Skipping {method} variant: {e}"),
        }
    }
    Ok(variants)
}

/// Run a single preprocessing method.
pub fn apply(
    method: PreprocessingMethod,
    image: &DynamicImage,
    config: &PreprocessConfig,
) -> Result<DynamicImage, PreprocessError> {
    let out = match method {
        PreprocessingMethod::Original => image.clone(),
        PreprocessingMethod::ContrastEnhanced => image.adjust_contrast(config.contrast),
        PreprocessingMethod::GrayscaleSharpened => image
            .grayscale()
            .unsharpen(config.sharpen_sigma, config.sharpen_threshold),
        PreprocessingMethod::DocumentEnhanced => normalize(image, config.max_dimension),
        PreprocessingMethod::AdaptiveBinarized => DynamicImage::ImageLuma8(binarize(
            &image.to_luma8(),
            config.binarize_block_radius,
            config.binarize_offset,
        )),
    };
    ensure_non_empty(&out)?;
    Ok(out)
}

/// Encode a variant as PNG for backends that take encoded bytes.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, PreprocessError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| PreprocessError::Encode(e.to_string()))?;
    Ok(buf)
}

pub(crate) fn ensure_non_empty(img: &DynamicImage) -> Result<(), PreprocessError> {
    if img.width() == 0 || img.height() == 0 {
        return Err(PreprocessError::Empty { width: img.width(), height: img.height() });
    }
    Ok(())
}

/// Grayscale + contrast stretch.
fn normalize(img: &DynamicImage, max_dimension: u32) -> DynamicImage {
    let resized;
    let img = if img.width() > max_dimension || img.height() > max_dimension {
        resized = img.resize(max_dimension, max_dimension, image::imageops::FilterType::Lanczos3);
        &resized
    } else {
        img
    };

    let gray: GrayImage = img.to_luma8();

    let (min_px, max_px) = gray
        .pixels()
        .fold((255u8, 0u8), |(mn, mx), p| (mn.min(p[0]), mx.max(p[0])));

    if max_px <= min_px {
        return DynamicImage::ImageLuma8(gray);
    }

    let range = (max_px - min_px) as u32;
    let stretched: GrayImage = ImageBuffer::from_fn(gray.width(), gray.height(), |x, y| {
        let p = gray.get_pixel(x, y)[0];
        let v = ((p - min_px) as u32 * 255 / range) as u8;
        Luma([v])
    });

    DynamicImage::ImageLuma8(stretched)
}

/// Local-mean thresholding: a pixel turns black when it is darker than the
/// mean of its `(2r+1)²` neighbourhood minus `offset`.
fn binarize(gray: &GrayImage, block_radius: u32, offset: i32) -> GrayImage {
    let (width, height) = gray.dimensions();
    let integral = integral_image(gray);

    ImageBuffer::from_fn(width, height, |x, y| {
        let mean = region_mean(&integral, width, height, x, y, block_radius);
        let threshold = (mean as i32 - offset).clamp(0, 255) as u8;
        let v = gray.get_pixel(x, y)[0];
        Luma([if v < threshold { 0 } else { 255 }])
    })
}

/// Summed-area table with a zero row and column in front:
/// `table[(y+1) * (w+1) + (x+1)]` is the sum over `[0, x] × [0, y]`.
fn integral_image(gray: &GrayImage) -> Vec<u64> {
    let (w, h) = gray.dimensions();
    let stride = (w + 1) as usize;
    let mut table = vec![0u64; stride * (h + 1) as usize];

    for y in 0..h {
        let mut row_sum = 0u64;
        for x in 0..w {
            row_sum += gray.get_pixel(x, y)[0] as u64;
            let idx = (y + 1) as usize * stride + (x + 1) as usize;
            let above = y as usize * stride + (x + 1) as usize;
            table[idx] = row_sum + table[above];
        }
    }
    table
}

fn region_mean(integral: &[u64], width: u32, height: u32, cx: u32, cy: u32, radius: u32) -> f64 {
    let stride = (width + 1) as usize;
    let x1 = cx.saturating_sub(radius) as usize;
    let y1 = cy.saturating_sub(radius) as usize;
    let x2 = (cx as usize + radius as usize + 1).min(width as usize);
    let y2 = (cy as usize + radius as usize + 1).min(height as usize);

    let area = ((x2 - x1) * (y2 - y1)) as f64;
    let sum = integral[y2 * stride + x2] + integral[y1 * stride + x1]
        - integral[y1 * stride + x2]
        - integral[y2 * stride + x1];
    sum as f64 / area
}
