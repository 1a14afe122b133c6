//! Image conversion helpers: arbitrary image files into network inputs, and
//! normalised network inputs back into viewable PNGs.

use std::path::Path;

use image::imageops::FilterType;
use image::{GrayImage, Luma};

use crate::data::transform::Normalize;
use crate::error::{Error, Result};

/// Nearest-neighbour upscale applied to written samples.
pub const SCALE: u32 = 8;

/// Decodes image bytes, resizes to `cols × rows`, converts to grayscale,
/// and normalises every pixel with `normalize`.
///
/// Returns a flat `Vec<f64>` of length `rows * cols`.
pub fn image_bytes_to_input(bytes: &[u8], rows: u32, cols: u32, normalize: Normalize) -> Result<Vec<f64>> {
    let img = image::load_from_memory(bytes)?;
    let resized = img.resize_exact(cols, rows, FilterType::Lanczos3);
    let gray = resized.to_luma8();
    Ok(gray.pixels().map(|p| normalize.apply(p.0[0])).collect())
}

/// Like `image_bytes_to_input`, reading from a file.
pub fn image_to_input(path: &Path, rows: u32, cols: u32, normalize: Normalize) -> Result<Vec<f64>> {
    let bytes = std::fs::read(path)?;
    image_bytes_to_input(&bytes, rows, cols, normalize)
}

/// Converts one normalised sample back to an upscaled grayscale image.
pub fn to_gray_image(pixels: &[f64], rows: usize, cols: usize, normalize: Normalize) -> Result<GrayImage> {
    if pixels.len() != rows * cols {
        return Err(Error::shape_mismatch("image", vec![rows * cols], vec![pixels.len()]));
    }
    let (w, h) = (cols as u32 * SCALE, rows as u32 * SCALE);
    Ok(GrayImage::from_fn(w, h, |x, y| {
        let idx = (y / SCALE) as usize * cols + (x / SCALE) as usize;
        Luma([to_byte(normalize.denormalize(pixels[idx]))])
    }))
}

/// Writes one normalised sample as a PNG.
pub fn imshow(
    pixels: &[f64],
    rows: usize,
    cols: usize,
    normalize: Normalize,
    path: impl AsRef<Path>,
) -> Result<()> {
    to_gray_image(pixels, rows, cols, normalize)?.save(path.as_ref())?;
    Ok(())
}

pub(crate) fn to_byte(unit: f64) -> u8 {
    (unit.clamp(0.0, 1.0) * 255.0).round() as u8
}
