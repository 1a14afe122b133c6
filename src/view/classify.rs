use std::path::Path;

use image::{imageops, Rgb, RgbImage};

use crate::data::transform::Normalize;
use crate::error::{Error, Result};
use crate::view::image::to_gray_image;

const PANEL_WIDTH: u32 = 320;
const GAP: u32 = 16;
const BAR_HEIGHT: u32 = 22;
const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const TRACK: Rgb<u8> = Rgb([230, 230, 230]);
const BAR: Rgb<u8> = Rgb([70, 110, 180]);
const TOP_BAR: Rgb<u8> = Rgb([210, 90, 60]);

/// Renders a sample next to a horizontal bar per class, bar length
/// proportional to its probability, and writes it as a PNG.
///
/// Classes are drawn top to bottom in label order; the most likely class is
/// highlighted.
pub fn view_classify(
    pixels: &[f64],
    rows: usize,
    cols: usize,
    normalize: Normalize,
    probs: &[f64],
    path: impl AsRef<Path>,
) -> Result<()> {
    render_classify(pixels, rows, cols, normalize, probs)?.save(path.as_ref())?;
    Ok(())
}

/// In-memory version of `view_classify`.
pub fn render_classify(
    pixels: &[f64],
    rows: usize,
    cols: usize,
    normalize: Normalize,
    probs: &[f64],
) -> Result<RgbImage> {
    if probs.is_empty() {
        return Err(Error::model("cannot plot an empty probability vector"));
    }
    let sample = to_gray_image(pixels, rows, cols, normalize)?;
    let (img_w, img_h) = sample.dimensions();

    let n = probs.len() as u32;
    let height = img_h.max(n * BAR_HEIGHT);
    let width = img_w + GAP + PANEL_WIDTH;
    let mut canvas = RgbImage::from_pixel(width, height, BACKGROUND);

    let sample_rgb = image::DynamicImage::ImageLuma8(sample).to_rgb8();
    imageops::overlay(&mut canvas, &sample_rgb, 0, i64::from((height - img_h) / 2));

    let best = crate::math::matrix::argmax(probs);
    let left = img_w + GAP;
    let band = height / n;
    for (class, &p) in probs.iter().enumerate() {
        let top = class as u32 * band + band / 4;
        let bottom = top + (band / 2).max(1);
        let filled = (p.clamp(0.0, 1.0) * f64::from(PANEL_WIDTH - 1)).round() as u32;
        let colour = if class == best { TOP_BAR } else { BAR };
        for y in top..bottom.min(height) {
            for x in 0..PANEL_WIDTH {
                let px = if x < filled { colour } else { TRACK };
                canvas.put_pixel(left + x, y, px);
            }
        }
    }
    Ok(canvas)
}

/// Text bar chart of class probabilities, one line per class.
pub fn format_probabilities(probs: &[f64], class_names: &[String]) -> String {
    const WIDTH: usize = 30;
    let label_width = class_names.iter().map(|s| s.len()).max().unwrap_or(0).max(2);
    probs
        .iter()
        .enumerate()
        .map(|(i, &p)| {
            let name = class_names.get(i).cloned().unwrap_or_else(|| i.to_string());
            let filled = (p.clamp(0.0, 1.0) * WIDTH as f64).round() as usize;
            format!(
                "{name:>label_width$} | {}{} {p:.4}",
                "#".repeat(filled),
                " ".repeat(WIDTH - filled)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
