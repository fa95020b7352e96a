use image::RgbImage;
use rayon::prelude::*;
use snafu::{OptionExt, ResultExt, ensure};
use tracing::*;

use crate::error::{DecodeSnafu, EmptyImageSnafu, LayoutError, ProcessingSnafu};

/// Upload decoded to RGB and bounded in size, ready for the model.
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pub image: RgbImage,
    /// (width, height) before any resizing
    pub original_size: (u32, u32),
    /// factor applied to both axes, `1.0` when untouched
    pub scale: f64,
}

impl ProcessedImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn was_resized(&self) -> bool {
        self.scale < 1.0
    }
}

/// Decodes `bytes` into an RGB image whose longer side is at most
/// `max_dimension`, downscaling with area averaging when needed.
pub fn preprocess(bytes: &[u8], max_dimension: u32) -> Result<ProcessedImage, LayoutError> {
    ensure!(!bytes.is_empty(), EmptyImageSnafu);

    let image = image::load_from_memory(bytes)
        .context(DecodeSnafu)?
        .into_rgb8();
    let original_size = image.dimensions();
    let (width, height) = original_size;

    let scale = scale_factor(width, height, max_dimension);
    if scale >= 1.0 {
        return Ok(ProcessedImage {
            image,
            original_size,
            scale: 1.0,
        });
    }

    let (new_width, new_height) = scaled_size(width, height, scale);
    let image = resize_area(&image, new_width, new_height)?;
    info!("Resized image from {width}x{height} to {new_width}x{new_height}");

    Ok(ProcessedImage {
        image,
        original_size,
        scale,
    })
}

/// `min(1, max_dimension / max(width, height))`.
pub fn scale_factor(width: u32, height: u32, max_dimension: u32) -> f64 {
    let longest = width.max(height).max(1) as f64;
    (max_dimension as f64 / longest).min(1.0)
}

/// Dimensions after scaling, rounded to the nearest pixel and never zero.
pub fn scaled_size(width: u32, height: u32, scale: f64) -> (u32, u32) {
    let scaled = |side: u32| ((side as f64 * scale).round() as u32).max(1);
    (scaled(width), scaled(height))
}

/// Source pixels covered by each destination pixel, with their coverage
/// share normalized to sum to one.
fn area_weights(src: u32, dst: u32) -> Vec<Vec<(usize, f32)>> {
    let ratio = src as f64 / dst as f64;

    (0..dst)
        .map(|d| {
            let start = d as f64 * ratio;
            let end = ((d + 1) as f64 * ratio).min(src as f64);
            let span = end - start;

            let mut weights = Vec::with_capacity(ratio.ceil() as usize + 1);
            let mut s = start.floor() as usize;
            while (s as f64) < end {
                let covered = end.min((s + 1) as f64) - start.max(s as f64);
                if covered > 0.0 {
                    weights.push((s, (covered / span) as f32));
                }
                s += 1;
            }
            weights
        })
        .collect()
}

/// Box-filter downscale: every output pixel is the coverage-weighted mean
/// of the input pixels under its footprint.
pub fn resize_area(
    image: &RgbImage,
    new_width: u32,
    new_height: u32,
) -> Result<RgbImage, LayoutError> {
    let (width, height) = image.dimensions();
    let x_weights = area_weights(width, new_width);
    let y_weights = area_weights(height, new_height);
    let src = image.as_raw();
    let src_stride = width as usize * 3;
    let dst_stride = new_width as usize * 3;

    // horizontal pass, full source height
    let mut horizontal = vec![0f32; height as usize * dst_stride];
    horizontal
        .par_chunks_mut(dst_stride)
        .enumerate()
        .for_each(|(y, row)| {
            let src_row = &src[y * src_stride..(y + 1) * src_stride];
            for (dx, weights) in x_weights.iter().enumerate() {
                let mut acc = [0f32; 3];
                for &(sx, w) in weights {
                    let px = &src_row[sx * 3..sx * 3 + 3];
                    acc[0] += px[0] as f32 * w;
                    acc[1] += px[1] as f32 * w;
                    acc[2] += px[2] as f32 * w;
                }
                row[dx * 3..dx * 3 + 3].copy_from_slice(&acc);
            }
        });

    let mut output = vec![0u8; new_height as usize * dst_stride];
    output
        .par_chunks_mut(dst_stride)
        .enumerate()
        .for_each(|(dy, row)| {
            let mut acc = vec![0f32; dst_stride];
            for &(sy, w) in &y_weights[dy] {
                let src_row = &horizontal[sy * dst_stride..(sy + 1) * dst_stride];
                for (a, &v) in acc.iter_mut().zip(src_row) {
                    *a += v * w;
                }
            }
            for (out, a) in row.iter_mut().zip(acc) {
                *out = a.round().clamp(0.0, 255.0) as u8;
            }
        });

    RgbImage::from_raw(new_width, new_height, output).context(ProcessingSnafu {
        message: format!("resized buffer does not match {new_width}x{new_height}"),
    })
}
