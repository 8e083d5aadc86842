//! Palette-based composites (indexed and 1-bit bitmap documents)

use super::{BitDepth, Bitmap, Samples};
use crate::psd::ColorMode;

/// Number of entries in an indexed color table
pub const PALETTE_SIZE: usize = 256;

/// Expand 8-bit palette indices into an RGB bitmap, RGBA when a transparent index is set
///
/// The color table is planar: 256 reds, then 256 greens, then 256 blues.
/// Indices at or past `color_count` map to opaque black.
pub fn expand_indexed(
    indices: &[u8],
    width: u32,
    height: u32,
    color_table: &[u8],
    color_count: usize,
    transparent_index: Option<usize>,
) -> Bitmap {
    let color_count = color_count.min(PALETTE_SIZE);
    let transparent_index = transparent_index.filter(|&t| t < color_count);
    let has_alpha = transparent_index.is_some();
    let channels = if has_alpha { 4 } else { 3 };

    let entry = |plane: usize, index: usize| -> u8 {
        color_table
            .get(plane * PALETTE_SIZE + index)
            .copied()
            .unwrap_or(0)
    };

    let pixel_count = width as usize * height as usize;
    let mut samples = Vec::with_capacity(pixel_count * channels);
    for &index in indices.iter().take(pixel_count) {
        let index = usize::from(index);
        if index < color_count {
            samples.extend([entry(0, index), entry(1, index), entry(2, index)]);
        } else {
            samples.extend([0, 0, 0]);
        }
        if has_alpha {
            samples.push(if Some(index) == transparent_index { 0 } else { 255 });
        }
    }
    samples.resize(pixel_count * channels, 0);

    let mut bitmap = Bitmap::new(width, height, channels, has_alpha, BitDepth::Eight, ColorMode::Rgb);
    bitmap.samples = Samples::U8(samples);
    bitmap
}

/// Expand a 1-bit plane into 8-bit gray; a set bit is black
pub fn expand_bitmap_mode(bits: &[u8], width: u32, height: u32) -> Bitmap {
    let width = width as usize;
    let row_len = width.div_ceil(8);
    let mut samples = Vec::with_capacity(width * height as usize);
    for y in 0..height as usize {
        let row = bits.get(y * row_len..(y + 1) * row_len).unwrap_or(&[]);
        for x in 0..width {
            let byte = row.get(x / 8).copied().unwrap_or(0);
            let set = byte & (0x80 >> (x % 8)) != 0;
            samples.push(if set { 0 } else { 255 });
        }
    }

    let mut bitmap = Bitmap::new(
        width as u32,
        height,
        1,
        false,
        BitDepth::Eight,
        ColorMode::Grayscale,
    );
    bitmap.samples = Samples::U8(samples);
    bitmap
}
