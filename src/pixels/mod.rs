//! Pixel planes and bitmaps
//!
//! Channel data is stored planar (one channel after another); decoded
//! planes are interleaved into a [`Bitmap`] band by band.

pub mod compression;
pub mod indexed;
pub mod plane;

use serde::Serialize;

use crate::psd::ColorMode;

pub use compression::Compression;
pub use plane::{decode_composite_planes, decode_plane};

/// Sample size of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BitDepth {
    Eight,
    Sixteen,
    ThirtyTwo,
}

impl BitDepth {
    pub fn from_depth(depth: u16) -> Option<Self> {
        match depth {
            8 => Some(BitDepth::Eight),
            16 => Some(BitDepth::Sixteen),
            32 => Some(BitDepth::ThirtyTwo),
            _ => None,
        }
    }

    pub fn bytes(self) -> usize {
        match self {
            BitDepth::Eight => 1,
            BitDepth::Sixteen => 2,
            BitDepth::ThirtyTwo => 4,
        }
    }
}

/// Sample storage, planar for a single channel or interleaved for a bitmap
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    U8(Vec<u8>),
    U16(Vec<u16>),
    F32(Vec<f32>),
}

impl Samples {
    pub fn zeroed(depth: BitDepth, len: usize) -> Self {
        match depth {
            BitDepth::Eight => Samples::U8(vec![0; len]),
            BitDepth::Sixteen => Samples::U16(vec![0; len]),
            BitDepth::ThirtyTwo => Samples::F32(vec![0.0; len]),
        }
    }

    /// Convert big-endian sample bytes
    pub fn from_be_bytes(depth: BitDepth, bytes: &[u8]) -> Self {
        match depth {
            BitDepth::Eight => Samples::U8(bytes.to_vec()),
            BitDepth::Sixteen => Samples::U16(
                bytes
                    .chunks_exact(2)
                    .map(|b| u16::from_be_bytes([b[0], b[1]]))
                    .collect(),
            ),
            BitDepth::ThirtyTwo => Samples::F32(
                bytes
                    .chunks_exact(4)
                    .map(|b| f32::from_be_bytes([b[0], b[1], b[2], b[3]]))
                    .collect(),
            ),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Samples::U8(v) => v.len(),
            Samples::U16(v) => v.len(),
            Samples::F32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sample normalized to `0.0..=1.0` (32-bit samples are returned as stored)
    pub fn normalized(&self, index: usize) -> Option<f32> {
        match self {
            Samples::U8(v) => v.get(index).map(|&s| f32::from(s) / 255.0),
            Samples::U16(v) => v.get(index).map(|&s| f32::from(s) / 65535.0),
            Samples::F32(v) => v.get(index).copied(),
        }
    }
}

/// Decoded raster with interleaved bands
///
/// Color bands come first in color-mode order; when `has_alpha` is set the
/// last band is alpha.
#[derive(Debug, Clone, Serialize)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub channels: usize,
    pub has_alpha: bool,
    pub depth: BitDepth,
    pub color_mode: ColorMode,
    #[serde(skip)]
    pub samples: Samples,
}

impl Bitmap {
    pub fn new(
        width: u32,
        height: u32,
        channels: usize,
        has_alpha: bool,
        depth: BitDepth,
        color_mode: ColorMode,
    ) -> Self {
        let len = width as usize * height as usize * channels;
        Self {
            width,
            height,
            channels,
            has_alpha,
            depth,
            color_mode,
            samples: Samples::zeroed(depth, len),
        }
    }

    /// Interleave a planar channel into `band`
    ///
    /// Planes of another sample type or band indexes out of range are ignored.
    pub fn set_plane(&mut self, band: usize, plane: &Samples) -> bool {
        if band >= self.channels {
            return false;
        }
        let stride = self.channels;
        match (&mut self.samples, plane) {
            (Samples::U8(dst), Samples::U8(src)) => interleave(dst, src, band, stride),
            (Samples::U16(dst), Samples::U16(src)) => interleave(dst, src, band, stride),
            (Samples::F32(dst), Samples::F32(src)) => interleave(dst, src, band, stride),
            _ => return false,
        }
        true
    }

    /// Normalized sample at `(x, y)` in `band`
    pub fn sample(&self, x: u32, y: u32, band: usize) -> Option<f32> {
        if x >= self.width || y >= self.height || band >= self.channels {
            return None;
        }
        let index = (y as usize * self.width as usize + x as usize) * self.channels + band;
        self.samples.normalized(index)
    }

    /// Invert the first `color_bands` bands, leaving alpha untouched
    ///
    /// CMYK documents store ink coverage inverted.
    pub fn invert_color_bands(&mut self, color_bands: usize) {
        let stride = self.channels;
        let bands = color_bands.min(stride);
        match &mut self.samples {
            Samples::U8(v) => invert(v, stride, bands, |s| u8::MAX - s),
            Samples::U16(v) => invert(v, stride, bands, |s| u16::MAX - s),
            Samples::F32(v) => invert(v, stride, bands, |s| 1.0 - s),
        }
    }
}

fn interleave<T: Copy>(dst: &mut [T], src: &[T], band: usize, stride: usize) {
    for (pixel, &value) in dst.chunks_exact_mut(stride).zip(src) {
        pixel[band] = value;
    }
}

fn invert<T: Copy>(samples: &mut [T], stride: usize, bands: usize, f: impl Fn(T) -> T) {
    if stride == 0 {
        return;
    }
    for pixel in samples.chunks_exact_mut(stride) {
        for sample in &mut pixel[..bands] {
            *sample = f(*sample);
        }
    }
}
