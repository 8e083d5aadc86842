//! File header and color mode data

use serde::Serialize;

use crate::chunk::cursor::check;
use crate::chunk::{Chunk, ChunkReader, Context};
use crate::error::ChunkError;

/// PSD file signature
pub const PSD_SIGNATURE: &[u8; 4] = b"8BPS";

/// PSD color modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorMode {
    Bitmap,
    Grayscale,
    Indexed,
    Rgb,
    Cmyk,
    Multichannel,
    Duotone,
    Lab,
    /// Any other tag, kept verbatim
    Unknown(u16),
}

impl ColorMode {
    pub fn from_raw(raw: u16) -> Self {
        match raw {
            0 => ColorMode::Bitmap,
            1 => ColorMode::Grayscale,
            2 => ColorMode::Indexed,
            3 => ColorMode::Rgb,
            4 => ColorMode::Cmyk,
            7 => ColorMode::Multichannel,
            8 => ColorMode::Duotone,
            9 => ColorMode::Lab,
            other => ColorMode::Unknown(other),
        }
    }

    pub fn raw(self) -> u16 {
        match self {
            ColorMode::Bitmap => 0,
            ColorMode::Grayscale => 1,
            ColorMode::Indexed => 2,
            ColorMode::Rgb => 3,
            ColorMode::Cmyk => 4,
            ColorMode::Multichannel => 7,
            ColorMode::Duotone => 8,
            ColorMode::Lab => 9,
            ColorMode::Unknown(other) => other,
        }
    }

    /// Number of color (non-alpha) bands, `None` for palette-based and unsupported modes
    pub fn color_channels(self) -> Option<usize> {
        match self {
            ColorMode::Grayscale | ColorMode::Duotone => Some(1),
            ColorMode::Rgb | ColorMode::Lab => Some(3),
            ColorMode::Cmyk => Some(4),
            _ => None,
        }
    }
}

/// PSD file header (26 bytes, Big-Endian)
///
/// Structure:
/// - Signature: 4 bytes ("8BPS")
/// - Version: 2 bytes (must be 1)
/// - Reserved: 6 bytes
/// - Channels: 2 bytes
/// - Height: 4 bytes
/// - Width: 4 bytes
/// - Depth: 2 bytes (1, 8, 16, or 32)
/// - Color mode: 2 bytes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Header {
    pub version: u16,
    pub channels: u16,
    pub height: u32,
    pub width: u32,
    pub depth: u16,
    pub color_mode: ColorMode,
}

impl Header {
    pub const SIZE: usize = 26;

    /// Whether `data` starts with a readable header
    pub fn probe(data: &[u8]) -> bool {
        let mut r = ChunkReader::new(data);
        Header::read(&mut r, &mut Context::new()).is_ok()
    }
}

impl Chunk for Header {
    fn read(r: &mut ChunkReader<'_>, _ctx: &mut Context) -> Result<Self, ChunkError> {
        r.expect("signature", PSD_SIGNATURE)?;
        let version = r.read_u16()?;
        check("version", 1, version)?;
        r.skip(6)?;
        Ok(Header {
            version,
            channels: r.read_u16()?,
            height: r.read_u32()?,
            width: r.read_u32()?,
            depth: r.read_u16()?,
            color_mode: ColorMode::from_raw(r.read_u16()?),
        })
    }
}

/// Color mode data section (palette for indexed documents)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorData {
    pub data: Vec<u8>,
}

impl Chunk for ColorData {
    fn read(r: &mut ChunkReader<'_>, _ctx: &mut Context) -> Result<Self, ChunkError> {
        let len = r.read_u32()?;
        Ok(ColorData {
            data: r.read_bytes(len.into())?,
        })
    }
}
