//! Image resource blocks
//!
//! Each block is `8BIM`, a 16-bit id, a padded Pascal name and a length
//! prefixed payload padded to an even size. Only the ids the decoder
//! consumes get a typed payload; everything else is kept as raw bytes.

use indexmap::IndexMap;
use serde::Serialize;

use crate::chunk::cursor::check;
use crate::chunk::{
    clamp_tag, into_keyed, padded_even, read_counted, read_until_exhausted, Chunk, ChunkReader,
    Context, Frame,
};
use crate::error::ChunkError;

/// Image resource IDs understood by the decoder
pub mod resource_id {
    pub const RESOLUTION_INFO: u16 = 0x03ED;
    pub const GUIDES: u16 = 0x0408;
    pub const THUMBNAIL: u16 = 0x040C;
    pub const ICC_PROFILE: u16 = 0x040F;
    pub const INDEXED_COLOR_COUNT: u16 = 0x0416;
    pub const TRANSPARENCY_INDEX: u16 = 0x0417;
}

/// The image resources section, keyed by block id
#[derive(Debug, Clone, Default)]
pub struct ImageResources {
    pub blocks: IndexMap<u16, ResourceBlock>,
}

#[derive(Debug, Clone)]
pub struct ResourceBlock {
    pub id: u16,
    pub name: String,
    pub data: ResourceData,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResourceData {
    Guides(GuidesInfo),
    Thumbnail(ThumbnailInfo),
    Resolution(ResolutionInfo),
    ColorProfile(Vec<u8>),
    UnsignedShort(u16),
    Unknown(Vec<u8>),
}

/// Guide orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Vertical,
    Horizontal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GuideEntry {
    /// Position in 27.5 fixed point document pixels
    pub location: i32,
    pub orientation: Orientation,
}

/// Grid and guides resource (0x0408)
#[derive(Debug, Clone, PartialEq)]
pub struct GuidesInfo {
    pub version: i32,
    pub guides: Vec<GuideEntry>,
}

/// JPEG thumbnail resource (0x040C)
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailInfo {
    pub width: u32,
    pub height: u32,
    pub row_bytes: u32,
    pub size: u32,
    pub jpeg: Vec<u8>,
}

/// Unit a resolution value is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionUnit {
    Unknown,
    PixelsPerInch,
    PixelsPerCentimeter,
}

/// Unit the user chose to display dimensions in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayUnit {
    Unknown,
    Inches,
    Centimeters,
    Points,
    Picas,
    Columns,
}

/// Resolution info resource (0x03ED)
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionInfo {
    /// Horizontal resolution (fixed point 16.16)
    pub h_res: i32,
    pub h_res_unit: ResolutionUnit,
    pub width_unit: DisplayUnit,
    /// Vertical resolution (fixed point 16.16)
    pub v_res: i32,
    pub v_res_unit: ResolutionUnit,
    pub height_unit: DisplayUnit,
}

const CENTIMETERS_PER_INCH: f32 = 2.54;

impl ResolutionUnit {
    fn from_raw(raw: u16) -> Self {
        const UNITS: [ResolutionUnit; 3] = [
            ResolutionUnit::Unknown,
            ResolutionUnit::PixelsPerInch,
            ResolutionUnit::PixelsPerCentimeter,
        ];
        UNITS[clamp_tag(raw.into(), UNITS.len())]
    }
}

impl DisplayUnit {
    fn from_raw(raw: u16) -> Self {
        const UNITS: [DisplayUnit; 6] = [
            DisplayUnit::Unknown,
            DisplayUnit::Inches,
            DisplayUnit::Centimeters,
            DisplayUnit::Points,
            DisplayUnit::Picas,
            DisplayUnit::Columns,
        ];
        UNITS[clamp_tag(raw.into(), UNITS.len())]
    }
}

impl ResolutionInfo {
    fn to_dpi(value: i32, unit: ResolutionUnit) -> f32 {
        let res = value as f32 / 65536.0;
        match unit {
            ResolutionUnit::PixelsPerCentimeter => res * CENTIMETERS_PER_INCH,
            _ => res,
        }
    }

    /// Horizontal resolution in pixels per inch
    pub fn horizontal_dpi(&self) -> f32 {
        Self::to_dpi(self.h_res, self.h_res_unit)
    }

    /// Vertical resolution in pixels per inch
    pub fn vertical_dpi(&self) -> f32 {
        Self::to_dpi(self.v_res, self.v_res_unit)
    }

    fn read(r: &mut ChunkReader<'_>) -> Result<Self, ChunkError> {
        Ok(ResolutionInfo {
            h_res: r.read_i32()?,
            h_res_unit: ResolutionUnit::from_raw(r.read_u16()?),
            width_unit: DisplayUnit::from_raw(r.read_u16()?),
            v_res: r.read_i32()?,
            v_res_unit: ResolutionUnit::from_raw(r.read_u16()?),
            height_unit: DisplayUnit::from_raw(r.read_u16()?),
        })
    }
}

impl GuidesInfo {
    fn read(r: &mut ChunkReader<'_>) -> Result<Self, ChunkError> {
        let version = r.read_i32()?;
        r.skip(8)?;
        let count = r.read_i32()?.max(0) as usize;
        let guides = read_counted(count, |_| {
            let location = r.read_i32()?;
            let orientation = match clamp_tag(r.read_u8()?.into(), 2) {
                0 => Orientation::Vertical,
                _ => Orientation::Horizontal,
            };
            Ok(GuideEntry {
                location,
                orientation,
            })
        })?;
        Ok(GuidesInfo { version, guides })
    }
}

impl ThumbnailInfo {
    fn read(r: &mut ChunkReader<'_>) -> Result<Self, ChunkError> {
        let format = r.read_u32()?;
        check("thumbnail format", 1, format)?;
        let width = r.read_u32()?;
        let height = r.read_u32()?;
        let row_bytes = r.read_u32()?;
        let size = r.read_u32()?;
        let compressed_size = r.read_u32()?;
        check("thumbnail bits per pixel", 24, r.read_u16()?)?;
        check("thumbnail planes", 1, r.read_u16()?)?;
        Ok(ThumbnailInfo {
            width,
            height,
            row_bytes,
            size,
            jpeg: r.read_bytes(compressed_size.into())?,
        })
    }
}

impl Chunk for ResourceBlock {
    fn read(r: &mut ChunkReader<'_>, ctx: &mut Context) -> Result<Self, ChunkError> {
        r.expect("resource signature", b"8BIM")?;
        let id = r.read_u16()?;
        let name_len = r.read_u8()?;
        let name = r.read_fixed_string(name_len.into())?;
        // length byte + name is padded to an even size
        r.skip((u64::from(name_len) + 1) & 1)?;
        let length = r.read_u32()?;
        let mut body = r.bounded(padded_even(length.into()))?;

        let data = ctx.scoped(Frame::ResourceBlock { id, length }, |_| {
            let data = match id {
                resource_id::GUIDES => ResourceData::Guides(GuidesInfo::read(&mut body)?),
                resource_id::THUMBNAIL => {
                    ResourceData::Thumbnail(ThumbnailInfo::read(&mut body)?)
                }
                resource_id::RESOLUTION_INFO => {
                    ResourceData::Resolution(ResolutionInfo::read(&mut body)?)
                }
                resource_id::ICC_PROFILE => {
                    ResourceData::ColorProfile(body.read_bytes(length.into())?)
                }
                resource_id::INDEXED_COLOR_COUNT | resource_id::TRANSPARENCY_INDEX => {
                    ResourceData::UnsignedShort(body.read_u16()?)
                }
                _ => ResourceData::Unknown(body.read_bytes(length.into())?),
            };
            Ok(data)
        })?;

        Ok(ResourceBlock { id, name, data })
    }
}

impl Chunk for ImageResources {
    fn read(r: &mut ChunkReader<'_>, ctx: &mut Context) -> Result<Self, ChunkError> {
        let length = r.read_u32()?;
        let mut section = r.bounded(length.into())?;
        let blocks = read_until_exhausted(&mut section, 12, |r| ResourceBlock::read(r, ctx))?;
        tracing::debug!("Read {} image resource blocks", blocks.len());
        Ok(ImageResources {
            blocks: into_keyed(blocks.into_iter().map(|block| (block.id, block))),
        })
    }
}

impl ImageResources {
    pub fn get(&self, id: u16) -> Option<&ResourceData> {
        self.blocks.get(&id).map(|block| &block.data)
    }

    pub fn unsigned_short(&self, id: u16) -> Option<u16> {
        match self.get(id)? {
            ResourceData::UnsignedShort(value) => Some(*value),
            _ => None,
        }
    }
}
