//! Layer and mask information section

use indexmap::IndexMap;

use crate::chunk::{
    into_keyed, padded_to, read_counted, read_until_exhausted, signed_count, Chunk, ChunkReader,
    Context, Frame,
};
use crate::error::ChunkError;
use crate::pixels::compression::Compression;

use super::properties::LayerProperty;

/// Smallest possible tagged property: signature, key and length
const PROPERTY_HEADER_LEN: u64 = 12;

/// Layer and mask information section
#[derive(Debug, Clone, Default)]
pub struct LayersInformation {
    pub layers: LayersList,
    pub global_mask: Vec<u8>,
    /// Document-level tagged blocks (`Lr16`, `Lr32`, ...)
    pub extras: IndexMap<String, LayerProperty>,
}

impl Chunk for LayersInformation {
    fn read(r: &mut ChunkReader<'_>, ctx: &mut Context) -> Result<Self, ChunkError> {
        let length = r.read_u32()?;
        if length == 0 {
            return Ok(LayersInformation::default());
        }
        let mut section = r.bounded(length.into())?;

        let layers = LayersList::read(&mut section, ctx)?;
        let global_mask = if section.remaining() >= 4 {
            let len = section.read_u32()?;
            section.read_bytes(len.into())?
        } else {
            Vec::new()
        };
        let extras = read_until_exhausted(&mut section, PROPERTY_HEADER_LEN, |r| {
            LayerProperty::read(r, ctx)
        })?;

        Ok(LayersInformation {
            layers,
            global_mask,
            extras: into_keyed(extras.into_iter().map(|p| (p.key.clone(), p))),
        })
    }
}

/// Layer records and their channel data
#[derive(Debug, Clone, Default)]
pub struct LayersList {
    /// The layer count was negative: the composite's first extra channel is alpha
    pub merged_alpha: bool,
    pub layers: Vec<RawLayer>,
    /// Channel data, one entry per layer in record order
    pub channels: Vec<Vec<ChannelImageData>>,
}

impl Chunk for LayersList {
    fn read(r: &mut ChunkReader<'_>, ctx: &mut Context) -> Result<Self, ChunkError> {
        let length = r.read_u32()?;
        if length == 0 {
            return Ok(LayersList::default());
        }
        let mut body = r.bounded(length.into())?;
        LayersList::read_body(&mut body, ctx)
    }
}

impl LayersList {
    /// Count, records and channel data without the leading length
    pub fn read_body(r: &mut ChunkReader<'_>, ctx: &mut Context) -> Result<Self, ChunkError> {
        let (count, merged_alpha) = signed_count(r.read_i16()?);
        tracing::debug!("Reading {} layer records", count);

        ctx.scoped(Frame::LayersList { count }, |ctx| {
            let layers = read_counted(count, |_| {
                ctx.scoped(Frame::RawLayer, |ctx| RawLayer::read(r, ctx))
            })?;

            let mut channels = Vec::with_capacity(layers.len());
            for layer in &layers {
                channels.push(read_counted(layer.channels_info.len(), |i| {
                    ChannelImageData::read(r, layer.channels_info[i].data_length)
                })?);
            }

            Ok(LayersList {
                merged_alpha,
                layers,
                channels,
            })
        })
    }
}

/// Channel information in a layer record
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelInfo {
    /// Channel ID: -1=transparency, 0..=4 color bands, below -1 masks
    pub id: i16,
    /// Length of channel data (including compression marker)
    pub data_length: u32,
}

/// Layer record flags
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LayerFlags {
    pub transparency_protected: bool,
    pub visible: bool,
    pub obsolete: bool,
    pub has_useful_info: bool,
    pub pixel_data_irrelevant: bool,
}

impl LayerFlags {
    pub fn from_byte(b: u8) -> Self {
        Self {
            transparency_protected: (b & 0x01) != 0,
            visible: (b & 0x02) == 0, // Note: bit clear = visible
            obsolete: (b & 0x04) != 0,
            has_useful_info: (b & 0x08) != 0,
            pixel_data_irrelevant: (b & 0x10) != 0,
        }
    }
}

/// A layer record as stored in the file
#[derive(Debug, Clone)]
pub struct RawLayer {
    pub top: i32,
    pub left: i32,
    pub bottom: i32,
    pub right: i32,
    pub channels_info: Vec<ChannelInfo>,
    pub blend_mode: String,
    pub opacity: u8,
    pub clipping: u8,
    pub flags: LayerFlags,
    pub extras: LayerExtras,
}

impl RawLayer {
    pub fn width(&self) -> i32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> i32 {
        self.bottom.saturating_sub(self.top)
    }

    pub fn property(&self, key: &str) -> Option<&LayerProperty> {
        self.extras.properties.get(key)
    }
}

impl Chunk for RawLayer {
    fn read(r: &mut ChunkReader<'_>, ctx: &mut Context) -> Result<Self, ChunkError> {
        let top = r.read_i32()?;
        let left = r.read_i32()?;
        let bottom = r.read_i32()?;
        let right = r.read_i32()?;

        let channel_count = r.read_u16()?;
        let channels_info = read_counted(channel_count.into(), |_| {
            Ok(ChannelInfo {
                id: r.read_i16()?,
                data_length: r.read_u32()?,
            })
        })?;

        r.expect("layer signature", b"8BIM")?;
        let blend_mode = r.read_key()?;
        let opacity = r.read_u8()?;
        let clipping = r.read_u8()?;
        let flags = LayerFlags::from_byte(r.read_u8()?);
        r.skip(1)?; // filler

        let extra_length = r.read_u32()?;
        let mut extras = r.bounded(extra_length.into())?;
        let extras = LayerExtras::read(&mut extras, ctx)?;

        Ok(RawLayer {
            top,
            left,
            bottom,
            right,
            channels_info,
            blend_mode,
            opacity,
            clipping,
            flags,
            extras,
        })
    }
}

/// Variable-length tail of a layer record
#[derive(Debug, Clone, Default)]
pub struct LayerExtras {
    pub mask: MaskAdjustment,
    /// The first blend range is always composite gray
    pub blend_ranges: Vec<BlendRange>,
    /// Legacy Pascal name
    pub name: String,
    pub properties: IndexMap<String, LayerProperty>,
}

impl Chunk for LayerExtras {
    fn read(r: &mut ChunkReader<'_>, ctx: &mut Context) -> Result<Self, ChunkError> {
        let mask = MaskAdjustment::read(r, ctx)?;

        let ranges_length = r.read_u32()?;
        let mut ranges = r.bounded(ranges_length.into())?;
        let blend_ranges = read_until_exhausted(&mut ranges, 8, BlendRange::read)?;

        // Pascal string padded to a multiple of 4 bytes
        let name_len = u64::from(r.read_u8()?);
        let name = r.read_fixed_string(name_len)?;
        r.skip(padded_to(name_len + 1, 4) - (name_len + 1))?;

        let properties = read_until_exhausted(r, PROPERTY_HEADER_LEN, |r| {
            LayerProperty::read(r, ctx)
        })?;

        Ok(LayerExtras {
            mask,
            blend_ranges,
            name,
            properties: into_keyed(properties.into_iter().map(|p| (p.key.clone(), p))),
        })
    }
}

/// Layer mask / adjustment layer data
///
/// A length of 20 ends with two bytes of padding; any other non-zero
/// length carries the "real" mask fields instead.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaskAdjustment {
    pub length: u32,
    pub top: u32,
    pub left: u32,
    pub bottom: u32,
    pub right: u32,
    pub default_color: u8,
    pub flags: u8,
    pub mask_parameters: u8,
    pub user_mask_density: Option<u8>,
    pub user_mask_feather: Option<f64>,
    pub vector_mask_density: Option<u8>,
    pub vector_mask_feather: Option<f64>,
    pub real: Option<RealMask>,
}

/// Mask fields present when the mask block is longer than 20 bytes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RealMask {
    pub flags: u8,
    pub user_mask_background: u8,
    pub top: u32,
    pub left: u32,
    pub bottom: u32,
    pub right: u32,
}

impl Chunk for MaskAdjustment {
    fn read(r: &mut ChunkReader<'_>, _ctx: &mut Context) -> Result<Self, ChunkError> {
        let length = r.read_u32()?;
        if length == 0 {
            return Ok(MaskAdjustment::default());
        }
        let mut r = r.bounded(length.into())?;

        let mut mask = MaskAdjustment {
            length,
            top: r.read_u32()?,
            left: r.read_u32()?,
            bottom: r.read_u32()?,
            right: r.read_u32()?,
            default_color: r.read_u8()?,
            flags: r.read_u8()?,
            ..Default::default()
        };

        if mask.flags & 0x10 != 0 {
            mask.mask_parameters = r.read_u8()?;
        }
        let params = mask.mask_parameters;
        if params & 0x1 != 0 {
            mask.user_mask_density = Some(r.read_u8()?);
        }
        if params & 0x2 != 0 {
            mask.user_mask_feather = Some(r.read_f64()?);
        }
        if params & 0x4 != 0 {
            mask.vector_mask_density = Some(r.read_u8()?);
        }
        if params & 0x8 != 0 {
            mask.vector_mask_feather = Some(r.read_f64()?);
        }

        if length == 20 {
            r.skip(2)?; // padding
            return Ok(mask);
        }

        mask.real = Some(RealMask {
            flags: r.read_u8()?,
            user_mask_background: r.read_u8()?,
            top: r.read_u32()?,
            left: r.read_u32()?,
            bottom: r.read_u32()?,
            right: r.read_u32()?,
        });
        Ok(mask)
    }
}

/// Tonal range for one channel
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BlendRange {
    pub src_black_in: u8,
    pub src_white_in: u8,
    pub src_black_out: u8,
    pub src_white_out: u8,
    pub dst_black_in: u8,
    pub dst_white_in: u8,
    pub dst_black_out: u8,
    pub dst_white_out: u8,
}

impl BlendRange {
    fn read(r: &mut ChunkReader<'_>) -> Result<Self, ChunkError> {
        Ok(BlendRange {
            src_black_in: r.read_u8()?,
            src_white_in: r.read_u8()?,
            src_black_out: r.read_u8()?,
            src_white_out: r.read_u8()?,
            dst_black_in: r.read_u8()?,
            dst_white_in: r.read_u8()?,
            dst_black_out: r.read_u8()?,
            dst_white_out: r.read_u8()?,
        })
    }
}

/// Compressed pixel data of one layer channel
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelImageData {
    pub compression: Compression,
    pub data: Vec<u8>,
}

impl ChannelImageData {
    /// `data_length` comes from the owning layer's channel table and includes
    /// the two-byte compression tag
    fn read(r: &mut ChunkReader<'_>, data_length: u32) -> Result<Self, ChunkError> {
        let compression = Compression::from_raw(r.read_u16()?);
        let data = r.read_bytes(u64::from(data_length.saturating_sub(2)))?;
        Ok(ChannelImageData { compression, data })
    }
}
