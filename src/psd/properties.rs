//! Tagged layer properties ("additional layer information")
//!
//! Each property is a signature, a four-character key and a length
//! prefixed payload. The key selects how the payload is decoded; keys the
//! decoder has no use for keep their raw bytes.

use crate::chunk::cursor::check;
use crate::chunk::{clamp_tag, read_counted, Chunk, ChunkReader, Context, Frame};
use crate::error::ChunkError;

use super::descriptor::Descriptor;
use super::layers::LayersList;

/// Property keys the decoder interprets
pub mod property_key {
    pub const EFFECTS: &str = "lfx2";
    pub const MULTI_EFFECTS: &str = "lmfx";
    pub const SECTION: &str = "lsct";
    pub const UNICODE_NAME: &str = "luni";
    pub const SOLID_COLOR: &str = "SoCo";
    pub const FILL_OPACITY: &str = "iOpa";
    pub const TYPE_TOOL: &str = "TySh";
    pub const SHAPE_MASK: &str = "vmsk";
    pub const SHAPE_MASK_LEGACY: &str = "vsms";
    pub const SHAPE_GRAPHICS: &str = "vscg";
    pub const SHAPE_STROKE: &str = "vstk";
    pub const LAYERS_16: &str = "Lr16";
    pub const LAYERS_32: &str = "Lr32";
}

#[derive(Debug, Clone)]
pub struct LayerProperty {
    pub signature: String,
    pub key: String,
    pub data: PropertyData,
}

#[derive(Debug, Clone)]
pub enum PropertyData {
    Effects(LayerEffects),
    Section(LayerSection),
    UnicodeName(String),
    SolidColor(SolidColor),
    FillOpacity(u8),
    TypeTool(Box<TypeToolObject>),
    ShapeMask(ShapeMask),
    ShapeGraphics(ShapeGraphics),
    Stroke(ShapeStroke),
    Layers(LayersList),
    Unknown(Vec<u8>),
}

impl Chunk for LayerProperty {
    fn read(r: &mut ChunkReader<'_>, ctx: &mut Context) -> Result<Self, ChunkError> {
        let signature = r.read_key()?;
        let key = r.read_key()?;
        let length = r.read_u32()?;
        let mut body = r.bounded(length.into())?;

        let frame = Frame::LayerProperty {
            key: key.clone(),
            length,
        };
        let data = ctx.scoped(frame, |ctx| {
            let body = &mut body;
            let data = match key.as_str() {
                property_key::EFFECTS | property_key::MULTI_EFFECTS => {
                    PropertyData::Effects(LayerEffects::read(body, ctx)?)
                }
                property_key::SECTION => PropertyData::Section(LayerSection::read(body, ctx)?),
                property_key::UNICODE_NAME => PropertyData::UnicodeName(body.read_unicode_string()?),
                property_key::SOLID_COLOR => PropertyData::SolidColor(SolidColor {
                    version: body.read_u32()?,
                    descriptor: Descriptor::read(body, ctx)?,
                }),
                property_key::FILL_OPACITY => PropertyData::FillOpacity(body.read_u8()?),
                property_key::TYPE_TOOL => {
                    PropertyData::TypeTool(Box::new(TypeToolObject::read(body, ctx)?))
                }
                property_key::SHAPE_MASK | property_key::SHAPE_MASK_LEGACY => {
                    PropertyData::ShapeMask(ShapeMask::read(body, ctx)?)
                }
                property_key::SHAPE_GRAPHICS => PropertyData::ShapeGraphics(ShapeGraphics {
                    key: body.read_key()?,
                    version: body.read_u32()?,
                    descriptor: Descriptor::read(body, ctx)?,
                }),
                property_key::SHAPE_STROKE => PropertyData::Stroke(ShapeStroke {
                    version: body.read_u32()?,
                    descriptor: Descriptor::read(body, ctx)?,
                }),
                property_key::LAYERS_16 | property_key::LAYERS_32 => {
                    PropertyData::Layers(LayersList::read_body(body, ctx)?)
                }
                _ => PropertyData::Unknown(body.read_rest().to_vec()),
            };
            Ok(data)
        })?;

        Ok(LayerProperty {
            signature,
            key,
            data,
        })
    }
}

/// Layer style (`lfx2`, `lmfx`)
#[derive(Debug, Clone)]
pub struct LayerEffects {
    pub descriptor_version: u32,
    pub descriptor: Descriptor,
}

impl Chunk for LayerEffects {
    fn read(r: &mut ChunkReader<'_>, ctx: &mut Context) -> Result<Self, ChunkError> {
        check("effects version", 0, r.read_u32()?)?;
        Ok(LayerEffects {
            descriptor_version: r.read_u32()?,
            descriptor: Descriptor::read(r, ctx)?,
        })
    }
}

/// Kind of section divider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionType {
    Other,
    GroupOpened,
    GroupClosed,
    /// Hidden marker closing a group
    Bounding,
}

/// Section divider (`lsct`)
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSection {
    pub section_type: SectionType,
    pub signature: Option<String>,
    pub blend_mode: Option<String>,
    pub sub_type: Option<u32>,
}

impl Chunk for LayerSection {
    fn read(r: &mut ChunkReader<'_>, ctx: &mut Context) -> Result<Self, ChunkError> {
        const TYPES: [SectionType; 4] = [
            SectionType::Other,
            SectionType::GroupOpened,
            SectionType::GroupClosed,
            SectionType::Bounding,
        ];
        let section_type = TYPES[clamp_tag(r.read_u32()?, TYPES.len())];

        // Older files stop after the type
        let length = ctx.enclosing_property().map_or(0, |(_, length)| length);
        let mut section = LayerSection {
            section_type,
            signature: None,
            blend_mode: None,
            sub_type: None,
        };
        if length >= 12 {
            section.signature = Some(r.read_key()?);
            section.blend_mode = Some(r.read_key()?);
        }
        if length >= 16 {
            section.sub_type = Some(r.read_u32()?);
        }
        Ok(section)
    }
}

/// Solid color fill (`SoCo`)
#[derive(Debug, Clone)]
pub struct SolidColor {
    pub version: u32,
    pub descriptor: Descriptor,
}

/// Vector shape graphics (`vscg`)
#[derive(Debug, Clone)]
pub struct ShapeGraphics {
    /// Kind of fill content, e.g. `SoCo`
    pub key: String,
    pub version: u32,
    pub descriptor: Descriptor,
}

/// Vector stroke (`vstk`)
#[derive(Debug, Clone)]
pub struct ShapeStroke {
    pub version: u32,
    pub descriptor: Descriptor,
}

/// Type tool object (`TySh`)
#[derive(Debug, Clone)]
pub struct TypeToolObject {
    pub version: i16,
    pub xx: f64,
    pub xy: f64,
    pub yx: f64,
    pub yy: f64,
    pub tx: f64,
    pub ty: f64,
    pub text_version: i16,
    pub text_descriptor_version: i32,
    pub text: Descriptor,
    pub warp_version: i16,
    pub warp_descriptor_version: i32,
    pub warp: Descriptor,
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Chunk for TypeToolObject {
    fn read(r: &mut ChunkReader<'_>, ctx: &mut Context) -> Result<Self, ChunkError> {
        Ok(TypeToolObject {
            version: r.read_i16()?,
            xx: r.read_f64()?,
            xy: r.read_f64()?,
            yx: r.read_f64()?,
            yy: r.read_f64()?,
            tx: r.read_f64()?,
            ty: r.read_f64()?,
            text_version: r.read_i16()?,
            text_descriptor_version: r.read_i32()?,
            text: Descriptor::read(r, ctx)?,
            warp_version: r.read_i16()?,
            warp_descriptor_version: r.read_i32()?,
            warp: Descriptor::read(r, ctx)?,
            left: r.read_i32()?,
            top: r.read_i32()?,
            right: r.read_i32()?,
            bottom: r.read_i32()?,
        })
    }
}

/// Path record selectors
pub mod selector {
    pub const CLOSED_SUBPATH_LENGTH: i16 = 0;
    pub const CLOSED_SUBPATH_KNOT_LINKED: i16 = 1;
    pub const CLOSED_SUBPATH_KNOT_UNLINKED: i16 = 2;
    pub const OPEN_SUBPATH_LENGTH: i16 = 3;
    pub const OPEN_SUBPATH_KNOT_LINKED: i16 = 4;
    pub const OPEN_SUBPATH_KNOT_UNLINKED: i16 = 5;
}

/// Size of one path record after its selector
const PATH_RECORD_BODY_LEN: u64 = 24;

/// Vector mask (`vmsk`, `vsms`)
#[derive(Debug, Clone)]
pub struct ShapeMask {
    pub version: u32,
    pub flags: u32,
    pub records: Vec<PathRecord>,
}

impl Chunk for ShapeMask {
    fn read(r: &mut ChunkReader<'_>, ctx: &mut Context) -> Result<Self, ChunkError> {
        let version = r.read_u32()?;
        let flags = r.read_u32()?;
        let length = ctx.enclosing_property().map_or(0, |(_, length)| length);
        let count = length.saturating_sub(8) as usize / (2 + PATH_RECORD_BODY_LEN as usize);
        let records = read_counted(count, |_| PathRecord::read(r, ctx))?;
        Ok(ShapeMask {
            version,
            flags,
            records,
        })
    }
}

/// One 26-byte path record
#[derive(Debug, Clone, PartialEq)]
pub struct PathRecord {
    pub selector: i16,
    pub data: PathRecordData,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PathRecordData {
    /// Starts a sub-path of `knot_count` knots
    SubPath { knot_count: u16, op: u16, tag: u16 },
    Knot(BezierKnot),
    /// Fill rule, clipboard and other records
    Other,
}

/// Bézier knot with coordinates in 8.24 fixed point, normalized to the document size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BezierKnot {
    pub control_enter_y: i32,
    pub control_enter_x: i32,
    pub anchor_y: i32,
    pub anchor_x: i32,
    pub control_exit_y: i32,
    pub control_exit_x: i32,
}

impl Chunk for PathRecord {
    fn read(r: &mut ChunkReader<'_>, _ctx: &mut Context) -> Result<Self, ChunkError> {
        let selector = r.read_i16()?;
        let mut body = r.bounded(PATH_RECORD_BODY_LEN)?;
        let data = match selector {
            selector::CLOSED_SUBPATH_LENGTH | selector::OPEN_SUBPATH_LENGTH => {
                PathRecordData::SubPath {
                    knot_count: body.read_u16()?,
                    op: body.read_u16()?,
                    tag: body.read_u16()?,
                }
            }
            selector::CLOSED_SUBPATH_KNOT_LINKED
            | selector::CLOSED_SUBPATH_KNOT_UNLINKED
            | selector::OPEN_SUBPATH_KNOT_LINKED
            | selector::OPEN_SUBPATH_KNOT_UNLINKED => PathRecordData::Knot(BezierKnot {
                control_enter_y: body.read_i32()?,
                control_enter_x: body.read_i32()?,
                anchor_y: body.read_i32()?,
                anchor_x: body.read_i32()?,
                control_exit_y: body.read_i32()?,
                control_exit_x: body.read_i32()?,
            }),
            _ => PathRecordData::Other,
        };
        Ok(PathRecord { selector, data })
    }
}
