//! PSD document schema
//!
//! Reads the five top-level sections of a Photoshop document into plain
//! records:
//!
//! - [`header::Header`]: dimensions, depth and color mode
//! - [`header::ColorData`]: palette for indexed documents
//! - [`resources::ImageResources`]: resolution, guides, thumbnail, ...
//! - [`layers::LayersInformation`]: layer records, channel data and tagged blocks
//! - [`ImageData`]: the flattened composite
//!
//! Nothing here interprets the records; see [`crate::assemble`] for that.
//!
//! # Example
//!
//! ```ignore
//! use psdprobe_lib::psd::PsdFile;
//!
//! let data = std::fs::read("poster.psd")?;
//! let file = PsdFile::parse(&data, true)?;
//! println!("{}x{}", file.header.width, file.header.height);
//! ```

pub mod descriptor;
pub mod header;
pub mod layers;
pub mod properties;
pub mod resources;

#[cfg(test)]
mod tests;

use crate::chunk::{Chunk, ChunkReader, Context};
use crate::error::ChunkError;
use crate::pixels::compression::Compression;

pub use descriptor::{Descriptor, DescriptorValue};
pub use header::{ColorData, ColorMode, Header};
pub use layers::{LayersInformation, LayersList, RawLayer};
pub use properties::{LayerProperty, PropertyData};
pub use resources::{ImageResources, ResourceData};

/// The flattened composite image
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    pub compression: Compression,
    pub data: Vec<u8>,
}

impl Chunk for ImageData {
    fn read(r: &mut ChunkReader<'_>, _ctx: &mut Context) -> Result<Self, ChunkError> {
        Ok(ImageData {
            compression: Compression::from_raw(r.read_u16()?),
            data: r.read_rest().to_vec(),
        })
    }
}

/// A whole document as stored on disk
#[derive(Debug, Clone)]
pub struct PsdFile {
    pub header: Header,
    pub color_data: ColorData,
    pub resources: ImageResources,
    pub layers_info: LayersInformation,
    pub image_data: ImageData,
}

impl PsdFile {
    /// Read all sections; with `with_layers` unset the layer section is skipped unparsed
    pub fn parse(data: &[u8], with_layers: bool) -> Result<Self, ChunkError> {
        let mut r = ChunkReader::new(data);
        let mut ctx = Context::new();

        let header = Header::read(&mut r, &mut ctx)?;
        let color_data = ColorData::read(&mut r, &mut ctx)?;
        let resources = ImageResources::read(&mut r, &mut ctx)?;
        let layers_info = if with_layers {
            LayersInformation::read(&mut r, &mut ctx)?
        } else {
            skip_layers(&mut r)?
        };
        let image_data = ImageData::read(&mut r, &mut ctx)?;

        tracing::debug!(
            "Parsed {}x{} document: {} resources, {} layer records",
            header.width,
            header.height,
            resources.blocks.len(),
            layers_info.layers.layers.len()
        );

        Ok(PsdFile {
            header,
            color_data,
            resources,
            layers_info,
            image_data,
        })
    }

    /// Layer list matching the document depth
    ///
    /// 16- and 32-bit documents keep their layers in the `Lr16`/`Lr32`
    /// tagged blocks; without one the regular list is used.
    pub fn layers_for_depth(&self) -> &LayersList {
        let key = match self.header.depth {
            16 => Some(properties::property_key::LAYERS_16),
            32 => Some(properties::property_key::LAYERS_32),
            _ => None,
        };
        let tagged = key
            .and_then(|key| self.layers_info.extras.get(key))
            .and_then(|property| match &property.data {
                PropertyData::Layers(list) => Some(list),
                _ => None,
            });
        tagged.unwrap_or(&self.layers_info.layers)
    }
}

/// Skip the layer section, keeping only the merged alpha flag of its count
fn skip_layers(r: &mut ChunkReader<'_>) -> Result<LayersInformation, ChunkError> {
    let length = r.read_u32()?;
    let mut section = r.bounded(length.into())?;
    let mut info = LayersInformation::default();
    if section.remaining() >= 6 {
        let list_length = section.read_u32()?;
        if list_length >= 2 {
            info.layers.merged_alpha = section.read_i16()? < 0;
        }
    }
    Ok(info)
}
