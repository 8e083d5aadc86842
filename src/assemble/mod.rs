//! Document assembler
//!
//! Turns the raw records of a [`PsdFile`] into an [`Image`]: document
//! metrics from the header and resources, the layer tree rebuilt from the
//! flat record list, and the merged composite.
//!
//! Records are stored bottom-most first. Walking them in reverse visits
//! each group record before its members and the hidden bounding record
//! last, so a plain stack is enough to rebuild the nesting.

pub mod color;
pub mod effects;
pub mod raster;
pub mod shape;
pub mod text;

use std::collections::HashMap;

use crate::config::DecodeOptions;
use crate::error::DecodeError;
use crate::model::{BlendMode, Guide, Image, Layer, LayerKind, Rect, DEFAULT_RESOLUTION};
use crate::psd::layers::{ChannelImageData, LayersList};
use crate::psd::properties::{property_key, LayerSection, SectionType};
use crate::psd::resources::{resource_id, ResourceData};
use crate::psd::{Header, PropertyData, PsdFile, RawLayer};

use shape::PathTransform;

/// Guide positions are stored in 1/32 pixel units
const GUIDE_UNITS_PER_PIXEL: f32 = 32.0;

/// Tagged blocks that make a layer an adjustment or fill layer
const ADJUSTMENT_KEYS: [&str; 20] = [
    "SoCo", "GdFl", "PtFl", "brit", "levl", "curv", "expA", "vibA", "hue ", "hue2", "blnc",
    "blwh", "phfl", "mixr", "clrL", "nvrt", "post", "thrs", "grdm", "selc",
];

/// Build the decoded image
pub fn assemble(file: &PsdFile, options: &DecodeOptions) -> Result<Image, DecodeError> {
    let header = &file.header;
    let resources = &file.resources;

    let (horizontal_resolution, vertical_resolution) =
        match resources.get(resource_id::RESOLUTION_INFO) {
            Some(ResourceData::Resolution(info)) => (info.horizontal_dpi(), info.vertical_dpi()),
            _ => (DEFAULT_RESOLUTION, DEFAULT_RESOLUTION),
        };

    let guides = match resources.get(resource_id::GUIDES) {
        Some(ResourceData::Guides(info)) if options.decode_guides => info
            .guides
            .iter()
            .map(|guide| Guide {
                orientation: guide.orientation,
                position: guide.location as f32 / GUIDE_UNITS_PER_PIXEL,
            })
            .collect(),
        _ => Vec::new(),
    };

    let thumbnail = match resources.get(resource_id::THUMBNAIL) {
        Some(ResourceData::Thumbnail(info)) if options.decode_thumbnail => {
            raster::decode_thumbnail(info)
        }
        _ => None,
    };

    let icc_profile = match resources.get(resource_id::ICC_PROFILE) {
        Some(ResourceData::ColorProfile(profile)) => Some(profile.clone()),
        _ => None,
    };

    let list = file.layers_for_depth();
    let layers = if options.decode_layers {
        let builder = LayerBuilder {
            header,
            list,
            options,
            resolution: vertical_resolution,
            counters: HashMap::new(),
        };
        builder.build_tree()?
    } else {
        Vec::new()
    };

    let merged_image = raster::decode_composite(file, list.merged_alpha);
    if merged_image.is_none() {
        tracing::warn!("Composite image could not be decoded");
    }

    tracing::info!(
        "Decoded {}x{} {:?} document ({}-bit, {} root layers)",
        header.width,
        header.height,
        header.color_mode,
        header.depth,
        layers.len()
    );

    Ok(Image {
        width: header.width,
        height: header.height,
        depth: header.depth,
        channels: header.channels,
        color_mode: header.color_mode,
        horizontal_resolution,
        vertical_resolution,
        icc_profile,
        thumbnail,
        guides,
        layers,
        merged_image,
    })
}

/// Kind of a plain (non-divider) layer record
pub fn infer_kind(layer: &RawLayer) -> LayerKind {
    if layer.property(property_key::TYPE_TOOL).is_some() {
        LayerKind::Text
    } else if layer.property(property_key::SHAPE_MASK).is_some()
        || layer.property(property_key::SHAPE_MASK_LEGACY).is_some()
    {
        LayerKind::Shape
    } else if ADJUSTMENT_KEYS.iter().any(|key| layer.property(key).is_some()) {
        LayerKind::Adjustment
    } else {
        LayerKind::Image
    }
}

fn section(layer: &RawLayer) -> Option<&LayerSection> {
    match &layer.property(property_key::SECTION)?.data {
        PropertyData::Section(section) => Some(section),
        _ => None,
    }
}

struct LayerBuilder<'a> {
    header: &'a Header,
    list: &'a LayersList,
    options: &'a DecodeOptions,
    resolution: f32,
    /// Generated-name counters per kind
    counters: HashMap<LayerKind, usize>,
}

impl LayerBuilder<'_> {
    fn build_tree(mut self) -> Result<Vec<Layer>, DecodeError> {
        let mut roots = Vec::new();
        let mut open_groups: Vec<Layer> = Vec::new();

        let list = self.list;
        for (index, raw) in list.layers.iter().enumerate().rev() {
            let section = section(raw);
            let group_open = match section.map(|s| s.section_type) {
                Some(SectionType::Other) => continue,
                Some(SectionType::Bounding) => {
                    match open_groups.pop() {
                        Some(group) => attach(&mut open_groups, &mut roots, group),
                        None => tracing::warn!("Group end marker without a group at layer {}", index),
                    }
                    continue;
                }
                Some(SectionType::GroupOpened) => Some(true),
                Some(SectionType::GroupClosed) => Some(false),
                None => None,
            };

            match group_open {
                Some(open) => {
                    let blend_key = section
                        .and_then(|s| s.blend_mode.as_deref())
                        .unwrap_or(&raw.blend_mode);
                    let mut group = self.build_layer(index, raw, LayerKind::Group, blend_key)?;
                    group.open = open;
                    open_groups.push(group);
                }
                None => {
                    let layer = self.build_layer(index, raw, infer_kind(raw), &raw.blend_mode)?;
                    attach(&mut open_groups, &mut roots, layer);
                }
            }
        }

        if !open_groups.is_empty() {
            tracing::warn!("Closing {} unterminated groups", open_groups.len());
        }
        while let Some(group) = open_groups.pop() {
            attach(&mut open_groups, &mut roots, group);
        }
        Ok(roots)
    }

    fn build_layer(
        &mut self,
        index: usize,
        raw: &RawLayer,
        kind: LayerKind,
        blend_key: &str,
    ) -> Result<Layer, DecodeError> {
        let bounds = Rect {
            x: raw.left,
            y: raw.top,
            width: raw.width(),
            height: raw.height(),
        };
        raster::check_layer_bounds(&bounds)?;
        let mut layer = Layer {
            name: self.layer_name(raw, kind),
            kind,
            bounds,
            opacity: f32::from(raw.opacity) / 255.0,
            blend_mode: BlendMode::from_key(blend_key),
            clip_base: raw.clipping == 0,
            open: true,
            visible: raw.flags.visible,
            image: None,
            shape: None,
            text: None,
            effects: None,
            children: Vec::new(),
        };

        let options = self.options;
        match kind {
            LayerKind::Image if options.decode_layer_image_data => {
                let channels: &[ChannelImageData] =
                    self.list.channels.get(index).map_or(&[], Vec::as_slice);
                layer.image = raster::decode_layer_image(raw, channels, bounds, self.header);
            }
            LayerKind::Shape if options.decode_layer_shape_data => {
                let transform = PathTransform::new(self.header.width, self.header.height, bounds);
                layer.shape = shape::extract_shape(&raw.extras.properties, &transform);
            }
            LayerKind::Text if options.decode_layer_text_data => {
                if let Some(PropertyData::TypeTool(type_tool)) =
                    raw.property(property_key::TYPE_TOOL).map(|p| &p.data)
                {
                    layer.text = Some(text::extract_text(type_tool, self.resolution)?);
                }
            }
            _ => {}
        }
        if options.decode_layer_effects {
            layer.effects = effects::extract_effects(raw, self.resolution);
        }

        tracing::debug!("Layer {} {:?} ({:?})", index, layer.name, kind);
        Ok(layer)
    }

    /// Unicode name, then the Pascal name, then a generated `<Kind N>`
    fn layer_name(&mut self, raw: &RawLayer, kind: LayerKind) -> String {
        let unicode = match raw.property(property_key::UNICODE_NAME).map(|p| &p.data) {
            Some(PropertyData::UnicodeName(name)) => Some(name.as_str()),
            _ => None,
        };
        if let Some(name) = unicode
            .into_iter()
            .chain(Some(raw.extras.name.as_str()))
            .find(|name| !name.trim().is_empty())
        {
            return name.to_string();
        }
        let counter = self.counters.entry(kind).or_insert(0);
        *counter += 1;
        format!("<{} {}>", kind.label(), counter)
    }
}

/// Add `layer` to the innermost open group, or to the roots
fn attach(open_groups: &mut [Layer], roots: &mut Vec<Layer>, layer: Layer) {
    match open_groups.last_mut() {
        Some(parent) => parent.children.push(layer),
        None => roots.push(layer),
    }
}
