//! Decoder options
//!
//! Every flag gates one part of the assembly. Options deserialize from JSON
//! with missing fields taking their defaults, so a partial file such as
//! `{"decode_thumbnail": true}` is valid.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Read the layer section and build the layer tree
    pub decode_layers: bool,
    /// Decode layer pixel planes
    pub decode_layer_image_data: bool,
    /// Build vector paths and strokes of shape layers
    pub decode_layer_shape_data: bool,
    /// Parse text content and engine data of text layers
    pub decode_layer_text_data: bool,
    /// Read layer styles
    pub decode_layer_effects: bool,
    /// Decode the embedded JPEG thumbnail
    pub decode_thumbnail: bool,
    pub decode_guides: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            decode_layers: true,
            decode_layer_image_data: true,
            decode_layer_shape_data: true,
            decode_layer_text_data: true,
            decode_layer_effects: true,
            decode_thumbnail: false,
            decode_guides: true,
        }
    }
}

impl DecodeOptions {
    /// Only the merged composite and document metrics
    pub fn image_only() -> Self {
        Self {
            decode_layers: false,
            decode_layer_image_data: false,
            decode_layer_shape_data: false,
            decode_layer_text_data: false,
            decode_layer_effects: false,
            decode_thumbnail: false,
            decode_guides: false,
        }
    }

    /// The layer tree with names, bounds and blending only
    pub fn layer_metadata_only() -> Self {
        Self {
            decode_layer_image_data: false,
            decode_layer_shape_data: false,
            decode_layer_text_data: false,
            decode_layer_effects: false,
            ..Self::default()
        }
    }
}
