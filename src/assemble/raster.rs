//! Layer rasters, the merged composite and the thumbnail

use rayon::prelude::*;

use crate::error::ChunkError;
use crate::model::Rect;
use crate::pixels::indexed::{expand_bitmap_mode, expand_indexed, PALETTE_SIZE};
use crate::pixels::plane::{decode_composite_planes, max_plane_bytes};
use crate::pixels::{decode_plane, BitDepth, Bitmap, Samples};
use crate::psd::layers::ChannelImageData;
use crate::psd::resources::{resource_id, ThumbnailInfo};
use crate::psd::{ColorMode, Header, PsdFile, RawLayer};

/// Channel id of a layer's transparency
const ALPHA_CHANNEL_ID: i16 = -1;

/// Largest layer width or height the format allows
pub const MAX_LAYER_SIDE: i32 = 30_000;

/// Reject layer bounds wider or taller than the format allows
pub fn check_layer_bounds(bounds: &Rect) -> Result<(), ChunkError> {
    for (field, length) in [("layer width", bounds.width), ("layer height", bounds.height)] {
        if length > MAX_LAYER_SIDE {
            return Err(ChunkError::InvalidLength {
                field,
                length: length.into(),
            });
        }
    }
    Ok(())
}

/// Most channels a layer of this color mode can use, `None` when layers carry no raster
fn layer_channel_cap(mode: ColorMode) -> Option<usize> {
    match mode {
        ColorMode::Grayscale | ColorMode::Duotone => Some(2),
        ColorMode::Rgb | ColorMode::Lab => Some(4),
        ColorMode::Cmyk => Some(5),
        _ => None,
    }
}

/// CMYK samples are stored inverted (0 = full ink)
fn fix_cmyk(mut bitmap: Bitmap) -> Bitmap {
    if bitmap.color_mode == ColorMode::Cmyk {
        bitmap.invert_color_bands(4);
    }
    bitmap
}

/// Decode the channels of one layer
///
/// Returns `None` for empty or oversized bounds, for color modes without
/// layer rasters and when no channel carries enough data to fill a plane.
/// Mask channels (id < -1) and zip planes are skipped.
pub fn decode_layer_image(
    layer: &RawLayer,
    channels: &[ChannelImageData],
    bounds: Rect,
    header: &Header,
) -> Option<Bitmap> {
    if bounds.is_empty() || check_layer_bounds(&bounds).is_err() {
        return None;
    }
    let cap = layer_channel_cap(header.color_mode)?;
    let color = header.color_mode.color_channels()?;
    let depth = BitDepth::from_depth(header.depth)?;

    let bands = layer.channels_info.len().min(cap).max(color);
    let has_alpha = bands > color;
    let (width, height) = (bounds.width as u32, bounds.height as u32);

    let tasks: Vec<(usize, &ChannelImageData)> = layer
        .channels_info
        .iter()
        .zip(channels)
        .filter_map(|(info, data)| {
            let band = match info.id {
                ALPHA_CHANNEL_ID if has_alpha => bands - 1,
                id if id >= 0 && (id as usize) < bands => id as usize,
                _ => return None,
            };
            Some((band, data))
        })
        .collect();

    let plane_len = (width as usize)
        .checked_mul(height as usize)?
        .checked_mul(depth.bytes())?;
    if !tasks
        .iter()
        .any(|(_, data)| max_plane_bytes(data.compression, &data.data) >= plane_len)
    {
        tracing::warn!(
            "Layer channel data cannot fill {}x{} bounds, skipping raster",
            width,
            height
        );
        return None;
    }

    let planes: Vec<(usize, Samples)> = tasks
        .par_iter()
        .filter_map(|(band, data)| {
            let plane = decode_plane(
                data.compression,
                &data.data,
                width as usize,
                height as usize,
                depth,
            )?;
            Some((*band, plane))
        })
        .collect();

    let mut bitmap = Bitmap::new(width, height, bands, has_alpha, depth, header.color_mode);
    for (band, plane) in &planes {
        bitmap.set_plane(*band, plane);
    }
    Some(fix_cmyk(bitmap))
}

/// Decode the flattened composite
///
/// `merged_alpha` adds the first extra channel as alpha. Indexed and
/// bitmap documents are expanded to RGB(A) and 8-bit gray.
pub fn decode_composite(file: &PsdFile, merged_alpha: bool) -> Option<Bitmap> {
    let header = &file.header;
    let image = &file.image_data;
    let (width, height) = (header.width, header.height);
    let table_channels = usize::from(header.channels);

    match header.color_mode {
        ColorMode::Indexed => {
            let planes = decode_composite_planes(
                image.compression,
                &image.data,
                width as usize,
                height as usize,
                1,
                table_channels,
            )?;
            let color_count = file
                .resources
                .unsigned_short(resource_id::INDEXED_COLOR_COUNT)
                .map_or(PALETTE_SIZE, usize::from);
            let transparent = file
                .resources
                .unsigned_short(resource_id::TRANSPARENCY_INDEX)
                .map(usize::from);
            Some(expand_indexed(
                planes.first()?,
                width,
                height,
                &file.color_data.data,
                color_count,
                transparent,
            ))
        }
        ColorMode::Bitmap => {
            let row_len = (width as usize).div_ceil(8);
            let planes = decode_composite_planes(
                image.compression,
                &image.data,
                row_len,
                height as usize,
                1,
                table_channels,
            )?;
            Some(expand_bitmap_mode(planes.first()?, width, height))
        }
        mode => {
            let color = mode.color_channels()?;
            let depth = BitDepth::from_depth(header.depth)?;
            let bands = table_channels.min(color + usize::from(merged_alpha));
            let planes = decode_composite_planes(
                image.compression,
                &image.data,
                width as usize * depth.bytes(),
                height as usize,
                bands,
                table_channels,
            )?;

            let samples: Vec<Samples> = planes
                .par_iter()
                .map(|bytes| Samples::from_be_bytes(depth, bytes))
                .collect();
            let mut bitmap = Bitmap::new(width, height, bands, bands > color, depth, mode);
            for (band, plane) in samples.iter().enumerate() {
                bitmap.set_plane(band, plane);
            }
            Some(fix_cmyk(bitmap))
        }
    }
}

/// Decode the JPEG thumbnail, logging and dropping it when unreadable
pub fn decode_thumbnail(info: &ThumbnailInfo) -> Option<image::RgbImage> {
    match image::load_from_memory_with_format(&info.jpeg, image::ImageFormat::Jpeg) {
        Ok(decoded) => Some(decoded.to_rgb8()),
        Err(e) => {
            tracing::warn!("Failed to decode thumbnail: {}", e);
            None
        }
    }
}
