//! Channel plane decoding (raw and PackBits)

use super::compression::{packbits_decode_row, Compression};
use super::{BitDepth, Samples};

/// Decode one layer channel into planar samples
///
/// RLE data starts with a table of `height` big-endian row byte counts.
/// Zip-compressed channels are not supported and yield `None`.
pub fn decode_plane(
    compression: Compression,
    data: &[u8],
    width: usize,
    height: usize,
    depth: BitDepth,
) -> Option<Samples> {
    let row_len = width * depth.bytes();
    let bytes = decode_plane_bytes(compression, data, row_len, height)?;
    Some(Samples::from_be_bytes(depth, &bytes))
}

/// Most bytes `data` can expand to under `compression`
pub fn max_plane_bytes(compression: Compression, data: &[u8]) -> usize {
    match compression {
        Compression::Raw => data.len(),
        // a two-byte repeat packet yields 128 bytes
        Compression::Rle => data.len().saturating_mul(64),
        // deflate tops out near 1032:1
        Compression::Zip | Compression::ZipNoPrediction => data.len().saturating_mul(1032),
    }
}

/// Decode one plane of `height` rows of `row_len` bytes
pub fn decode_plane_bytes(
    compression: Compression,
    data: &[u8],
    row_len: usize,
    height: usize,
) -> Option<Vec<u8>> {
    match compression {
        Compression::Raw => Some(raw_plane(data, row_len * height)),
        Compression::Rle => {
            let counts = row_counts(data, height)?;
            let (bytes, _) = decode_rle_rows(&data[height * 2..], &counts, row_len);
            Some(bytes)
        }
        Compression::Zip | Compression::ZipNoPrediction => {
            tracing::warn!("Zip-compressed channel data is not supported, skipping plane");
            None
        }
    }
}

/// Decode the composite image's planes
///
/// All planes share one compression tag. For RLE the row table covers
/// every channel the header declares (`table_channels`), even when fewer
/// planes are wanted.
pub fn decode_composite_planes(
    compression: Compression,
    data: &[u8],
    row_len: usize,
    height: usize,
    planes: usize,
    table_channels: usize,
) -> Option<Vec<Vec<u8>>> {
    match compression {
        Compression::Raw => {
            let plane_len = row_len * height;
            Some(
                (0..planes)
                    .map(|i| raw_plane(data.get(i * plane_len..).unwrap_or(&[]), plane_len))
                    .collect(),
            )
        }
        Compression::Rle => {
            let table_rows = height * table_channels.max(planes);
            let counts = row_counts(data, table_rows)?;
            let mut pos = table_rows * 2;
            let mut out = Vec::with_capacity(planes);
            for plane in 0..planes {
                let rows = &counts[plane * height..(plane + 1) * height];
                let (bytes, consumed) =
                    decode_rle_rows(data.get(pos..).unwrap_or(&[]), rows, row_len);
                pos += consumed;
                out.push(bytes);
            }
            Some(out)
        }
        Compression::Zip | Compression::ZipNoPrediction => {
            tracing::warn!("Zip-compressed composite image is not supported");
            None
        }
    }
}

/// Copy `len` bytes, zero-filling when the data is short
fn raw_plane(data: &[u8], len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    let available = len.min(data.len());
    if available < len {
        tracing::warn!("Raw plane truncated: {} of {} bytes", available, len);
    }
    bytes[..available].copy_from_slice(&data[..available]);
    bytes
}

fn row_counts(data: &[u8], rows: usize) -> Option<Vec<u16>> {
    let table = data.get(..rows * 2);
    if table.is_none() {
        tracing::warn!("RLE row table truncated ({} rows expected)", rows);
    }
    Some(
        table?
            .chunks_exact(2)
            .map(|b| u16::from_be_bytes([b[0], b[1]]))
            .collect(),
    )
}

/// Decode rows whose compressed sizes are listed in `counts`
///
/// Each row consumes exactly its declared byte count. Returns the decoded
/// plane and the number of input bytes consumed.
fn decode_rle_rows(data: &[u8], counts: &[u16], row_len: usize) -> (Vec<u8>, usize) {
    let mut out = vec![0u8; row_len * counts.len()];
    let mut pos = 0;
    for (row, &count) in counts.iter().enumerate() {
        let end = (pos + count as usize).min(data.len());
        packbits_decode_row(&data[pos..end], &mut out[row * row_len..(row + 1) * row_len]);
        pos = end;
    }
    (out, pos)
}
