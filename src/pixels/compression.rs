//! Channel compression methods and PackBits RLE decoding
//!
//! PackBits is the run-length scheme used for PSD channel data.
//! Reference: Apple Technical Note TN1023

use serde::Serialize;

use crate::chunk::clamp_tag;

/// Compression tag stored in front of every channel and the composite image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Compression {
    Raw,
    Rle,
    Zip,
    ZipNoPrediction,
}

impl Compression {
    /// Tags past the known set clamp to the last method
    pub fn from_raw(raw: u16) -> Self {
        const METHODS: [Compression; 4] = [
            Compression::Raw,
            Compression::Rle,
            Compression::Zip,
            Compression::ZipNoPrediction,
        ];
        METHODS[clamp_tag(raw.into(), METHODS.len())]
    }
}

/// Decode one PackBits scanline into `out`
///
/// Rules:
/// - N >= 0: Next N+1 bytes are literal (copy as-is)
/// - -127 <= N < 0: Repeat next byte (1-N) times
/// - N = -128: No operation
///
/// Consumes all of `input` (one declared row) and fills at most `out.len()`
/// bytes; output past the end of `out` is dropped and a short row leaves the
/// remainder untouched. Returns the number of bytes produced.
pub fn packbits_decode_row(input: &[u8], out: &mut [u8]) -> usize {
    let mut pos = 0;
    let mut written = 0;

    while pos < input.len() {
        let n = input[pos] as i8;
        pos += 1;

        if n >= 0 {
            let count = n as usize + 1;
            let end = (pos + count).min(input.len());
            for &byte in &input[pos..end] {
                if written < out.len() {
                    out[written] = byte;
                }
                written += 1;
            }
            pos = end;
        } else if n > -128 {
            let count = (1 - i16::from(n)) as usize;
            let Some(&byte) = input.get(pos) else {
                break;
            };
            pos += 1;
            let end = (written + count).min(out.len());
            if written < end {
                out[written..end].fill(byte);
            }
            written += count;
        }
        // n == -128 is a no-op
    }

    if written != out.len() {
        tracing::debug!(
            "PackBits row decoded to {} bytes, expected {}",
            written,
            out.len()
        );
    }
    written.min(out.len())
}

/// Decode a PackBits stream without row boundaries until `expected_len` bytes are produced
pub fn packbits_decode(input: &[u8], expected_len: usize) -> Vec<u8> {
    let mut out = vec![0u8; expected_len];
    packbits_decode_row(input, &mut out);
    out
}
