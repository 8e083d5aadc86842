//! Schema-driven chunk reading
//!
//! Aggregates implement [`Chunk`] and read their fields in declaration
//! order from a [`ChunkReader`]. A [`Context`] tracks the stack of
//! aggregates currently being read so that a field whose length or
//! presence depends on an enclosing record (for example a section divider
//! whose tail fields exist only when the surrounding property is long
//! enough) can look that record up without back-pointers.
//!
//! Collection shapes used by the format:
//!
//! - counted: a fixed number of items ([`read_counted`])
//! - budgeted: items until a byte budget runs out ([`read_until_exhausted`])
//! - keyed: either of the above folded into an ordered map where a later
//!   item with the same key replaces the earlier one ([`into_keyed`])

pub mod cursor;

use indexmap::IndexMap;
use std::hash::Hash;

pub use cursor::ChunkReader;

use crate::error::ChunkError;

/// A record that knows how to read itself
pub trait Chunk: Sized {
    fn read(r: &mut ChunkReader<'_>, ctx: &mut Context) -> Result<Self, ChunkError>;
}

/// One open aggregate on the read stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    ResourceBlock { id: u16, length: u32 },
    LayersList { count: usize },
    RawLayer,
    LayerProperty { key: String, length: u32 },
    Descriptor,
}

/// Stack of aggregates currently being read
#[derive(Debug, Default)]
pub struct Context {
    frames: Vec<Frame>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` with `frame` pushed, popping it again whether or not `f` fails
    pub fn scoped<T>(
        &mut self,
        frame: Frame,
        f: impl FnOnce(&mut Context) -> Result<T, ChunkError>,
    ) -> Result<T, ChunkError> {
        self.frames.push(frame);
        let result = f(self);
        self.frames.pop();
        result
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Key and declared length of the innermost layer property being read
    pub fn enclosing_property(&self) -> Option<(&str, u32)> {
        self.frames.iter().rev().find_map(|frame| match frame {
            Frame::LayerProperty { key, length } => Some((key.as_str(), *length)),
            _ => None,
        })
    }
}

/// Read exactly `count` items
pub fn read_counted<T>(
    count: usize,
    mut read_item: impl FnMut(usize) -> Result<T, ChunkError>,
) -> Result<Vec<T>, ChunkError> {
    // Counts come straight from the file, so don't trust them for capacity.
    let mut items = Vec::with_capacity(count.min(1024));
    for index in 0..count {
        items.push(read_item(index)?);
    }
    Ok(items)
}

/// Read items until fewer than `min_item_len` bytes remain in `r`
///
/// Leftover bytes shorter than one item are treated as padding.
pub fn read_until_exhausted<'a, T>(
    r: &mut ChunkReader<'a>,
    min_item_len: u64,
    mut read_item: impl FnMut(&mut ChunkReader<'a>) -> Result<T, ChunkError>,
) -> Result<Vec<T>, ChunkError> {
    let mut items = Vec::new();
    while r.remaining() >= min_item_len.max(1) {
        let before = r.position();
        items.push(read_item(r)?);
        if r.position() == before {
            break;
        }
    }
    Ok(items)
}

/// Fold items into an ordered map, last occurrence of a key wins
pub fn into_keyed<K: Hash + Eq, V>(items: impl IntoIterator<Item = (K, V)>) -> IndexMap<K, V> {
    let mut map = IndexMap::new();
    for (key, value) in items {
        map.insert(key, value);
    }
    map
}

/// Round a length up to an even number of bytes
pub fn padded_even(len: u64) -> u64 {
    len + (len & 1)
}

/// Round a length up to a multiple of `multiple`
pub fn padded_to(len: u64, multiple: u64) -> u64 {
    len.div_ceil(multiple) * multiple
}

/// Clamp a raw enum tag into `0..len`
///
/// Tags past the end of a known set map onto its last member.
pub fn clamp_tag(raw: u32, len: usize) -> usize {
    (raw as usize).min(len.saturating_sub(1))
}

/// Split a signed record count into its magnitude and sign
pub fn signed_count(raw: i16) -> (usize, bool) {
    (raw.unsigned_abs() as usize, raw < 0)
}
