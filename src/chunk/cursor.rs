//! Big-endian field reader over an in-memory buffer
//!
//! Every read is bounds-checked up front so that running off the end of a
//! section reports the absolute offset instead of a bare IO error.

use byteorder::{BigEndian, ReadBytesExt};
use std::io::Cursor;

use crate::error::ChunkError;

macro_rules! read_be {
    ($name:ident, $ty:ty, $size:expr, $method:ident) => {
        pub fn $name(&mut self) -> Result<$ty, ChunkError> {
            self.ensure($size)?;
            Ok(self.cursor.$method::<BigEndian>()?)
        }
    };
}

/// Forward-only reader over a byte slice
///
/// Sub-ranges created with [`ChunkReader::bounded`] share the parent's
/// buffer and report offsets relative to the start of the whole stream.
#[derive(Debug, Clone)]
pub struct ChunkReader<'a> {
    cursor: Cursor<&'a [u8]>,
    base: u64,
}

impl<'a> ChunkReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(data),
            base: 0,
        }
    }

    /// Absolute offset of the next byte to be read
    pub fn position(&self) -> u64 {
        self.base + self.cursor.position()
    }

    pub fn remaining(&self) -> u64 {
        (self.cursor.get_ref().len() as u64).saturating_sub(self.cursor.position())
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn ensure(&self, wanted: u64) -> Result<(), ChunkError> {
        if self.remaining() < wanted {
            return Err(ChunkError::UnexpectedEof {
                offset: self.position(),
                wanted,
            });
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8, ChunkError> {
        self.ensure(1)?;
        Ok(self.cursor.read_u8()?)
    }

    pub fn read_i8(&mut self) -> Result<i8, ChunkError> {
        self.ensure(1)?;
        Ok(self.cursor.read_i8()?)
    }

    read_be!(read_u16, u16, 2, read_u16);
    read_be!(read_i16, i16, 2, read_i16);
    read_be!(read_u32, u32, 4, read_u32);
    read_be!(read_i32, i32, 4, read_i32);
    read_be!(read_i64, i64, 8, read_i64);
    read_be!(read_f32, f32, 4, read_f32);
    read_be!(read_f64, f64, 8, read_f64);

    /// Borrow the next `len` bytes without copying
    pub fn read_slice(&mut self, len: u64) -> Result<&'a [u8], ChunkError> {
        self.ensure(len)?;
        let data: &'a [u8] = *self.cursor.get_ref();
        let start = self.cursor.position() as usize;
        let end = start + len as usize;
        self.cursor.set_position(end as u64);
        Ok(&data[start..end])
    }

    pub fn read_bytes(&mut self, len: u64) -> Result<Vec<u8>, ChunkError> {
        Ok(self.read_slice(len)?.to_vec())
    }

    pub fn skip(&mut self, len: u64) -> Result<(), ChunkError> {
        self.read_slice(len).map(|_| ())
    }

    /// Everything left in this reader's range
    pub fn read_rest(&mut self) -> &'a [u8] {
        let data: &'a [u8] = *self.cursor.get_ref();
        let start = (self.cursor.position() as usize).min(data.len());
        self.cursor.set_position(data.len() as u64);
        &data[start..]
    }

    /// Split off a sub-reader over exactly `len` bytes
    ///
    /// The parent advances by `len` immediately, so whatever the sub-reader
    /// leaves unread is skipped.
    pub fn bounded(&mut self, len: u64) -> Result<ChunkReader<'a>, ChunkError> {
        let base = self.position();
        let slice = self.read_slice(len)?;
        Ok(ChunkReader {
            cursor: Cursor::new(slice),
            base,
        })
    }

    /// Fixed-width string, one byte per character
    pub fn read_fixed_string(&mut self, len: u64) -> Result<String, ChunkError> {
        Ok(self.read_slice(len)?.iter().map(|&b| b as char).collect())
    }

    /// Four-character code such as a signature or property key
    pub fn read_key(&mut self) -> Result<String, ChunkError> {
        self.read_fixed_string(4)
    }

    /// Length-prefixed ASCII string where a zero length means four bytes
    pub fn read_minimum_string(&mut self) -> Result<String, ChunkError> {
        let len = self.read_u32()?;
        let len = if len == 0 { 4 } else { u64::from(len) };
        self.read_fixed_string(len)
    }

    /// Character-count prefixed UTF-16BE string with any trailing NUL removed
    pub fn read_unicode_string(&mut self) -> Result<String, ChunkError> {
        let count = u64::from(self.read_u32()?);
        let bytes = self.read_slice(count * 2)?;
        Ok(decode_utf16_be(bytes))
    }

    /// Assert a literal byte sequence
    pub fn expect(&mut self, field: &'static str, literal: &[u8]) -> Result<(), ChunkError> {
        let offset = self.position();
        let found = self.read_slice(literal.len() as u64)?;
        if found != literal {
            tracing::debug!("{} mismatch at offset {}", field, offset);
            return Err(ChunkError::Mismatch {
                field,
                expected: String::from_utf8_lossy(literal).into_owned(),
                found: String::from_utf8_lossy(found).into_owned(),
            });
        }
        Ok(())
    }
}

/// Decode UTF-16BE, dropping a trailing NUL and replacing unpaired surrogates
pub fn decode_utf16_be(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    let mut text = String::from_utf16_lossy(&units);
    if text.ends_with('\0') {
        text.pop();
    }
    text
}

/// Raise a mismatch error when a decoded value differs from the expected one
pub fn check<T: PartialEq + std::fmt::Display>(
    field: &'static str,
    expected: T,
    found: T,
) -> Result<(), ChunkError> {
    if expected != found {
        return Err(ChunkError::Mismatch {
            field,
            expected: expected.to_string(),
            found: found.to_string(),
        });
    }
    Ok(())
}
