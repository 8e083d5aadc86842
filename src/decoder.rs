//! Decoder entry points

use std::path::Path;

use crate::assemble::assemble;
use crate::config::DecodeOptions;
use crate::error::DecodeError;
use crate::model::Image;
use crate::psd::{Header, PsdFile};

/// Decodes PSD streams with a fixed set of options
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    options: DecodeOptions,
}

impl Decoder {
    pub fn new(options: DecodeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Whether `data` looks like a PSD stream this decoder can read
    ///
    /// Only the header is inspected. Never fails.
    pub fn accept(&self, data: &[u8]) -> bool {
        Header::probe(data)
    }

    /// Decode a whole stream
    pub fn decode(&self, data: &[u8]) -> Result<Image, DecodeError> {
        let file = PsdFile::parse(data, self.options.decode_layers)?;
        assemble(&file, &self.options)
    }

    /// Read and decode a file
    pub fn decode_file(&self, path: impl AsRef<Path>) -> Result<Image, DecodeError> {
        let path = path.as_ref();
        tracing::debug!("Reading {}", path.display());
        let data = std::fs::read(path)?;
        self.decode(&data)
    }
}

/// [`Decoder::accept`] with default options
pub fn accept(data: &[u8]) -> bool {
    Decoder::default().accept(data)
}

/// [`Decoder::decode`] with `options`
pub fn decode(data: &[u8], options: &DecodeOptions) -> Result<Image, DecodeError> {
    Decoder::new(*options).decode(data)
}
