//! psdprobe - Photoshop document decoder
//!
//! Reads PSD streams into a layer tree with rasters, vector shapes, text
//! and layer effects, plus the merged composite image.

pub mod assemble;
pub mod chunk;
pub mod config;
pub mod decoder;
pub mod error;
pub mod model;
pub mod pixels;
pub mod psd;
pub mod text;

#[cfg(test)]
mod testutil;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use config::DecodeOptions;
pub use decoder::{accept, decode, Decoder};
pub use error::DecodeError;
pub use model::{Image, Layer, LayerKind};

/// Install the global tracing subscriber
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "psdprobe=info,psdprobe_lib=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
