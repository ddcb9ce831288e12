//! Image codec backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three codec operations the pipeline
//! needs: decode a source photo, decode the watermark, and encode an output.
//! Everything between decode and encode is plain pixel work on
//! [`RgbaImage`] buffers and lives outside the backend.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate's pure-Rust codecs.

use super::params::Quality;
use image::{DynamicImage, RgbaImage};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
}

/// Trait for image codec backends.
///
/// Backends are shared by reference across rayon workers, hence `Sync`.
pub trait ImageBackend: Sync {
    /// Decode a source photo from its encoded bytes.
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError>;

    /// Decode the watermark, keeping (or synthesizing) its alpha channel.
    fn decode_watermark(&self, bytes: &[u8]) -> Result<RgbaImage, BackendError>;

    /// Encode an output buffer at the given quality.
    fn encode(&self, image: &RgbaImage, quality: Quality) -> Result<Vec<u8>, BackendError>;
}
