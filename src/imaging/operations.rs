//! High-level image operations.
//!
//! These functions combine the resampler with backend encoding. The size
//! fan-out is the per-variant failure boundary: one label failing to
//! encode or write never stops the remaining labels.

use super::backend::{BackendError, ImageBackend};
use super::params::Quality;
use super::resample;
use crate::sizes::SizeRequests;
use image::RgbaImage;
use std::borrow::Cow;
use std::path::PathBuf;
use thiserror::Error;

/// Why a single size variant was not produced.
#[derive(Error, Debug)]
pub enum VariantError {
    #[error("{0}")]
    Encode(#[from] BackendError),
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result of emitting one labeled variant.
#[derive(Debug)]
pub struct VariantOutcome {
    pub label: String,
    pub result: Result<(u32, u32), VariantError>,
}

impl VariantOutcome {
    pub fn is_written(&self) -> bool {
        self.result.is_ok()
    }
}

/// Resize `image` to `width` (aspect-preserved) and encode it.
///
/// Width `0` encodes the image unchanged. Returns the encoded bytes and
/// the dimensions that were encoded.
pub fn render_variant(
    backend: &impl ImageBackend,
    image: &RgbaImage,
    width: u32,
    quality: Quality,
) -> Result<(Vec<u8>, (u32, u32)), BackendError> {
    let sized: Cow<'_, RgbaImage> = if width == 0 {
        Cow::Borrowed(image)
    } else {
        Cow::Owned(resample::resize(image, width, 0))
    };
    let bytes = backend.encode(&sized, quality)?;
    Ok((bytes, sized.dimensions()))
}

/// Encode one output per size label and hand each to `write`.
///
/// Every label is attempted. Failures are logged and returned in the
/// outcome list; they never short-circuit the loop.
pub fn emit_sizes<W>(
    backend: &impl ImageBackend,
    image: &RgbaImage,
    sizes: &SizeRequests,
    quality: Quality,
    mut write: W,
) -> Vec<VariantOutcome>
where
    W: FnMut(&str, &[u8]) -> Result<(), VariantError>,
{
    sizes
        .iter()
        .map(|(label, width)| {
            let result = render_variant(backend, image, width, quality)
                .map_err(VariantError::from)
                .and_then(|(bytes, dims)| write(label, &bytes).map(|()| dims));

            match &result {
                Ok((w, h)) => tracing::debug!(label, width = *w, height = *h, "variant written"),
                Err(e) => tracing::warn!(label, error = %e, "skipping size variant"),
            }

            VariantOutcome {
                label: label.to_string(),
                result,
            }
        })
        .collect()
}
