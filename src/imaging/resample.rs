//! Lanczos3 resampling of RGBA buffers.
//!
//! `image::imageops::resize` with [`FilterType::Lanczos3`] is a separable
//! windowed-sinc filter of radius 3, applied horizontally then vertically.

use super::calculations::scaled_dimensions;
use image::RgbaImage;
use image::imageops::{self, FilterType};

/// Resize `buffer` to `width` x `height`, where one of the two may be `0`
/// to keep the buffer's aspect ratio on that axis.
///
/// A request equal to the current dimensions returns a copy.
///
/// # Panics
///
/// See [`scaled_dimensions`].
pub fn resize(buffer: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let (w, h) = scaled_dimensions(buffer.dimensions(), width, height);
    if (w, h) == buffer.dimensions() {
        return buffer.clone();
    }
    imageops::resize(buffer, w, h, FilterType::Lanczos3)
}
