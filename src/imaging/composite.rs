//! Watermark compositing.
//!
//! The working buffer starts as an opaque RGBA copy of the source. The
//! watermark is resized to a percentage of the source height (keeping the
//! watermark's own aspect ratio), then alpha-blended "over" the working
//! buffer with `image::imageops::overlay`, which clips the destination
//! rectangle to the canvas.

use super::calculations::{Rect, intersects_canvas, placement_rect, scaled_dimensions, watermark_height};
use super::params::CompositeParams;
use super::resample;
use image::imageops;
use image::{DynamicImage, RgbaImage};

/// A watermarked image together with where the watermark was placed.
#[derive(Debug, Clone, PartialEq)]
pub struct Composited {
    pub image: RgbaImage,
    /// Destination rectangle of the resized watermark, before clipping.
    pub watermark: Rect,
}

/// Composite `watermark` onto a copy of `source`.
///
/// Pure: the same inputs always give the same pixels, and `watermark` is
/// only read. A zero-height watermark (e.g. `height_percentage = 0`) or one
/// placed entirely off the canvas leaves the copy untouched.
pub fn composite(
    source: &DynamicImage,
    watermark: &RgbaImage,
    params: &CompositeParams,
) -> Composited {
    let mut working = source.to_rgba8();
    let (width, height) = working.dimensions();

    let target_height = watermark_height(params.height_percentage, height);
    let size = if target_height == 0 || watermark.width() == 0 || watermark.height() == 0 {
        (0, 0)
    } else {
        scaled_dimensions(watermark.dimensions(), 0, target_height)
    };
    let rect = placement_rect(height, size, params.placement);

    if intersects_canvas(&rect, width, height) {
        let resized = resample::resize(watermark, rect.width, rect.height);
        imageops::overlay(&mut working, &resized, rect.left, rect.top);
    }

    Composited {
        image: working,
        watermark: rect,
    }
}
