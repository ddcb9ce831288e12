//! Pure calculation functions for image geometry.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::Placement;

/// Resolve the output dimensions of a resize request.
///
/// A target of `0` on one axis means "unspecified": that axis is computed
/// from the source aspect ratio as `round(other * given / original)`. When
/// both targets are non-zero they are returned unchanged.
///
/// # Panics
///
/// Panics if both targets are zero or the source has a zero dimension.
/// These are caller bugs, not runtime conditions.
///
/// # Examples
/// ```
/// # use batch_watermark::imaging::calculations::scaled_dimensions;
/// // 400x100 watermark scaled to height 80 → 320x80
/// assert_eq!(scaled_dimensions((400, 100), 0, 80), (320, 80));
///
/// // 1000x800 composite scaled to width 500 → 500x400
/// assert_eq!(scaled_dimensions((1000, 800), 500, 0), (500, 400));
/// ```
pub fn scaled_dimensions(source: (u32, u32), width: u32, height: u32) -> (u32, u32) {
    let (src_w, src_h) = source;
    assert!(
        src_w > 0 && src_h > 0,
        "cannot resize a {src_w}x{src_h} buffer"
    );
    assert!(
        width > 0 || height > 0,
        "at most one resize dimension may be unspecified"
    );

    match (width, height) {
        (0, h) => ((src_w as f64 * h as f64 / src_h as f64).round() as u32, h),
        (w, 0) => (w, (src_h as f64 * w as f64 / src_w as f64).round() as u32),
        (w, h) => (w, h),
    }
}

/// Watermark height for a source image of `image_height` pixels.
///
/// Integer arithmetic, floored: `percentage * image_height / 100`.
/// Saturates at `u32::MAX`.
pub fn watermark_height(percentage: u32, image_height: u32) -> u32 {
    u32::try_from(percentage as u64 * image_height as u64 / 100).unwrap_or(u32::MAX)
}

/// Destination rectangle of a watermark on its target image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub left: i64,
    pub top: i64,
    pub width: u32,
    pub height: u32,
}

/// Compute where a `watermark` sized watermark lands on an image of `image_height`.
///
/// `left` is the horizontal offset; `top` is measured so that the watermark's
/// bottom edge sits `offset_y` pixels above the image's bottom edge.
/// Offsets far outside the canvas saturate instead of overflowing.
pub fn placement_rect(image_height: u32, watermark: (u32, u32), placement: Placement) -> Rect {
    let (width, height) = watermark;
    Rect {
        left: placement.offset_x,
        top: (image_height as i64 - height as i64).saturating_sub(placement.offset_y),
        width,
        height,
    }
}

/// Whether any part of `rect` falls inside a `width`x`height` canvas.
pub fn intersects_canvas(rect: &Rect, width: u32, height: u32) -> bool {
    rect.width > 0
        && rect.height > 0
        && rect.left < width as i64
        && rect.top < height as i64
        && rect.left.saturating_add(rect.width as i64) > 0
        && rect.top.saturating_add(rect.height as i64) > 0
}
