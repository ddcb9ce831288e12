//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They sit between
//! the batch driver (which reads them from config) and the pixel code in
//! [`composite`](super::composite) and [`operations`](super::operations).
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 85). Clamped on construction.
//! - [`Placement`]: Watermark offset from the left and **bottom** edges of the target.
//! - [`CompositeParams`]: Watermark height percentage plus placement.

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

/// Watermark placement relative to the target image.
///
/// - `offset_x`: pixels from the target's left edge to the watermark's left edge
/// - `offset_y`: pixels from the target's bottom edge to the watermark's bottom edge
///
/// Either may be negative or larger than the image; the blend is clipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Placement {
    pub offset_x: i64,
    pub offset_y: i64,
}

/// Parameters for compositing one watermark onto one source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositeParams {
    /// Watermark height as a percentage of the source image height.
    pub height_percentage: u32,
    pub placement: Placement,
}

impl Default for CompositeParams {
    fn default() -> Self {
        Self {
            height_percentage: 10,
            placement: Placement::default(),
        }
    }
}
