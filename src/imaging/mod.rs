//! Image processing: pure Rust, built on the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` (JPEG, PNG, TIFF, WebP) |
//! | **Resize** | `image::imageops::resize`, Lanczos3 |
//! | **Composite** | `image::imageops::overlay` (alpha "over", clipped) |
//! | **Encode** | `JpegEncoder` at a fixed quality |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension and placement math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Resample / Composite**: Pixel work on `RgbaImage` buffers
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: The per-size fan-out combining resample + backend

pub mod backend;
pub mod calculations;
pub mod composite;
pub mod operations;
mod params;
pub mod resample;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend};
pub use calculations::Rect;
pub use composite::{Composited, composite};
pub use operations::{VariantError, VariantOutcome, emit_sizes, render_variant};
pub use params::{CompositeParams, Placement, Quality};
pub use rust_backend::RustBackend;
