//! # Batch Watermark
//!
//! Batch-applies a graphic watermark to a directory of photographs and
//! writes one or more resized JPEG copies of each result.
//!
//! ```text
//! in/dawn.jpg ─┐
//! in/dusk.jpg ─┼─ composite watermark ─┬─ out/source/dawn.jpg
//!              │  (bottom-left, % of   ├─ out/500/dawn.jpg
//! watermark.png┘   image height)       └─ ...
//! ```
//!
//! # Pipeline
//!
//! For every regular file in the input directory:
//!
//! 1. **Decode** the photo into an RGBA working buffer (opaque copy).
//! 2. **Composite**: resize the watermark to `height_percentage` of the photo
//!    height with Lanczos3, keeping the watermark's own aspect ratio, and
//!    alpha-blend it `offset_x` px from the left and `offset_y` px from the
//!    bottom. Off-canvas parts are clipped.
//! 3. **Fan out**: for each size label, resize the composite to the label's
//!    width (or keep it, for `source`), encode as JPEG, and write
//!    `out/<label>/<filename>`.
//!
//! Files are independent units of work and are processed in parallel. The
//! watermark is decoded once and shared read-only.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`process`] | Batch driver: input listing, per-file pipeline, counters, progress events |
//! | [`imaging`] | Resampling, compositing, per-size fan-out, codec backend |
//! | [`sizes`] | Size list parser (`source,500,thumb=200`) |
//! | [`config`] | TOML config loading, layering with CLI flags, validation |
//! | [`output`] | CLI output formatting for progress and the final summary |
//!
//! # Failure Policy
//!
//! Configuration problems (unreadable watermark, bad size list, missing
//! input directory) stop the run before any image is touched. A corrupt
//! photo stops the run too unless `on_decode_error = "skip"`. A size variant
//! that fails to encode or write is only a warning: the other sizes and
//! files still get produced.

pub mod config;
pub mod imaging;
pub mod output;
pub mod process;
pub mod sizes;

#[cfg(test)]
pub(crate) mod test_helpers;
