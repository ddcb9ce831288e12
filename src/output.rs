//! CLI output formatting.
//!
//! Every processed image gets a header line (positional index + file name)
//! followed by indented context lines: where the watermark went and the
//! status of each size variant.
//!
//! ```text
//! Watermarking 2 images with "watermark.png" (sizes: 500, source)
//! 001 dawn.jpg (1000x800)
//!     watermark: 320x80 at (0, 720)
//!     500: 500x400
//!     source: 1000x800
//! 002 dusk.jpg
//!     skipped: failed to decode image in/dusk.jpg: ...
//!
//! watermarked 1 images with "watermark.png"
//!     variants: 2 written, 0 failed
//!     skipped: 1
//! ```
//!
//! Format functions are pure and return lines; the `print_*` wrappers write
//! them to stdout.

use crate::process::{BatchResult, ProcessEvent, VariantStatus};
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Format a single progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::Started {
            watermark,
            image_count,
            sizes,
        } => vec![format!(
            "Watermarking {} images with {:?} (sizes: {})",
            image_count,
            watermark,
            sizes.join(", ")
        )],
        ProcessEvent::ImageProcessed {
            index,
            filename,
            dimensions,
            watermark,
            variants,
        } => {
            let mut lines = vec![format!(
                "{} {} ({}x{})",
                format_index(*index),
                filename,
                dimensions.0,
                dimensions.1
            )];
            if watermark.height == 0 {
                lines.push("    watermark: none (zero height)".to_string());
            } else {
                lines.push(format!(
                    "    watermark: {}x{} at ({}, {})",
                    watermark.width, watermark.height, watermark.left, watermark.top
                ));
            }
            for variant in variants {
                let status = match &variant.status {
                    VariantStatus::Written { width, height } => format!("{width}x{height}"),
                    VariantStatus::Failed(err) => format!("failed ({err})"),
                };
                lines.push(format!("    {}: {}", variant.label, status));
            }
            lines
        }
        ProcessEvent::ImageSkipped {
            index,
            filename,
            error,
        } => vec![
            format!("{} {}", format_index(*index), filename),
            format!("    skipped: {}", error),
        ],
    }
}

/// Format the end-of-run summary.
pub fn format_summary(result: &BatchResult, watermark: &Path) -> Vec<String> {
    let mut lines = vec![format!(
        "watermarked {} images with {:?}",
        result.watermarked,
        watermark.display().to_string()
    )];
    lines.push(format!(
        "    variants: {} written, {} failed",
        result.variants_written, result.variants_failed
    ));
    if result.skipped > 0 {
        lines.push(format!("    skipped: {}", result.skipped));
    }
    lines
}

/// Print the end-of-run summary to stdout.
pub fn print_summary(result: &BatchResult, watermark: &Path) {
    for line in format_summary(result, watermark) {
        println!("{}", line);
    }
}
