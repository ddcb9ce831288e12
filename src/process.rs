//! Batch watermarking.
//!
//! Reads every regular file directly inside the input directory, composites
//! the watermark onto it, and writes one JPEG per size label.
//!
//! ## Per-file pipeline
//!
//! ```text
//! read bytes → decode → composite → for each size: resize → encode → write
//! ```
//!
//! ## Output Structure
//!
//! ```text
//! out/                      # layout = "labeled" (default)
//! ├── source/
//! │   ├── dawn.jpg          # composited, original width
//! │   └── dusk.jpg
//! └── 500/
//!     ├── dawn.jpg          # composited, then resized to 500px wide
//!     └── dusk.jpg
//!
//! out/                      # layout = "flat" (single size only)
//! ├── dawn.jpg
//! └── dusk.jpg
//! ```
//!
//! ## Failure Handling
//!
//! - Config, watermark, input listing and output directory errors abort
//!   before any image is touched.
//! - A source that cannot be read or decoded aborts the run, unless
//!   `on_decode_error = "skip"`.
//! - A size variant that fails to encode or write is logged and skipped;
//!   the other sizes and files carry on. The image still counts as
//!   watermarked.
//!
//! ## Parallel Processing
//!
//! Files are processed in parallel using [rayon](https://docs.rs/rayon). The
//! watermark is decoded once and only ever borrowed immutably. All output
//! directories exist before the first worker starts, and counters are summed
//! from per-file results after the parallel section.

use crate::config::{ConfigError, DecodeErrorPolicy, OutputLayout, WatermarkConfig};
use crate::imaging::{
    BackendError, CompositeParams, ImageBackend, Quality, Rect, RustBackend, VariantError,
    composite, emit_sizes,
};
use crate::sizes::SizeRequests;
use image::RgbaImage;
use rayon::prelude::*;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to read watermark {}: {source}", path.display())]
    ReadWatermark {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode watermark {}: {source}", path.display())]
    DecodeWatermark {
        path: PathBuf,
        #[source]
        source: BackendError,
    },
    #[error("failed to list input directory {}: {source}", path.display())]
    ListInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to create output directory {}: {source}", path.display())]
    CreateOutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read image {}: {source}", path.display())]
    ReadImage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image {}: {source}", path.display())]
    DecodeImage {
        path: PathBuf,
        #[source]
        source: BackendError,
    },
}

/// The decoded watermark, shared read-only by every file in a run.
#[derive(Debug, Clone)]
pub struct WatermarkAsset {
    pub path: PathBuf,
    pub image: RgbaImage,
}

/// Counters for a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchResult {
    /// Files that were decoded and composited.
    pub watermarked: usize,
    /// Files passed over under `on_decode_error = "skip"`.
    pub skipped: usize,
    pub variants_written: usize,
    pub variants_failed: usize,
}

/// Progress events sent while a batch runs.
///
/// With more than one worker, `ImageProcessed` events arrive in completion
/// order, not input order.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessEvent {
    Started {
        watermark: String,
        image_count: usize,
        sizes: Vec<String>,
    },
    ImageProcessed {
        /// 1-based position in the sorted input list.
        index: usize,
        filename: String,
        dimensions: (u32, u32),
        watermark: Rect,
        variants: Vec<VariantInfo>,
    },
    ImageSkipped {
        index: usize,
        filename: String,
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariantInfo {
    pub label: String,
    pub status: VariantStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum VariantStatus {
    Written { width: u32, height: u32 },
    Failed(String),
}

/// Everything a worker needs, resolved once from the config.
struct BatchSettings<'a> {
    sizes: SizeRequests,
    quality: Quality,
    composite: CompositeParams,
    output: &'a Path,
    layout: OutputLayout,
    on_decode_error: DecodeErrorPolicy,
}

impl<'a> BatchSettings<'a> {
    fn from_config(config: &'a WatermarkConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            sizes: config.size_requests()?,
            quality: config.quality(),
            composite: config.composite_params(),
            output: &config.output,
            layout: config.layout,
            on_decode_error: config.on_decode_error,
        })
    }
}

enum FileOutcome {
    Watermarked { written: usize, failed: usize },
    Skipped,
}

pub fn run(
    config: &WatermarkConfig,
    events: Option<Sender<ProcessEvent>>,
) -> Result<BatchResult, ProcessError> {
    run_with_backend(&RustBackend::new(), config, events)
}

/// Run a batch with a specific backend (allows testing with mock).
pub fn run_with_backend(
    backend: &impl ImageBackend,
    config: &WatermarkConfig,
    events: Option<Sender<ProcessEvent>>,
) -> Result<BatchResult, ProcessError> {
    let settings = BatchSettings::from_config(config)?;

    tracing::info!(path = %config.watermark.display(), "reading watermark");
    let watermark = load_watermark(backend, &config.watermark)?;

    tracing::info!(path = %config.input.display(), "listing input images");
    let inputs = list_input_files(&config.input)?;

    tracing::info!(path = %config.output.display(), "creating output directories");
    create_output_dirs(settings.output, &settings.sizes, settings.layout)?;

    if let Some(tx) = &events {
        tx.send(ProcessEvent::Started {
            watermark: watermark.path.display().to_string(),
            image_count: inputs.len(),
            sizes: settings.sizes.labels().map(str::to_string).collect(),
        })
        .ok();
    }

    let outcomes = inputs
        .par_iter()
        .enumerate()
        .map(|(i, path)| process_file(backend, &watermark, path, i + 1, &settings, events.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;

    let mut result = BatchResult::default();
    for outcome in outcomes {
        match outcome {
            FileOutcome::Watermarked { written, failed } => {
                result.watermarked += 1;
                result.variants_written += written;
                result.variants_failed += failed;
            }
            FileOutcome::Skipped => result.skipped += 1,
        }
    }
    Ok(result)
}

/// Read and decode the watermark file.
pub fn load_watermark(
    backend: &impl ImageBackend,
    path: &Path,
) -> Result<WatermarkAsset, ProcessError> {
    let bytes = fs::read(path).map_err(|source| ProcessError::ReadWatermark {
        path: path.to_path_buf(),
        source,
    })?;
    let image = backend
        .decode_watermark(&bytes)
        .map_err(|source| ProcessError::DecodeWatermark {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(WatermarkAsset {
        path: path.to_path_buf(),
        image,
    })
}

/// Regular files directly inside `dir`, sorted by name.
///
/// Subdirectories and symlinks are skipped.
pub fn list_input_files(dir: &Path) -> Result<Vec<PathBuf>, ProcessError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| ProcessError::ListInput {
            path: dir.to_path_buf(),
            source: e.into(),
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Create every directory a run will write into.
pub fn create_output_dirs(
    root: &Path,
    sizes: &SizeRequests,
    layout: OutputLayout,
) -> Result<(), ProcessError> {
    let dirs: Vec<PathBuf> = match layout {
        OutputLayout::Flat => vec![root.to_path_buf()],
        OutputLayout::Labeled => sizes.labels().map(|label| root.join(label)).collect(),
    };
    for dir in dirs {
        fs::create_dir_all(&dir)
            .map_err(|source| ProcessError::CreateOutputDir { path: dir, source })?;
    }
    Ok(())
}

/// Destination of one variant of `filename`.
pub fn output_path(root: &Path, layout: OutputLayout, label: &str, filename: &OsStr) -> PathBuf {
    match layout {
        OutputLayout::Flat => root.join(filename),
        OutputLayout::Labeled => root.join(label).join(filename),
    }
}

fn process_file(
    backend: &impl ImageBackend,
    watermark: &WatermarkAsset,
    path: &Path,
    index: usize,
    settings: &BatchSettings<'_>,
    events: Option<&Sender<ProcessEvent>>,
) -> Result<FileOutcome, ProcessError> {
    let filename = path.file_name().unwrap_or(path.as_os_str());
    let display_name = filename.to_string_lossy().into_owned();
    tracing::info!(file = %path.display(), "watermarking");

    let decoded = fs::read(path)
        .map_err(|source| ProcessError::ReadImage {
            path: path.to_path_buf(),
            source,
        })
        .and_then(|bytes| {
            backend
                .decode(&bytes)
                .map_err(|source| ProcessError::DecodeImage {
                    path: path.to_path_buf(),
                    source,
                })
        });

    let source = match (decoded, settings.on_decode_error) {
        (Ok(img), _) => img,
        (Err(e), DecodeErrorPolicy::Abort) => return Err(e),
        (Err(e), DecodeErrorPolicy::Skip) => {
            tracing::warn!(error = %e, "skipping image");
            if let Some(tx) = events {
                tx.send(ProcessEvent::ImageSkipped {
                    index,
                    filename: display_name,
                    error: e.to_string(),
                })
                .ok();
            }
            return Ok(FileOutcome::Skipped);
        }
    };

    let composited = composite(&source, &watermark.image, &settings.composite);
    drop(source);

    let outcomes = emit_sizes(
        backend,
        &composited.image,
        &settings.sizes,
        settings.quality,
        |label, bytes| {
            let out = output_path(settings.output, settings.layout, label, filename);
            fs::write(&out, bytes).map_err(|source| VariantError::Write { path: out, source })
        },
    );

    let written = outcomes.iter().filter(|o| o.is_written()).count();
    let failed = outcomes.len() - written;

    if let Some(tx) = events {
        let variants = outcomes
            .into_iter()
            .map(|o| VariantInfo {
                label: o.label,
                status: match o.result {
                    Ok((width, height)) => VariantStatus::Written { width, height },
                    Err(e) => VariantStatus::Failed(e.to_string()),
                },
            })
            .collect();
        tx.send(ProcessEvent::ImageProcessed {
            index,
            filename: display_name,
            dimensions: composited.image.dimensions(),
            watermark: composited.watermark,
            variants,
        })
        .ok();
    }

    Ok(FileOutcome::Watermarked { written, failed })
}
