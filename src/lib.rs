//! # Gallery Thumbnailer
//!
//! Batch thumbnail generation for a personal photo/video library: each
//! source directory is scanned, every image gets a height-normalized JPEG
//! preview and every non-hidden video gets a still frame extracted near its
//! start, written into a tree that mirrors the source layout under a
//! thumbnail root.
//!
//! The pipeline tolerates per-entry failures: every dispatched entry yields
//! exactly one [`EntryOutcome`], and one entry failing never aborts the
//! rest of its directory. All operations are performed asynchronously using
//! `tokio`.
//!
//! ## Requirements
//!
//! - **FFmpeg**: must be installed and accessible in the system's `PATH`
//!   (only needed when video entries are processed).
//!
//! ## Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use gallery_thumbnailer::{PipelineConfig, ThumbnailPipeline};
//! use color_eyre::Result;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = PipelineConfig {
//!         source_dirs: vec![PathBuf::from("photos/2024")],
//!         thumbnail_root: PathBuf::from("thumbs"),
//!         worker_count: 4,
//!         ..PipelineConfig::default()
//!     };
//!
//!     let pipeline = ThumbnailPipeline::new(config);
//!     for run in pipeline.run_all().await {
//!         match run.result {
//!             Ok(outcomes) => println!(
//!                 "{}: {} thumbnails",
//!                 run.source_dir.display(),
//!                 outcomes.iter().filter(|o| o.is_success()).count()
//!             ),
//!             Err(e) => eprintln!("{}: {e}", run.source_dir.display()),
//!         }
//!     }
//!     Ok(())
//! }
//! ```

// Run configuration and extension matching.
mod config;
// Frame-extraction collaborator (ffmpeg).
mod ffmpeg;
// Pure source-path to thumbnail-path mapping.
mod paths;
// The batch orchestrator.
mod pipeline;
// Image-resize collaborator.
mod resize;
// Directory scanning and entry classification.
mod scan;
// Per-kind generators.
mod thumbnails;

pub use config::{ConfigError, MirrorMode, PipelineConfig};
pub use ffmpeg::{ExtractError, ExtractRequest, FfmpegExtractor, FrameExtractor};
pub use paths::{mirrored_subpath, thumbnail_dir, thumbnail_file_name, thumbnail_path};
pub use pipeline::{
    DirectoryRun, EntryError, EntryOutcome, OutcomeStatus, ProgressEvent, RunError,
    ThumbnailPipeline,
};
pub use resize::{
    ExtendMode, Gravity, ImageResizer, Interpolation, NativeResizer, ResizeError, ResizeOptions,
};
pub use scan::{MediaDirectory, MediaEntry, MediaKind, ScanError, discover, scan};
