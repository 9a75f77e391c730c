use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::resize::{ExtendMode, Gravity, Interpolation, ResizeOptions};

/// How much of a source directory's path is reproduced under the
/// thumbnail root.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MirrorMode {
    /// Mirror every path component of the source directory. Distinct source
    /// trees can never collide, at the cost of deep destination trees.
    #[default]
    FullPath,
    /// Mirror only the final path component. Flatter output, but two source
    /// directories with the same name will share a destination.
    LastSegment,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Configuration for a pipeline run. Every field has a default, so a JSON
/// config file may set any subset.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Source media directories, each an independent unit of work.
    pub source_dirs: Vec<PathBuf>,
    /// Root under which the mirrored thumbnail tree is written.
    pub thumbnail_root: PathBuf,
    /// The one extension treated as an image (leading dot optional,
    /// matched case-insensitively).
    pub image_extension: String,
    /// The one extension treated as a video.
    pub video_extension: String,
    /// Thumbnail height in pixels; width follows the aspect ratio.
    pub target_height: u32,
    /// JPEG quality (1-100) for resized image thumbnails.
    pub jpeg_quality: u8,
    /// Entries processed concurrently within one directory. 1 = sequential.
    pub worker_count: usize,
    /// Seek offset into a video before grabbing the still frame.
    pub seek_seconds: f64,
    /// Per-entry wall-clock limit; `None` leaves entries unbounded.
    pub timeout_seconds: Option<u64>,
    pub mirror: MirrorMode,
    /// Extra attempts after a failed entry. 0 = no retry.
    pub retry_attempts: usize,
    /// Fixed delay between retry attempts.
    pub retry_delay_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_dirs: Vec::new(),
            thumbnail_root: PathBuf::from("thumbs"),
            image_extension: "jpg".to_string(),
            video_extension: "mp4".to_string(),
            target_height: 500,
            jpeg_quality: 90,
            worker_count: 1,
            seek_seconds: 1.0,
            timeout_seconds: None,
            mirror: MirrorMode::FullPath,
            retry_attempts: 0,
            retry_delay_ms: 500,
        }
    }
}

fn strip_dot(ext: &str) -> &str {
    ext.strip_prefix('.').unwrap_or(ext)
}

impl PipelineConfig {
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn is_image_extension(&self, ext: &str) -> bool {
        strip_dot(&self.image_extension).eq_ignore_ascii_case(strip_dot(ext))
    }

    pub fn is_video_extension(&self, ext: &str) -> bool {
        strip_dot(&self.video_extension).eq_ignore_ascii_case(strip_dot(ext))
    }

    /// The image extension as written into thumbnail file names, without a
    /// leading dot.
    pub fn image_ext(&self) -> &str {
        strip_dot(&self.image_extension)
    }

    pub fn per_entry_timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }

    /// The fixed resize parameters handed to the image collaborator.
    pub fn resize_options(&self) -> ResizeOptions {
        ResizeOptions {
            target_height: self.target_height,
            crop: false,
            extend: ExtendMode::WhiteFill,
            gravity: Gravity::Centre,
            interpolation: Interpolation::Bilinear,
            quality: self.jpeg_quality,
        }
    }
}
