//! Frame extraction collaborator: the trait the pipeline calls, and the
//! production implementation that shells out to the `ffmpeg` binary.
//!
//! The command is always built as an argument vector. Source file names are
//! untrusted input and must never pass through a shell.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// One frame-extraction job: grab a single frame `seek_seconds` into
/// `source` and write it to `destination`.
#[derive(Clone, Debug)]
pub struct ExtractRequest {
    pub source: PathBuf,
    pub seek_seconds: f64,
    pub destination: PathBuf,
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to launch frame extractor: {0}")]
    Launch(#[source] std::io::Error),
    #[error("frame extractor exited with {status}: {stderr}")]
    Failed {
        status: std::process::ExitStatus,
        stderr: String,
    },
    #[error("frame extraction timed out after {0:?}")]
    Timeout(Duration),
}

/// Writes one still image from a video, or reports why it could not.
#[async_trait]
pub trait FrameExtractor: Send + Sync {
    async fn extract(&self, request: &ExtractRequest) -> Result<(), ExtractError>;
}

/// Production extractor invoking `ffmpeg`. Requires the binary on `PATH`.
#[derive(Clone, Debug)]
pub struct FfmpegExtractor {
    program: String,
}

impl Default for FfmpegExtractor {
    fn default() -> Self {
        Self {
            program: "ffmpeg".to_string(),
        }
    }
}

impl FfmpegExtractor {
    /// Use a different executable name, e.g. a pinned path.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl FrameExtractor for FfmpegExtractor {
    async fn extract(&self, request: &ExtractRequest) -> Result<(), ExtractError> {
        debug!(
            source = %request.source.display(),
            seek = request.seek_seconds,
            "extracting video frame"
        );
        // kill_on_drop reaps the child if the caller's timeout drops us.
        let output = Command::new(&self.program)
            .arg("-y")
            .arg("-ss")
            .arg(request.seek_seconds.to_string())
            .arg("-i")
            .arg(&request.source)
            .arg("-frames:v")
            .arg("1")
            .arg(&request.destination)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(ExtractError::Launch)?;

        if output.status.success() {
            Ok(())
        } else {
            Err(ExtractError::Failed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}
