//! The batch orchestrator: scan a source directory, ensure its mirrored
//! destination, dispatch every catalogued entry to the matching generator,
//! and report one outcome per dispatched entry.
//!
//! Continue-on-error is a hard contract here: a single entry's failure
//! never aborts the directory, and a directory's fatal failure never
//! affects its siblings.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::{StreamExt, stream};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tokio_retry::Retry;
use tokio_retry::strategy::FixedInterval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::ffmpeg::{ExtractError, FfmpegExtractor, FrameExtractor};
use crate::paths;
use crate::resize::{ImageResizer, NativeResizer, ResizeError};
use crate::scan::{self, MediaEntry, MediaKind, ScanError};
use crate::thumbnails::{photo, video};

/// Why one entry failed. Each variant maps to one stage of the per-entry
/// work, so callers can triage without parsing text.
#[derive(Debug, Error)]
pub enum EntryError {
    #[error("failed to read source file: {0}")]
    Read(#[source] std::io::Error),
    #[error(transparent)]
    Resize(#[from] ResizeError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error("failed to write thumbnail: {0}")]
    Write(#[source] std::io::Error),
}

/// A fatal per-directory error. Sibling directories are unaffected.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error("cannot create destination directory {dir}: {source}")]
    Destination {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug)]
pub enum OutcomeStatus {
    Success,
    Failed(EntryError),
}

/// Per-entry record of one dispatch. Exists only for the duration of the
/// run; the thumbnail file on disk is the only persistent artifact.
#[derive(Debug)]
pub struct EntryOutcome {
    pub entry: MediaEntry,
    pub thumbnail_path: PathBuf,
    pub status: OutcomeStatus,
}

impl EntryOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, OutcomeStatus::Success)
    }
}

/// Result of one configured source directory, success or fatal.
#[derive(Debug)]
pub struct DirectoryRun {
    pub source_dir: PathBuf,
    pub result: Result<Vec<EntryOutcome>, RunError>,
}

/// Emitted after each dispatched entry completes.
#[derive(Clone, Debug)]
pub struct ProgressEvent {
    pub completed: usize,
    pub total: usize,
    pub source_path: PathBuf,
    /// Human-readable diagnostic when the entry failed.
    pub failure: Option<String>,
}

pub struct ThumbnailPipeline {
    config: PipelineConfig,
    resizer: Arc<dyn ImageResizer>,
    extractor: Arc<dyn FrameExtractor>,
    progress: Option<UnboundedSender<ProgressEvent>>,
    cancel: CancellationToken,
}

impl ThumbnailPipeline {
    /// Pipeline with the production collaborators (`NativeResizer` and the
    /// `ffmpeg` binary).
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_collaborators(
            config,
            Arc::new(NativeResizer),
            Arc::new(FfmpegExtractor::default()),
        )
    }

    /// Pipeline with substituted collaborator seams.
    pub fn with_collaborators(
        config: PipelineConfig,
        resizer: Arc<dyn ImageResizer>,
        extractor: Arc<dyn FrameExtractor>,
    ) -> Self {
        Self {
            config,
            resizer,
            extractor,
            progress: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_progress(mut self, sender: UnboundedSender<ProgressEvent>) -> Self {
        self.progress = Some(sender);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Processes every configured source directory as an independent unit
    /// of work, sequentially. A fatal directory error is recorded in its
    /// `DirectoryRun` and processing moves on.
    pub async fn run_all(&self) -> Vec<DirectoryRun> {
        let mut runs = Vec::new();
        for dir in &self.config.source_dirs {
            if self.cancel.is_cancelled() {
                info!("run cancelled, skipping remaining directories");
                break;
            }
            let result = self.run_directory(dir).await;
            match &result {
                Ok(outcomes) => {
                    let failed = outcomes.iter().filter(|o| !o.is_success()).count();
                    info!(
                        dir = %dir.display(),
                        generated = outcomes.len() - failed,
                        failed,
                        "directory complete"
                    );
                }
                Err(err) => {
                    warn!(dir = %dir.display(), error = %err, "directory run failed");
                }
            }
            runs.push(DirectoryRun {
                source_dir: dir.clone(),
                result,
            });
        }
        runs
    }

    /// Runs one source directory: scan, ensure the mirrored destination,
    /// dispatch. Returns exactly one outcome per dispatched entry.
    pub async fn run_directory(
        &self,
        source_dir: &Path,
    ) -> Result<Vec<EntryOutcome>, RunError> {
        let catalogue = scan::scan(source_dir, &self.config).await?;
        let destination = catalogue.destination_path.clone();

        // The destination barrier: nothing dispatches until the whole
        // mirrored tree exists.
        tokio::fs::create_dir_all(&destination)
            .await
            .map_err(|source| RunError::Destination {
                dir: destination.clone(),
                source,
            })?;

        let image_ext = self.config.image_ext();
        let jobs: Vec<(MediaEntry, PathBuf)> = catalogue
            .entries
            .iter()
            .filter(|entry| match entry.kind {
                MediaKind::Image => true,
                MediaKind::Video => !entry.hidden,
                MediaKind::Unsupported => false,
            })
            .filter_map(|entry| {
                paths::thumbnail_file_name(entry, image_ext)
                    .map(|name| (entry.clone(), destination.join(name)))
            })
            .collect();

        let total = jobs.len();
        let completed = AtomicUsize::new(0);
        info!(dir = %source_dir.display(), total, "dispatching entries");

        let outcomes: Vec<Option<EntryOutcome>> = stream::iter(jobs)
            .map(|(entry, thumbnail_path)| {
                let completed = &completed;
                async move {
                    if self.cancel.is_cancelled() {
                        debug!(file = %entry.source_path.display(), "cancelled, not dispatching");
                        return None;
                    }
                    let status = match self.generate(&entry, &thumbnail_path).await {
                        Ok(()) => OutcomeStatus::Success,
                        Err(err) => OutcomeStatus::Failed(err),
                    };
                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    self.emit_progress(done, total, &entry, &status);
                    Some(EntryOutcome {
                        entry,
                        thumbnail_path,
                        status,
                    })
                }
            })
            .buffered(self.config.worker_count.max(1))
            .collect()
            .await;

        Ok(outcomes.into_iter().flatten().collect())
    }

    async fn generate(&self, entry: &MediaEntry, destination: &Path) -> Result<(), EntryError> {
        if self.config.retry_attempts == 0 {
            return self.generate_once(entry, destination).await;
        }
        let strategy = FixedInterval::from_millis(self.config.retry_delay_ms)
            .take(self.config.retry_attempts);
        Retry::spawn(strategy, || self.generate_once(entry, destination)).await
    }

    async fn generate_once(
        &self,
        entry: &MediaEntry,
        destination: &Path,
    ) -> Result<(), EntryError> {
        match entry.kind {
            MediaKind::Image => {
                photo::generate(
                    entry,
                    destination,
                    Arc::clone(&self.resizer),
                    self.config.resize_options(),
                )
                .await
            }
            MediaKind::Video => {
                video::generate(
                    entry,
                    destination,
                    Arc::clone(&self.extractor),
                    self.config.seek_seconds,
                    self.config.per_entry_timeout(),
                )
                .await
            }
            // filtered out before dispatch
            MediaKind::Unsupported => Ok(()),
        }
    }

    fn emit_progress(
        &self,
        completed: usize,
        total: usize,
        entry: &MediaEntry,
        status: &OutcomeStatus,
    ) {
        let failure = match status {
            OutcomeStatus::Success => {
                debug!(
                    file = %entry.source_path.display(),
                    completed, total, "thumbnail generated"
                );
                None
            }
            OutcomeStatus::Failed(err) => {
                warn!(
                    file = %entry.source_path.display(),
                    error = %err,
                    completed, total, "thumbnail generation failed"
                );
                Some(err.to_string())
            }
        };
        if let Some(sender) = &self.progress {
            // a dropped receiver only means nobody is watching
            let _ = sender.send(ProgressEvent {
                completed,
                total,
                source_path: entry.source_path.clone(),
                failure,
            });
        }
    }
}
