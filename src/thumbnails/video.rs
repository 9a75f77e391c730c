//! Video thumbnail generation: extract one frame into a staging directory,
//! then persist it to the destination.
//!
//! Staging guarantees a failed or interrupted extraction never leaves a
//! partial file at the destination; whatever the tool wrote is discarded
//! with the scratch directory.

use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use temp_dir::TempDir;
use tokio::fs;
use tracing::debug;

use crate::ffmpeg::{ExtractError, ExtractRequest, FrameExtractor};
use crate::pipeline::EntryError;
use crate::scan::MediaEntry;

/// Extracts a still frame from `entry` and persists it to `destination`.
/// The caller only dispatches non-hidden video entries here.
pub(crate) async fn generate(
    entry: &MediaEntry,
    destination: &Path,
    extractor: Arc<dyn FrameExtractor>,
    seek_seconds: f64,
    timeout: Option<Duration>,
) -> Result<(), EntryError> {
    let staging = TempDir::new()
        .map_err(|e| EntryError::Write(io::Error::other(e)))?;
    let file_name = destination.file_name().ok_or_else(|| {
        EntryError::Write(io::Error::new(
            io::ErrorKind::InvalidInput,
            "destination has no file name",
        ))
    })?;
    let staged = staging.path().join(file_name);

    let request = ExtractRequest {
        source: entry.source_path.clone(),
        seek_seconds,
        destination: staged.clone(),
    };

    debug!(
        source = %entry.source_path.display(),
        staged = %staged.display(),
        "extracting frame into staging"
    );

    match timeout {
        Some(limit) => tokio::time::timeout(limit, extractor.extract(&request))
            .await
            .map_err(|_| ExtractError::Timeout(limit))??,
        None => extractor.extract(&request).await?,
    }

    persist(&staged, destination)
        .await
        .map_err(EntryError::Write)
}

/// Moves the staged frame into place. Rename is atomic on one filesystem;
/// staging usually lives on another (tmpfs), so the common path is the
/// copy fallback.
async fn persist(staged: &Path, destination: &Path) -> io::Result<()> {
    if fs::rename(staged, destination).await.is_ok() {
        return Ok(());
    }
    copy_into_place(staged, destination).await
}

/// Cross-filesystem fallback: copy next to the destination under a
/// temporary dot-name, then rename into place. The destination path only
/// ever sees the complete file; a torn copy is removed.
async fn copy_into_place(staged: &Path, destination: &Path) -> io::Result<()> {
    let file_name = destination.file_name().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "destination has no file name")
    })?;
    let mut tmp_name = std::ffi::OsString::from(".");
    tmp_name.push(file_name);
    tmp_name.push(".tmp");
    let tmp = destination.with_file_name(tmp_name);

    if let Err(e) = fs::copy(staged, &tmp).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e);
    }
    fs::rename(&tmp, destination).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ffmpeg::tests::{HangingExtractor, ScriptedExtractor};
    use crate::scan::MediaKind;
    use std::path::PathBuf;

    fn video_entry(dir: &Path, file_name: &str) -> MediaEntry {
        let (name, ext) = file_name.rsplit_once('.').unwrap();
        MediaEntry {
            name: name.to_string(),
            extension: ext.to_string(),
            source_path: dir.join(file_name),
            kind: MediaKind::Video,
            hidden: false,
            gallery_index: None,
        }
    }

    #[tokio::test]
    async fn persists_extracted_frame_to_destination() {
        let tmp = TempDir::new().unwrap();
        let entry = video_entry(tmp.path(), "clip.mp4");
        let destination = tmp.path().join("clip.jpg");

        let extractor = Arc::new(ScriptedExtractor::default());
        generate(&entry, &destination, extractor.clone(), 1.0, None)
            .await
            .unwrap();

        assert!(destination.exists());
        let requests = extractor.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].source, entry.source_path);
        assert_eq!(requests[0].seek_seconds, 1.0);
        // extraction was staged, not written straight to the destination
        assert_ne!(requests[0].destination, destination);
        assert_eq!(
            requests[0].destination.file_name(),
            Some(std::ffi::OsStr::new("clip.jpg"))
        );
    }

    #[tokio::test]
    async fn failed_extraction_leaves_no_destination_file() {
        let tmp = TempDir::new().unwrap();
        let entry = video_entry(tmp.path(), "clip.mp4");
        let destination = tmp.path().join("clip.jpg");

        let extractor = Arc::new(ScriptedExtractor {
            fail_on: vec![0],
            partial_on_failure: true,
            ..ScriptedExtractor::default()
        });
        let err = generate(&entry, &destination, extractor, 1.0, None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EntryError::Extract(ExtractError::Failed { .. })
        ));
        assert!(!destination.exists());
    }

    #[tokio::test]
    async fn copy_fallback_never_exposes_a_torn_destination() {
        let staging = TempDir::new().unwrap();
        let dest_dir = TempDir::new().unwrap();
        let staged = staging.path().join("clip.jpg");
        let destination = dest_dir.path().join("clip.jpg");
        std::fs::write(&staged, b"frame-bytes").unwrap();

        copy_into_place(&staged, &destination).await.unwrap();

        assert_eq!(std::fs::read(&destination).unwrap(), b"frame-bytes");
        // the intermediate dot-name was renamed away, not left behind
        assert!(!dest_dir.path().join(".clip.jpg.tmp").exists());
    }

    #[tokio::test]
    async fn failed_fallback_copy_leaves_destination_untouched() {
        let staging = TempDir::new().unwrap();
        let dest_dir = TempDir::new().unwrap();
        let missing = staging.path().join("gone.jpg");
        let destination = dest_dir.path().join("clip.jpg");

        let err = copy_into_place(&missing, &destination).await.unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(!destination.exists());
        assert!(!dest_dir.path().join(".clip.jpg.tmp").exists());
    }

    #[tokio::test]
    async fn hung_extractor_times_out() {
        let entry = video_entry(Path::new("/videos"), "clip.mp4");
        let destination = PathBuf::from("/nonexistent/clip.jpg");

        let err = generate(
            &entry,
            &destination,
            Arc::new(HangingExtractor),
            1.0,
            Some(Duration::from_millis(20)),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, EntryError::Extract(ExtractError::Timeout(_))));
    }
}
