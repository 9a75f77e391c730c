//! Directory scanning: list a source directory and classify each entry so
//! the pipeline can dispatch it.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

use crate::config::PipelineConfig;
use crate::paths;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    Unsupported,
}

/// One catalogued directory entry. Immutable once produced by [`scan`].
#[derive(Clone, Debug)]
pub struct MediaEntry {
    /// File stem, without the extension.
    pub name: String,
    /// On-disk extension with its original case, no leading dot.
    /// `name` + `.` + `extension` reconstructs the file name.
    pub extension: String,
    pub source_path: PathBuf,
    pub kind: MediaKind,
    /// True iff the file name starts with `.`.
    pub hidden: bool,
    /// Per-scan sequence number over image entries, in catalogue order.
    /// Gallery display consumers use this; thumbnail generation does not.
    pub gallery_index: Option<usize>,
}

/// A scanned source directory with its resolved destination.
#[derive(Clone, Debug)]
pub struct MediaDirectory {
    pub source_path: PathBuf,
    pub destination_path: PathBuf,
    pub entries: Vec<MediaEntry>,
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("cannot list source directory {dir}: {source}")]
    List {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Lists `source_dir` and classifies every entry. Listing order is whatever
/// the directory enumeration yields; no sort is imposed.
pub async fn scan(
    source_dir: &Path,
    config: &PipelineConfig,
) -> Result<MediaDirectory, ScanError> {
    let list_err = |source| ScanError::List {
        dir: source_dir.to_path_buf(),
        source,
    };
    let mut reader = tokio::fs::read_dir(source_dir).await.map_err(list_err)?;

    let mut entries = Vec::new();
    let mut image_count = 0usize;
    while let Some(dir_entry) = reader.next_entry().await.map_err(list_err)? {
        let is_file = dir_entry
            .file_type()
            .await
            .map(|t| t.is_file())
            .unwrap_or(false);
        let file_name = dir_entry.file_name();
        let source_path = dir_entry.path();

        let Some(file_name) = file_name.to_str() else {
            // Non-UTF-8 names are catalogued but never dispatched.
            entries.push(MediaEntry {
                name: dir_entry.file_name().to_string_lossy().into_owned(),
                extension: String::new(),
                source_path,
                kind: MediaKind::Unsupported,
                hidden: false,
                gallery_index: None,
            });
            continue;
        };

        let hidden = file_name.starts_with('.');
        let (name, extension) = split_name(file_name);
        let kind = if !is_file || extension.is_empty() {
            MediaKind::Unsupported
        } else if config.is_image_extension(extension) {
            MediaKind::Image
        } else if config.is_video_extension(extension) {
            MediaKind::Video
        } else {
            MediaKind::Unsupported
        };

        let gallery_index = (kind == MediaKind::Image).then(|| {
            let i = image_count;
            image_count += 1;
            i
        });

        entries.push(MediaEntry {
            name: name.to_string(),
            extension: extension.to_string(),
            source_path,
            kind,
            hidden,
            gallery_index,
        });
    }

    debug!(
        dir = %source_dir.display(),
        entries = entries.len(),
        images = image_count,
        "scanned source directory"
    );

    Ok(MediaDirectory {
        source_path: source_dir.to_path_buf(),
        destination_path: paths::thumbnail_dir(source_dir, &config.thumbnail_root, config.mirror),
        entries,
    })
}

/// Splits a file name into stem and extension, mirroring
/// `Path::file_stem`/`Path::extension` (a leading dot alone does not start
/// an extension, so `.hidden` has none while `.hidden.mp4` has `mp4`).
fn split_name(file_name: &str) -> (&str, &str) {
    let skip = file_name.chars().next().map_or(0, char::len_utf8);
    match file_name[skip..].rfind('.') {
        Some(i) => (&file_name[..skip + i], &file_name[skip + i + 1..]),
        None => (file_name, ""),
    }
}

/// Walks `root` and returns the sorted, deduplicated set of directories
/// that directly contain at least one dispatchable media file, each usable
/// as an independent pipeline unit. A file counts by the same rules the
/// scanner dispatches with: any image, or a non-hidden video.
pub fn discover(root: &Path, config: &PipelineConfig) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            let Some(name) = e.file_name().to_str() else {
                return false;
            };
            let (_, ext) = split_name(name);
            config.is_image_extension(ext)
                || (config.is_video_extension(ext) && !name.starts_with('.'))
        })
        .filter_map(|e| e.path().parent().map(Path::to_path_buf))
        .collect();
    dirs.sort();
    dirs.dedup();
    dirs
}
