//! Pure source-path to thumbnail-path mapping, shared by the pipeline and
//! by anything that later serves the generated files. No I/O here.

use std::path::{Component, Path, PathBuf};

use crate::config::MirrorMode;
use crate::scan::{MediaEntry, MediaKind};

/// The part of `source_dir` reproduced under the thumbnail root.
///
/// Root, prefix and relative (`.`/`..`) components are dropped, so the
/// result can never escape the thumbnail root.
pub fn mirrored_subpath(source_dir: &Path, mirror: MirrorMode) -> PathBuf {
    let normal = source_dir.components().filter_map(|c| match c {
        Component::Normal(part) => Some(part),
        _ => None,
    });
    match mirror {
        MirrorMode::FullPath => normal.collect(),
        MirrorMode::LastSegment => normal.last().map(PathBuf::from).unwrap_or_default(),
    }
}

pub fn thumbnail_dir(source_dir: &Path, thumbnail_root: &Path, mirror: MirrorMode) -> PathBuf {
    thumbnail_root.join(mirrored_subpath(source_dir, mirror))
}

/// File name of the entry's thumbnail. Image thumbnails keep the original
/// name verbatim; a video thumbnail is itself an image, so the video
/// extension is replaced with `image_ext`. Unsupported entries have none.
pub fn thumbnail_file_name(entry: &MediaEntry, image_ext: &str) -> Option<String> {
    match entry.kind {
        MediaKind::Image => Some(format!("{}.{}", entry.name, entry.extension)),
        MediaKind::Video => Some(format!("{}.{}", entry.name, image_ext)),
        MediaKind::Unsupported => None,
    }
}

/// Full destination path for an entry's thumbnail.
pub fn thumbnail_path(
    entry: &MediaEntry,
    thumbnail_root: &Path,
    mirror: MirrorMode,
    image_ext: &str,
) -> Option<PathBuf> {
    let source_dir = entry.source_path.parent()?;
    let name = thumbnail_file_name(entry, image_ext)?;
    Some(thumbnail_dir(source_dir, thumbnail_root, mirror).join(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, ext: &str, dir: &str, kind: MediaKind) -> MediaEntry {
        MediaEntry {
            name: name.to_string(),
            extension: ext.to_string(),
            source_path: Path::new(dir).join(format!("{name}.{ext}")),
            kind,
            hidden: name.starts_with('.'),
            gallery_index: None,
        }
    }

    #[test]
    fn full_path_mirror_drops_root() {
        let sub = mirrored_subpath(Path::new("/media/fergus/Photos/Japan 2014"), MirrorMode::FullPath);
        assert_eq!(sub, PathBuf::from("media/fergus/Photos/Japan 2014"));
    }

    #[test]
    fn full_path_mirror_drops_relative_components() {
        let sub = mirrored_subpath(Path::new("../photos/./imgs"), MirrorMode::FullPath);
        assert_eq!(sub, PathBuf::from("photos/imgs"));
    }

    #[test]
    fn last_segment_mirror_keeps_final_component() {
        let sub = mirrored_subpath(Path::new("/media/fergus/Photos/Japan 2014"), MirrorMode::LastSegment);
        assert_eq!(sub, PathBuf::from("Japan 2014"));
        assert_eq!(
            mirrored_subpath(Path::new("/"), MirrorMode::LastSegment),
            PathBuf::new()
        );
    }

    #[test]
    fn image_thumbnail_keeps_original_name_and_case() {
        let e = entry("photo", "JPG", "/imgs", MediaKind::Image);
        assert_eq!(thumbnail_file_name(&e, "jpg").unwrap(), "photo.JPG");
        assert_eq!(
            thumbnail_path(&e, Path::new("/thumbs"), MirrorMode::FullPath, "jpg").unwrap(),
            PathBuf::from("/thumbs/imgs/photo.JPG")
        );
    }

    #[test]
    fn video_thumbnail_takes_image_extension() {
        let e = entry("clip", "mp4", "/imgs", MediaKind::Video);
        assert_eq!(thumbnail_file_name(&e, "jpg").unwrap(), "clip.jpg");
        assert_eq!(
            thumbnail_path(&e, Path::new("/thumbs"), MirrorMode::FullPath, "jpg").unwrap(),
            PathBuf::from("/thumbs/imgs/clip.jpg")
        );
    }

    #[test]
    fn unsupported_entry_has_no_thumbnail_path() {
        let e = entry("note", "txt", "/imgs", MediaKind::Unsupported);
        assert!(thumbnail_file_name(&e, "jpg").is_none());
        assert!(thumbnail_path(&e, Path::new("/thumbs"), MirrorMode::FullPath, "jpg").is_none());
    }
}
