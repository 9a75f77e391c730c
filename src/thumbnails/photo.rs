//! Image thumbnail generation: read, resize on a blocking worker, write.

use std::path::Path;
use std::sync::Arc;

use tokio::fs;
use tracing::debug;

use crate::pipeline::EntryError;
use crate::resize::{ImageResizer, ResizeError, ResizeOptions};
use crate::scan::MediaEntry;

/// Resizes `entry` and writes the thumbnail to `destination`. The write is
/// a single buffer write; a failure leaves no partial file.
pub(crate) async fn generate(
    entry: &MediaEntry,
    destination: &Path,
    resizer: Arc<dyn ImageResizer>,
    options: ResizeOptions,
) -> Result<(), EntryError> {
    let bytes = fs::read(&entry.source_path)
        .await
        .map_err(EntryError::Read)?;

    debug!(
        source = %entry.source_path.display(),
        size = bytes.len(),
        "resizing image"
    );

    // Resizing is CPU-bound; keep it off the async workers.
    let resized = tokio::task::spawn_blocking(move || resizer.resize(&bytes, &options))
        .await
        .map_err(|e| ResizeError::Scale(format!("resize task failed: {e}")))??;

    fs::write(destination, &resized)
        .await
        .map_err(EntryError::Write)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(destination, std::fs::Permissions::from_mode(0o775))
            .await
            .map_err(EntryError::Write)?;
    }
    Ok(())
}
