//! Loading image sets from disk.

use std::path::{Path, PathBuf};

use anyhow::Context;
use appraisal_vision::{is_supported_format, ImageBlob};

/// Supported image files directly inside `dir`, sorted by file name.
pub fn image_paths(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read image directory {}", dir.display()))?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && is_supported_format(&path.to_string_lossy()) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Read every supported image in `dir`. Unreadable files are skipped with a warning.
pub fn load_image_set(dir: &Path) -> anyhow::Result<Vec<ImageBlob>> {
    let mut blobs = Vec::new();
    for path in image_paths(dir)? {
        match ImageBlob::from_file(&path) {
            Ok(blob) => blobs.push(blob),
            Err(e) => tracing::warn!("Skipping {}: {e}", path.display()),
        }
    }
    tracing::info!("Loaded {} image(s) from {}", blobs.len(), dir.display());
    Ok(blobs)
}
