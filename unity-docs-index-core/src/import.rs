//! Copies an existing documentation tree from local disk instead of downloading it.
//!
//! The copy is best-effort: a failure part-way leaves whatever was already copied.

use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, error, info};
use walkdir::WalkDir;

use crate::contract::ImportError;
use crate::layout::normalize_layout;

/// Recursively copies `source` into `dest`, overwriting files that already exist,
/// then flattens a nested `Documentation/en` or `en` folder the same way a download is.
pub fn import_from(source: &Path, dest: &Path) -> Result<usize, ImportError> {
    if source.as_os_str().is_empty() {
        error!("Local documentation source path is empty");
        return Err(ImportError::SourcePathEmpty);
    }
    if !source.is_dir() {
        error!(path = %source.display(), "Local documentation source not found");
        return Err(ImportError::SourceNotFound(source.display().to_string()));
    }

    info!(source = %source.display(), dest = %dest.display(), "Copying documentation from local source");
    let copied = copy_tree(source, dest).map_err(|e| {
        error!(error = %e, source = %source.display(), "Copying local documentation failed");
        ImportError::CopyFailed(e)
    })?;

    let layout = normalize_layout(dest).map_err(|e| {
        error!(error = %e, dest = %dest.display(), "Normalising imported documentation failed");
        ImportError::CopyFailed(e)
    })?;

    info!(files = copied, ?layout, dest = %dest.display(), "Documentation copied");
    Ok(copied)
}

fn copy_tree(source: &Path, dest: &Path) -> io::Result<usize> {
    fs::create_dir_all(dest)?;
    let mut copied = 0;
    for entry in WalkDir::new(source).min_depth(1).follow_links(true) {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
            debug!(file = %relative.display(), "Copied");
            copied += 1;
        }
    }
    Ok(copied)
}
