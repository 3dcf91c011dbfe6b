//! Writes a generated index block into a human-edited text file.
//!
//! The marker pair is the only contract with the file: whatever sits between the
//! first start marker and the next end marker is replaced, everything else is
//! left byte-for-byte as it was. Writes are not atomic.

use std::fs;
use std::path::Path;

use tracing::{error, info};

use crate::contract::{IgnoreError, IgnoreOutcome, InjectError, InjectOutcome};
use crate::index::{END_MARKER, START_MARKER};

/// Result of patching `content` with `block`, before anything touches disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patched {
    pub content: String,
    pub outcome: InjectOutcome,
}

/// Replaces the marker-delimited span in `content` with `block`, or appends
/// `block` after a blank line when no well-ordered marker pair exists.
pub fn patch_content(content: &str, block: &str) -> Patched {
    if let Some((start, end)) = marker_span(content) {
        let mut patched = String::with_capacity(content.len() + block.len());
        patched.push_str(&content[..start]);
        patched.push_str(block);
        patched.push_str(&content[end..]);
        return Patched {
            content: patched,
            outcome: InjectOutcome::Updated,
        };
    }

    Patched {
        content: format!("{}\n\n{}\n", content.trim_end(), block),
        outcome: InjectOutcome::Appended,
    }
}

/// Byte range from the start marker through the end of the end marker.
pub fn marker_span(content: &str) -> Option<(usize, usize)> {
    let start = content.find(START_MARKER)?;
    let end = content.find(END_MARKER)?;
    (end > start).then_some((start, end + END_MARKER.len()))
}

/// Injects `block` into `path`, creating the file when missing and allowed.
pub fn inject(path: &Path, block: &str, create_if_missing: bool) -> Result<InjectOutcome, InjectError> {
    if path.as_os_str().is_empty() {
        error!("Index target path is empty");
        return Err(InjectError::FilePathEmpty);
    }

    if !path.exists() {
        if !create_if_missing {
            error!(path = %path.display(), "Index target file not found");
            return Err(InjectError::FileNotFound(path.display().to_string()));
        }
        fs::write(path, format!("{block}\n")).map_err(write_failed(path))?;
        info!(path = %path.display(), "Created index target file");
        return Ok(InjectOutcome::Created);
    }

    let content = fs::read_to_string(path).map_err(write_failed(path))?;
    let patched = patch_content(&content, block);
    fs::write(path, &patched.content).map_err(write_failed(path))?;
    match patched.outcome {
        InjectOutcome::Updated => info!(path = %path.display(), "Updated existing index"),
        _ => info!(path = %path.display(), "Appended index"),
    }
    Ok(patched.outcome)
}

fn write_failed(path: &Path) -> impl Fn(std::io::Error) -> InjectError + '_ {
    move |e| {
        error!(error = %e, path = %path.display(), "Index injection failed");
        InjectError::WriteFailed(e)
    }
}

/// Makes sure `entry` is an exact (trimmed) line of the ignore-list at `path`.
pub fn ensure_ignore_entry(path: &Path, entry: &str) -> Result<IgnoreOutcome, IgnoreError> {
    if path.as_os_str().is_empty() || entry.is_empty() {
        return Err(IgnoreError::PathEmpty);
    }

    if !path.exists() {
        fs::write(path, format!("{entry}\n")).map_err(IgnoreError::WriteFailed)?;
        info!(path = %path.display(), entry, "Created ignore-list");
        return Ok(IgnoreOutcome::Created);
    }

    let content = fs::read_to_string(path).map_err(IgnoreError::WriteFailed)?;
    if content.lines().any(|line| line.trim() == entry) {
        return Ok(IgnoreOutcome::AlreadyPresent);
    }

    let mut updated = content;
    updated.push_str(&format!("\n{entry}\n"));
    fs::write(path, updated).map_err(IgnoreError::WriteFailed)?;
    info!(path = %path.display(), entry, "Added entry to ignore-list");
    Ok(IgnoreOutcome::Updated)
}
