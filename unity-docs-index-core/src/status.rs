//! Inspection of a project that may already have been indexed.
//!
//! The index block is its own record: the version it was built for is read back
//! from its `version:` field, no separate state file is kept.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::index::{END_MARKER, START_MARKER};
use crate::inject::marker_span;
use crate::layout::docs_exist;
use crate::version::normalize_version;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocsStatus {
    pub docs_present: bool,
    pub index_present: bool,
    pub indexed_version: Option<String>,
    /// Requested version key differs from the indexed one.
    pub stale: bool,
}

impl DocsStatus {
    /// The output file references documentation that is not on disk.
    pub fn needs_download(&self) -> bool {
        self.index_present && !self.docs_present
    }
}

/// Reads the `version:` field from the first marker block in `content`.
pub fn indexed_version(content: &str) -> Option<String> {
    let (start, end) = marker_span(content)?;
    let body = &content[start + START_MARKER.len()..end - END_MARKER.len()];
    body.split('|')
        .find_map(|field| field.strip_prefix("version: "))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn inspect(
    docs_root: &Path,
    output_file: &Path,
    requested_version: Option<&str>,
) -> DocsStatus {
    let docs_present = docs_exist(docs_root);
    let content = fs::read_to_string(output_file).ok();
    let index_present = content
        .as_deref()
        .is_some_and(|c| c.contains(START_MARKER));
    let indexed_version = content.as_deref().and_then(indexed_version);

    let stale = match (requested_version.map(normalize_version), &indexed_version) {
        (Some(requested), Some(indexed)) if !requested.is_empty() => requested != *indexed,
        _ => false,
    };

    let status = DocsStatus {
        docs_present,
        index_present,
        indexed_version,
        stale,
    };
    debug!(?status, docs = %docs_root.display(), output = %output_file.display(), "Inspected project");
    status
}
