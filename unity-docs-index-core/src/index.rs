//! # index: compact, deterministic index of a documentation tree
//!
//! The index is a single line meant to be pasted into a notes file read by coding
//! agents. It names every Manual page without carrying any page content:
//!
//! ```text
//! <!-- UNITY-DOCS-INDEX-START -->[Unity Docs Index]|root: ./.unity-docs|version: 2022.3|...|Manual:{index.html}|Manual/Animation:{Clips.html}<!-- UNITY-DOCS-INDEX-END -->
//! ```
//!
//! Grouping and output order depend only on the set of discovered files, so a
//! fixed tree always renders byte-for-byte the same block.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::contract::IndexError;
use crate::layout::{MANUAL_SECTION, SCRIPT_REFERENCE_SECTION};

pub const START_MARKER: &str = "<!-- UNITY-DOCS-INDEX-START -->";
pub const END_MARKER: &str = "<!-- UNITY-DOCS-INDEX-END -->";

pub const INDEX_TITLE: &str = "[Unity Docs Index]";
const FIELD_DELIMITER: &str = "|";
const ROOT_GROUP: &str = ".";
const CONTENT_EXTENSION: &str = "html";

const RETRIEVAL_ADVICE: &str =
    "IMPORTANT: Prefer retrieval-led reasoning over pre-training-led reasoning for any Unity tasks.";
const RECOVERY_ADVICE: &str =
    "If docs missing, run `unity-docs-index sync` in the project root to download them";

/// Directory key to the file names directly inside it.
pub type GroupedIndex = BTreeMap<String, BTreeSet<String>>;

/// Every `.html` file under `section_root`, relative, `/`-separated and sorted.
/// A missing root yields an empty list.
pub fn discover_files(section_root: &Path) -> Vec<String> {
    if section_root.as_os_str().is_empty() || !section_root.is_dir() {
        return Vec::new();
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(section_root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, root = %section_root.display(), "Skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let is_content = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(CONTENT_EXTENSION));
        if !is_content {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(section_root) else {
            continue;
        };
        files.push(relative.to_string_lossy().replace('\\', "/"));
    }

    files.sort();
    debug!(root = %section_root.display(), count = files.len(), "Discovered documentation files");
    files
}

/// Splits each path at its last `/` into directory and file name. Files with no
/// directory land under `"."`.
pub fn group_by_directory<S: AsRef<str>>(files: &[S]) -> GroupedIndex {
    let mut grouped = GroupedIndex::new();
    for file in files {
        let file = file.as_ref();
        let (dir, name) = match file.rfind('/') {
            Some(at) => (&file[..at], &file[at + 1..]),
            None => (ROOT_GROUP, file),
        };
        grouped.entry(dir.to_string()).or_default().insert(name.to_string());
    }
    grouped
}

/// Renders the index body without markers.
///
/// `None` for `grouped` means nothing was discovered at all; an empty map still
/// renders the header lines.
pub fn build_index(
    grouped: Option<&GroupedIndex>,
    root_label: &str,
    version: Option<&str>,
) -> Result<String, IndexError> {
    let grouped = grouped.ok_or(IndexError::NoDocumentationFound)?;
    if root_label.is_empty() {
        return Err(IndexError::RootPathEmpty);
    }

    let mut parts = vec![INDEX_TITLE.to_string(), format!("root: {root_label}")];
    if let Some(version) = version.filter(|v| !v.is_empty()) {
        parts.push(format!("version: {version}"));
    }
    parts.push(RETRIEVAL_ADVICE.to_string());
    parts.push(RECOVERY_ADVICE.to_string());
    parts.push(format!(
        "{SCRIPT_REFERENCE_SECTION} (API docs) available at: {root_label}/{SCRIPT_REFERENCE_SECTION}/ (not indexed due to size)"
    ));

    for (dir, names) in grouped {
        if names.is_empty() {
            continue;
        }
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        parts.push(format!("{dir}:{{{}}}", names.join(",")));
    }

    Ok(parts.join(FIELD_DELIMITER))
}

pub fn wrap_with_markers(index: &str) -> String {
    format!("{START_MARKER}{index}{END_MARKER}")
}

/// Indexes whichever of the Manual and ScriptReference roots exist, keys each
/// group by its section and wraps the result in markers.
pub fn build_full_index(
    manual_root: Option<&Path>,
    script_reference_root: Option<&Path>,
    root_label: &str,
    version: Option<&str>,
) -> Result<String, IndexError> {
    if root_label.is_empty() {
        return Err(IndexError::RootPathEmpty);
    }

    let sections: Vec<(&str, &Path)> = [
        (MANUAL_SECTION, manual_root),
        (SCRIPT_REFERENCE_SECTION, script_reference_root),
    ]
    .into_iter()
    .filter_map(|(name, root)| root.filter(|r| r.is_dir()).map(|r| (name, r)))
    .collect();

    if sections.is_empty() {
        warn!("Neither Manual nor ScriptReference root exists");
        return Err(IndexError::NoDocumentationFound);
    }

    let mut merged = GroupedIndex::new();
    for (section, root) in sections {
        let files = discover_files(root);
        info!(section, files = files.len(), "Indexing documentation section");
        for (dir, names) in group_by_directory(&files) {
            let key = if dir == ROOT_GROUP {
                section.to_string()
            } else {
                format!("{section}/{dir}")
            };
            merged.entry(key).or_default().extend(names);
        }
    }

    let index = build_index(Some(&merged), root_label, version)?;
    Ok(wrap_with_markers(&index))
}
