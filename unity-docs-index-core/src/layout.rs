//! Documentation root layout: the canonical shape an extracted or imported tree
//! must end up in, and the one nested-folder convention that gets flattened into it.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

pub const MANUAL_SECTION: &str = "Manual";
pub const SCRIPT_REFERENCE_SECTION: &str = "ScriptReference";

/// What [`normalize_layout`] found and did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutChange {
    /// `Documentation/en/*` was moved to the root.
    FlattenedDocumentationEn,
    /// `en/*` was moved to the root.
    FlattenedEn,
    AlreadyCanonical,
}

/// True when `docs_root` holds a Manual or ScriptReference section.
pub fn docs_exist(docs_root: &Path) -> bool {
    if docs_root.as_os_str().is_empty() {
        return false;
    }
    docs_root.join(MANUAL_SECTION).is_dir() || docs_root.join(SCRIPT_REFERENCE_SECTION).is_dir()
}

/// Path of `section` under `docs_root`, if that directory exists.
pub fn section_path(docs_root: &Path, section: &str) -> Option<PathBuf> {
    if docs_root.as_os_str().is_empty() || section.is_empty() {
        return None;
    }
    let path = docs_root.join(section);
    path.is_dir().then_some(path)
}

/// Hoists the contents of `Documentation/en` (or else `en`) into `dest` and
/// removes the emptied wrapper. Running it on a canonical tree is a no-op.
pub fn normalize_layout(dest: &Path) -> io::Result<LayoutChange> {
    let documentation = dest.join("Documentation");
    let documentation_en = documentation.join("en");
    if documentation_en.is_dir() {
        move_directory_contents(&documentation_en, dest)?;
        fs::remove_dir_all(&documentation)?;
        info!(path = %dest.display(), "Moved contents up from Documentation/en");
        return Ok(LayoutChange::FlattenedDocumentationEn);
    }

    let en = dest.join("en");
    if en.is_dir() {
        move_directory_contents(&en, dest)?;
        fs::remove_dir_all(&en)?;
        info!(path = %dest.display(), "Moved contents up from en");
        return Ok(LayoutChange::FlattenedEn);
    }

    debug!(path = %dest.display(), "Extracted layout already canonical");
    Ok(LayoutChange::AlreadyCanonical)
}

/// Moves every child of `source` into `dest`, replacing whatever has the same name.
fn move_directory_contents(source: &Path, dest: &Path) -> io::Result<()> {
    for entry in fs::read_dir(source)? {
        let entry = entry?;
        let target = dest.join(entry.file_name());
        if target.is_dir() {
            fs::remove_dir_all(&target)?;
        } else if target.exists() {
            fs::remove_file(&target)?;
        }
        fs::rename(entry.path(), &target)?;
    }
    Ok(())
}
