//! Version keys and archive URL resolution.

use std::sync::OnceLock;

use regex::Regex;

use crate::config::CdnDescriptor;

pub const ARCHIVE_FILE_NAME: &str = "UnityDocumentation.zip";

fn version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\d+)\.(\d+)").expect("version pattern is valid"))
}

/// Reduces an editor version such as `2022.3.15f1` to its `major.minor` key.
///
/// Input without a leading `<digits>.<digits>` passes through unchanged.
pub fn normalize_version(input: &str) -> String {
    match version_pattern().captures(input) {
        Some(caps) => format!("{}.{}", &caps[1], &caps[2]),
        None => input.to_string(),
    }
}

/// Builds `<base>/<key>/UnityDocumentation.zip` for `version`.
///
/// A non-empty `override_base` wins, then the fast tier when it mirrors the
/// key, then the fallback tier.
pub fn resolve_url(descriptor: &CdnDescriptor, version: &str, override_base: Option<&str>) -> String {
    let key = normalize_version(version);
    let base = match override_base.map(str::trim).filter(|b| !b.is_empty()) {
        Some(custom) => custom,
        None if descriptor.is_fast_tier(&key) => descriptor.cloudmedia_base.as_str(),
        None => descriptor.google_storage_base.as_str(),
    };
    format!("{}/{}/{}", base.trim_end_matches('/'), key, ARCHIVE_FILE_NAME)
}
