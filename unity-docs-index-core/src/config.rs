use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

pub const DEFAULT_CLOUDMEDIA_BASE: &str = "https://cloudmedia-docs.unity3d.com/docscloudstorage/en";
pub const DEFAULT_GOOGLE_STORAGE_BASE: &str = "https://storage.googleapis.com/docscloudstorage";

/// Version keys mirrored on the fast tier when no descriptor is available.
pub const DEFAULT_CLOUDMEDIA_VERSIONS: &[&str] = &[
    "6000.5", "6000.4", "6000.2", "6000.1", "6000.0", "2023.2", "2023.1", "2022.3", "2022.2",
    "2021.3", "2020.3",
];

/// Where documentation archives live, as described by `cdn_versions.json`.
///
/// Built once at startup and passed by reference to whatever resolves URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CdnDescriptor {
    /// Version keys available on the fast tier, in descriptor order.
    #[serde(default)]
    pub cloudmedia: Vec<String>,
    /// Version keys only on the fallback tier. Informational.
    #[serde(default)]
    pub google_storage_only: Vec<String>,
    #[serde(default = "default_cloudmedia_base")]
    pub cloudmedia_base: String,
    #[serde(default = "default_google_storage_base")]
    pub google_storage_base: String,
}

fn default_cloudmedia_base() -> String {
    DEFAULT_CLOUDMEDIA_BASE.to_string()
}

fn default_google_storage_base() -> String {
    DEFAULT_GOOGLE_STORAGE_BASE.to_string()
}

impl Default for CdnDescriptor {
    fn default() -> Self {
        Self {
            cloudmedia: DEFAULT_CLOUDMEDIA_VERSIONS
                .iter()
                .map(|v| v.to_string())
                .collect(),
            google_storage_only: Vec::new(),
            cloudmedia_base: default_cloudmedia_base(),
            google_storage_base: default_google_storage_base(),
        }
    }
}

impl CdnDescriptor {
    /// Every known version key: fast tier first, then fallback-only.
    pub fn all_versions(&self) -> Vec<&str> {
        self.cloudmedia
            .iter()
            .chain(self.google_storage_only.iter())
            .map(String::as_str)
            .collect()
    }

    pub fn is_fast_tier(&self, version_key: &str) -> bool {
        self.cloudmedia.iter().any(|v| v == version_key)
    }

    pub fn trace_loaded(&self) {
        info!(
            fast_tier = self.cloudmedia.len(),
            fallback_only = self.google_storage_only.len(),
            cloudmedia_base = %self.cloudmedia_base,
            google_storage_base = %self.google_storage_base,
            "Loaded CDN descriptor"
        );
        debug!(?self, "CDN descriptor loaded (full debug)");
    }
}

pub fn parse_descriptor(json: &str) -> Result<CdnDescriptor, serde_json::Error> {
    serde_json::from_str(json)
}

/// Loads the descriptor at `path`, substituting the built-in defaults when the
/// file is absent, unreadable or malformed. Never fails.
pub fn load_descriptor(path: Option<&Path>) -> CdnDescriptor {
    let Some(path) = path else {
        warn!("No cdn_versions.json configured, using built-in defaults");
        return CdnDescriptor::default();
    };

    let json = match std::fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, path = %path.display(), "cdn_versions.json not readable, using built-in defaults");
            return CdnDescriptor::default();
        }
    };

    match parse_descriptor(&json) {
        Ok(descriptor) => {
            descriptor.trace_loaded();
            descriptor
        }
        Err(e) => {
            warn!(error = %e, path = %path.display(), "Failed to parse cdn_versions.json, using built-in defaults");
            CdnDescriptor::default()
        }
    }
}
