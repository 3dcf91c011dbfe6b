//! # download: cancellable archive fetch, extraction and layout normalisation
//!
//! [`DefaultFetcher`] walks one invocation through
//! `Requesting -> Downloading -> Extracting -> Normalizing -> Done`.
//!
//! - The archive is streamed into a temporary file inside the destination while
//!   progress is reported per received chunk.
//! - The cancellation token is raced against every network await. A cancelled
//!   transfer drops the response and the temporary file, so nothing but the
//!   (possibly freshly created) destination directory remains.
//! - Extraction and normalisation run on a blocking worker. The temporary archive
//!   is removed when the worker finishes, whatever the extraction result.
//!
//! Transfer failures map to [`FetchError::NetworkFailure`], archive problems to
//! [`FetchError::ExtractionFailed`]. There is no retry; callers decide.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use futures::StreamExt;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::CdnDescriptor;
use crate::contract::{FetchError, FetchOutcome, Fetcher, ProgressCallback};
use crate::layout::normalize_layout;
use crate::version::{normalize_version, resolve_url};

const TEMP_ARCHIVE_PREFIX: &str = "temp-docs";

/// Fetches archives from the CDN tiers described by a [`CdnDescriptor`].
pub struct DefaultFetcher {
    descriptor: CdnDescriptor,
    override_base: Option<String>,
    client: reqwest::Client,
}

impl DefaultFetcher {
    pub fn new(descriptor: CdnDescriptor, override_base: Option<String>) -> Self {
        Self {
            descriptor,
            override_base: override_base.filter(|b| !b.trim().is_empty()),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn url_for(&self, version: &str) -> String {
        resolve_url(&self.descriptor, version, self.override_base.as_deref())
    }

    /// Streams `url` into a temp file under `dest`. `Ok(None)` means cancelled.
    async fn download_archive(
        &self,
        url: &str,
        dest: &Path,
        on_progress: &ProgressCallback,
        cancel: &CancellationToken,
    ) -> Result<Option<NamedTempFile>, FetchError> {
        let network = |reason: String| FetchError::NetworkFailure {
            url: url.to_string(),
            reason,
        };

        if cancel.is_cancelled() {
            info!(url = %url, "Download cancelled before request");
            return Ok(None);
        }

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!(url = %url, "Download cancelled while requesting");
                return Ok(None);
            }
            res = self.client.get(url).send() => res.map_err(|e| network(e.to_string()))?,
        };

        let status = response.status();
        if !status.is_success() {
            error!(status = %status, url = %url, "Documentation download returned error status");
            return Err(network(format!("HTTP status {status}")));
        }

        let total = response.content_length().filter(|len| *len > 0);
        let temp = tempfile::Builder::new()
            .prefix(TEMP_ARCHIVE_PREFIX)
            .suffix(".zip")
            .tempfile_in(dest)
            .map_err(|e| FetchError::Destination {
                path: dest.display().to_string(),
                source: e,
            })?;
        let writer = temp.reopen().map_err(|e| FetchError::Destination {
            path: temp.path().display().to_string(),
            source: e,
        })?;
        let mut writer = tokio::fs::File::from_std(writer);

        let mut stream = response.bytes_stream();
        let mut received: u64 = 0;
        let mut reported: f32 = 0.0;
        on_progress(reported);

        loop {
            let chunk = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(url = %url, received, "Download cancelled mid-transfer");
                    return Ok(None);
                }
                next = stream.next() => next,
            };
            let Some(chunk) = chunk else { break };
            let bytes = chunk.map_err(|e| network(e.to_string()))?;
            writer
                .write_all(&bytes)
                .await
                .map_err(|e| network(format!("could not write temporary archive: {e}")))?;
            received += bytes.len() as u64;

            if let Some(total) = total {
                let fraction = (received as f64 / total as f64).min(1.0) as f32;
                if fraction > reported {
                    reported = fraction;
                    on_progress(reported);
                }
            }
        }

        writer
            .flush()
            .await
            .map_err(|e| network(format!("could not flush temporary archive: {e}")))?;
        drop(writer);

        if cancel.is_cancelled() {
            info!(url = %url, "Download cancelled after transfer");
            return Ok(None);
        }

        on_progress(1.0);
        info!(url = %url, bytes = received, "Documentation archive downloaded");
        Ok(Some(temp))
    }
}

#[async_trait::async_trait]
impl Fetcher for DefaultFetcher {
    async fn fetch(
        &self,
        version: &str,
        dest: &Path,
        on_progress: ProgressCallback,
        cancel: CancellationToken,
    ) -> Result<FetchOutcome, FetchError> {
        let key = normalize_version(version.trim());
        if key.is_empty() {
            error!(version = %version, "Cannot fetch documentation for an empty version");
            return Err(FetchError::InvalidVersion(version.to_string()));
        }

        let url = self.url_for(&key);
        info!(version = %key, url = %url, dest = %dest.display(), "Downloading Unity documentation");

        fs::create_dir_all(dest).map_err(|e| FetchError::Destination {
            path: dest.display().to_string(),
            source: e,
        })?;

        let Some(archive) = self.download_archive(&url, dest, &on_progress, &cancel).await? else {
            return Ok(FetchOutcome::Cancelled);
        };

        info!(dest = %dest.display(), "Extracting documentation");
        let dest_owned = dest.to_path_buf();
        tokio::task::spawn_blocking(move || {
            let result = extract_archive(archive.path(), &dest_owned).and_then(|_| {
                normalize_layout(&dest_owned).map_err(|e| format!("layout normalisation failed: {e}"))
            });
            // Dropping the handle removes the temporary archive.
            drop(archive);
            result
        })
        .await
        .map_err(|e| FetchError::ExtractionFailed(format!("extraction worker failed: {e}")))?
        .map_err(|reason| {
            error!(reason = %reason, "Failed to extract documentation");
            FetchError::ExtractionFailed(reason)
        })?;

        info!(dest = %dest.display(), "Documentation extracted");
        Ok(FetchOutcome::Completed)
    }
}

/// Unpacks the zip at `archive` into `dest`, overwriting existing files.
/// Entries that would escape `dest` are skipped.
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<usize, String> {
    let file = fs::File::open(archive).map_err(|e| format!("cannot open archive: {e}"))?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| format!("not a zip archive: {e}"))?;

    let mut written = 0;
    for i in 0..zip.len() {
        let mut entry = zip
            .by_index(i)
            .map_err(|e| format!("corrupt archive entry {i}: {e}"))?;
        let Some(relative) = entry.enclosed_name() else {
            debug!(name = entry.name(), "Skipping archive entry outside destination");
            continue;
        };
        let target: PathBuf = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&target).map_err(|e| format!("{}: {e}", target.display()))?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| format!("{}: {e}", parent.display()))?;
        }
        let mut out = fs::File::create(&target).map_err(|e| format!("{}: {e}", target.display()))?;
        io::copy(&mut entry, &mut out).map_err(|e| format!("{}: {e}", target.display()))?;
        written += 1;
    }

    debug!(files = written, dest = %dest.display(), "Archive unpacked");
    Ok(written)
}
