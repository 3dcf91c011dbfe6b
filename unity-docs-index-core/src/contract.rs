//! # contract: outcome types and seams shared across the pipeline
//!
//! Every filesystem- or network-touching operation in this crate reports a closed
//! set of outcomes. Successful variants live in the `*Outcome` enums, failures in
//! the matching `*Error` enums. Nothing else crosses a component boundary: raw
//! `std::io::Error`s and transport errors are wrapped here before they leave.
//!
//! Cancellation is a voluntary stop, not a failure, so it is modelled as an
//! outcome ([`FetchOutcome::Cancelled`]) rather than an error variant.
//!
//! ## Mocking & Testing
//! - [`Fetcher`] is annotated for `mockall`; `MockFetcher` is exported under the
//!   `test-export-mocks` feature so pipeline tests never touch the network.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use mockall::automock;

/// Progress callback invoked with a fraction in `[0, 1]` that never decreases.
pub type ProgressCallback = Arc<dyn Fn(f32) + Send + Sync>;

/// Successful end states of a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Archive downloaded, extracted and normalised into the destination.
    Completed,
    /// Cancellation was observed before the transfer finished. Partial data was discarded.
    Cancelled,
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("version {0:?} does not normalise to a version key")]
    InvalidVersion(String),
    #[error("failed to create destination {path}: {source}")]
    Destination {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("network failure fetching {url}: {reason}")]
    NetworkFailure { url: String, reason: String },
    #[error("failed to extract documentation archive: {0}")]
    ExtractionFailed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("source path is empty")]
    SourcePathEmpty,
    #[error("source directory not found: {0}")]
    SourceNotFound(String),
    #[error("copy failed: {0}")]
    CopyFailed(#[source] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    #[error("no documentation found")]
    NoDocumentationFound,
    #[error("index root label is empty")]
    RootPathEmpty,
}

/// How [`crate::inject::inject`] changed the target file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectOutcome {
    Created,
    Updated,
    Appended,
}

#[derive(Debug, thiserror::Error)]
pub enum InjectError {
    #[error("target file path is empty")]
    FilePathEmpty,
    #[error("target file not found: {0}")]
    FileNotFound(String),
    #[error("failed to write target file: {0}")]
    WriteFailed(#[source] std::io::Error),
}

/// How [`crate::inject::ensure_ignore_entry`] changed the ignore-list file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreOutcome {
    Created,
    Updated,
    AlreadyPresent,
}

#[derive(Debug, thiserror::Error)]
pub enum IgnoreError {
    #[error("ignore-list path or entry is empty")]
    PathEmpty,
    #[error("failed to write ignore-list file: {0}")]
    WriteFailed(#[source] std::io::Error),
}

/// Acquires a documentation archive for a version and lays it out under `dest`.
///
/// Implemented by [`crate::download::DefaultFetcher`] and by mocks in tests.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the archive for `version` into `dest`, reporting progress and
    /// observing `cancel` at every suspension point of the transfer.
    async fn fetch(
        &self,
        version: &str,
        dest: &Path,
        on_progress: ProgressCallback,
        cancel: CancellationToken,
    ) -> Result<FetchOutcome, FetchError>;
}
