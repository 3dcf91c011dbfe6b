//! High-level pipeline: acquire documentation → build the index → inject it.
//!
//! [`synchronise`] is the single entrypoint used by the CLI and by integration tests.
//! One call runs strictly in order:
//!   - Acquires the documentation root when it has no Manual/ScriptReference section,
//!     either from a local directory or through a [`Fetcher`]
//!   - Builds the Manual index on a blocking worker so the caller's runtime stays free
//!   - Injects the index block into the output file
//!   - Ensures the documentation directory is git-ignored (never fatal)
//!
//! # Cancellation
//! The token is honoured at every suspension point of the fetch. Once the index
//! worker is running it completes regardless; a cancellation requested in the
//! meantime discards its output and the call reports [`SynchroniseOutcome::Cancelled`].
//!
//! # Concurrency
//! At most one run per documentation root may be in flight within a process.
//! A second concurrent call for the same root fails with
//! [`SynchroniseError::AlreadyRunning`].

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::contract::{
    FetchError, FetchOutcome, Fetcher, IgnoreOutcome, ImportError, IndexError, InjectError,
    InjectOutcome, ProgressCallback,
};
use crate::import::import_from;
use crate::index::build_full_index;
use crate::inject::{ensure_ignore_entry, inject};
use crate::layout::{docs_exist, section_path, MANUAL_SECTION};
use crate::version::normalize_version;

pub const DEFAULT_DOCS_DIR: &str = ".unity-docs";
pub const DEFAULT_OUTPUT_FILE: &str = "CLAUDE.md";
pub const IGNORE_FILE: &str = ".gitignore";

/// Inputs for one pipeline run.
#[derive(Debug, Clone)]
pub struct SynchroniseConfig {
    pub project_root: PathBuf,
    /// Documentation directory name, relative to `project_root`.
    pub docs_dir: String,
    /// Target notes file; relative paths are resolved against `project_root`.
    pub output_file: PathBuf,
    pub version: String,
    /// Copy documentation from here instead of downloading it.
    pub local_source: Option<PathBuf>,
    /// Delete any existing documentation root before acquiring it again.
    pub force: bool,
}

impl SynchroniseConfig {
    pub fn new(project_root: impl Into<PathBuf>, version: impl Into<String>) -> Self {
        Self {
            project_root: project_root.into(),
            docs_dir: DEFAULT_DOCS_DIR.to_string(),
            output_file: PathBuf::from(DEFAULT_OUTPUT_FILE),
            version: version.into(),
            local_source: None,
            force: false,
        }
    }

    pub fn docs_path(&self) -> PathBuf {
        self.project_root.join(&self.docs_dir)
    }

    pub fn output_path(&self) -> PathBuf {
        if self.output_file.is_absolute() {
            self.output_file.clone()
        } else {
            self.project_root.join(&self.output_file)
        }
    }

    /// Key under which a run is registered as in flight. Spellings of the same
    /// project root (relative, absolute, with `..`) map to one key.
    fn in_flight_key(&self) -> PathBuf {
        std::fs::canonicalize(&self.project_root)
            .map(|root| root.join(&self.docs_dir))
            .unwrap_or_else(|_| self.docs_path())
    }

    /// Root label written into the index, e.g. `./.unity-docs`.
    pub fn root_label(&self) -> String {
        format!("./{}", self.docs_dir)
    }
}

/// How the documentation root came to be populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquisition {
    AlreadyPresent,
    Downloaded,
    Imported,
}

#[derive(Debug)]
pub struct SynchroniseReport {
    pub docs_path: PathBuf,
    pub output_path: PathBuf,
    pub acquisition: Acquisition,
    pub inject: InjectOutcome,
    /// `None` when the ignore-list update failed; the failure is only logged.
    pub ignore: Option<IgnoreOutcome>,
    pub index_len: usize,
}

#[derive(Debug)]
pub enum SynchroniseOutcome {
    Completed(SynchroniseReport),
    Cancelled,
}

#[derive(Debug, thiserror::Error)]
pub enum SynchroniseError {
    #[error("a pipeline run for {0} is already in progress")]
    AlreadyRunning(String),
    #[error("failed to remove existing documentation at {path}: {source}")]
    Reset {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error(transparent)]
    Inject(#[from] InjectError),
    #[error("index worker failed: {0}")]
    Worker(String),
}

fn in_flight() -> &'static Mutex<HashSet<PathBuf>> {
    static IN_FLIGHT: OnceLock<Mutex<HashSet<PathBuf>>> = OnceLock::new();
    IN_FLIGHT.get_or_init(|| Mutex::new(HashSet::new()))
}

/// Marks a documentation root busy for the lifetime of the guard.
struct InFlightGuard {
    target: PathBuf,
}

impl InFlightGuard {
    fn acquire(target: &Path) -> Option<Self> {
        let mut running = in_flight().lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        running
            .insert(target.to_path_buf())
            .then(|| Self {
                target: target.to_path_buf(),
            })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut running = in_flight().lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        running.remove(&self.target);
    }
}

pub async fn synchronise<F>(
    config: &SynchroniseConfig,
    fetcher: &F,
    on_progress: ProgressCallback,
    cancel: CancellationToken,
) -> Result<SynchroniseOutcome, SynchroniseError>
where
    F: Fetcher + ?Sized,
{
    let docs_path = config.docs_path();
    let output_path = config.output_path();
    info!(docs = %docs_path.display(), output = %output_path.display(), "[SYNC] Starting documentation index pipeline");

    let Some(_guard) = InFlightGuard::acquire(&config.in_flight_key()) else {
        error!(docs = %docs_path.display(), "[SYNC][ERROR] Pipeline already running for this target");
        return Err(SynchroniseError::AlreadyRunning(docs_path.display().to_string()));
    };

    if config.force && docs_path.exists() {
        std::fs::remove_dir_all(&docs_path).map_err(|e| SynchroniseError::Reset {
            path: docs_path.display().to_string(),
            source: e,
        })?;
        info!(docs = %docs_path.display(), "[SYNC] Removed existing documentation for re-download");
    }

    // --- Step 1: Acquire ---
    let acquisition = if docs_exist(&docs_path) {
        info!(docs = %docs_path.display(), "[SYNC] Documentation already present");
        Acquisition::AlreadyPresent
    } else if let Some(source) = &config.local_source {
        let source = source.clone();
        let dest = docs_path.clone();
        tokio::task::spawn_blocking(move || import_from(&source, &dest))
            .await
            .map_err(|e| SynchroniseError::Worker(e.to_string()))??;
        info!("[SYNC] Imported documentation from local source");
        Acquisition::Imported
    } else {
        match fetcher
            .fetch(&config.version, &docs_path, on_progress, cancel.clone())
            .await
        {
            Ok(FetchOutcome::Completed) => {
                info!("[SYNC] Download succeeded");
                Acquisition::Downloaded
            }
            Ok(FetchOutcome::Cancelled) => {
                info!("[SYNC] Download cancelled");
                return Ok(SynchroniseOutcome::Cancelled);
            }
            Err(e) => {
                error!(error = %e, "[SYNC][ERROR] Download failed");
                return Err(e.into());
            }
        }
    };

    if cancel.is_cancelled() {
        info!("[SYNC] Cancelled before indexing");
        return Ok(SynchroniseOutcome::Cancelled);
    }

    // --- Step 2: Build the index (Manual only, ScriptReference is too large) ---
    let Some(manual) = section_path(&docs_path, MANUAL_SECTION) else {
        error!(docs = %docs_path.display(), "[SYNC][ERROR] No Manual section in documentation root");
        return Err(IndexError::NoDocumentationFound.into());
    };
    let root_label = config.root_label();
    let version = normalize_version(config.version.trim());
    info!(manual = %manual.display(), "[SYNC] Building index");
    let index = tokio::task::spawn_blocking(move || {
        let version = Some(version.as_str()).filter(|v| !v.is_empty());
        build_full_index(Some(&manual), None, &root_label, version)
    })
    .await
    .map_err(|e| SynchroniseError::Worker(e.to_string()))??;

    if cancel.is_cancelled() {
        info!("[SYNC] Cancelled while indexing, discarding index");
        return Ok(SynchroniseOutcome::Cancelled);
    }

    // --- Step 3: Inject ---
    let inject_outcome = inject(&output_path, &index, true)?;
    info!(outcome = ?inject_outcome, output = %output_path.display(), "[SYNC] Index injected");

    // --- Step 4: Ignore-list (secondary) ---
    let ignore_path = config.project_root.join(IGNORE_FILE);
    let ignore = match ensure_ignore_entry(&ignore_path, &config.docs_dir) {
        Ok(outcome) => Some(outcome),
        Err(e) => {
            warn!(error = %e, path = %ignore_path.display(), "[SYNC] Could not update ignore-list");
            None
        }
    };

    Ok(SynchroniseOutcome::Completed(SynchroniseReport {
        docs_path,
        output_path,
        acquisition,
        inject: inject_outcome,
        ignore,
        index_len: index.len(),
    }))
}
