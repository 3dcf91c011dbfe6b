//!
//! Command-line surface for unity-docs-index: argument parsing, settings merging,
//! Ctrl-C wiring and progress output. All pipeline logic lives in
//! `unity-docs-index-core`; this module only decides what to call and prints results.
//!
//! Precedence for every setting: command-line flag, then environment, then YAML file,
//! then built-in default.
use crate::load_config::{load_config, Settings};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use unity_docs_index_core::config::{load_descriptor, CdnDescriptor};
use unity_docs_index_core::contract::ProgressCallback;
use unity_docs_index_core::download::DefaultFetcher;
use unity_docs_index_core::index::build_full_index;
use unity_docs_index_core::layout::{section_path, MANUAL_SECTION};
use unity_docs_index_core::status::inspect;
use unity_docs_index_core::synchronise::{synchronise, SynchroniseConfig, SynchroniseOutcome};
use unity_docs_index_core::version::{normalize_version, resolve_url};

/// Exit status used when the user cancels a run.
const EXIT_CANCELLED: u8 = 130;

/// CLI for unity-docs-index: give coding agents a compact map of the Unity docs.
#[derive(Parser)]
#[clap(
    name = "unity-docs-index",
    version,
    about = "Download Unity documentation and inject a compact index of it into CLAUDE.md"
)]
pub struct Cli {
    /// Optional YAML settings file
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to a cdn_versions.json descriptor (built-in defaults otherwise)
    #[clap(long, global = true)]
    pub descriptor: Option<PathBuf>,

    /// Project root holding the documentation directory and the output file
    #[clap(long, global = true)]
    pub project_root: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch (or import) the documentation, build the index and inject it
    Sync {
        /// Unity version, e.g. 2022.3.15f1
        #[clap(long)]
        version: Option<String>,
        /// Base URL that replaces the official CDN
        #[clap(long)]
        cdn_url: Option<String>,
        /// Copy documentation from this local directory instead of downloading
        #[clap(long)]
        source: Option<PathBuf>,
        /// File that receives the index, relative to the project root
        #[clap(long)]
        output: Option<PathBuf>,
        /// Delete existing documentation and acquire it again
        #[clap(long)]
        force: bool,
    },
    /// Print the archive URL for a version
    Url {
        #[clap(long)]
        version: String,
        #[clap(long)]
        cdn_url: Option<String>,
    },
    /// List every version key the descriptor knows
    Versions,
    /// Print the index block for documentation already on disk
    Index {
        #[clap(long)]
        version: Option<String>,
    },
    /// Show whether documentation and index are present and current
    Status {
        #[clap(long)]
        version: Option<String>,
        #[clap(long)]
        output: Option<PathBuf>,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<ExitCode> {
    let mut settings = load_config(cli.config.as_deref())?;
    if let Some(root) = cli.project_root {
        settings.project_root = root;
    }
    if cli.descriptor.is_some() {
        settings.descriptor = cli.descriptor;
    }
    let descriptor = load_descriptor(settings.descriptor.as_deref());

    match cli.command {
        Commands::Sync {
            version,
            cdn_url,
            source,
            output,
            force,
        } => {
            let cdn_url = cdn_url.or(settings.cdn_url.clone());
            let config = SynchroniseConfig {
                project_root: settings.project_root.clone(),
                docs_dir: settings.docs_dir.clone(),
                output_file: output.unwrap_or_else(|| settings.output_file.clone()),
                version: version.or(settings.version.clone()).unwrap_or_default(),
                local_source: source,
                force,
            };
            run_sync(config, descriptor, cdn_url).await
        }
        Commands::Url { version, cdn_url } => {
            let cdn_url = cdn_url.or(settings.cdn_url);
            println!("{}", resolve_url(&descriptor, &version, cdn_url.as_deref()));
            Ok(ExitCode::SUCCESS)
        }
        Commands::Versions => {
            print_versions(&descriptor);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Index { version } => {
            let version = version.or(settings.version.clone());
            print_index(&settings, version.as_deref())
        }
        Commands::Status { version, output } => {
            let version = version.or(settings.version.clone());
            if let Some(output) = output {
                settings.output_file = output;
            }
            print_status(&settings, version.as_deref());
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn run_sync(
    config: SynchroniseConfig,
    descriptor: CdnDescriptor,
    cdn_url: Option<String>,
) -> Result<ExitCode> {
    tracing::info!(command = "sync", "Starting documentation index pipeline");
    let fetcher = DefaultFetcher::new(descriptor, cdn_url);

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling");
            on_ctrl_c.cancel();
        }
    });

    let result = synchronise(&config, &fetcher, progress_printer(), cancel).await;
    ctrl_c.abort();
    eprintln!();

    match result {
        Ok(SynchroniseOutcome::Completed(report)) => {
            tracing::info!(command = "sync", ?report, "Synchronisation complete");
            println!(
                "Index written to {} ({:?}, {} bytes).",
                report.output_path.display(),
                report.inject,
                report.index_len
            );
            Ok(ExitCode::SUCCESS)
        }
        Ok(SynchroniseOutcome::Cancelled) => {
            println!("Cancelled.");
            Ok(ExitCode::from(EXIT_CANCELLED))
        }
        Err(e) => {
            tracing::error!(command = "sync", error = %e, "Synchronisation failed");
            Err(anyhow::Error::from(e).context("sync failed"))
        }
    }
}

/// Renders whole-percent download progress on stderr, skipping repeats.
fn progress_printer() -> ProgressCallback {
    let last = Arc::new(AtomicU32::new(u32::MAX));
    Arc::new(move |fraction: f32| {
        let percent = (fraction.clamp(0.0, 1.0) * 100.0).round() as u32;
        if last.swap(percent, Ordering::Relaxed) != percent {
            let mut stderr = std::io::stderr();
            let _ = write!(stderr, "\rDownloading documentation... {percent:>3}%");
            let _ = stderr.flush();
        }
    })
}

fn print_versions(descriptor: &CdnDescriptor) {
    for version in &descriptor.cloudmedia {
        println!("{version}");
    }
    for version in &descriptor.google_storage_only {
        println!("{version} (fallback tier)");
    }
}

fn print_index(settings: &Settings, version: Option<&str>) -> Result<ExitCode> {
    let docs = settings.project_root.join(&settings.docs_dir);
    let manual = section_path(&docs, MANUAL_SECTION);
    let version = version.map(normalize_version);
    let index = build_full_index(
        manual.as_deref(),
        None,
        &format!("./{}", settings.docs_dir),
        version.as_deref().filter(|v| !v.is_empty()),
    )
    .with_context(|| format!("cannot index documentation at {}", docs.display()))?;
    println!("{index}");
    Ok(ExitCode::SUCCESS)
}

fn print_status(settings: &Settings, version: Option<&str>) {
    let docs = settings.project_root.join(&settings.docs_dir);
    let output = if settings.output_file.is_absolute() {
        settings.output_file.clone()
    } else {
        settings.project_root.join(&settings.output_file)
    };
    let status = inspect(&docs, &output, version);

    println!("documentation: {}", if status.docs_present { "present" } else { "missing" });
    println!("index: {}", if status.index_present { "present" } else { "missing" });
    println!(
        "indexed version: {}",
        status.indexed_version.as_deref().unwrap_or("unknown")
    );
    if status.needs_download() {
        println!("The index references documentation that is not on disk; run `unity-docs-index sync`.");
    } else if status.stale {
        println!("The index was built for another version; run `unity-docs-index sync --force`.");
    }
}
