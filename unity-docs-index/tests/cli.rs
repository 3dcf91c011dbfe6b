use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn page(root: &Path, relative: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, "<html></html>").unwrap();
}

fn bin() -> Command {
    let mut cmd = Command::cargo_bin("unity-docs-index").expect("Binary exists");
    cmd.env_remove("UNITY_DOCS_VERSION")
        .env_remove("UNITY_DOCS_CDN_URL")
        .env("RUST_LOG", "off");
    cmd
}

#[test]
fn url_prints_override_archive_location() {
    bin()
        .args(["url", "--version", "2022.3.1f1", "--cdn-url", "https://custom/"])
        .assert()
        .success()
        .stdout(predicate::str::diff("https://custom/2022.3/UnityDocumentation.zip\n"));
}

#[test]
fn url_uses_fallback_tier_for_unknown_versions() {
    bin()
        .args(["url", "--version", "1999.9"])
        .assert()
        .success()
        .stdout(predicate::str::contains("storage.googleapis.com"))
        .stdout(predicate::str::contains("/1999.9/UnityDocumentation.zip"));
}

#[test]
fn versions_lists_descriptor_tiers() {
    let tmp = tempdir().unwrap();
    let descriptor = tmp.path().join("cdn_versions.json");
    fs::write(
        &descriptor,
        r#"{"cloudmedia": ["2022.3"], "google_storage_only": ["2019.4"]}"#,
    )
    .unwrap();

    bin()
        .arg("versions")
        .assert()
        .success()
        .stdout(predicate::str::contains("6000.0\n"));

    bin()
        .arg("versions")
        .arg("--descriptor")
        .arg(&descriptor)
        .assert()
        .success()
        .stdout(predicate::str::diff("2022.3\n2019.4 (fallback tier)\n"));
}

#[test]
fn sync_from_local_source_writes_index_and_ignore_entry() {
    let tmp = tempdir().unwrap();
    let source = tmp.path().join("downloaded");
    page(&source, "Manual/index.html");
    page(&source, "Manual/Animation/Clips.html");
    let project = tmp.path().join("project");
    fs::create_dir_all(&project).unwrap();

    bin()
        .arg("sync")
        .arg("--project-root")
        .arg(&project)
        .arg("--source")
        .arg(&source)
        .assert()
        .success()
        .stdout(predicate::str::contains("Index written to"));

    let claude = fs::read_to_string(project.join("CLAUDE.md")).unwrap();
    assert!(claude.contains("<!-- UNITY-DOCS-INDEX-START -->"));
    assert!(claude.contains("Manual/Animation:{Clips.html}"));
    assert_eq!(
        fs::read_to_string(project.join(".gitignore")).unwrap(),
        ".unity-docs\n"
    );

    bin()
        .arg("status")
        .arg("--project-root")
        .arg(&project)
        .assert()
        .success()
        .stdout(predicate::str::contains("documentation: present"))
        .stdout(predicate::str::contains("index: present"));
}

#[test]
fn sync_without_version_or_docs_fails() {
    let tmp = tempdir().unwrap();

    bin()
        .arg("sync")
        .arg("--project-root")
        .arg(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("sync failed"));
    assert!(!tmp.path().join("CLAUDE.md").exists());
}

#[test]
fn index_prints_block_for_existing_docs() {
    let tmp = tempdir().unwrap();
    page(&tmp.path().join(".unity-docs"), "Manual/Physics/Rigidbody.html");

    bin()
        .args(["index", "--version", "6000.0.23f1", "--project-root"])
        .arg(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "[Unity Docs Index]|root: ./.unity-docs|version: 6000.0|",
        ))
        .stdout(predicate::str::contains("Manual/Physics:{Rigidbody.html}"));
}

#[test]
fn index_fails_when_docs_missing() {
    let tmp = tempdir().unwrap();

    bin()
        .args(["index", "--project-root"])
        .arg(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot index documentation"));
}

#[test]
fn status_reports_missing_docs() {
    let tmp = tempdir().unwrap();

    bin()
        .args(["status", "--project-root"])
        .arg(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("documentation: missing"))
        .stdout(predicate::str::contains("index: missing"));
}

use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{layer::Context, Layer, Registry};

/// Collects the formatted message of every emitted event.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        struct Visitor<'a>(&'a mut String);
        impl tracing::field::Visit for Visitor<'_> {
            fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
                if field.name() == "message" {
                    self.0.push_str(&format!("{value:?}"));
                }
            }
        }
        let mut message = String::new();
        event.record(&mut Visitor(&mut message));
        self.events.lock().unwrap().push(message);
    }
}

#[tokio::test]
#[serial_test::serial]
async fn run_emits_pipeline_events() {
    use clap::Parser;
    use unity_docs_index::{run, Cli};

    let events = Arc::new(Mutex::new(Vec::new()));
    let subscriber = Registry::default().with(EventCollector {
        events: Arc::clone(&events),
    });
    let _guard = tracing::subscriber::set_default(subscriber);

    let tmp = tempdir().unwrap();
    page(&tmp.path().join(".unity-docs"), "Manual/index.html");

    let cli = Cli::parse_from([
        "unity-docs-index",
        "sync",
        "--project-root",
        tmp.path().to_str().unwrap(),
    ]);
    let code = run(cli).await.expect("sync succeeds on existing docs");
    assert_eq!(
        format!("{code:?}"),
        format!("{:?}", std::process::ExitCode::SUCCESS)
    );

    let events = events.lock().unwrap();
    assert!(
        events.iter().any(|e| e.contains("Starting documentation index pipeline")),
        "events: {events:?}"
    );
    assert!(events.iter().any(|e| e.contains("Synchronisation complete")));
}
