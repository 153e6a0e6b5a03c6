// Exercises GitSynchronizer against a local upstream repository; requires `git` on PATH.

use repodocs_core::config::{RepositorySpec, SyncMode, SyncSettings};
use repodocs_core::contract::RepositorySync;
use repodocs_core::sync::{checkout_dir, GitSynchronizer, SyncError};
use serde_json::json;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

fn git(dir: &Path, args: &[&str]) {
    let status = Command::new("git")
        .args([
            "-c",
            "user.name=repodocs",
            "-c",
            "user.email=repodocs@example.com",
            "-c",
            "commit.gpgsign=false",
        ])
        .args(args)
        .current_dir(dir)
        .status()
        .expect("git runs");
    assert!(status.success(), "git {args:?} failed");
}

fn upstream_with(dir: &Path, file: &str, content: &str) {
    fs::create_dir_all(dir).unwrap();
    git(dir, &["init", "-q"]);
    git(dir, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    fs::write(dir.join(file), content).unwrap();
    git(dir, &["add", "."]);
    git(dir, &["commit", "-q", "-m", "initial"]);
}

fn spec(name: &str, url: &str) -> RepositorySpec {
    serde_json::from_value(json!({
        "name": name,
        "git_url": url,
        "display_name": name,
        "description": "",
        "docs_source": "scan_conventions",
    }))
    .unwrap()
}

fn settings(mode: SyncMode) -> SyncSettings {
    SyncSettings {
        mode,
        timeout_secs: Some(60),
        ..SyncSettings::default()
    }
}

#[tokio::test]
async fn clones_then_resets_local_changes() {
    let tmp = tempdir().unwrap();
    let upstream = tmp.path().join("upstream");
    upstream_with(&upstream, "README.md", "# Upstream\n");
    let url = format!("file://{}", upstream.display());
    let repo = spec("component", &url);
    let checkout = checkout_dir(&tmp.path().join(".repos"), &repo);

    let sync = GitSynchronizer::new(settings(SyncMode::Strict));
    sync.sync(&repo, &checkout).await.expect("clone succeeds");
    assert_eq!(fs::read_to_string(checkout.join("README.md")).unwrap(), "# Upstream\n");

    fs::write(checkout.join("README.md"), "local edit").unwrap();
    fs::write(upstream.join("NEW.md"), "new upstream file").unwrap();
    git(&upstream, &["add", "."]);
    git(&upstream, &["commit", "-q", "-m", "second"]);

    sync.sync(&repo, &checkout).await.expect("update succeeds");
    assert_eq!(fs::read_to_string(checkout.join("README.md")).unwrap(), "# Upstream\n");
    assert!(checkout.join("NEW.md").exists());
}

#[tokio::test]
async fn strict_mode_reports_failed_command() {
    let tmp = tempdir().unwrap();
    let missing = format!("file://{}", tmp.path().join("no-such-upstream").display());
    let repo = spec("ghost", &missing);
    let checkout = checkout_dir(&tmp.path().join(".repos"), &repo);

    let err = GitSynchronizer::new(settings(SyncMode::Strict))
        .sync(&repo, &checkout)
        .await
        .unwrap_err();
    match err {
        SyncError::CommandFailed { command, code, .. } => {
            assert!(command.starts_with("git clone --depth=1"));
            assert_ne!(code, 0);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn lenient_mode_tolerates_failures() {
    let tmp = tempdir().unwrap();
    let missing = format!("file://{}", tmp.path().join("no-such-upstream").display());
    let repo = spec("ghost", &missing);
    let checkout = checkout_dir(&tmp.path().join(".repos"), &repo);

    GitSynchronizer::new(settings(SyncMode::Lenient))
        .sync(&repo, &checkout)
        .await
        .expect("lenient sync never fails on git exit codes");
}
