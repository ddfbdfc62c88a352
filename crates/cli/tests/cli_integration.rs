//! CLI integration tests for the `publishing` binary.
//!
//! Uses `assert_cmd` to spawn the binary and verify exit codes, stdout
//! content, and stderr content. Every test runs in a scratch directory so a
//! stray `.env` cannot leak configuration in.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper: create a Command for the `publishing` binary, rooted at `dir`.
fn publishing(dir: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("publishing");
    cmd.current_dir(dir.path());
    for var in [
        "URL_SIGNING_SECRET",
        "DATABASE_URL",
        "EMAIL_RELAY_URL",
        "PUBLISHING_API_KEY",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

// ──────────────────────────────────────────────
// Help and version
// ──────────────────────────────────────────────

#[test]
fn help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    publishing(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("render-template"));
}

#[test]
fn version_prints_package_version() {
    let dir = TempDir::new().unwrap();
    publishing(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn serve_help_documents_backends() {
    let dir = TempDir::new().unwrap();
    publishing(&dir)
        .args(["serve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--document-store"))
        .stdout(predicate::str::contains("--relational-store"))
        .stdout(predicate::str::contains("--email-transport"));
}

// ──────────────────────────────────────────────
// Configuration errors
// ──────────────────────────────────────────────

#[test]
fn serve_without_signing_secret_exits_2() {
    let dir = TempDir::new().unwrap();
    publishing(&dir)
        .args([
            "serve",
            "--document-store",
            "memory",
            "--relational-store",
            "memory",
            "--email-transport",
            "log",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("URL_SIGNING_SECRET"));
}

#[test]
fn serve_with_relay_transport_requires_relay_url() {
    let dir = TempDir::new().unwrap();
    publishing(&dir)
        .args([
            "serve",
            "--document-store",
            "memory",
            "--relational-store",
            "memory",
            "--url-signing-secret",
            "s3cr3t",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("EMAIL_RELAY_URL"));
}

#[test]
fn unknown_backend_is_a_usage_error() {
    let dir = TempDir::new().unwrap();
    publishing(&dir)
        .args(["serve", "--document-store", "dynamo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("dynamo"));
}

// ──────────────────────────────────────────────
// render-template
// ──────────────────────────────────────────────

#[test]
fn render_template_substitutes_attributes() {
    let dir = TempDir::new().unwrap();
    let template = dir.path().join("submitted.html");
    fs::write(
        &template,
        "<a href=\"https://${AppURL}/${WorkspaceNodeId}/proposals\">${ProposalName}</a>",
    )
    .unwrap();

    publishing(&dir)
        .arg("render-template")
        .arg(&template)
        .args([
            "--attr",
            "AppURL=app.example.org",
            "--attr",
            "WorkspaceNodeId=N:organization:repo",
            "--attr",
            "ProposalName=Study A",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "<a href=\"https://app.example.org/N:organization:repo/proposals\">Study A</a>",
        ));
}

#[test]
fn render_template_leaves_unknown_placeholders() {
    let dir = TempDir::new().unwrap();
    let template = dir.path().join("accepted.html");
    fs::write(&template, "Hello ${OwnerName}, see ${Unset}").unwrap();

    publishing(&dir)
        .arg("render-template")
        .arg(&template)
        .args(["--attr", "OwnerName=Ada"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Hello Ada, see ${Unset}"));
}

#[test]
fn render_template_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    publishing(&dir)
        .args(["render-template", "nope.html"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read template"));
}

#[test]
fn render_template_rejects_malformed_attribute() {
    let dir = TempDir::new().unwrap();
    publishing(&dir)
        .args(["render-template", "t.html", "--attr", "novalue"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected KEY=VALUE"));
}
