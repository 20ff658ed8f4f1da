//! Integration tests for the `styx-explorer` binary.
//!
//! These run the `get`, `export` and `import` subcommands against file-backed
//! stores in temporary directories. `serve` is covered by the routing tests in
//! `server.rs`, which need no socket.

// `Command::cargo_bin` was deprecated in assert_cmd 2.1.2 in favor of
// `cargo::cargo_bin_cmd!`. Allow it until we migrate.
#![allow(deprecated)]

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Helper: a command running in `dir`, isolated from the caller's `STYX_*` variables.
fn explorer(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("styx-explorer").unwrap();
    cmd.current_dir(dir)
        .env_remove("STYX_SERVER_PORT")
        .env_remove("STYX_DATASTORE_URL")
        .env_remove("STYX_WORKER_THREADS")
        .env("RUST_LOG", "warn");
    cmd
}

/// Helper: a temp dir holding `store.styx` with the given contents.
fn store_with(contents: &str) -> (TempDir, String) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.styx");
    fs::write(&path, contents).unwrap();
    let url = format!("file:{}", path.display());
    (dir, url)
}

// ─────────────────────────────────────────────────────────────────────────────
// Get subcommand
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn get_browse_lists_children() {
    let (dir, url) = store_with("{a:1,b:{c:2}}");
    explorer(dir.path())
        .args(["--datastore-url", &url, "get", "/", "--mode", "browse"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"self_text\": \"</>\""))
        .stdout(predicate::str::contains("\"key_text\": \"a\""))
        .stdout(predicate::str::contains("\"kind\": \"nested\""))
        .stdout(predicate::str::contains("\"child_ref\": \"/b\""));
}

#[test]
fn get_browse_initializes_missing_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fresh.styx");
    let url = format!("file:{}", path.display());

    explorer(dir.path())
        .args(["--datastore-url", &url, "get", "/", "--mode", "browse"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"entries\": []"));

    assert_eq!(fs::read_to_string(&path).unwrap().trim(), "{}");
}

#[test]
fn get_content_prints_indented_value() {
    let (dir, url) = store_with("{a:1,b:{c:2}}");
    explorer(dir.path())
        .args(["--datastore-url", &url, "get", "/b", "--mode", "content"])
        .assert()
        .success()
        .stdout("{\n    c: 2\n}\n");
}

#[test]
fn get_view_is_the_default_mode() {
    let (dir, url) = store_with("{a:\"hello world\"}");
    explorer(dir.path())
        .args(["--datastore-url", &url, "get", "/a"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"parent_ref\": \"/\""))
        .stdout(predicate::str::contains("hello world"));
}

#[test]
fn get_missing_path_fails() {
    let (dir, url) = store_with("{a:1}");
    explorer(dir.path())
        .args(["--datastore-url", &url, "get", "/nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found: </nope>"));
}

#[test]
fn get_reads_datastore_url_from_properties_file() {
    let (dir, url) = store_with("{from:file}");
    fs::write(
        dir.path().join("styx.toml"),
        format!("datastore-url = \"{}\"\n", url.replace('\\', "\\\\")),
    )
    .unwrap();
    explorer(dir.path())
        .args(["get", "/from", "--mode", "content"])
        .assert()
        .success()
        .stdout("file\n");
}

#[test]
fn get_rejects_unsupported_store() {
    let dir = tempfile::tempdir().unwrap();
    explorer(dir.path())
        .args(["--datastore-url", "lmdb:/tmp/x", "get", "/"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("lmdb:/tmp/x"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Export / import subcommands
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn export_writes_indented_tree() {
    let (dir, url) = store_with("{a:1,b:{c:2}}");
    let out = dir.path().join("dump.styx");

    explorer(dir.path())
        .args(["export", &url])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 3 entries"));

    assert_eq!(
        fs::read_to_string(&out).unwrap(),
        "{\n    a: 1,\n    b: {\n        c: 2\n    }\n}\n"
    );
}

#[test]
fn import_then_export_keeps_the_tree() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("source.styx");
    fs::write(&source, "{users:{alice:{age:30}},\"odd key\":\"x y\"}").unwrap();
    let url = format!("file:{}", dir.path().join("store.styx").display());
    let out = dir.path().join("dump.styx");

    explorer(dir.path())
        .args(["import", &url])
        .arg(&source)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 4 entries"));

    explorer(dir.path())
        .args(["export", &url])
        .arg(&out)
        .assert()
        .success();

    let dumped = fs::read_to_string(&out).unwrap();
    assert!(dumped.contains("\"odd key\": \"x y\""));
    assert!(dumped.contains("alice: {"));
}

#[test]
fn import_invalid_text_leaves_store_alone() {
    let (dir, url) = store_with("{a:1}");
    let source = dir.path().join("bad.styx");
    fs::write(&source, "{a:").unwrap();

    explorer(dir.path())
        .args(["import", &url])
        .arg(&source)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to import"));

    assert_eq!(
        fs::read_to_string(dir.path().join("store.styx")).unwrap(),
        "{a:1}"
    );
}

#[test]
fn help_lists_subcommands() {
    let dir = tempfile::tempdir().unwrap();
    explorer(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("export"))
        .stdout(predicate::str::contains("import"));
}
