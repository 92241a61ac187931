//! CLI tests: run the `shelf` binary against a temporary store.

mod common;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

use common::{pdf_with_pages, pdf_with_text, write_config};

fn shelf_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("shelf");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("library");
    fs::create_dir_all(&root).unwrap();

    fs::write(root.join("a.pdf"), pdf_with_text("The quick fox")).unwrap();
    fs::write(root.join("b.pdf"), pdf_with_text("A slow turtle")).unwrap();
    fs::write(
        root.join("book.pdf"),
        pdf_with_pages(Some("Field Guide"), &["owls at night", "herons by day"]),
    )
    .unwrap();
    fs::write(root.join("broken.pdf"), b"%PDF-1.7 garbage").unwrap();
    fs::write(root.join("readme.txt"), "not a pdf").unwrap();

    let config_path = write_config(tmp.path(), &root, "127.0.0.1:7340");
    (tmp, config_path)
}

fn run_shelf(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = shelf_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .current_dir(config_path.parent().unwrap())
        .output()
        .unwrap_or_else(|e| panic!("Failed to run shelf binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_list_shows_every_pdf() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_shelf(&config_path, &["list"]);
    assert!(success, "list failed: {}", stderr);
    for name in ["a.pdf", "b.pdf", "book.pdf", "broken.pdf"] {
        assert!(stdout.contains(name), "missing {} in:\n{}", name, stdout);
    }
    assert!(!stdout.contains("readme.txt"));
    assert!(stdout.contains("4 document(s)"));
}

#[test]
fn test_list_json() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_shelf(&config_path, &["--json", "list"]);
    assert!(success);
    let body: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(body["ok"], true);
    assert_eq!(body["documents"].as_array().unwrap().len(), 4);
}

#[test]
fn test_search() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_shelf(&config_path, &["search", "fox"]);
    assert!(success, "search failed: {}", stderr);
    assert!(stdout.contains("a.pdf"));
    assert!(!stdout.contains("b.pdf"));

    let (stdout, _, success) = run_shelf(&config_path, &["search", "zzz_no_match"]);
    assert!(success);
    assert!(stdout.contains("No results."));
}

#[test]
fn test_search_deterministic() {
    let (_tmp, config_path) = setup_test_env();

    let (first, _, _) = run_shelf(&config_path, &["--json", "search", "owls herons fox"]);
    let (second, _, _) = run_shelf(&config_path, &["--json", "search", "owls herons fox"]);
    assert_eq!(first, second);
}

#[test]
fn test_search_empty_query() {
    let (_tmp, config_path) = setup_test_env();

    let (_, stderr, success) = run_shelf(&config_path, &["search", "  "]);
    assert!(!success);
    assert!(stderr.contains("invalid query"), "stderr: {}", stderr);
}

#[test]
fn test_info() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_shelf(&config_path, &["info", "book.pdf"]);
    assert!(success, "info failed: {}", stderr);
    assert!(stdout.contains("Field Guide"));
    assert!(stdout.contains("pages:         2"));

    let (_, stderr, success) = run_shelf(&config_path, &["info", "missing.pdf"]);
    assert!(!success);
    assert!(stderr.contains("not found"));
}

#[test]
fn test_rebuild_reports_skipped_documents() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_shelf(&config_path, &["rebuild"]);
    assert!(success, "rebuild failed: {}", stderr);
    assert!(stdout.contains("documents: 4"));
    assert!(stdout.contains("indexed:   3"));
    assert!(stdout.contains("broken.pdf"));
}

#[test]
fn test_extract_and_convert() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_shelf(
        &config_path,
        &["extract", "book.pdf", "--from", "2", "--to", "2"],
    );
    assert!(success, "extract failed: {}", stderr);
    assert!(stdout.contains("book_p2-2.pdf"));
    assert!(tmp.path().join("library/book_p2-2.pdf").is_file());

    let (_, stderr, success) = run_shelf(
        &config_path,
        &["extract", "book.pdf", "--from", "3", "--to", "4"],
    );
    assert!(!success);
    assert!(stderr.contains("invalid page range"));

    let out = tmp.path().join("guide.epub");
    let (_, stderr, success) = run_shelf(
        &config_path,
        &["convert", "book.pdf", "--output", out.to_str().unwrap()],
    );
    assert!(success, "convert failed: {}", stderr);
    let bytes = fs::read(&out).unwrap();
    assert!(bytes.starts_with(b"PK"));
}

#[test]
fn test_missing_config_fails() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, success) = run_shelf(&tmp.path().join("nope.toml"), &["list"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"), "stderr: {}", stderr);
}
