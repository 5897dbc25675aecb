//! End-to-end tests driving the `desk` binary.
//!
//! Each test builds an isolated library in a temp directory, writes a config
//! pointing at it, and runs the CLI. Spreadsheet fixtures are written through
//! the crate's own XLSX writer.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

use studydesk::sheet::{self, Table};

fn desk_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("desk");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let library = root.join("library");
    fs::create_dir_all(&library).unwrap();

    let config_content = format!(
        r#"[library]
root = "{}/library"

[server]
bind = "127.0.0.1:0"
"#,
        root.display()
    );

    let config_path = root.join("desk.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_desk(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = desk_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run desk binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn files_lists_library_contents() {
    let (tmp, config_path) = setup_test_env();
    fs::write(tmp.path().join("library/OS.pdf"), vec![0u8; 1024]).unwrap();
    fs::write(tmp.path().join("library/notes.txt"), b"hello").unwrap();

    let (stdout, stderr, success) = run_desk(&config_path, &["files"]);
    assert!(success, "files failed: {}", stderr);
    assert!(stdout.contains("OS.pdf (1.00 KB)"));
    assert!(stdout.contains("notes.txt"));
    assert!(stdout.contains("2 file(s)"));
}

#[test]
fn files_with_empty_library() {
    let (_tmp, config_path) = setup_test_env();
    let (stdout, _, success) = run_desk(&config_path, &["files"]);
    assert!(success);
    assert!(stdout.contains("No files are currently available"));
}

#[test]
fn books_reports_missing_textbooks_as_unloaded() {
    let (_tmp, config_path) = setup_test_env();
    let (stdout, _, success) = run_desk(&config_path, &["books"]);
    assert!(success);
    assert!(stdout.contains("Operating Systems"));
    assert!(stdout.contains("false"));
}

#[test]
fn ask_listing_answers_without_generation() {
    let (tmp, config_path) = setup_test_env();
    fs::write(tmp.path().join("library/OS.pdf"), vec![0u8; 1024]).unwrap();

    let (stdout, stderr, success) = run_desk(&config_path, &["ask", "list available files"]);
    assert!(success, "ask failed: {}", stderr);
    assert!(stdout.contains("OS.pdf (1.00 KB)"));
    assert!(stdout.contains("You can ask me to download any of these files."));
}

#[test]
fn ask_specific_file_prints_locator() {
    let (tmp, config_path) = setup_test_env();
    fs::write(tmp.path().join("library/OS.pdf"), vec![0u8; 1024]).unwrap();

    let (stdout, _, success) = run_desk(&config_path, &["ask", "please download os.pdf"]);
    assert!(success);
    assert!(stdout.contains("Here is the requested file: OS.pdf"));
    assert!(stdout.contains("download: /download/OS.pdf"));
}

#[test]
fn ask_registration_updates_assignment_sheet() {
    let (tmp, config_path) = setup_test_env();
    let sheet_path = tmp.path().join("library/assignment.xlsx");

    let mut table = Table::new(vec!["regno".to_string(), "submitted".to_string()]);
    table.rows.push(vec!["REG42".to_string(), String::new()]);
    sheet::write_table(&sheet_path, &table).unwrap();

    let (stdout, _, success) = run_desk(&config_path, &["ask", "my reg no is REG42"]);
    assert!(success);
    assert!(stdout.contains("Assignment submitted successfully!"));

    let reread = sheet::read_table(&sheet_path).unwrap();
    assert_eq!(reread.get(0, "submitted"), Some("true"));
}

#[test]
fn ask_registration_beats_file_request() {
    let (tmp, config_path) = setup_test_env();
    fs::write(tmp.path().join("library/OS.pdf"), vec![0u8; 1024]).unwrap();

    let mut table = Table::new(vec!["regno".to_string(), "submitted".to_string()]);
    table.rows.push(vec!["REG42".to_string(), String::new()]);
    sheet::write_table(&tmp.path().join("library/assignment.xlsx"), &table).unwrap();

    let (stdout, _, success) = run_desk(
        &config_path,
        &["ask", "reg no REG42, and also list files to download"],
    );
    assert!(success);
    assert!(stdout.contains("Assignment submitted successfully!"));
    assert!(!stdout.contains("Here are the files"));
}

#[test]
fn ask_unknown_registration_is_reported() {
    let (tmp, config_path) = setup_test_env();
    let mut table = Table::new(vec!["regno".to_string(), "submitted".to_string()]);
    table.rows.push(vec!["REG42".to_string(), String::new()]);
    sheet::write_table(&tmp.path().join("library/assignment.xlsx"), &table).unwrap();

    let (stdout, _, success) = run_desk(&config_path, &["ask", "register number: NOPE1"]);
    assert!(success);
    assert!(stdout.contains("Register number not found."));
}

#[test]
fn ask_sgpa_without_document_asks_for_upload() {
    let (_tmp, config_path) = setup_test_env();
    let (stdout, _, success) = run_desk(&config_path, &["ask", "what is my sgpa?"]);
    assert!(success);
    assert!(stdout.contains("Please upload your marksheet PDF first."));
}

#[test]
fn ask_generation_path_fails_cleanly_when_disabled() {
    let (_tmp, config_path) = setup_test_env();
    let (_, stderr, success) = run_desk(&config_path, &["ask", "explain deadlock"]);
    assert!(!success, "generation should fail with disabled provider");
    assert!(stderr.contains("disabled"), "got: {}", stderr);
}

#[test]
fn sgpa_command_rejects_invalid_pdf() {
    let (tmp, config_path) = setup_test_env();
    let pdf_path = tmp.path().join("bad.pdf");
    fs::write(&pdf_path, b"not a valid pdf").unwrap();

    let (_, stderr, success) = run_desk(&config_path, &["sgpa", pdf_path.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("PDF extraction failed"), "got: {}", stderr);
}

#[test]
fn sgpa_command_rejects_missing_file() {
    let (tmp, config_path) = setup_test_env();
    let pdf_path = tmp.path().join("absent.pdf");

    let (_, stderr, success) = run_desk(&config_path, &["sgpa", pdf_path.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("Failed to read"), "got: {}", stderr);
}

#[test]
fn missing_config_is_an_error() {
    let (tmp, _) = setup_test_env();
    let bogus = tmp.path().join("absent.toml");
    let binary = desk_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(bogus.to_str().unwrap())
        .arg("files")
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to read config file"));
}
