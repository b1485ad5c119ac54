use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

const UNSET_KEY_VAR: &str = "DOCQA_INTEGRATION_KEY_THAT_IS_NEVER_SET";

fn docqa_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("docqa");
    path
}

fn docx_with_paragraphs(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
        .collect();
    let xml = format!(
        "<?xml version=\"1.0\"?><w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"><w:body>{}</w:body></w:document>",
        body
    );

    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
        zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap();
    }
    buf
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let files_dir = root.join("files");
    fs::create_dir_all(&files_dir).unwrap();
    fs::write(
        files_dir.join("minutes.docx"),
        docx_with_paragraphs(&["Board meeting minutes", "The budget was approved."]),
    )
    .unwrap();
    fs::write(files_dir.join("notes.xyz"), "not a supported format").unwrap();

    // The LLM endpoint is unreachable and its key is unset, so `ask` never
    // leaves the machine.
    let config_content = format!(
        r#"[db]
path = "{}/data/docqa.sqlite"

[llm]
provider = "openai"
base_url = "http://127.0.0.1:9"
api_key_env = "{}"

[speech]
provider = "disabled"

[server]
bind = "127.0.0.1:7341"
"#,
        root.display(),
        UNSET_KEY_VAR
    );

    let config_path = config_dir.join("docqa.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_docqa(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = docqa_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove(UNSET_KEY_VAR)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run docqa binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn files_dir(config_path: &Path) -> PathBuf {
    config_path.parent().unwrap().parent().unwrap().join("files")
}

#[test]
fn test_init_creates_database() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_docqa(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Database initialized successfully."));
    assert!(tmp.path().join("data").join("docqa.sqlite").exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_docqa(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_docqa(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_upload_stores_supported_and_skips_unsupported() {
    let (_tmp, config_path) = setup_test_env();
    let files = files_dir(&config_path);

    run_docqa(&config_path, &["init"]);
    let (stdout, stderr, success) =
        run_docqa(&config_path, &["upload", files.to_str().unwrap()]);
    assert!(success, "upload failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("stored:  minutes.docx (id 1)"));
    assert!(stdout.contains("skipped: notes.xyz (unsupported file type)"));
    assert!(stdout.contains("processed: 2 files"));
    assert!(stdout.contains("ok"));
}

#[test]
fn test_upload_include_filter() {
    let (_tmp, config_path) = setup_test_env();
    let files = files_dir(&config_path);

    let (stdout, _, success) = run_docqa(
        &config_path,
        &["upload", files.to_str().unwrap(), "--include", "**/*.docx"],
    );
    assert!(success);
    assert!(stdout.contains("processed: 1 files"));
    assert!(!stdout.contains("notes.xyz"));
}

#[test]
fn test_upload_missing_path_fails() {
    let (tmp, config_path) = setup_test_env();
    let missing = tmp.path().join("nope");

    let (_, stderr, success) = run_docqa(&config_path, &["upload", missing.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("No such file or directory"));
}

#[test]
fn test_list_and_show() {
    let (_tmp, config_path) = setup_test_env();
    let docx = files_dir(&config_path).join("minutes.docx");

    run_docqa(&config_path, &["upload", docx.to_str().unwrap()]);

    let (stdout, _, success) = run_docqa(&config_path, &["list"]);
    assert!(success);
    assert!(stdout.contains("minutes.docx"));
    assert!(stdout.contains("Board meeting minutes The budget was approved."));
    assert!(stdout.contains("1 documents"));

    let (stdout, _, success) = run_docqa(&config_path, &["show", "1"]);
    assert!(success);
    assert!(stdout.contains("file_name:   minutes.docx"));
    assert!(stdout.contains(
        "file_type:   application/vnd.openxmlformats-officedocument.wordprocessingml.document"
    ));
    assert!(stdout.contains("Board meeting minutes\nThe budget was approved."));
}

#[test]
fn test_list_empty_database() {
    let (_tmp, config_path) = setup_test_env();

    run_docqa(&config_path, &["init"]);
    let (stdout, _, success) = run_docqa(&config_path, &["list"]);
    assert!(success);
    assert!(stdout.contains("No data found in the database."));
}

#[test]
fn test_files_lists_distinct_names() {
    let (_tmp, config_path) = setup_test_env();
    let docx = files_dir(&config_path).join("minutes.docx");

    run_docqa(&config_path, &["upload", docx.to_str().unwrap()]);
    run_docqa(&config_path, &["upload", docx.to_str().unwrap()]);

    let (stdout, _, success) = run_docqa(&config_path, &["files"]);
    assert!(success);
    assert_eq!(stdout.matches("minutes.docx").count(), 1);
}

#[test]
fn test_show_missing_document() {
    let (_tmp, config_path) = setup_test_env();

    run_docqa(&config_path, &["init"]);
    let (_, stderr, success) = run_docqa(&config_path, &["show", "42"]);
    assert!(!success);
    assert!(stderr.contains("document not found: 42"));
}

#[test]
fn test_delete_is_idempotent() {
    let (_tmp, config_path) = setup_test_env();
    let docx = files_dir(&config_path).join("minutes.docx");

    run_docqa(&config_path, &["upload", docx.to_str().unwrap()]);

    let (stdout, _, success) = run_docqa(&config_path, &["delete", "1"]);
    assert!(success);
    assert!(stdout.contains("Deleted 'minutes.docx' (id 1)."));

    let (stdout, _, success) = run_docqa(&config_path, &["delete", "1"]);
    assert!(success);
    assert!(stdout.contains("nothing deleted"));

    let (stdout, _, _) = run_docqa(&config_path, &["list"]);
    assert!(stdout.contains("No data found in the database."));
}

#[test]
fn test_ask_without_documents_fails() {
    let (_tmp, config_path) = setup_test_env();

    run_docqa(&config_path, &["init"]);
    let (_, stderr, success) = run_docqa(&config_path, &["ask", "What was decided?"]);
    assert!(!success);
    assert!(stderr.contains("No files found. Please upload at least one document."));
}

#[test]
fn test_ask_with_unreachable_model_returns_error_text() {
    let (_tmp, config_path) = setup_test_env();
    let docx = files_dir(&config_path).join("minutes.docx");

    run_docqa(&config_path, &["upload", docx.to_str().unwrap()]);
    let (stdout, stderr, success) = run_docqa(
        &config_path,
        &["ask", "What was decided?", "--show-context"],
    );
    assert!(success, "ask failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("DOCUMENT START\nFILE_NAME: minutes.docx\n"));
    assert!(stdout.contains(&format!(
        "An error occurred while contacting the AI model: {} environment variable not set",
        UNSET_KEY_VAR
    )));
}

#[test]
fn test_ask_show_context_prints_nothing_for_invalid_requests() {
    let (_tmp, config_path) = setup_test_env();

    run_docqa(&config_path, &["init"]);
    let (stdout, stderr, success) =
        run_docqa(&config_path, &["ask", "What was decided?", "--show-context"]);
    assert!(!success);
    assert!(stderr.contains("No files found. Please upload at least one document."));
    assert!(!stdout.contains("--- Context ---"));

    let docx = files_dir(&config_path).join("minutes.docx");
    run_docqa(&config_path, &["upload", docx.to_str().unwrap()]);
    let (stdout, stderr, success) = run_docqa(&config_path, &["ask", "  ", "--show-context"]);
    assert!(!success);
    assert!(stderr.contains("question must not be empty"));
    assert!(!stdout.contains("--- Context ---"));
    assert!(!stdout.contains("DOCUMENT START"));
}

#[cfg(target_os = "linux")]
#[test]
fn test_upload_reports_unreadable_file_and_continues() {
    let (_tmp, config_path) = setup_test_env();
    let docx = files_dir(&config_path).join("minutes.docx");

    let (stdout, stderr, success) = run_docqa(
        &config_path,
        &["upload", "/proc/self/mem", docx.to_str().unwrap()],
    );
    assert!(success, "upload failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("unreadable: mem (Failed to read /proc/self/mem"));
    assert!(stdout.contains("stored:  minutes.docx (id 1)"));
    assert!(stdout.contains("processed: 2 files"));
    assert!(stdout.contains("unreadable: 1"));
}

#[test]
fn test_missing_config_fails() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, success) = run_docqa(&tmp.path().join("absent.toml"), &["init"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}
