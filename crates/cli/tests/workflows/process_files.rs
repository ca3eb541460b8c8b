//! `ai-helper process` and `ai-helper scan` against a stub endpoint

use crate::common::stub;
use crate::helper;
use anyhow::Result;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const REPLY: &str = "Here is the plan:\n1. Check null input\n2) Check type\n";

fn write_config(home: &Path, endpoint: &str) -> Result<()> {
    let dir = home.join(".ai_helper");
    fs::create_dir_all(&dir)?;
    fs::write(
        dir.join("config.json"),
        serde_json::json!({ "api_endpoint": endpoint, "timeout_secs": 5 }).to_string(),
    )?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_process_expands_marker_once() -> Result<()> {
    let home = TempDir::new()?;
    let project = TempDir::new()?;
    write_config(home.path(), &stub::spawn_endpoint(REPLY).await)?;

    let source = project.path().join("app.py");
    fs::write(&source, "def f(x):\n    // ai add input validation\n    return x\n")?;

    let result = helper!(project.path(), home.path(), "--no-log-file", "process", "app.py")
        .assert_success()
        .await?;
    assert!(result.contains_stdout("1 expanded"));

    let expected = "def f(x):\n    // ai add input validation\n\n// 1. Check null input\n// 2. Check type\n\n    return x\n";
    assert_eq!(fs::read_to_string(&source)?, expected);

    // Second run leaves the expanded marker alone
    let result = helper!(project.path(), home.path(), "--no-log-file", "process", "app.py")
        .assert_success()
        .await?;
    assert!(result.contains_stdout("already expanded"));
    assert_eq!(fs::read_to_string(&source)?, expected);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unreachable_endpoint_writes_inline_error() -> Result<()> {
    let home = TempDir::new()?;
    let project = TempDir::new()?;
    write_config(home.path(), &stub::closed_endpoint().await)?;

    let source = project.path().join("main.js");
    fs::write(&source, "//ai add caching\nconsole.log(1);\n")?;

    helper!(project.path(), home.path(), "--no-log-file", "process", "main.js")
        .assert_success()
        .await?;

    let lines: Vec<String> = fs::read_to_string(&source)?
        .lines()
        .map(String::from)
        .collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("// Error: Error generating subtasks:"));
    assert_eq!(lines[2], "console.log(1);");
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_file_fails_run() -> Result<()> {
    let home = TempDir::new()?;
    let project = TempDir::new()?;
    write_config(home.path(), &stub::closed_endpoint().await)?;

    let result = helper!(project.path(), home.path(), "--no-log-file", "process", "gone.py")
        .assert_failure()
        .await?;
    assert!(result.contains_stderr("could not be processed"));
    Ok(())
}

#[tokio::test]
async fn test_malformed_config_is_fatal() -> Result<()> {
    let home = TempDir::new()?;
    let project = TempDir::new()?;
    let dir = home.path().join(".ai_helper");
    fs::create_dir_all(&dir)?;
    fs::write(dir.join("config.json"), "{ not json")?;
    fs::write(project.path().join("app.py"), "//ai anything\n")?;

    let result = helper!(project.path(), home.path(), "--no-log-file", "process", "app.py")
        .assert_failure()
        .await?;
    assert!(result.contains_stderr("Failed to load configuration"));
    assert_eq!(fs::read_to_string(project.path().join("app.py"))?, "//ai anything\n");
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_scan_dry_run_lists_pending_files() -> Result<()> {
    let home = TempDir::new()?;
    let project = TempDir::new()?;
    write_config(home.path(), &stub::closed_endpoint().await)?;

    fs::create_dir_all(project.path().join("src"))?;
    fs::create_dir_all(project.path().join("node_modules"))?;
    fs::write(project.path().join("src").join("a.ts"), "//ai one\n//ai two\n")?;
    fs::write(project.path().join("src").join("b.ts"), "const b = 1;\n")?;
    fs::write(project.path().join("node_modules").join("c.js"), "//ai vendored\n")?;
    fs::write(project.path().join("notes.txt"), "//ai not watched\n")?;

    let result = helper!(project.path(), home.path(), "--no-log-file", "scan", "--dry-run")
        .assert_success()
        .await?;

    assert!(result.contains_stdout("a.ts"));
    assert!(!result.contains_stdout("b.ts"));
    assert!(!result.contains_stdout("c.js"));
    assert!(!result.contains_stdout("notes.txt"));
    // Nothing is rewritten
    assert_eq!(
        fs::read_to_string(project.path().join("src").join("a.ts"))?,
        "//ai one\n//ai two\n"
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_scan_expands_and_logs_to_file() -> Result<()> {
    let home = TempDir::new()?;
    let project = TempDir::new()?;
    write_config(home.path(), &stub::spawn_endpoint(REPLY).await)?;

    let source = project.path().join("lib.c");
    fs::write(&source, "//ai free buffers\n")?;

    helper!(project.path(), home.path(), "scan")
        .assert_success()
        .await?;

    assert!(fs::read_to_string(&source)?.contains("// 2. Check type"));

    let log = fs::read_to_string(
        home.path()
            .join(".ai_helper")
            .join("logs")
            .join("ai_helper.log"),
    )?;
    assert!(log.contains("completed in"));
    Ok(())
}
