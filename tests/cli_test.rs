//! Tests for the `mdcopy` binary.

use std::process::Command;

const FIXTURES_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

fn fixture_path(name: &str) -> String {
    format!("{}/{}", FIXTURES_DIR, name)
}

fn mdcopy(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_mdcopy"))
        .args(args)
        .output()
        .expect("Failed to run mdcopy")
}

#[test]
fn test_prints_markdown_for_host() {
    let path = fixture_path("chatgpt_conversation.html");
    let out = mdcopy(&[&path, "--host", "chatgpt.com", "--quiet"]);

    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.starts_with("## Summing"));
    assert!(stdout.contains("[the docs](https://chatgpt.com/docs/sum)"));
}

#[test]
fn test_platform_flag() {
    let path = fixture_path("gemini_conversation.html");
    let out = mdcopy(&[&path, "--platform", "gemini", "--quiet"]);

    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.contains("```python\nimport math"));
}

#[test]
fn test_inject_prints_page_with_controls() {
    let path = fixture_path("gemini_conversation.html");
    let out = mdcopy(&[&path, "--platform", "gemini", "--inject"]);

    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert_eq!(stdout.matches(r#"data-markdown-copy="true""#).count(), 1);
    assert!(stdout.contains(r#"data-md-id="md-0""#));
}

#[test]
fn test_settings_override_content_selector() {
    let dir = tempfile::tempdir().unwrap();
    let settings = dir.path().join("settings.json");
    std::fs::write(
        &settings,
        r#"{"customSelectors":{"gemini":{"contentSelector":".no-such-panel"}}}"#,
    )
    .unwrap();

    let path = fixture_path("gemini_conversation.html");
    let out = mdcopy(&[
        &path,
        "--platform",
        "gemini",
        "--settings",
        settings.to_str().unwrap(),
        "--quiet",
    ]);

    // The control is injected but no content matches, so nothing converts.
    assert!(out.status.success());
    assert_eq!(String::from_utf8(out.stdout).unwrap().trim(), "");
}

#[test]
fn test_unsupported_host_fails() {
    let path = fixture_path("chatgpt_conversation.html");
    let out = mdcopy(&[&path, "--host", "example.org"]);

    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("unsupported host"));
}
