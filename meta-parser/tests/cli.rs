use std::io::Write;
use std::process::{Command, Output, Stdio};

use pretty_assertions::assert_eq;
use serde_json::Value;

const CAPTURED_AT_ENV: &str = "META_PARSER_CAPTURED_AT";

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "cli exited with {}: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[test]
fn cli_reads_file_path() {
    let output = Command::new(env!("CARGO_BIN_EXE_meta_parser"))
        .env(CAPTURED_AT_ENV, "1700000000")
        .arg("https://example.com/blog/entry-one")
        .arg("tests/fixtures/html/no-meta.html")
        .output()
        .expect("run CLI");

    assert_success(&output);
    let expected: Value =
        serde_json::from_str(include_str!("fixtures/expected/no-meta.json")).expect("fixture");
    assert_eq!(stdout_json(&output), expected);
}

#[test]
fn cli_reads_stdin_when_no_file() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_meta_parser"))
        .env(CAPTURED_AT_ENV, "2023-11-14T22:13:20+0000")
        .arg("https://www.facebook.com/photo/?fbid=998877")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn CLI");

    let html = include_str!("fixtures/html/profile-photo.html");
    child
        .stdin
        .as_mut()
        .expect("stdin open")
        .write_all(html.as_bytes())
        .expect("write stdin");

    let output = child.wait_with_output().expect("read CLI output");
    assert_success(&output);
    let expected: Value =
        serde_json::from_str(include_str!("fixtures/expected/profile-photo.json"))
            .expect("fixture");
    assert_eq!(stdout_json(&output), expected);
}

#[test]
fn cli_prints_empty_array_without_url() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_meta_parser"))
        .arg("")
        .arg("-")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn CLI");
    drop(child.stdin.take());

    let output = child.wait_with_output().expect("read CLI output");
    assert_success(&output);
    assert_eq!(stdout_json(&output), Value::Array(Vec::new()));
}

#[test]
fn cli_requires_url() {
    let output = Command::new(env!("CARGO_BIN_EXE_meta_parser"))
        .stdin(Stdio::null())
        .output()
        .expect("run CLI");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("missing URL"));
}
