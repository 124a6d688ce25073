//! `social-clean` subcommand tests.
//!
//! Each test spawns the binary with the built-in registry, writes raw bytes
//! to stdin and checks stdout, stderr and the exit status.

#![cfg(feature = "cli")]

use std::io::Write;
use std::process::{Command, Output, Stdio};

fn run(args: &[&str], stdin: &[u8]) -> Output {
    let bin = env!("CARGO_BIN_EXE_social-clean");
    let mut child = Command::new(bin)
        .args(args)
        .env_remove("SOCIAL_CLEAN_REGISTRY")
        .env("XDG_DATA_HOME", std::env::temp_dir().join("social-clean-cli-test-none"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap_or_else(|e| panic!("Failed to spawn {bin}: {e}"));

    let mut pipe = child.stdin.take().unwrap();
    pipe.write_all(stdin).unwrap();
    drop(pipe);
    child.wait_with_output().unwrap()
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

#[test]
fn clean_reads_urls_from_stdin() {
    let out = run(&["clean"], b"https://x.com/a?s=1\n\nhttps://youtu.be/z?si=1\n");
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out), "https://x.com/a/\nhttps://youtu.be/z\n");
}

#[test]
fn clean_fails_on_non_utf8_stdin() {
    let out = run(&["clean"], b"https://x.com/a?s=1\n\xff\xfe\nhttps://youtu.be/z?si=1\n");
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("Failed to read stdin"));
    assert!(!stdout(&out).contains("youtu.be"));
}

#[test]
fn clean_unsupported_exits_one() {
    let out = run(&["clean", "https://example.com/?utm_source=x"], b"");
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("Unsupported platform"));
}

#[test]
fn platforms_by_key() {
    let out = run(&["platforms", "twitter", "--json"], b"");
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let parsed: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    let rows = parsed.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["display_name"], "X (Twitter)");
}

#[test]
fn platforms_unknown_key_exits_one() {
    let out = run(&["platforms", "myspace"], b"");
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("Unknown platform key: myspace"));
}

#[test]
fn missing_registry_file_is_fatal() {
    let missing = std::env::temp_dir().join("social-clean-cli-test-missing.json");
    let out = run(&["--registry", missing.to_str().unwrap(), "clean", "youtu.be/x"], b"");
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("Failed to load registry"));
}
