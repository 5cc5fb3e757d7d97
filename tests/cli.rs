//! Integration tests for top-level CLI behavior.

use std::path::Path;
use std::process::{Command, Output};

use serde_json::{json, Value};
use tracksync::cassette::recorder::CassetteRecorder;

fn run_tracksync(dir: &Path, args: &[&str]) -> Output {
    let bin = env!("CARGO_BIN_EXE_tracksync");
    Command::new(bin)
        .args(args)
        .current_dir(dir)
        .env("TRACKSYNC_CONFIG", dir.join("absent.yaml"))
        .env("TRACKSYNC_STATE_DIR", dir.join("state"))
        .env("TRACKSYNC_LOG_DIR", dir.join("logs"))
        .env_remove("TRACKSYNC_RECORD")
        .env_remove("GITLAB_TOKEN")
        .env_remove("REDMINE_API_KEY")
        .env_remove("OPENAI_API_KEY")
        .output()
        .expect("failed to run tracksync binary")
}

#[test]
fn help_lists_subcommands() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_tracksync(dir.path(), &["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    for command in ["serve", "process", "check", "projects"] {
        assert!(stdout.contains(command), "missing {command} in {stdout}");
    }
}

#[test]
fn live_process_requires_secrets() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("push.json"), r#"{"object_kind":"push"}"#).unwrap();

    let output = run_tracksync(dir.path(), &["process", "push.json"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("missing required setting 'gitlab.token'"), "{stderr}");
}

#[test]
fn replayed_process_prints_batch_report() {
    let dir = tempfile::tempdir().unwrap();
    let mut recorder = CassetteRecorder::new(dir.path().join("run.cassette.yaml"), "cli");
    recorder.record("id_gen", "generate_id", json!({}), json!("run-cli"));
    for _ in 0..3 {
        recorder.record("clock", "now", json!({}), json!("2024-03-09T12:00:00Z"));
    }
    recorder.finish().unwrap();
    let payload = json!({
        "object_kind": "push",
        "ref": "refs/heads/main",
        "project_id": 3,
        "project": {"name": "shop"},
        "commits": [{
            "id": "0123456789abcdef",
            "message": "Merge branch 'x'",
            "author": {"name": "Ann"},
        }],
    });
    std::fs::write(dir.path().join("push.json"), payload.to_string()).unwrap();

    let output =
        run_tracksync(dir.path(), &["process", "push.json", "--replay", "run.cassette.yaml"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["run_id"], "run-cli");
    assert_eq!(report["branch"], "main");
    assert_eq!(report["outcomes"][0]["reason"], "merge commit");
    assert!(dir.path().join("state").join("sync-2024-03-09.jsonl").exists());
}

#[test]
fn missing_payload_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let mut recorder = CassetteRecorder::new(dir.path().join("empty.cassette.yaml"), "cli");
    recorder.record("id_gen", "generate_id", json!({}), json!("unused"));
    recorder.finish().unwrap();

    let output =
        run_tracksync(dir.path(), &["process", "nope.json", "--replay", "empty.cassette.yaml"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("Failed to read payload nope.json"), "{stderr}");
}
