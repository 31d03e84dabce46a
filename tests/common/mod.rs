#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, SystemTime};

pub fn run_cli(args: &[&str], stdin_json: &str) -> (i32, String, String) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_handover"))
        .args(args)
        .env_remove("HANDOVER_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn binary");

    // The binary may exit before reading stdin (e.g. on a usage error).
    let _ = child
        .stdin
        .as_mut()
        .unwrap()
        .write_all(stdin_json.as_bytes());

    let output = child.wait_with_output().unwrap();
    (
        output.status.code().unwrap_or(-1),
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
    )
}

pub fn payload(session_id: &str, cwd: &Path, transcript_path: &Path) -> String {
    serde_json::json!({
        "session_id": session_id,
        "transcript_path": transcript_path,
        "cwd": cwd,
        "hook_event_name": "PreCompact",
        "trigger": "auto",
    })
    .to_string()
}

/// A fresh session id and its 8-character filename prefix.
pub fn new_session() -> (String, String) {
    let id = uuid::Uuid::new_v4().to_string();
    let prefix = id[..8].to_string();
    (id, prefix)
}

/// A project directory plus a sibling transcript directory, as laid out
/// under `~/.claude/projects`.
pub struct Workspace {
    pub project: tempfile::TempDir,
    pub transcripts: tempfile::TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            project: tempfile::tempdir().unwrap(),
            transcripts: tempfile::tempdir().unwrap(),
        }
    }

    pub fn cwd(&self) -> &Path {
        self.project.path()
    }

    /// Write a transcript named after the session and return its path.
    pub fn transcript(&self, session_id: &str, contents: &str) -> PathBuf {
        let path = self.transcripts.path().join(format!("{session_id}.jsonl"));
        fs::write(&path, contents).unwrap();
        path
    }

    /// Point the summarizer at a shell script run in the project directory.
    pub fn summarizer(&self, script: &str, timeout_secs: u64) {
        let toml = format!(
            "[summarizer]\ncommand = ['sh', '-c', '{script}']\ntimeout_secs = {timeout_secs}\n"
        );
        fs::write(self.cwd().join(".handover.toml"), toml).unwrap();
    }

    /// Handover files in the project directory, sorted.
    pub fn handovers(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.cwd())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with("HANDOVER"))
            .collect();
        names.sort();
        names
    }
}

/// Write `contents` to `path` and set its mtime to `secs` after the epoch.
pub fn write_at(path: &Path, contents: &str, secs: u64) {
    fs::write(path, contents).unwrap();
    set_mtime(path, secs);
}

pub fn set_mtime(path: &Path, secs: u64) {
    fs::File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
        .unwrap();
}

/// A short JSONL transcript with one user and one assistant turn.
pub const TRANSCRIPT: &str = concat!(
    r#"{"type":"user","uuid":"u1","sessionId":"s","message":{"role":"user","content":"fix the flaky parser test"}}"#,
    "\n",
    r#"{"type":"assistant","uuid":"a1","parentUuid":"u1","sessionId":"s","message":{"role":"assistant","content":[{"type":"text","text":"Patched src/parser.rs"}]}}"#,
    "\n",
);
