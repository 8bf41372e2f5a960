// Shared helpers for integration tests.
//
// Provides a temporary repository + home directory pair and in-memory
// collaborators so each integration test can drive the engine without
// touching the real home directory, stdin, or process environment.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thunderize_cli::config::registry::Registry;
use thunderize_cli::context::Context;
use thunderize_cli::exec::SystemExecutor;
use thunderize_cli::logging::{EntryStatus, Log, SummaryEntry};
use thunderize_cli::mirror::NativeMirror;
use thunderize_cli::paths::{HomeSource, PathResolver, RootSource};
use thunderize_cli::prompt::Prompt;
use thunderize_cli::resources::permissions::SystemModes;

/// [`Log`] that keeps every message and summary entry in memory.
#[derive(Debug, Default)]
pub struct MemoryLog {
    lines: Mutex<Vec<String>>,
    entries: Mutex<Vec<SummaryEntry>>,
}

impl MemoryLog {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().expect("log lock").clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|l| l.contains(needle))
    }

    pub fn entries(&self) -> Vec<SummaryEntry> {
        self.entries.lock().expect("log lock").clone()
    }

    fn push(&self, level: &str, msg: &str) {
        self.lines
            .lock()
            .expect("log lock")
            .push(format!("{level}: {msg}"));
    }
}

impl Log for MemoryLog {
    fn stage(&self, msg: &str) {
        self.push("stage", msg);
    }
    fn info(&self, msg: &str) {
        self.push("info", msg);
    }
    fn debug(&self, msg: &str) {
        self.push("debug", msg);
    }
    fn warn(&self, msg: &str) {
        self.push("warn", msg);
    }
    fn error(&self, msg: &str) {
        self.push("error", msg);
    }
    fn dry_run(&self, msg: &str) {
        self.push("dry_run", msg);
    }
    fn record_entry(&self, name: &str, status: EntryStatus, message: Option<&str>) {
        self.entries.lock().expect("log lock").push(SummaryEntry {
            name: name.to_string(),
            status,
            message: message.map(String::from),
        });
    }
}

/// [`Prompt`] that replays fixed answers and records every question.
#[derive(Debug, Default)]
pub struct Answers {
    answers: Mutex<VecDeque<bool>>,
    asked: Mutex<Vec<String>>,
}

impl Answers {
    pub fn new(answers: &[bool]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().copied().collect()),
            asked: Mutex::new(Vec::new()),
        }
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().expect("prompt lock").clone()
    }
}

impl Prompt for Answers {
    fn confirm(&self, question: &str, _default: bool) -> anyhow::Result<bool> {
        self.asked
            .lock()
            .expect("prompt lock")
            .push(question.to_string());
        self.answers
            .lock()
            .expect("prompt lock")
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("unexpected prompt: {question}"))
    }
}

/// An isolated repository and home directory backed by one
/// [`tempfile::TempDir`].
pub struct TestEnv {
    dir: tempfile::TempDir,
    pub log: Arc<MemoryLog>,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        std::fs::create_dir_all(dir.path().join("repo/config")).expect("create repo");
        std::fs::create_dir_all(dir.path().join("home")).expect("create home");
        Self {
            dir,
            log: Arc::new(MemoryLog::default()),
        }
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().join("repo")
    }

    pub fn home(&self) -> PathBuf {
        self.dir.path().join("home")
    }

    /// Write `content` to `relative` under the repository root.
    pub fn repo_file(&self, relative: &str, content: &str) -> PathBuf {
        write(&self.root().join(relative), content)
    }

    /// Write `content` to `relative` under the home directory.
    pub fn home_file(&self, relative: &str, content: &str) -> PathBuf {
        write(&self.home().join(relative), content)
    }

    /// A context over `registry` with the native mirror and `prompt`.
    pub fn context(&self, registry: Registry, prompt: Arc<dyn Prompt>) -> Context {
        Context {
            registry: Arc::new(registry),
            paths: Arc::new(PathResolver::new(
                RootSource::Fixed(self.root()),
                HomeSource::Fixed(self.home()),
            )),
            mirror: Arc::new(NativeMirror),
            executor: Arc::new(SystemExecutor),
            prompt,
            log: self.log.clone(),
            modes: Arc::new(SystemModes),
            dry_run: false,
        }
    }
}

fn write(path: &Path, content: &str) -> PathBuf {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent");
    }
    std::fs::write(path, content).expect("write file");
    path.to_path_buf()
}

/// Read a file to a string, panicking with the path on failure.
pub fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap_or_else(|e| panic!("read {}: {e}", path.display()))
}

/// Permission bits of `path`.
#[cfg(unix)]
pub fn mode(path: &Path) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path).expect("metadata").permissions().mode() & 0o7777
}
