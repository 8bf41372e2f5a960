//! One-way file and directory synchronization.
//!
//! [`Mirror`] is the single copy primitive used by the engine and the
//! secrets guard.  Backends implement only the raw copy; the shared
//! [`Mirror::mirror`] method enforces the contract around it: the source
//! must exist, the destination's directory is created, progress is logged,
//! and backend failures are surfaced verbatim.
pub mod native;
pub mod rsync;

use std::fmt;
use std::path::{Component, Path};
use std::sync::Arc;

use anyhow::Result;
use glob::{MatchOptions, Pattern};

use crate::config::{ConfigDescriptor, Kind};
use crate::error::SyncError;
use crate::exec::Executor;
use crate::logging::Log;
use crate::resources::fs;

pub use native::NativeMirror;
pub use rsync::RsyncMirror;

/// What a mirror call is doing, for progress output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Repository -> system.
    Deploy,
    /// System -> repository.
    Backup,
    /// Secrets template -> system.
    Initialize,
}

impl Operation {
    /// Present-participle label used in progress lines.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Deploy => "Deploying",
            Self::Backup => "Backing up",
            Self::Initialize => "Initializing",
        }
    }

    /// Past-tense label used in completion lines.
    #[must_use]
    pub const fn past(self) -> &'static str {
        match self {
            Self::Deploy => "deployed",
            Self::Backup => "backed up",
            Self::Initialize => "initialized",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Compiled exclusion patterns.
///
/// A pattern without `/` is matched against each path component's name, so
/// `.git` excludes a `.git` directory at any depth.  A pattern containing `/`
/// is matched against the whole path relative to the mirror root.
#[derive(Debug, Clone)]
pub struct ExcludeSet {
    raw: Vec<String>,
    names: Vec<Pattern>,
    paths: Vec<Pattern>,
}

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

impl ExcludeSet {
    /// Compile `patterns`.
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern is not a valid glob.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let mut set = Self {
            raw: Vec::with_capacity(patterns.len()),
            names: Vec::new(),
            paths: Vec::new(),
        };
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let trimmed = pattern.trim_matches('/');
            let compiled = Pattern::new(trimmed)
                .map_err(|e| anyhow::anyhow!("invalid exclude pattern '{pattern}': {e}"))?;
            if trimmed.contains('/') {
                set.paths.push(compiled);
            } else {
                set.names.push(compiled);
            }
            set.raw.push(pattern.to_string());
        }
        Ok(set)
    }

    /// The patterns as given, in order.
    #[must_use]
    pub fn patterns(&self) -> &[String] {
        &self.raw
    }

    /// Whether `relative` (a path below the mirror root) is excluded.
    #[must_use]
    pub fn is_excluded(&self, relative: &Path) -> bool {
        let by_name = relative.components().any(|c| match c {
            Component::Normal(name) => name
                .to_str()
                .is_some_and(|n| self.names.iter().any(|p| p.matches_with(n, MATCH_OPTIONS))),
            _ => false,
        });
        by_name
            || self
                .paths
                .iter()
                .any(|p| p.matches_path_with(relative, MATCH_OPTIONS))
    }
}

/// One mirror request.
#[derive(Debug, Clone, Copy)]
pub struct MirrorJob<'a> {
    /// Config name, for messages.
    pub name: &'a str,
    /// Label for progress output.
    pub operation: Operation,
    /// Path to copy from.
    pub source: &'a Path,
    /// Path to copy to.
    pub destination: &'a Path,
    /// Single file or whole tree.
    pub kind: Kind,
    /// Exclusion patterns, baseline included.
    pub excludes: &'a [String],
}

impl<'a> MirrorJob<'a> {
    /// Build a job for `descriptor`.
    #[must_use]
    pub fn for_descriptor(
        descriptor: &'a ConfigDescriptor,
        operation: Operation,
        source: &'a Path,
        destination: &'a Path,
        excludes: &'a [String],
    ) -> Self {
        Self {
            name: descriptor.name(),
            operation,
            source,
            destination,
            kind: descriptor.kind(),
            excludes,
        }
    }
}

/// A copy backend.
pub trait Mirror: Send + Sync + fmt::Debug {
    /// Backend name, for debug output.
    fn name(&self) -> &'static str;

    /// Copy exactly one file, preserving permissions and modification time.
    /// Nothing else in the destination directory is touched.
    ///
    /// # Errors
    ///
    /// Returns the backend's diagnostic if the copy fails.
    fn copy_file(&self, source: &Path, destination: &Path) -> Result<()>;

    /// Make `destination` an exact copy of the contents of `source`,
    /// deleting destination entries absent from the source.  Excluded
    /// entries are neither copied nor deleted.
    ///
    /// # Errors
    ///
    /// Returns the backend's diagnostic if the copy fails.
    fn copy_tree(&self, source: &Path, destination: &Path, excludes: &ExcludeSet) -> Result<()>;

    /// Synchronize `job.source` to `job.destination`.
    ///
    /// # Errors
    ///
    /// - [`SyncError::SourceMissing`] if the source does not exist (a
    ///   dangling link counts as missing); nothing is written.
    /// - [`SyncError::Mirror`] if the source is not of `job.kind` (nothing
    ///   is written), the destination directory cannot be created, or the
    ///   backend fails.
    fn mirror(&self, job: &MirrorJob<'_>, log: &dyn Log) -> Result<(), SyncError> {
        if !job.source.exists() {
            return Err(SyncError::SourceMissing {
                name: job.name.to_string(),
                path: job.source.to_path_buf(),
            });
        }

        let wrap = |e: anyhow::Error| SyncError::Mirror {
            name: job.name.to_string(),
            detail: format!("{e:#}"),
        };

        let kind_matches = match job.kind {
            Kind::File => job.source.is_file(),
            Kind::Directory => job.source.is_dir(),
        };
        if !kind_matches {
            return Err(SyncError::Mirror {
                name: job.name.to_string(),
                detail: format!("source is not a {}: {}", job.kind, job.source.display()),
            });
        }

        let excludes = ExcludeSet::new(job.excludes).map_err(wrap)?;
        let prepared = match job.kind {
            Kind::File => fs::ensure_parent_dir(job.destination),
            Kind::Directory => fs::create_dir_all(job.destination),
        };
        prepared.map_err(wrap)?;

        log.stage(&format!("{} {} config...", job.operation, job.name));
        log.info(&format!("Source: {}", job.source.display()));
        log.info(&format!("Target: {}", job.destination.display()));
        log.debug(&format!("mirror backend: {}", self.name()));

        let copied = match job.kind {
            Kind::File => self.copy_file(job.source, job.destination),
            Kind::Directory => self.copy_tree(job.source, job.destination, &excludes),
        };
        copied.map_err(wrap)?;

        log.info(&format!("{} config {} successfully", job.name, job.operation.past()));
        Ok(())
    }
}

/// Available mirror backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Backend {
    /// In-process copy (no external tools).
    #[default]
    Native,
    /// Shell out to `rsync`.
    Rsync,
}

/// Construct the selected backend.
#[must_use]
pub fn build(backend: Backend, executor: Arc<dyn Executor>) -> Arc<dyn Mirror> {
    match backend {
        Backend::Native => Arc::new(NativeMirror),
        Backend::Rsync => Arc::new(RsyncMirror::new(executor)),
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::BASELINE_EXCLUDES;
    use crate::logging::test_helpers::RecordingLog;
    use std::sync::Mutex;

    fn baseline() -> ExcludeSet {
        ExcludeSet::new(BASELINE_EXCLUDES).unwrap()
    }

    #[test]
    fn baseline_excludes_git_and_swap_files() {
        let set = baseline();
        assert!(set.is_excluded(Path::new(".git")));
        assert!(set.is_excluded(Path::new(".git/HEAD")));
        assert!(set.is_excluded(Path::new("lua/.git")));
        assert!(set.is_excluded(Path::new("x.swp")));
        assert!(set.is_excluded(Path::new("lua/init.lua.swo")));
        assert!(!set.is_excluded(Path::new("a.txt")));
        assert!(!set.is_excluded(Path::new(".gitignore")));
    }

    #[test]
    fn slash_patterns_match_relative_path() {
        let set = ExcludeSet::new(&["themes/*.toml"]).unwrap();
        assert!(set.is_excluded(Path::new("themes/dark.toml")));
        assert!(!set.is_excluded(Path::new("dark.toml")));
        assert!(!set.is_excluded(Path::new("other/themes/dark.toml")));
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        assert!(ExcludeSet::new(&["[unterminated"]).is_err());
    }

    #[test]
    fn patterns_are_kept_verbatim() {
        let set = ExcludeSet::new(&[".DS_Store", "cache/"]).unwrap();
        assert_eq!(set.patterns(), [".DS_Store", "cache/"]);
    }

    #[test]
    fn operation_labels() {
        assert_eq!(Operation::Deploy.to_string(), "Deploying");
        assert_eq!(Operation::Backup.label(), "Backing up");
        assert_eq!(Operation::Initialize.past(), "initialized");
    }

    /// Backend that records calls instead of copying.
    #[derive(Debug, Default)]
    struct RecordingMirror {
        calls: Mutex<Vec<String>>,
    }

    impl Mirror for RecordingMirror {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn copy_file(&self, source: &Path, destination: &Path) -> Result<()> {
            self.calls.lock().unwrap().push(format!(
                "file {} {}",
                source.display(),
                destination.display()
            ));
            Ok(())
        }

        fn copy_tree(&self, source: &Path, destination: &Path, _: &ExcludeSet) -> Result<()> {
            self.calls.lock().unwrap().push(format!(
                "tree {} {}",
                source.display(),
                destination.display()
            ));
            Ok(())
        }
    }

    #[test]
    fn missing_source_fails_without_side_effects() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("absent");
        let destination = dir.path().join("out/nested/file");
        let backend = RecordingMirror::default();
        let log = RecordingLog::new();
        let job = MirrorJob {
            name: "zsh",
            operation: Operation::Deploy,
            source: &source,
            destination: &destination,
            kind: Kind::File,
            excludes: &[],
        };

        let err = backend.mirror(&job, &log).unwrap_err();
        assert!(matches!(err, SyncError::SourceMissing { ref name, .. } if name == "zsh"));
        assert!(!dir.path().join("out").exists());
        assert!(backend.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn kind_mismatch_fails_before_any_write() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("alacritty.toml");
        std::fs::write(&source, "[window]").unwrap();
        let destination = dir.path().join("home/.config/alacritty");
        let backend = RecordingMirror::default();
        let job = MirrorJob {
            name: "alacritty",
            operation: Operation::Backup,
            source: &source,
            destination: &destination,
            kind: Kind::Directory,
            excludes: &[],
        };

        let err = backend.mirror(&job, &RecordingLog::new()).unwrap_err();
        assert!(
            matches!(err, SyncError::Mirror { ref detail, .. } if detail.contains("not a directory"))
        );
        assert!(!dir.path().join("home").exists());
        assert!(backend.calls.lock().unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn dangling_link_source_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("zshrc");
        std::os::unix::fs::symlink(dir.path().join("gone"), &source).unwrap();
        let destination = dir.path().join(".zshrc");
        let backend = RecordingMirror::default();
        let job = MirrorJob {
            name: "zsh",
            operation: Operation::Deploy,
            source: &source,
            destination: &destination,
            kind: Kind::File,
            excludes: &[],
        };

        let err = backend.mirror(&job, &RecordingLog::new()).unwrap_err();
        assert!(matches!(err, SyncError::SourceMissing { .. }));
        assert!(backend.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn file_job_creates_parent_and_logs_paths() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("zshrc");
        std::fs::write(&source, "export A=1").unwrap();
        let destination = dir.path().join("home/.config/zshrc");
        let backend = RecordingMirror::default();
        let log = RecordingLog::new();
        let job = MirrorJob {
            name: "zsh",
            operation: Operation::Deploy,
            source: &source,
            destination: &destination,
            kind: Kind::File,
            excludes: &[],
        };

        backend.mirror(&job, &log).unwrap();
        assert!(dir.path().join("home/.config").is_dir());
        assert!(log.contains(&source.display().to_string()));
        assert!(log.contains(&destination.display().to_string()));
        assert!(log.contains("Deploying zsh config"));
        assert_eq!(backend.calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn backend_failure_becomes_mirror_error() {
        #[derive(Debug)]
        struct Failing;
        impl Mirror for Failing {
            fn name(&self) -> &'static str {
                "failing"
            }
            fn copy_file(&self, _: &Path, _: &Path) -> Result<()> {
                anyhow::bail!("disk full")
            }
            fn copy_tree(&self, _: &Path, _: &Path, _: &ExcludeSet) -> Result<()> {
                anyhow::bail!("disk full")
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        std::fs::create_dir(&source).unwrap();
        let destination = dir.path().join("dst");
        let job = MirrorJob {
            name: "neovim",
            operation: Operation::Backup,
            source: &source,
            destination: &destination,
            kind: Kind::Directory,
            excludes: &[],
        };
        let err = Failing.mirror(&job, &RecordingLog::new()).unwrap_err();
        assert!(matches!(err, SyncError::Mirror { ref detail, .. } if detail == "disk full"));
    }
}
