//! Deploy, backup, validate, list, and status over the config catalog.
//!
//! Single-config operations fail fast and return the underlying error
//! unchanged.  The bulk operations differ on purpose:
//!
//! - [`SyncEngine::deploy_all`] stops at the first failure, since a partially
//!   deployed environment is not left behind silently.
//! - [`SyncEngine::backup_all`] attempts every config and reports failures
//!   as warnings.
//! - [`SyncEngine::validate_all`] checks every config and returns one
//!   aggregated error.
pub mod report;
pub mod status;

use std::path::Path;

use serde::Serialize;

use crate::config::{ConfigDescriptor, Kind, Side};
use crate::context::Context;
use crate::error::SyncError;
use crate::logging::EntryStatus;
use crate::mirror::{ExcludeSet, MirrorJob, Operation};

pub use report::{BulkReport, ConfigResult, SyncOutcome};
pub use status::{ConfigStatus, DriftState};

/// Display metadata for one config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigListing {
    /// Config name.
    pub name: String,
    /// `file` or `directory`.
    pub kind: Kind,
    /// Path relative to the repository root.
    pub repo_path: String,
    /// System path as registered (unexpanded).
    pub system_path: String,
}

/// Orchestrates sync operations over a [`Context`].
#[derive(Debug)]
pub struct SyncEngine<'a> {
    ctx: &'a Context,
}

impl<'a> SyncEngine<'a> {
    /// Create an engine over `ctx`.
    #[must_use]
    pub const fn new(ctx: &'a Context) -> Self {
        Self { ctx }
    }

    /// Mirror one config from the repository to the system.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NotFound`] for an unknown name, otherwise the
    /// path or mirror error unchanged.
    pub fn deploy_one(&self, name: &str) -> Result<SyncOutcome, SyncError> {
        let descriptor = self.ctx.registry.lookup(name)?;
        self.run_recorded(descriptor, Operation::Deploy)
    }

    /// Mirror one config from the system back into the repository.
    ///
    /// # Errors
    ///
    /// Same as [`SyncEngine::deploy_one`].
    pub fn backup_one(&self, name: &str) -> Result<SyncOutcome, SyncError> {
        let descriptor = self.ctx.registry.lookup(name)?;
        self.run_recorded(descriptor, Operation::Backup)
    }

    /// Deploy every config in catalog order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first config's error; later configs are not attempted.
    pub fn deploy_all(&self) -> Result<BulkReport, SyncError> {
        self.ctx.log.stage("Deploying all configurations");
        let mut report = BulkReport::default();
        for descriptor in self.ctx.registry.all() {
            match self.run_recorded(descriptor, Operation::Deploy) {
                Ok(outcome) => report.push(descriptor.name(), outcome),
                Err(e) => {
                    self.ctx
                        .log
                        .error(&format!("Failed to deploy {}", descriptor.name()));
                    return Err(e);
                }
            }
        }
        self.ctx.log.info("All configurations deployed");
        Ok(report)
    }

    /// Back up every config in catalog order, continuing past failures.
    ///
    /// Never fails as a whole; individual failures are logged as warnings
    /// and appear in the returned report.
    pub fn backup_all(&self) -> BulkReport {
        self.ctx.log.stage("Backing up all configurations");
        let mut report = BulkReport::default();
        for descriptor in self.ctx.registry.all() {
            let outcome = match self.run_recorded(descriptor, Operation::Backup) {
                Ok(outcome) => outcome,
                Err(e) => {
                    self.ctx.log.warn(&format!(
                        "Warning: Failed to backup {}: {e}",
                        descriptor.name()
                    ));
                    SyncOutcome::Failed(e.to_string())
                }
            };
            report.push(descriptor.name(), outcome);
        }
        if report.ok() {
            self.ctx.log.info("All configurations backed up");
        }
        report
    }

    /// Check that every config exists on the repository side.
    ///
    /// The system side is never touched.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Validation`] naming every missing config, or
    /// [`SyncError::Path`] if the repository root cannot be resolved.
    pub fn validate_all(&self) -> Result<(), SyncError> {
        self.ctx.log.stage("Validating configurations");
        let mut missing = Vec::new();
        for descriptor in self.ctx.registry.all() {
            let path = self.ctx.paths.config_path(descriptor, Side::Repo)?;
            if path.exists() {
                self.ctx.log.info(&format!("✓ {}", descriptor.name()));
            } else {
                self.ctx.log.error(&format!(
                    "✗ {}: missing at {}",
                    descriptor.name(),
                    path.display()
                ));
                missing.push(descriptor.name().to_string());
            }
        }
        if missing.is_empty() {
            self.ctx.log.info("All configurations are valid");
            Ok(())
        } else {
            Err(SyncError::Validation { missing })
        }
    }

    /// Enumerate the catalog.  Touches no files.
    #[must_use]
    pub fn list_all(&self) -> Vec<ConfigListing> {
        self.ctx
            .registry
            .all()
            .iter()
            .map(|d| ConfigListing {
                name: d.name().to_string(),
                kind: d.kind(),
                repo_path: d.repo_path().to_string(),
                system_path: d.system_path().to_string(),
            })
            .collect()
    }

    /// Compare the repository and system copies of one config.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NotFound`] for an unknown name, or an error if
    /// a path cannot be resolved or read.
    pub fn status_one(&self, name: &str) -> Result<ConfigStatus, SyncError> {
        let descriptor = self.ctx.registry.lookup(name)?;
        self.status(descriptor)
    }

    /// Compare every config, in catalog order.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered while hashing.
    pub fn status_all(&self) -> Result<Vec<ConfigStatus>, SyncError> {
        self.ctx
            .registry
            .all()
            .iter()
            .map(|d| self.status(d))
            .collect()
    }

    fn status(&self, descriptor: &ConfigDescriptor) -> Result<ConfigStatus, SyncError> {
        let excludes = ExcludeSet::new(&descriptor.effective_excludes())
            .map_err(|e| SyncError::Catalog(format!("{e:#}")))?;
        let hash = |side| -> Result<Option<String>, SyncError> {
            let path = self.ctx.paths.config_path(descriptor, side)?;
            status::digest(&path, descriptor.kind(), &excludes).map_err(|e| SyncError::Mirror {
                name: descriptor.name().to_string(),
                detail: format!("{e:#}"),
            })
        };
        let repo = hash(Side::Repo)?;
        let system = hash(Side::System)?;
        let state = DriftState::compare(repo.as_deref(), system.as_deref());
        self.ctx
            .log
            .debug(&format!("{}: {state}", descriptor.name()));
        Ok(ConfigStatus {
            name: descriptor.name().to_string(),
            state,
        })
    }

    /// Run one sync and record its outcome in the summary.
    fn run_recorded(
        &self,
        descriptor: &ConfigDescriptor,
        operation: Operation,
    ) -> Result<SyncOutcome, SyncError> {
        let _span = tracing::info_span!("config", name = %descriptor.name()).entered();
        let result = self.run(descriptor, operation);
        let (status, message) = match &result {
            Ok(outcome) => (outcome.status(), outcome.message().map(String::from)),
            Err(e) => (EntryStatus::Failed, Some(e.to_string())),
        };
        self.ctx
            .log
            .record_entry(descriptor.name(), status, message.as_deref());
        result
    }

    fn run(
        &self,
        descriptor: &ConfigDescriptor,
        operation: Operation,
    ) -> Result<SyncOutcome, SyncError> {
        let (from, to) = match operation {
            Operation::Backup => (Side::System, Side::Repo),
            Operation::Deploy | Operation::Initialize => (Side::Repo, Side::System),
        };
        let source = self.ctx.paths.config_path(descriptor, from)?;
        let destination = self.ctx.paths.config_path(descriptor, to)?;

        if same_location(&source, &destination) {
            let reason = "source and destination are the same path".to_string();
            self.ctx
                .log
                .warn(&format!("Skipping {}: {reason}", descriptor.name()));
            return Ok(SyncOutcome::Skipped(reason));
        }

        if self.ctx.dry_run {
            if !source.exists() {
                return Err(SyncError::SourceMissing {
                    name: descriptor.name().to_string(),
                    path: source,
                });
            }
            self.ctx.log.dry_run(&format!(
                "Would {} {} config: {} -> {}",
                verb(operation),
                descriptor.name(),
                source.display(),
                destination.display()
            ));
            return Ok(SyncOutcome::DryRun);
        }

        let excludes = descriptor.effective_excludes();
        let job = MirrorJob::for_descriptor(descriptor, operation, &source, &destination, &excludes);
        self.ctx.mirror.mirror(&job, self.ctx.log.as_ref())?;
        Ok(SyncOutcome::Success)
    }
}

const fn verb(operation: Operation) -> &'static str {
    match operation {
        Operation::Deploy => "deploy",
        Operation::Backup => "back up",
        Operation::Initialize => "initialize",
    }
}

fn same_location(a: &Path, b: &Path) -> bool {
    a == b
        || matches!(
            (dunce::canonicalize(a), dunce::canonicalize(b)),
            (Ok(x), Ok(y)) if x == y
        )
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::config::registry::Registry;
    use crate::context::test_helpers::make_context;
    use crate::exec::test_helpers::MockExecutor;
    use crate::logging::test_helpers::RecordingLog;
    use crate::prompt::test_helpers::ScriptedPrompt;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        root: std::path::PathBuf,
        home: std::path::PathBuf,
        log: Arc<RecordingLog>,
        ctx: Context,
    }

    fn three_files() -> Registry {
        Registry::new(
            vec![
                ConfigDescriptor::file("a", "config/a", "~/.a"),
                ConfigDescriptor::file("b", "config/b", "~/.b"),
                ConfigDescriptor::file("c", "config/c", "~/.c"),
            ],
            vec![],
        )
        .unwrap()
    }

    fn fixture(registry: Registry) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("repo");
        let home = dir.path().join("home");
        std::fs::create_dir_all(root.join("config")).unwrap();
        std::fs::create_dir_all(&home).unwrap();
        let log = Arc::new(RecordingLog::new());
        let ctx = make_context(
            registry,
            &root,
            &home,
            Arc::new(ScriptedPrompt::silent()),
            Arc::new(MockExecutor::default()),
            log.clone(),
        );
        Fixture {
            _dir: dir,
            root,
            home,
            log,
            ctx,
        }
    }

    #[test]
    fn deploy_one_copies_to_system_and_records_ok() {
        let f = fixture(three_files());
        std::fs::write(f.root.join("config/a"), "alpha").unwrap();

        let outcome = SyncEngine::new(&f.ctx).deploy_one("A").unwrap();

        assert_eq!(outcome, SyncOutcome::Success);
        assert_eq!(std::fs::read_to_string(f.home.join(".a")).unwrap(), "alpha");
        assert_eq!(f.log.entries()[0].status, EntryStatus::Ok);
    }

    #[test]
    fn deploy_one_unknown_name() {
        let f = fixture(three_files());
        let err = SyncEngine::new(&f.ctx).deploy_one("nope").unwrap_err();
        assert!(matches!(err, SyncError::NotFound(ref n) if n == "nope"));
    }

    #[test]
    fn deploy_one_missing_source_is_propagated() {
        let f = fixture(three_files());
        let err = SyncEngine::new(&f.ctx).deploy_one("b").unwrap_err();
        assert!(matches!(err, SyncError::SourceMissing { ref name, .. } if name == "b"));
        assert_eq!(f.log.entries()[0].status, EntryStatus::Failed);
    }

    #[test]
    fn deploy_all_stops_at_first_failure() {
        let f = fixture(three_files());
        std::fs::write(f.root.join("config/a"), "alpha").unwrap();
        std::fs::write(f.root.join("config/c"), "gamma").unwrap();

        let err = SyncEngine::new(&f.ctx).deploy_all().unwrap_err();

        assert!(matches!(err, SyncError::SourceMissing { ref name, .. } if name == "b"));
        assert!(f.home.join(".a").exists());
        assert!(!f.home.join(".c").exists());
        assert!(f.log.contains("Failed to deploy b"));
        let names: Vec<_> = f.log.entries().into_iter().map(|e| e.name).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn backup_all_attempts_every_config() {
        let f = fixture(three_files());
        std::fs::write(f.home.join(".a"), "alpha").unwrap();
        std::fs::write(f.home.join(".c"), "gamma").unwrap();

        let report = SyncEngine::new(&f.ctx).backup_all();

        assert_eq!(report.results.len(), 3);
        assert_eq!(report.failed(), ["b"]);
        assert_eq!(std::fs::read_to_string(f.root.join("config/a")).unwrap(), "alpha");
        assert_eq!(std::fs::read_to_string(f.root.join("config/c")).unwrap(), "gamma");
        assert!(f.log.contains("Warning: Failed to backup b"));
    }

    #[test]
    fn validate_all_aggregates_missing_names() {
        let registry = Registry::new(
            ["one", "two", "three", "four", "five"]
                .iter()
                .map(|n| ConfigDescriptor::file(n, &format!("config/{n}"), &format!("~/.{n}")))
                .collect(),
            vec![],
        )
        .unwrap();
        let f = fixture(registry);
        for n in ["one", "three", "five"] {
            std::fs::write(f.root.join("config").join(n), n).unwrap();
        }

        let err = SyncEngine::new(&f.ctx).validate_all().unwrap_err();

        match err {
            SyncError::Validation { missing } => assert_eq!(missing, ["two", "four"]),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn validate_all_passes_when_everything_exists() {
        let f = fixture(three_files());
        for n in ["a", "b", "c"] {
            std::fs::write(f.root.join("config").join(n), n).unwrap();
        }
        SyncEngine::new(&f.ctx).validate_all().unwrap();
        assert!(f.log.contains("✓ b"));
    }

    #[test]
    fn list_all_touches_no_files() {
        let ctx = make_context(
            Registry::builtin(),
            Path::new("/nonexistent/repo"),
            Path::new("/nonexistent/home"),
            Arc::new(ScriptedPrompt::silent()),
            Arc::new(MockExecutor::default()),
            Arc::new(RecordingLog::new()),
        );
        let listing = SyncEngine::new(&ctx).list_all();
        assert_eq!(listing.len(), 5);
        assert_eq!(listing[0].name, "neovim");
        assert_eq!(listing[0].kind, Kind::Directory);
        assert_eq!(listing[1].system_path, "~/.zshrc");
    }

    #[test]
    fn dry_run_copies_nothing() {
        let mut f = fixture(three_files());
        f.ctx.dry_run = true;
        std::fs::write(f.root.join("config/a"), "alpha").unwrap();

        let outcome = SyncEngine::new(&f.ctx).deploy_one("a").unwrap();

        assert_eq!(outcome, SyncOutcome::DryRun);
        assert!(!f.home.join(".a").exists());
        assert!(f.log.contains("Would deploy a config"));
    }

    #[test]
    fn dry_run_still_checks_source() {
        let mut f = fixture(three_files());
        f.ctx.dry_run = true;
        let err = SyncEngine::new(&f.ctx).deploy_one("b").unwrap_err();
        assert!(matches!(err, SyncError::SourceMissing { .. }));
    }

    #[test]
    fn status_reports_drift() {
        let f = fixture(three_files());
        std::fs::write(f.root.join("config/a"), "same").unwrap();
        std::fs::write(f.home.join(".a"), "same").unwrap();
        std::fs::write(f.root.join("config/b"), "repo").unwrap();
        std::fs::write(f.home.join(".b"), "edited").unwrap();

        let states: Vec<_> = SyncEngine::new(&f.ctx)
            .status_all()
            .unwrap()
            .into_iter()
            .map(|s| s.state)
            .collect();

        assert_eq!(
            states,
            [DriftState::InSync, DriftState::Drifted, DriftState::MissingBoth]
        );
    }

    #[test]
    fn same_path_is_skipped() {
        let registry = Registry::new(
            vec![ConfigDescriptor::file("loop", "config/loop", "~/config/loop")],
            vec![],
        )
        .unwrap();
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("config")).unwrap();
        std::fs::write(dir.path().join("config/loop"), "x").unwrap();
        let log = Arc::new(RecordingLog::new());
        let ctx = make_context(
            registry,
            dir.path(),
            dir.path(),
            Arc::new(ScriptedPrompt::silent()),
            Arc::new(MockExecutor::default()),
            log.clone(),
        );

        let outcome = SyncEngine::new(&ctx).deploy_one("loop").unwrap();
        assert!(matches!(outcome, SyncOutcome::Skipped(_)));
        assert_eq!(log.entries()[0].status, EntryStatus::Skipped);
    }
}
