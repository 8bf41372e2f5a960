//! Guarded sync for the secrets file.
//!
//! The secrets config is never part of bulk operations.  Its system copy is
//! created from a repository template, must end up with mode `0600`, and is
//! never overwritten without confirmation.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use crate::config::{ConfigDescriptor, Kind, Side};
use crate::context::Context;
use crate::error::SyncError;
use crate::mirror::{MirrorJob, Operation};
use crate::resources::permissions::{ModeResource, SECURE_MODE};
use crate::resources::{Resource, ResourceChange, ResourceState};

/// Editor used when `$EDITOR` is unset or empty.
pub const DEFAULT_EDITOR: &str = "vi";

/// The user's configured editor, falling back to [`DEFAULT_EDITOR`].
#[must_use]
pub fn editor_from_env() -> String {
    std::env::var("EDITOR")
        .ok()
        .filter(|e| !e.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_EDITOR.to_string())
}

/// Where the system-side secrets file stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretsState {
    /// No file at the system path.
    Absent,
    /// Present with a mode other than `0600`.
    Insecure {
        /// Current mode, e.g. `"0644"`.
        mode: String,
    },
    /// Present with mode `0600`.
    Secure,
}

/// Result of [`SecretsGuard::init`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// No file existed; the template was copied.
    Created,
    /// An existing file was replaced after confirmation.
    Overwritten,
    /// The user declined to overwrite.
    Cancelled,
}

/// Result of [`SecretsGuard::check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// No file yet.
    Absent,
    /// Already `0600`.
    Secure,
    /// Mode corrected to `0600`.
    Fixed,
    /// The user declined the fix.
    LeftInsecure {
        /// Mode left in place.
        mode: String,
    },
}

/// Result of [`SecretsGuard::edit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// The editor ran and exited successfully.
    Edited,
    /// The file was absent and the user declined to create it.
    Cancelled,
}

/// Init, check, and edit for one secret config.
#[derive(Debug)]
pub struct SecretsGuard<'a> {
    ctx: &'a Context,
    descriptor: &'a ConfigDescriptor,
    editor: String,
}

impl<'a> SecretsGuard<'a> {
    /// Guard the secret config named `name`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NotFound`] if no secret config has that name.
    pub fn new(ctx: &'a Context, name: &str) -> Result<Self, SyncError> {
        Ok(Self {
            ctx,
            descriptor: ctx.registry.lookup_secret(name)?,
            editor: DEFAULT_EDITOR.to_string(),
        })
    }

    /// Use `editor` for [`SecretsGuard::edit`].
    #[must_use]
    pub fn with_editor(mut self, editor: impl Into<String>) -> Self {
        self.editor = editor.into();
        self
    }

    fn system_path(&self) -> Result<PathBuf, SyncError> {
        self.ctx.paths.config_path(self.descriptor, Side::System)
    }

    fn mode_of(&self, path: PathBuf) -> ModeResource {
        ModeResource::secure(path, Arc::clone(&self.ctx.modes))
    }

    /// Apply `0600` to `path`.  Failure is a [`SyncError::Permission`]
    /// even when the content is already in place.
    fn secure(&self, path: &Path) -> Result<(), SyncError> {
        match self.mode_of(path.to_path_buf()).apply() {
            Ok(ResourceChange::Skipped { reason }) => {
                self.ctx.log.debug(&format!("mode not applied: {reason}"));
                Ok(())
            }
            Ok(ResourceChange::Applied | ResourceChange::AlreadyCorrect) => Ok(()),
            Err(e) => Err(SyncError::Permission {
                path: path.to_path_buf(),
                source: e
                    .downcast::<std::io::Error>()
                    .unwrap_or_else(|e| std::io::Error::other(format!("{e:#}"))),
            }),
        }
    }

    /// Inspect the system-side file.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be resolved or its mode read.
    pub fn state(&self) -> Result<SecretsState> {
        let path = self.system_path()?;
        Ok(match self.mode_of(path).current_state()? {
            ResourceState::Missing => SecretsState::Absent,
            ResourceState::Incorrect { current } => SecretsState::Insecure { mode: current },
            ResourceState::Correct => SecretsState::Secure,
            ResourceState::Invalid { reason } => {
                self.ctx.log.debug(&format!("mode check skipped: {reason}"));
                SecretsState::Secure
            }
        })
    }

    /// Copy the template to the system path and lock it down to `0600`.
    ///
    /// # Errors
    ///
    /// Returns the mirror error if the copy fails, or
    /// [`SyncError::Permission`] if the mode cannot be set (the copied file
    /// is left in place).
    pub fn init(&self) -> Result<InitOutcome> {
        let name = self.descriptor.name();
        let source = self.ctx.paths.config_path(self.descriptor, Side::Repo)?;
        let destination = self.system_path()?;

        let existed = destination.symlink_metadata().is_ok();
        if existed {
            self.ctx.log.warn(&format!(
                "Warning: Secrets file already exists at: {}",
                destination.display()
            ));
            if !self.ctx.prompt.confirm("Overwrite existing file?", false)? {
                self.ctx.log.info("Secrets initialization cancelled.");
                return Ok(InitOutcome::Cancelled);
            }
        }

        let job = MirrorJob {
            name,
            operation: Operation::Initialize,
            source: &source,
            destination: &destination,
            kind: Kind::File,
            excludes: &[],
        };
        self.ctx.mirror.mirror(&job, self.ctx.log.as_ref())?;
        self.secure(&destination)?;

        self.ctx.log.info("Secrets file initialized successfully!");
        self.ctx.log.info("Next steps:");
        self.ctx
            .log
            .info(&format!("  1. Edit the file: {}", destination.display()));
        self.ctx
            .log
            .info("  2. Replace placeholder values with your actual credentials");
        self.ctx
            .log
            .info("  3. The file is protected with 600 permissions (owner read/write only)");
        self.ctx.log.warn(&format!(
            "Never commit {} to version control; keep only the template ({}) in git",
            self.descriptor.system_path(),
            self.descriptor.repo_path()
        ));

        Ok(if existed {
            InitOutcome::Overwritten
        } else {
            InitOutcome::Created
        })
    }

    /// Report the file's location and mode, offering to fix an insecure mode.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Permission`] if an accepted fix fails.
    pub fn check(&self) -> Result<CheckOutcome> {
        let path = self.system_path()?;
        self.ctx.log.stage("Checking secrets file...");

        let state = self.state()?;
        if state == SecretsState::Absent {
            self.ctx
                .log
                .warn(&format!("Secrets file not found: {}", path.display()));
            self.ctx
                .log
                .info("Run `thunderize secrets init` to create it from template");
            return Ok(CheckOutcome::Absent);
        }

        self.ctx.log.info(&format!("  Location: {}", path.display()));
        let SecretsState::Insecure { mode } = state else {
            self.ctx.log.info(&format!("  Permissions: {SECURE_MODE:04o}"));
            self.ctx
                .log
                .info("Secrets file exists and has secure permissions!");
            return Ok(CheckOutcome::Secure);
        };

        self.ctx.log.info(&format!("  Permissions: {mode}"));
        self.ctx
            .log
            .warn("Warning: Secrets file has insecure permissions!");
        self.ctx
            .log
            .info("Recommended permissions: 0600 (owner read/write only)");
        if !self.ctx.prompt.confirm("Fix permissions now?", true)? {
            return Ok(CheckOutcome::LeftInsecure { mode });
        }
        self.secure(&path)?;
        self.ctx.log.info("Permissions updated to 0600");
        Ok(CheckOutcome::Fixed)
    }

    /// Open the secrets file in the configured editor, offering to create
    /// it first if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if initialization fails or the editor cannot be run
    /// or exits non-zero.
    pub fn edit(&self) -> Result<EditOutcome> {
        let path = self.system_path()?;
        if path.symlink_metadata().is_err() {
            self.ctx
                .log
                .warn(&format!("Secrets file not found: {}", path.display()));
            if !self.ctx.prompt.confirm("Initialize secrets file now?", true)? {
                return Ok(EditOutcome::Cancelled);
            }
            self.init()?;
        }

        self.ctx
            .log
            .info(&format!("Opening secrets file in {}", self.editor));
        // The editor value may carry its own arguments ("code --wait").
        let script = format!("{} \"$1\"", self.editor);
        let target = path.to_string_lossy();
        self.ctx
            .executor
            .run_interactive("sh", &["-c", script.as_str(), "sh", &*target])?;
        Ok(EditOutcome::Edited)
    }
}
