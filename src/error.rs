//! Domain-specific error types for the synchronization engine.
//!
//! Library operations return [`SyncError`]; command handlers at the CLI
//! boundary convert it to [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error taxonomy
//!
//! ```text
//! SyncError
//! ├── Path           : home or executable location unresolvable
//! ├── NotFound       : unknown config name
//! ├── SourceMissing  : sync attempted from a nonexistent source
//! ├── Mirror         : underlying copy failed (diagnostic kept verbatim)
//! ├── Validation     : aggregated list of configs missing from the repo
//! ├── Permission     : secure mode could not be set on the secrets file
//! ├── Catalog        : invalid catalog file
//! └── Io             : any other filesystem failure
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by path resolution, mirroring, and the sync engine.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The home directory or the executable location could not be resolved.
    #[error("path resolution failed: {0}")]
    Path(String),

    /// No config with the requested name is registered.
    #[error("unknown config: {0}")]
    NotFound(String),

    /// The source side of a sync does not exist.
    #[error("{name} config not found at {}", path.display())]
    SourceMissing {
        /// Name of the config being synced.
        name: String,
        /// Source path that was expected to exist.
        path: PathBuf,
    },

    /// The copy itself failed; `detail` is the backend's diagnostic output.
    #[error("mirror failed for {name}: {detail}")]
    Mirror {
        /// Name of the config being synced.
        name: String,
        /// Raw diagnostic text from the copy backend.
        detail: String,
    },

    /// One or more configs are missing from the repository.
    #[error("some configurations are missing from the repo: {}", missing.join(", "))]
    Validation {
        /// Names of every config whose repository-side path is absent.
        missing: Vec<String>,
    },

    /// Setting restrictive permissions failed.
    #[error("failed to set secure permissions on {}: {source}", path.display())]
    Permission {
        /// File whose mode could not be changed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The catalog file is malformed or violates a catalog invariant.
    #[error("invalid config catalog: {0}")]
    Catalog(String),

    /// Any other I/O failure.
    #[error("{context}: {source}")]
    Io {
        /// What was being attempted.
        context: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

impl SyncError {
    /// Wrap an I/O error with a short description of the failed action.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}
