//! Resolution of a config's repository and system locations.
//!
//! Nothing here is cached: the repository root and the home directory are
//! read again on every call, so a descriptor's system path always reflects
//! the environment at the moment of the operation.
use std::path::{Path, PathBuf};

use crate::config::{ConfigDescriptor, Side};
use crate::error::SyncError;

/// Where the repository root comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootSource {
    /// Parent of the directory holding the running executable
    /// (`<root>/bin/thunderize` -> `<root>`).
    Executable,
    /// An explicit directory (from `--root` or `THUNDERIZE_ROOT`).
    Fixed(PathBuf),
}

/// Where the home directory comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HomeSource {
    /// `HOME` (or `USERPROFILE` on Windows), read at call time.
    Environment,
    /// An explicit directory.
    Fixed(PathBuf),
}

/// Resolves repository and system paths for config descriptors.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: RootSource,
    home: HomeSource,
}

impl PathResolver {
    /// Create a resolver from explicit sources.
    #[must_use]
    pub const fn new(root: RootSource, home: HomeSource) -> Self {
        Self { root, home }
    }

    /// Resolver used by the CLI: root from `root_override` if given,
    /// otherwise from the executable's location; home from the environment.
    #[must_use]
    pub fn from_override(root_override: Option<PathBuf>) -> Self {
        let root = root_override.map_or(RootSource::Executable, |root| {
            RootSource::Fixed(dunce::canonicalize(&root).unwrap_or(root))
        });
        Self::new(root, HomeSource::Environment)
    }

    /// Resolve the repository root.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Path`] if the executable's own path cannot be
    /// determined or has no grandparent directory.
    pub fn resolve_repo_root(&self) -> Result<PathBuf, SyncError> {
        match &self.root {
            RootSource::Fixed(root) => Ok(root.clone()),
            RootSource::Executable => {
                let exe = std::env::current_exe().map_err(|e| {
                    SyncError::Path(format!("failed to get executable path: {e}"))
                })?;
                exe.parent()
                    .and_then(Path::parent)
                    .map(Path::to_path_buf)
                    .ok_or_else(|| {
                        SyncError::Path(format!(
                            "executable has no repository root above it: {}",
                            exe.display()
                        ))
                    })
            }
        }
    }

    /// Resolve the invoking user's home directory.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Path`] if the home directory is not set.
    pub fn resolve_home(&self) -> Result<PathBuf, SyncError> {
        match &self.home {
            HomeSource::Fixed(home) => Ok(home.clone()),
            HomeSource::Environment => {
                let var = if cfg!(target_os = "windows") {
                    std::env::var_os("USERPROFILE").or_else(|| std::env::var_os("HOME"))
                } else {
                    std::env::var_os("HOME")
                };
                var.filter(|v| !v.is_empty())
                    .map(PathBuf::from)
                    .ok_or_else(|| {
                        SyncError::Path("failed to get home directory: HOME is not set".into())
                    })
            }
        }
    }

    /// Expand a leading `~` to the home directory.
    ///
    /// `~` maps to the home directory itself and `~/x` to `home/x`.  Paths
    /// not starting with `~` are returned unchanged without consulting the
    /// home directory.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Path`] only if expansion is needed and the home
    /// directory cannot be resolved.
    pub fn expand(&self, path: &str) -> Result<PathBuf, SyncError> {
        let Some(rest) = path.strip_prefix('~') else {
            return Ok(PathBuf::from(path));
        };
        let home = self.resolve_home()?;
        let rest = rest.trim_start_matches(['/', '\\']);
        if rest.is_empty() {
            Ok(home)
        } else {
            Ok(home.join(rest))
        }
    }

    /// Resolve one side of a descriptor to an absolute path.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Path`] if the root or home cannot be resolved.
    pub fn config_path(
        &self,
        descriptor: &ConfigDescriptor,
        side: Side,
    ) -> Result<PathBuf, SyncError> {
        match side {
            Side::Repo => Ok(self.resolve_repo_root()?.join(descriptor.repo_path())),
            Side::System => self.expand(descriptor.system_path()),
        }
    }
}
