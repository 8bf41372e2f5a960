//! Unix permission bits, read and written through an injectable
//! [`FileModes`] so tests can simulate a failing `chmod`.
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{Resource, ResourceChange, ResourceState};

/// Owner read/write only.
pub const SECURE_MODE: u32 = 0o600;

/// Access to file permission bits.
pub trait FileModes: Send + Sync + std::fmt::Debug {
    /// Current permission bits of `path`, or `None` where the platform has
    /// no Unix modes.
    ///
    /// # Errors
    ///
    /// Returns an error if the file's metadata cannot be read.
    fn mode(&self, path: &Path) -> std::io::Result<Option<u32>>;

    /// Set `path`'s permission bits to `mode`.
    ///
    /// # Errors
    ///
    /// Returns the raw I/O error so callers can classify it.
    fn set_mode(&self, path: &Path, mode: u32) -> std::io::Result<()>;
}

/// [`FileModes`] backed by the real filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemModes;

impl FileModes for SystemModes {
    fn mode(&self, path: &Path) -> std::io::Result<Option<u32>> {
        current_mode(path)
    }

    fn set_mode(&self, path: &Path, mode: u32) -> std::io::Result<()> {
        set_mode(path, mode)
    }
}

/// A single file's permission bits.
#[derive(Debug, Clone)]
pub struct ModeResource {
    /// Target file path (absolute).
    pub target: PathBuf,
    /// Desired permission bits, e.g. `0o600`.
    pub mode: u32,
    modes: Arc<dyn FileModes>,
}

impl ModeResource {
    /// Create a new mode resource.
    #[must_use]
    pub fn new(target: PathBuf, mode: u32, modes: Arc<dyn FileModes>) -> Self {
        Self {
            target,
            mode,
            modes,
        }
    }

    /// Owner-only (`0600`) mode for `target`.
    #[must_use]
    pub fn secure(target: PathBuf, modes: Arc<dyn FileModes>) -> Self {
        Self::new(target, SECURE_MODE, modes)
    }
}

/// Current permission bits of `path`, or `None` where the platform has no
/// Unix modes.
///
/// # Errors
///
/// Returns an error if the file's metadata cannot be read.
pub fn current_mode(path: &Path) -> std::io::Result<Option<u32>> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        Ok(Some(std::fs::metadata(path)?.permissions().mode() & 0o7777))
    }

    #[cfg(not(unix))]
    {
        std::fs::metadata(path)?;
        Ok(None)
    }
}

/// Set `path`'s permission bits to `mode`.  A no-op without Unix modes.
///
/// # Errors
///
/// Returns the raw I/O error so callers can classify it.
pub fn set_mode(path: &Path, mode: u32) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
    }

    #[cfg(not(unix))]
    {
        let _ = (path, mode);
        Ok(())
    }
}

impl Resource for ModeResource {
    fn current_state(&self) -> Result<ResourceState> {
        if !self.target.exists() {
            return Ok(ResourceState::Missing);
        }
        let mode = self
            .modes
            .mode(&self.target)
            .with_context(|| format!("read permissions: {}", self.target.display()))?;
        Ok(match mode {
            Some(current) if current == self.mode => ResourceState::Correct,
            Some(current) => ResourceState::Incorrect {
                current: format!("{current:04o}"),
            },
            None => ResourceState::Invalid {
                reason: "file modes not supported on this platform".to_string(),
            },
        })
    }

    fn apply(&self) -> Result<ResourceChange> {
        match self.current_state()? {
            ResourceState::Correct => Ok(ResourceChange::AlreadyCorrect),
            ResourceState::Invalid { reason } => Ok(ResourceChange::Skipped { reason }),
            ResourceState::Missing | ResourceState::Incorrect { .. } => {
                self.modes
                    .set_mode(&self.target, self.mode)
                    .with_context(|| format!("set permissions: {}", self.target.display()))?;
                Ok(ResourceChange::Applied)
            }
        }
    }
}

/// Test doubles for [`FileModes`].
#[cfg(test)]
pub mod test_helpers {
    use super::{FileModes, current_mode};
    use std::path::Path;

    /// Reads real modes but refuses every `set_mode`.
    #[derive(Debug, Default)]
    pub struct ReadOnlyModes;

    impl FileModes for ReadOnlyModes {
        fn mode(&self, path: &Path) -> std::io::Result<Option<u32>> {
            current_mode(path)
        }

        fn set_mode(&self, _: &Path, _: u32) -> std::io::Result<()> {
            Err(std::io::Error::from(std::io::ErrorKind::PermissionDenied))
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::test_helpers::ReadOnlyModes;
    use super::*;

    fn secure(target: PathBuf) -> ModeResource {
        ModeResource::secure(target, Arc::new(SystemModes))
    }

    #[test]
    fn missing_when_target_absent() {
        let dir = tempfile::tempdir().unwrap();
        let resource = secure(dir.path().join("nonexistent"));
        assert_eq!(resource.current_state().unwrap(), ResourceState::Missing);
    }

    #[cfg(unix)]
    #[test]
    fn detects_correct_mode() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("secrets");
        std::fs::write(&file, "x").unwrap();
        set_mode(&file, 0o600).unwrap();
        assert_eq!(secure(file).current_state().unwrap(), ResourceState::Correct);
    }

    #[cfg(unix)]
    #[test]
    fn detects_incorrect_mode() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("secrets");
        std::fs::write(&file, "x").unwrap();
        set_mode(&file, 0o644).unwrap();
        match secure(file).current_state().unwrap() {
            ResourceState::Incorrect { current } => assert_eq!(current, "0644"),
            other => panic!("expected Incorrect, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn apply_sets_mode() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("secrets");
        std::fs::write(&file, "x").unwrap();
        set_mode(&file, 0o644).unwrap();

        let resource = secure(file.clone());
        assert_eq!(resource.apply().unwrap(), ResourceChange::Applied);
        assert_eq!(current_mode(&file).unwrap(), Some(0o600));
        assert_eq!(resource.apply().unwrap(), ResourceChange::AlreadyCorrect);
    }

    #[cfg(unix)]
    #[test]
    fn apply_surfaces_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("secrets");
        std::fs::write(&file, "x").unwrap();
        set_mode(&file, 0o644).unwrap();

        let resource = ModeResource::secure(file.clone(), Arc::new(ReadOnlyModes));
        let err = resource.apply().unwrap_err();

        let io = err.downcast_ref::<std::io::Error>().unwrap();
        assert_eq!(io.kind(), std::io::ErrorKind::PermissionDenied);
        assert_eq!(current_mode(&file).unwrap(), Some(0o644));
    }
}
