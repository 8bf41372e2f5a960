//! Injected collaborators shared by every command.
use std::sync::Arc;

use crate::config::registry::Registry;
use crate::exec::Executor;
use crate::logging::Log;
use crate::mirror::Mirror;
use crate::paths::PathResolver;
use crate::prompt::Prompt;
use crate::resources::permissions::FileModes;

/// Collaborators shared by the sync engine and the secrets guard.
pub struct Context {
    /// Immutable config catalog.
    pub registry: Arc<Registry>,
    /// Repository and system path resolution.
    pub paths: Arc<PathResolver>,
    /// Copy backend.
    pub mirror: Arc<dyn Mirror>,
    /// External process runner (editor, rsync).
    pub executor: Arc<dyn Executor>,
    /// Yes/no confirmation source.
    pub prompt: Arc<dyn Prompt>,
    /// Logger for output and summary recording.
    pub log: Arc<dyn Log>,
    /// Permission-bit access for the secrets file.
    pub modes: Arc<dyn FileModes>,
    /// Preview deploy/backup without copying.
    pub dry_run: bool,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("registry", &self.registry)
            .field("paths", &self.paths)
            .field("mirror", &self.mirror.name())
            .field("executor", &"<dyn Executor>")
            .field("prompt", &"<dyn Prompt>")
            .field("log", &"<dyn Log>")
            .field("modes", &self.modes)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

/// Context builders shared by unit tests.
#[cfg(test)]
pub mod test_helpers {
    use super::Context;
    use crate::config::registry::Registry;
    use crate::exec::test_helpers::MockExecutor;
    use crate::logging::test_helpers::RecordingLog;
    use crate::mirror::NativeMirror;
    use crate::paths::{HomeSource, PathResolver, RootSource};
    use crate::prompt::test_helpers::ScriptedPrompt;
    use crate::resources::permissions::SystemModes;
    use std::path::Path;
    use std::sync::Arc;

    /// A context rooted at `root` with home `home`, the native mirror, and
    /// the given test doubles.
    #[must_use]
    pub fn make_context(
        registry: Registry,
        root: &Path,
        home: &Path,
        prompt: Arc<ScriptedPrompt>,
        executor: Arc<MockExecutor>,
        log: Arc<RecordingLog>,
    ) -> Context {
        Context {
            registry: Arc::new(registry),
            paths: Arc::new(PathResolver::new(
                RootSource::Fixed(root.to_path_buf()),
                HomeSource::Fixed(home.to_path_buf()),
            )),
            mirror: Arc::new(NativeMirror),
            executor,
            prompt,
            log,
            modes: Arc::new(SystemModes),
            dry_run: false,
        }
    }
}
