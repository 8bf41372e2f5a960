//! Top-level subcommand orchestration.
pub mod completions;
pub mod config;
pub mod secrets;
pub mod version;

use std::sync::Arc;

use anyhow::{Result, bail};

use crate::cli::GlobalOpts;
use crate::config::registry::Registry;
use crate::context::Context;
use crate::exec::{Executor, SystemExecutor};
use crate::logging::Log;
use crate::mirror::{self, Backend};
use crate::paths::PathResolver;
use crate::prompt::{AutoPrompt, Prompt, StdinPrompt};
use crate::resources::permissions::SystemModes;

/// Resolve the repository, load the catalog, and wire the collaborators
/// every command needs.
///
/// # Errors
///
/// Returns an error if the repository root cannot be determined, the
/// catalog file is invalid, or the `rsync` backend was requested but
/// `rsync` is not installed.
pub fn build_context(global: &GlobalOpts, log: Arc<dyn Log>) -> Result<Context> {
    let paths = PathResolver::from_override(global.root.clone());
    let root = paths.resolve_repo_root()?;
    log.debug(&format!("repository root: {}", root.display()));

    let registry = Registry::load(&root)?;
    log.debug(&format!(
        "{} configs, {} secrets",
        registry.all().len(),
        registry.secrets().len()
    ));

    let executor: Arc<dyn Executor> = Arc::new(SystemExecutor);
    if global.mirror == Backend::Rsync && !executor.which("rsync") {
        bail!("rsync backend selected but rsync was not found on PATH");
    }
    let mirror = mirror::build(global.mirror, Arc::clone(&executor));
    log.debug(&format!("mirror backend: {}", mirror.name()));

    let prompt: Arc<dyn Prompt> = if global.yes {
        Arc::new(AutoPrompt)
    } else {
        Arc::new(StdinPrompt)
    };

    Ok(Context {
        registry: Arc::new(registry),
        paths: Arc::new(paths),
        mirror,
        executor,
        prompt,
        log,
        modes: Arc::new(SystemModes),
        dry_run: global.dry_run,
    })
}
