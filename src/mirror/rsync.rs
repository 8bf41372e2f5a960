//! Mirror backend delegating to the external `rsync` tool.
use std::path::Path;
use std::sync::Arc;

use anyhow::{Result, bail};

use super::{ExcludeSet, Mirror};
use crate::exec::Executor;

/// Mirror backend that shells out to `rsync -a`.
#[derive(Debug, Clone)]
pub struct RsyncMirror {
    executor: Arc<dyn Executor>,
}

impl RsyncMirror {
    /// Create a backend that runs `rsync` through `executor`.
    #[must_use]
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self { executor }
    }

    fn run(&self, args: &[String]) -> Result<()> {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let result = self.executor.run_unchecked("rsync", &args)?;
        if !result.success {
            bail!(
                "rsync failed (exit {}):\n{}",
                result.code.unwrap_or(-1),
                result.combined_output().trim_end()
            );
        }
        Ok(())
    }
}

/// `path` with a trailing separator, so rsync copies the directory's
/// contents rather than the directory itself.
fn with_trailing_slash(path: &Path) -> String {
    let mut s = path.display().to_string();
    if !s.ends_with('/') {
        s.push('/');
    }
    s
}

impl Mirror for RsyncMirror {
    fn name(&self) -> &'static str {
        "rsync"
    }

    fn copy_file(&self, source: &Path, destination: &Path) -> Result<()> {
        self.run(&[
            "-a".to_string(),
            source.display().to_string(),
            destination.display().to_string(),
        ])
    }

    fn copy_tree(&self, source: &Path, destination: &Path, excludes: &ExcludeSet) -> Result<()> {
        let mut args = vec!["-a".to_string(), "--delete".to_string()];
        args.extend(excludes.patterns().iter().map(|p| format!("--exclude={p}")));
        args.push(with_trailing_slash(source));
        args.push(with_trailing_slash(destination));
        self.run(&args)
    }
}
