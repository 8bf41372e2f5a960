//! Command: `config deploy|backup|list|validate|status`.
use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::{Context as _, Result};

use crate::cli::{ConfigCommand, GlobalOpts, target};
use crate::logging::{Log, Logger};
use crate::sync::{ConfigListing, ConfigStatus, DriftState, SyncEngine};

/// Run a `config` subcommand.
///
/// # Errors
///
/// Returns an error if setup fails, a single-config sync fails, a bulk
/// deploy stops on a failure, or validation finds missing configs.
pub fn run(global: &GlobalOpts, command: &ConfigCommand, log: &Arc<Logger>) -> Result<()> {
    let ctx = super::build_context(global, Arc::clone(log) as Arc<dyn Log>)?;
    let engine = SyncEngine::new(&ctx);

    match command {
        ConfigCommand::Deploy { name } => {
            if let Some(name) = target(name.as_deref()) {
                engine.deploy_one(name)?;
            } else {
                let result = engine.deploy_all();
                log.print_summary();
                result?;
            }
        }
        ConfigCommand::Backup { name } => {
            if let Some(name) = target(name.as_deref()) {
                engine.backup_one(name)?;
            } else {
                let report = engine.backup_all();
                log.print_summary();
                let failed = report.failed();
                if !failed.is_empty() {
                    log.warn(&format!(
                        "{} config(s) could not be backed up: {}",
                        failed.len(),
                        failed.join(", ")
                    ));
                }
            }
        }
        ConfigCommand::List { json } => {
            let listing = engine.list_all();
            let rendered = if *json {
                serde_json::to_string_pretty(&listing).context("serializing config list")?
            } else {
                render_listing(&listing)
            };
            print_stdout(&rendered);
        }
        ConfigCommand::Validate => engine.validate_all()?,
        ConfigCommand::Status { name } => {
            let statuses = match target(name.as_deref()) {
                Some(name) => vec![engine.status_one(name)?],
                None => engine.status_all()?,
            };
            log.stage("Config status");
            for status in &statuses {
                log.info(&render_status(status));
            }
            let in_sync = statuses
                .iter()
                .filter(|s| s.state == DriftState::InSync)
                .count();
            log.info(&format!("{in_sync} of {} configs in sync", statuses.len()));
        }
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_stdout(text: &str) {
    println!("{text}");
}

/// Aligned table of registered configs.
#[must_use]
pub fn render_listing(listing: &[ConfigListing]) -> String {
    let width = listing
        .iter()
        .map(|l| l.name.len())
        .max()
        .unwrap_or(0)
        .max("NAME".len());
    let mut out = format!("{:<width$}  {:<9}  {}\n", "NAME", "KIND", "REPO -> SYSTEM");
    for l in listing {
        let _ = writeln!(
            out,
            "{:<width$}  {:<9}  {} -> {}",
            l.name,
            l.kind.to_string(),
            l.repo_path,
            l.system_path
        );
    }
    out.truncate(out.trim_end().len());
    out
}

fn render_status(status: &ConfigStatus) -> String {
    let icon = match status.state {
        DriftState::InSync => "✓",
        DriftState::Drifted => "~",
        DriftState::MissingRepo | DriftState::MissingSystem => "○",
        DriftState::MissingBoth => "✗",
    };
    format!("{icon} {}: {}", status.name, status.state)
}
