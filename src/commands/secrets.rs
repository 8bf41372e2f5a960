//! Command: `secrets init|check|edit`.
use std::sync::Arc;

use anyhow::Result;

use crate::cli::{GlobalOpts, SecretsCommand};
use crate::config::ConfigDescriptor;
use crate::config::registry::ZSH_SECRETS;
use crate::logging::{Log, Logger};
use crate::secrets::{SecretsGuard, editor_from_env};

/// Run a `secrets` subcommand against the first registered secret config.
///
/// # Errors
///
/// Returns an error if setup fails, the template cannot be copied, secure
/// permissions cannot be applied, or the editor fails.
pub fn run(global: &GlobalOpts, command: SecretsCommand, log: &Arc<Logger>) -> Result<()> {
    let ctx = super::build_context(global, Arc::clone(log) as Arc<dyn Log>)?;
    let name = ctx
        .registry
        .secrets()
        .first()
        .map_or(ZSH_SECRETS, ConfigDescriptor::name);
    let guard = SecretsGuard::new(&ctx, name)?;

    match command {
        SecretsCommand::Init => {
            guard.init()?;
        }
        SecretsCommand::Check => {
            guard.check()?;
        }
        SecretsCommand::Edit => {
            guard.with_editor(editor_from_env()).edit()?;
        }
    }
    Ok(())
}
