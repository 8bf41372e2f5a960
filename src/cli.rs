//! Command-line surface: global options and the `config` and `secrets` subcommand trees.
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

use crate::mirror::Backend;

/// Top-level CLI entry point for the config synchronization engine.
#[derive(Parser, Debug)]
#[command(
    name = "thunderize",
    about = "Keep development environment configs in sync with a repository",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone)]
pub struct GlobalOpts {
    /// Override the repository root directory
    #[arg(long, global = true, env = "THUNDERIZE_ROOT")]
    pub root: Option<PathBuf>,

    /// Copy backend used for deploy, backup, and secrets init
    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = Backend::Native,
        env = "THUNDERIZE_MIRROR"
    )]
    pub mirror: Backend,

    /// Preview deploy/backup without copying anything
    #[arg(short = 'd', long, global = true)]
    pub dry_run: bool,

    /// Answer every confirmation with its default
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Deploy, back up, and inspect configs
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Manage the secrets file
    #[command(subcommand)]
    Secrets(SecretsCommand),
    /// Generate a shell completion script
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
    /// Print version information
    Version,
}

/// `config` subcommands.  A missing name means `all`.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Copy configs from the repository to the system
    Deploy {
        /// Config name, or `all`
        name: Option<String>,
    },
    /// Copy configs from the system back into the repository
    Backup {
        /// Config name, or `all`
        name: Option<String>,
    },
    /// List registered configs
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Check that every config exists in the repository
    Validate,
    /// Show which configs differ between repository and system
    Status {
        /// Config name, or `all`
        name: Option<String>,
    },
}

/// `secrets` subcommands.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretsCommand {
    /// Create the secrets file from its template
    Init,
    /// Check that the secrets file exists with mode 0600
    Check,
    /// Open the secrets file in $EDITOR
    Edit,
}

/// Resolve an optional name argument, where absence means `all`.
#[must_use]
pub fn target(name: Option<&str>) -> Option<&str> {
    name.filter(|n| !n.eq_ignore_ascii_case("all"))
}
