use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use thunderize_cli::cli::{Cli, Command};
use thunderize_cli::{commands, logging};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();

    match args.command {
        Command::Config(command) => {
            let log = init_logging(args.verbose, "config");
            commands::config::run(&args.global, &command, &log)
        }
        Command::Secrets(command) => {
            let log = init_logging(args.verbose, "secrets");
            commands::secrets::run(&args.global, command, &log)
        }
        Command::Completions { shell } => {
            commands::completions::run(shell);
            Ok(())
        }
        Command::Version => {
            commands::version::run();
            Ok(())
        }
    }
}

fn init_logging(verbose: bool, command: &str) -> Arc<logging::Logger> {
    logging::init_subscriber(verbose, command);
    Arc::new(logging::Logger::new(command))
}
