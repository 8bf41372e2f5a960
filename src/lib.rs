//! Config synchronization engine.
//!
//! Keeps a set of named configuration artifacts (editor config, shell rc
//! file, terminal theme, tool-version pins) identical between a source
//! repository and their locations on the local machine, plus a guarded
//! secrets file that is only ever created from a template with mode `0600`.
//!
//! The public API is organised in layers:
//!
//! - **[`config`]**: config descriptors and the immutable catalog
//! - **[`paths`]**: repository root, home directory, and `~` expansion
//! - **[`mirror`]**: the one-way copy primitive and its backends
//! - **[`sync`]**: deploy, backup, validate, list, and drift status
//! - **[`secrets`]**: init, check, and edit for the secrets file
//! - **[`commands`]**: subcommand orchestration for the `thunderize` binary
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod exec;
pub mod logging;
pub mod mirror;
pub mod paths;
pub mod prompt;
pub mod resources;
pub mod secrets;
pub mod sync;
