//! Location of the per-command log file and the clock used to stamp it.
use std::fmt;
use std::fs::File;
use std::io::Write as _;
use std::path::PathBuf;

use chrono::{SecondsFormat, Utc};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;

/// Overrides the log directory outright.
const LOG_DIR_ENV: &str = "THUNDERIZE_LOG_DIR";

/// Resolve the log directory from `var`.
///
/// `THUNDERIZE_LOG_DIR` wins; otherwise `$XDG_CACHE_HOME/thunderize`, then
/// `~/.cache/thunderize`.  Empty values count as unset.
pub(super) fn log_dir_with(var: impl Fn(&str) -> Option<String>) -> PathBuf {
    let var = |name: &str| var(name).filter(|v| !v.is_empty());
    if let Some(dir) = var(LOG_DIR_ENV) {
        return PathBuf::from(dir);
    }
    let cache = var("XDG_CACHE_HOME").map_or_else(
        || {
            var("HOME")
                .or_else(|| var("USERPROFILE"))
                .map_or_else(|| PathBuf::from("."), PathBuf::from)
                .join(".cache")
        },
        PathBuf::from,
    );
    cache.join("thunderize")
}

/// `<log dir>/<command>.log` for the current environment.
pub(super) fn log_file_path(command: &str) -> PathBuf {
    log_dir_with(|name| std::env::var(name).ok()).join(format!("{command}.log"))
}

/// Truncate the log for `command` and write its run header.
///
/// Returns `None` when the file cannot be created; logging then stays
/// console-only.
pub(super) fn open_log_file(command: &str) -> Option<File> {
    let path = log_file_path(command);
    std::fs::create_dir_all(path.parent()?).ok()?;
    let mut file = File::create(&path).ok()?;
    writeln!(file, "{}", run_header(command)).ok()?;
    Some(file)
}

fn run_header(command: &str) -> String {
    let version =
        option_env!("THUNDERIZE_VERSION").unwrap_or(concat!("dev-", env!("CARGO_PKG_VERSION")));
    format!(
        "# thunderize {version} `{command}` started {}",
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
    )
}

/// Millisecond UTC wall clock (`HH:MM:SS.mmm`) for log lines.
#[derive(Debug, Default, Clone, Copy)]
pub(super) struct UtcClock;

impl FormatTime for UtcClock {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{}", Utc::now().format("%H:%M:%S%.3f"))
    }
}
