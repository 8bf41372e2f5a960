//! Core logging types: summary entries, status, and the [`Log`] trait.

/// Per-config result for summary reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryEntry {
    /// Config name.
    pub name: String,
    /// Final status.
    pub status: EntryStatus,
    /// Optional detail (skip reason or error description).
    pub message: Option<String>,
}

/// Status of one config within a bulk operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    /// Synced successfully.
    Ok,
    /// Deliberately not synced.
    Skipped,
    /// Previewed only; nothing was copied.
    DryRun,
    /// Sync failed.
    Failed,
}

impl EntryStatus {
    /// Summary icon.
    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Ok => "✓",
            Self::Skipped => "○",
            Self::DryRun => "~",
            Self::Failed => "✗",
        }
    }
}

/// Abstraction over logging backends.
///
/// The engine logs only through this trait so tests can inspect what was
/// reported without capturing the terminal.
pub trait Log: Send + Sync + std::fmt::Debug {
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a debug message (suppressed on console unless verbose).
    fn debug(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
    /// Log a dry-run action message.
    fn dry_run(&self, msg: &str);
    /// Record a per-config result for the summary.
    fn record_entry(&self, name: &str, status: EntryStatus, message: Option<&str>);
}
