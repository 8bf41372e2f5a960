//! Per-config outcomes of sync operations.
use crate::logging::EntryStatus;

/// What happened to one config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Mirrored successfully.
    Success,
    /// Deliberately not synced.
    Skipped(String),
    /// Dry run: the source exists and would have been mirrored.
    DryRun,
    /// The sync failed; holds the rendered error.
    Failed(String),
}

impl SyncOutcome {
    /// Summary status for this outcome.
    #[must_use]
    pub const fn status(&self) -> EntryStatus {
        match self {
            Self::Success => EntryStatus::Ok,
            Self::Skipped(_) => EntryStatus::Skipped,
            Self::DryRun => EntryStatus::DryRun,
            Self::Failed(_) => EntryStatus::Failed,
        }
    }

    /// Detail shown next to the summary line.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Skipped(msg) | Self::Failed(msg) => Some(msg),
            Self::Success | Self::DryRun => None,
        }
    }
}

/// Outcome for a named config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigResult {
    /// Config name as registered.
    pub name: String,
    /// What happened.
    pub outcome: SyncOutcome,
}

/// Ordered outcomes of a bulk operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkReport {
    /// One entry per attempted config, in catalog order.
    pub results: Vec<ConfigResult>,
}

impl BulkReport {
    pub(crate) fn push(&mut self, name: &str, outcome: SyncOutcome) {
        self.results.push(ConfigResult {
            name: name.to_string(),
            outcome,
        });
    }

    /// `true` if no attempted config failed.
    #[must_use]
    pub fn ok(&self) -> bool {
        !self
            .results
            .iter()
            .any(|r| matches!(r.outcome, SyncOutcome::Failed(_)))
    }

    /// Names of the configs that failed, in order.
    #[must_use]
    pub fn failed(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, SyncOutcome::Failed(_)))
            .map(|r| r.name.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report_is_ok() {
        assert!(BulkReport::default().ok());
    }

    #[test]
    fn failed_lists_only_failures() {
        let mut report = BulkReport::default();
        report.push("neovim", SyncOutcome::Success);
        report.push("zsh", SyncOutcome::Failed("zsh config not found".into()));
        report.push("asdf", SyncOutcome::DryRun);
        assert!(!report.ok());
        assert_eq!(report.failed(), ["zsh"]);
    }

    #[test]
    fn outcome_maps_to_summary_status() {
        assert_eq!(SyncOutcome::Success.status(), EntryStatus::Ok);
        assert_eq!(SyncOutcome::DryRun.status(), EntryStatus::DryRun);
        let skipped = SyncOutcome::Skipped("not on this system".into());
        assert_eq!(skipped.status(), EntryStatus::Skipped);
        assert_eq!(skipped.message(), Some("not on this system"));
        assert_eq!(SyncOutcome::Success.message(), None);
    }
}
