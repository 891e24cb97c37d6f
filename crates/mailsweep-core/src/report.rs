//! Per-message outcomes and the final run report.

use crate::plan::MessageDescriptor;

/// What happened to one planned message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// Marked for deletion and expunged.
    Deleted,
    /// Deletion failed; the reason is preserved verbatim.
    Failed(String),
    /// Dry-run mode: no mutating call was issued.
    SkippedDryRun,
    /// The run was cancelled before this message's batch.
    SkippedCancelled,
}

/// How the run as a whole ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// Every batch was processed.
    Completed,
    /// The caller cancelled between batches.
    Cancelled,
    /// A fatal error stopped the run; completed work is still reported.
    Failed(String),
}

/// Final tally of a run. Created at run end; immutable.
#[derive(Debug, Clone)]
pub struct Report {
    /// Folder the run operated on.
    pub folder: String,
    /// Messages in the folder when it was selected.
    pub total_examined: u32,
    /// Messages matched by the search.
    pub total_matched: usize,
    /// Outcome per planned message, in plan order. Messages never reached
    /// because of a fatal error carry no outcome.
    pub outcomes: Vec<(MessageDescriptor, ExecutionOutcome)>,
    /// How the run ended.
    pub status: RunStatus,
    /// Surfaced when the search predicate lost sub-day precision.
    pub truncation_note: Option<String>,
}

impl Report {
    /// Number of messages deleted.
    #[must_use]
    pub fn deleted_count(&self) -> usize {
        self.count(|o| matches!(o, ExecutionOutcome::Deleted))
    }

    /// Number of messages whose deletion failed.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.count(|o| matches!(o, ExecutionOutcome::Failed(_)))
    }

    /// Number of messages skipped (dry-run or cancellation).
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.count(|o| {
            matches!(
                o,
                ExecutionOutcome::SkippedDryRun | ExecutionOutcome::SkippedCancelled
            )
        })
    }

    /// Failures in plan order, with their reasons.
    pub fn failures(&self) -> impl Iterator<Item = (&MessageDescriptor, &str)> {
        self.outcomes.iter().filter_map(|(descriptor, outcome)| {
            if let ExecutionOutcome::Failed(reason) = outcome {
                Some((descriptor, reason.as_str()))
            } else {
                None
            }
        })
    }

    /// True when the run completed with no per-message failures.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.status == RunStatus::Completed && self.failed_count() == 0
    }

    fn count(&self, matcher: impl Fn(&ExecutionOutcome) -> bool) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| matcher(outcome))
            .count()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::plan::Metadata;
    use mailsweep_imap::Uid;

    fn descriptor(n: u32) -> MessageDescriptor {
        MessageDescriptor {
            uid: Uid::new(n).unwrap(),
            metadata: Metadata::Unavailable {
                reason: "test".to_string(),
            },
        }
    }

    fn report(outcomes: Vec<(MessageDescriptor, ExecutionOutcome)>, status: RunStatus) -> Report {
        Report {
            folder: "INBOX".to_string(),
            total_examined: 10,
            total_matched: outcomes.len(),
            outcomes,
            status,
            truncation_note: None,
        }
    }

    #[test]
    fn counts_and_failures() {
        let r = report(
            vec![
                (descriptor(1), ExecutionOutcome::Deleted),
                (descriptor(2), ExecutionOutcome::Failed("boom".to_string())),
                (descriptor(3), ExecutionOutcome::SkippedCancelled),
            ],
            RunStatus::Cancelled,
        );
        assert_eq!(r.deleted_count(), 1);
        assert_eq!(r.failed_count(), 1);
        assert_eq!(r.skipped_count(), 1);

        let failures: Vec<_> = r.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].1, "boom");
        assert!(!r.is_clean());
    }

    #[test]
    fn clean_run() {
        let r = report(
            vec![(descriptor(1), ExecutionOutcome::Deleted)],
            RunStatus::Completed,
        );
        assert!(r.is_clean());
    }

    #[test]
    fn failed_status_is_not_clean() {
        let r = report(
            vec![(descriptor(1), ExecutionOutcome::Deleted)],
            RunStatus::Failed("connection lost".to_string()),
        );
        assert!(!r.is_clean());
    }
}
