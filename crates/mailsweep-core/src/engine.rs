//! Plan execution: batching, reconnect-and-resume, cancellation.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use mailsweep_imap::Uid;

use crate::error::SessionError;
use crate::plan::{DeletionPlan, MessageDescriptor};
use crate::report::{ExecutionOutcome, Report, RunStatus};
use crate::session::{FolderHandle, MailboxSession};

/// Default number of messages marked and expunged per round trip.
///
/// Sized to stay well under typical server command-size and time limits;
/// override through [`ExecuteOptions`] rather than editing.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Tunables for one execution pass.
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Report what would be deleted without issuing mutating calls.
    pub dry_run: bool,
    /// Messages per mark/expunge round trip.
    pub batch_size: usize,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Shareable flag for requesting cancellation between batches.
///
/// Cancellation is honored at batch boundaries only; a batch in flight
/// completes before the remaining messages are skipped.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a token in the not-cancelled state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Returns true once cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Executes a deletion plan and always produces a report.
///
/// Messages are processed in fixed-size batches: one batched
/// mark-for-deletion, then an expunge. A per-message or per-batch server
/// rejection is recorded and the run continues. A connection loss (or
/// timeout) gets exactly one reconnect-and-resume: re-authenticate,
/// re-select the folder, retry the *current* batch; a second consecutive
/// loss on the same batch ends the run as [`RunStatus::Failed`] with
/// everything completed so far in the report.
pub async fn execute<S: MailboxSession>(
    session: &mut S,
    plan: DeletionPlan,
    options: &ExecuteOptions,
    cancel: &CancelToken,
) -> Report {
    let total_examined = plan.total_examined();
    let total_matched = plan.total_matched();
    let (folder, descriptors, truncation_note) = plan.into_parts();
    let folder_name = folder.name().to_string();

    let mut outcomes = Vec::with_capacity(descriptors.len());

    if options.dry_run {
        for descriptor in descriptors {
            tracing::info!("would delete: {}", descriptor.describe());
            outcomes.push((descriptor, ExecutionOutcome::SkippedDryRun));
        }
        return Report {
            folder: folder_name,
            total_examined,
            total_matched,
            outcomes,
            status: RunStatus::Completed,
            truncation_note,
        };
    }

    let batch_size = options.batch_size.max(1);
    let mut queue: VecDeque<MessageDescriptor> = descriptors.into();
    let mut handle = folder;
    let mut status = RunStatus::Completed;
    let mut batch_index = 0usize;

    'run: while !queue.is_empty() {
        if cancel.is_cancelled() {
            tracing::info!(remaining = queue.len(), "cancelled; skipping remaining messages");
            while let Some(descriptor) = queue.pop_front() {
                outcomes.push((descriptor, ExecutionOutcome::SkippedCancelled));
            }
            status = RunStatus::Cancelled;
            break;
        }

        let take = batch_size.min(queue.len());
        let batch: Vec<MessageDescriptor> = queue.drain(..take).collect();
        batch_index += 1;
        tracing::info!(
            batch = batch_index,
            size = batch.len(),
            remaining = queue.len(),
            "processing batch"
        );

        let mut reconnected = false;
        let batch_outcomes = loop {
            match run_batch(session, &handle, &batch).await {
                Ok(batch_outcomes) => break batch_outcomes,
                Err(e) if reconnected => {
                    tracing::error!(error = %e, "second connection loss on the same batch");
                    status = RunStatus::Failed(e.to_string());
                    break 'run;
                }
                Err(e) => {
                    reconnected = true;
                    tracing::warn!(error = %e, "connection lost mid-batch; reconnecting");
                    match reconnect(session, handle.name()).await {
                        Ok(new_handle) => handle = new_handle,
                        Err(re) => {
                            tracing::error!(error = %re, "reconnect failed");
                            status = RunStatus::Failed(re.to_string());
                            break 'run;
                        }
                    }
                }
            }
        };

        for (descriptor, outcome) in batch.into_iter().zip(batch_outcomes) {
            outcomes.push((descriptor, outcome));
        }
    }

    tracing::info!(
        folder = %folder_name,
        deleted = outcomes
            .iter()
            .filter(|(_, o)| matches!(o, ExecutionOutcome::Deleted))
            .count(),
        "execution finished"
    );

    Report {
        folder: folder_name,
        total_examined,
        total_matched,
        outcomes,
        status,
        truncation_note,
    }
}

/// Marks and expunges one batch.
///
/// Returns per-message outcomes aligned with the batch, or the connection
/// error that interrupted it. A non-connection failure of the batched mark
/// falls back to marking messages one by one so failures stay isolated.
async fn run_batch<S: MailboxSession>(
    session: &mut S,
    folder: &FolderHandle,
    batch: &[MessageDescriptor],
) -> Result<Vec<ExecutionOutcome>, SessionError> {
    let uids: Vec<Uid> = batch.iter().map(|d| d.uid).collect();
    let mut mark_failures: Vec<Option<String>> = vec![None; batch.len()];

    match session.mark_deleted(folder, &uids).await {
        Ok(()) => {}
        Err(e) if e.is_connection_loss() => return Err(e),
        Err(batch_error) => {
            tracing::warn!(error = %batch_error, "batched mark rejected; marking individually");
            for (i, uid) in uids.iter().enumerate() {
                match session.mark_deleted(folder, std::slice::from_ref(uid)).await {
                    Ok(()) => {}
                    Err(e) if e.is_connection_loss() => return Err(e),
                    Err(e) => mark_failures[i] = Some(e.to_string()),
                }
            }
        }
    }

    match session.expunge(folder).await {
        Ok(()) => {}
        Err(e) if e.is_connection_loss() => return Err(e),
        Err(e) => {
            let reason = e.to_string();
            return Ok(mark_failures
                .into_iter()
                .map(|mark| ExecutionOutcome::Failed(mark.unwrap_or_else(|| reason.clone())))
                .collect());
        }
    }

    Ok(mark_failures
        .into_iter()
        .map(|mark| match mark {
            None => ExecutionOutcome::Deleted,
            Some(reason) => ExecutionOutcome::Failed(reason),
        })
        .collect())
}

async fn reconnect<S: MailboxSession>(
    session: &mut S,
    folder: &str,
) -> Result<FolderHandle, SessionError> {
    session.authenticate().await?;
    session.select_folder(folder).await
}
