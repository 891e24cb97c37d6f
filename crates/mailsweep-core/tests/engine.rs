//! Execution engine scenarios against the in-memory session.

#![allow(clippy::unwrap_used)]

mod common;

use common::{FakeMessage, FakeSession};
use mailsweep_core::{
    CancelToken, ExecuteOptions, ExecutionOutcome, FixedClock, MailboxSession, RunStatus,
    TimeCriterion, execute, plan, sweep,
};

const NOW: &str = "2023-06-15T12:00:00Z";

fn clock() -> FixedClock {
    FixedClock::at(NOW.parse().unwrap())
}

fn age(days: u32) -> TimeCriterion {
    TimeCriterion::Age {
        threshold_days: days,
    }
}

/// A mailbox of `count` stale messages, uids 1..=count.
fn stale_mailbox(count: u32) -> Vec<FakeMessage> {
    (1..=count)
        .map(|uid| FakeMessage::new(uid, "2023-01-10T00:00:00Z"))
        .collect()
}

fn options(dry_run: bool, batch_size: usize) -> ExecuteOptions {
    ExecuteOptions {
        dry_run,
        batch_size,
    }
}

#[tokio::test]
async fn dry_run_reports_candidates_without_mutating() {
    let mut session = FakeSession::new("INBOX", stale_mailbox(5));
    session.authenticate().await.unwrap();

    let deletion_plan = plan(&mut session, "INBOX", &age(30), &clock()).await.unwrap();
    let report = execute(
        &mut session,
        deletion_plan,
        &options(true, 2),
        &CancelToken::new(),
    )
    .await;

    assert_eq!(report.total_matched, 5);
    assert_eq!(report.deleted_count(), 0);
    assert_eq!(report.skipped_count(), 5);
    assert!(report
        .outcomes
        .iter()
        .all(|(_, o)| *o == ExecutionOutcome::SkippedDryRun));
    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(session.mutation_calls(), 0);
    assert_eq!(session.messages.len(), 5);
}

#[tokio::test]
async fn dry_run_and_real_run_plan_identically() {
    let mut session = FakeSession::new("INBOX", stale_mailbox(4));
    session.authenticate().await.unwrap();

    let first = plan(&mut session, "INBOX", &age(30), &clock()).await.unwrap();
    let second = plan(&mut session, "INBOX", &age(30), &clock()).await.unwrap();
    assert_eq!(first.descriptors(), second.descriptors());

    // Dry-run execution leaves the mailbox untouched, so a later real run
    // operates on the exact candidates the dry-run reported.
    let dry = execute(&mut session, first, &options(true, 10), &CancelToken::new()).await;
    let real = execute(&mut session, second, &options(false, 10), &CancelToken::new()).await;

    assert_eq!(dry.total_matched, real.total_matched);
    assert_eq!(real.deleted_count(), 4);
    assert!(real.is_clean());
}

#[tokio::test]
async fn full_run_deletes_in_batches() {
    let mut session = FakeSession::new("INBOX", stale_mailbox(25));
    session.authenticate().await.unwrap();

    let report = sweep(
        &mut session,
        "INBOX",
        &age(30),
        &options(false, 10),
        &CancelToken::new(),
        &clock(),
    )
    .await
    .unwrap();

    assert_eq!(report.deleted_count(), 25);
    assert_eq!(report.failed_count(), 0);
    assert!(report.is_clean());
    assert!(session.messages.is_empty());
    // 25 messages at batch size 10: three mark+expunge round trips.
    assert_eq!(session.calls.iter().filter(|c| *c == "expunge").count(), 3);
}

#[tokio::test]
async fn connection_loss_mid_run_resumes_once_and_completes() {
    let mut session = FakeSession::new("INBOX", stale_mailbox(50));
    // Batches of 10: marks 1 and 2 succeed (20 deleted), mark 3 drops the
    // connection; the engine reconnects and retries the current batch.
    session.drop_on_mark_calls.insert(3);
    session.authenticate().await.unwrap();

    let report = sweep(
        &mut session,
        "INBOX",
        &age(30),
        &options(false, 10),
        &CancelToken::new(),
        &clock(),
    )
    .await
    .unwrap();

    assert_eq!(report.deleted_count(), 50);
    assert_eq!(report.failed_count(), 0);
    assert_eq!(report.status, RunStatus::Completed);
    assert!(session.messages.is_empty());
    // Initial authenticate plus one reconnect.
    assert_eq!(session.auth_count, 2);
}

#[tokio::test]
async fn second_connection_loss_on_same_batch_is_fatal() {
    let mut session = FakeSession::new("INBOX", stale_mailbox(50));
    // The third batch drops on both the original attempt and the retry.
    session.drop_on_mark_calls.insert(3);
    session.drop_on_mark_calls.insert(4);
    session.authenticate().await.unwrap();

    let report = sweep(
        &mut session,
        "INBOX",
        &age(30),
        &options(false, 10),
        &CancelToken::new(),
        &clock(),
    )
    .await
    .unwrap();

    // Everything completed before the fatal batch is still reported.
    assert_eq!(report.deleted_count(), 20);
    assert_eq!(report.total_matched, 50);
    assert!(matches!(report.status, RunStatus::Failed(_)));
    assert!(!report.is_clean());
}

#[tokio::test]
async fn deleting_already_deleted_messages_fails_cleanly() {
    let mut session = FakeSession::new("INBOX", stale_mailbox(3));
    session.authenticate().await.unwrap();

    let deletion_plan = plan(&mut session, "INBOX", &age(30), &clock()).await.unwrap();

    let first = execute(
        &mut session,
        deletion_plan.clone(),
        &options(false, 10),
        &CancelToken::new(),
    )
    .await;
    assert_eq!(first.deleted_count(), 3);

    // Same plan again: the messages are gone, so every deletion fails
    // with a not-found-class reason instead of crashing.
    let second = execute(
        &mut session,
        deletion_plan,
        &options(false, 10),
        &CancelToken::new(),
    )
    .await;
    assert_eq!(second.deleted_count(), 0);
    assert_eq!(second.failed_count(), 3);
    assert!(second
        .failures()
        .all(|(_, reason)| reason.contains("not found")));
    assert_eq!(second.status, RunStatus::Completed);
}

#[tokio::test]
async fn expunge_rejection_fails_the_batch_but_not_the_run() {
    let mut session = FakeSession::new("INBOX", stale_mailbox(6));
    session
        .fail_expunge_calls
        .insert(1, "expunge denied".to_string());
    session.authenticate().await.unwrap();

    let report = sweep(
        &mut session,
        "INBOX",
        &age(30),
        &options(false, 3),
        &CancelToken::new(),
        &clock(),
    )
    .await
    .unwrap();

    // First batch of 3 failed on expunge, second batch went through.
    assert_eq!(report.failed_count(), 3);
    assert_eq!(report.deleted_count(), 3);
    assert_eq!(report.status, RunStatus::Completed);
    assert!(report
        .failures()
        .all(|(_, reason)| reason.contains("expunge denied")));
}

#[tokio::test]
async fn cancellation_between_batches_skips_the_rest() {
    let mut session = FakeSession::new("INBOX", stale_mailbox(9));
    let cancel = CancelToken::new();
    // Cancel during the first expunge; the engine honors it before batch 2.
    session.cancel_on_expunge = Some((1, cancel.clone()));
    session.authenticate().await.unwrap();

    let report = sweep(
        &mut session,
        "INBOX",
        &age(30),
        &options(false, 3),
        &cancel,
        &clock(),
    )
    .await
    .unwrap();

    assert_eq!(report.deleted_count(), 3);
    assert_eq!(report.skipped_count(), 6);
    assert_eq!(report.status, RunStatus::Cancelled);
    assert!(report.outcomes[3..]
        .iter()
        .all(|(_, o)| *o == ExecutionOutcome::SkippedCancelled));
}

#[tokio::test]
async fn empty_plan_produces_an_empty_completed_report() {
    let mut session = FakeSession::new("INBOX", vec![FakeMessage::new(1, NOW)]);
    session.authenticate().await.unwrap();

    let report = sweep(
        &mut session,
        "INBOX",
        &age(30),
        &ExecuteOptions::default(),
        &CancelToken::new(),
        &clock(),
    )
    .await
    .unwrap();

    assert_eq!(report.total_matched, 0);
    assert_eq!(report.deleted_count(), 0);
    assert!(report.is_clean());
    assert_eq!(session.mutation_calls(), 0);
}
