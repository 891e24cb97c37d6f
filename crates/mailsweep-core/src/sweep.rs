//! One-call assembly of planning and execution.

use crate::clock::Clock;
use crate::criteria::TimeCriterion;
use crate::engine::{CancelToken, ExecuteOptions, execute};
use crate::error::Result;
use crate::planner::plan;
use crate::report::Report;
use crate::session::MailboxSession;

/// Runs one cleanup pass: authenticate, plan, execute, report.
///
/// Dry-run and real runs plan identically; only execution differs, so a
/// dry-run report shows the exact candidates a real run would delete.
///
/// # Errors
///
/// Setup and planning failures (authentication, folder selection, search)
/// abort before anything is deleted. Once execution starts, failures are
/// captured in the returned [`Report`] instead.
pub async fn sweep<S, C>(
    session: &mut S,
    folder: &str,
    criterion: &TimeCriterion,
    options: &ExecuteOptions,
    cancel: &CancelToken,
    clock: &C,
) -> Result<Report>
where
    S: MailboxSession,
    C: Clock + ?Sized,
{
    session.authenticate().await?;
    let plan = plan(session, folder, criterion, clock).await?;
    tracing::info!(
        folder,
        matched = plan.total_matched(),
        dry_run = options.dry_run,
        "plan ready"
    );
    Ok(execute(session, plan, options, cancel).await)
}
