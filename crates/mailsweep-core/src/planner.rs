//! Selection planning: search, metadata, ordering.

use chrono::Utc;

use crate::clock::Clock;
use crate::criteria::TimeCriterion;
use crate::error::Result;
use crate::plan::{DeletionPlan, MessageDescriptor, Metadata};
use crate::session::MailboxSession;

/// Builds a deletion plan for `folder` from the given criterion.
///
/// Selects the folder, issues the day-granular search, fetches display
/// metadata per match, and returns descriptors sorted ascending by internal
/// date (ties broken by identifier, date-less messages last) so the plan is
/// deterministic and reviewable.
///
/// A failed metadata fetch does not abort planning: the message stays in
/// the plan with its failure recorded, since deletion proceeds by
/// identifier alone. For `Range` criteria, fetched internal dates are
/// checked against the full-precision window and out-of-range matches from
/// the day-granular search are dropped; date-less messages are kept.
///
/// # Errors
///
/// Any failure before a search result is obtained (authentication, folder
/// selection, the search itself) is a hard failure and nothing partial is
/// returned.
pub async fn plan<S, C>(
    session: &mut S,
    folder: &str,
    criterion: &TimeCriterion,
    clock: &C,
) -> Result<DeletionPlan>
where
    S: MailboxSession,
    C: Clock + ?Sized,
{
    let handle = session.select_folder(folder).await?;
    let predicate = criterion.to_predicate(clock.now());

    let uids = session.search(&handle, &predicate).await?;
    tracing::info!(
        folder,
        examined = handle.exists(),
        matched = uids.len(),
        "search complete"
    );

    let mut descriptors = Vec::with_capacity(uids.len());
    for uid in uids {
        let metadata = match session.fetch_metadata(&handle, uid).await {
            Ok(meta) => Metadata::Available(meta),
            Err(e) => {
                tracing::warn!(%uid, error = %e, "metadata fetch failed; keeping message in plan");
                Metadata::Unavailable {
                    reason: e.to_string(),
                }
            }
        };
        descriptors.push(MessageDescriptor { uid, metadata });
    }

    if let TimeCriterion::Range { start, end } = *criterion {
        let before = descriptors.len();
        descriptors.retain(|d| {
            d.internal_date().is_none_or(|dt| {
                let dt = dt.with_timezone(&Utc);
                start <= dt && dt < end
            })
        });
        let dropped = before - descriptors.len();
        if dropped > 0 {
            tracing::debug!(dropped, "refined day-granular matches against the precise range");
        }
    }

    descriptors.sort_by(|a, b| {
        let key_a = (a.internal_date().is_none(), a.internal_date(), a.uid);
        let key_b = (b.internal_date().is_none(), b.internal_date(), b.uid);
        key_a.cmp(&key_b)
    });

    Ok(DeletionPlan::new(
        handle,
        descriptors,
        predicate.truncation_note(),
    ))
}
