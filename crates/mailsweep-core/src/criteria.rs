//! Time criteria and their protocol-level search predicates.
//!
//! A [`TimeCriterion`] captures the user's intent (an age threshold or an
//! explicit range). A [`SearchPredicate`] is its day-granular encoding for
//! the server-side search: IMAP SEARCH compares internal dates by calendar
//! day, so deriving a predicate is an explicit, documented precision loss.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};

use crate::error::CriterionError;

/// Raw user input for building a criterion.
///
/// Exactly one of the two fields must be set; the builder validates.
#[derive(Debug, Clone, Default)]
pub struct CriterionSpec {
    /// Delete messages older than this many days.
    pub age_days: Option<i64>,
    /// Delete messages whose internal date lies in `[start, end)`.
    pub range: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

/// Validated time constraint for selecting messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeCriterion {
    /// Messages older than `now` minus this many days.
    Age {
        /// Age threshold in days.
        threshold_days: u32,
    },
    /// Messages with `start <= internal date < end`.
    Range {
        /// Start of the range (inclusive).
        start: DateTime<Utc>,
        /// End of the range (exclusive).
        end: DateTime<Utc>,
    },
}

impl TimeCriterion {
    /// Builds a criterion from raw input.
    ///
    /// # Errors
    ///
    /// Returns a [`CriterionError`] when both or neither constraint is
    /// supplied, when the age is negative, or when the range is inverted
    /// or empty.
    pub fn build(spec: &CriterionSpec) -> Result<Self, CriterionError> {
        match (spec.age_days, spec.range) {
            (Some(_), Some(_)) => Err(CriterionError::BothSupplied),
            (None, None) => Err(CriterionError::NoneSupplied),
            (Some(days), None) => {
                let threshold_days =
                    u32::try_from(days).map_err(|_| CriterionError::NegativeAge(days))?;
                Ok(Self::Age { threshold_days })
            }
            (None, Some((start, end))) => {
                if end < start {
                    Err(CriterionError::EndBeforeStart)
                } else if start == end {
                    Err(CriterionError::EmptyRange)
                } else {
                    Ok(Self::Range { start, end })
                }
            }
        }
    }

    /// Derives the day-granular search predicate, relative to `now` for
    /// age criteria.
    #[must_use]
    pub fn to_predicate(&self, now: DateTime<Utc>) -> SearchPredicate {
        match *self {
            Self::Age { threshold_days } => {
                let before = now
                    .date_naive()
                    .checked_sub_days(Days::new(u64::from(threshold_days)))
                    .unwrap_or(NaiveDate::MIN);
                SearchPredicate::OlderThan { before }
            }
            Self::Range { start, end } => {
                let midnight = NaiveTime::MIN;
                let truncated = start.time() != midnight || end.time() != midnight;

                // SINCE is inclusive of the day, BEFORE exclusive. An end
                // with a sub-day component must round up a day so boundary
                // messages still reach the plan; the planner trims the
                // overshoot against the fetched internal dates.
                let since = start.date_naive();
                let before = if end.time() == midnight {
                    end.date_naive()
                } else {
                    end.date_naive()
                        .checked_add_days(Days::new(1))
                        .unwrap_or(NaiveDate::MAX)
                };

                SearchPredicate::Within {
                    since,
                    before,
                    truncated,
                }
            }
        }
    }
}

/// Day-granular, protocol-agnostic search predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPredicate {
    /// Internal date strictly before the given day.
    OlderThan {
        /// Exclusive cutoff day.
        before: NaiveDate,
    },
    /// Internal date within `[since, before)`, by day.
    Within {
        /// Inclusive start day.
        since: NaiveDate,
        /// Exclusive end day.
        before: NaiveDate,
        /// True when a range endpoint carried a sub-day time component
        /// that the day-granular search cannot express.
        truncated: bool,
    },
}

impl SearchPredicate {
    /// Returns the note to surface in the report when deriving this
    /// predicate lost sub-day precision.
    #[must_use]
    pub fn truncation_note(&self) -> Option<String> {
        match self {
            Self::Within {
                truncated: true,
                since,
                before,
            } => Some(format!(
                "range endpoints carry a time of day; the server-side search \
                 is day-granular and matched {since} through {before} exclusive, \
                 refined against each message's internal date"
            )),
            _ => None,
        }
    }
}
