//! UID sets for addressing messages in UID commands.

use super::Uid;

/// UID-based message set, as used by UID FETCH / UID STORE / UID SEARCH.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UidSet {
    /// Single UID.
    Single(Uid),
    /// Range of UIDs (inclusive).
    Range(Uid, Uid),
    /// Multiple UID specifications.
    Set(Vec<Self>),
}

impl UidSet {
    /// Creates a UID set from a single UID.
    #[must_use]
    pub const fn single(uid: Uid) -> Self {
        Self::Single(uid)
    }

    /// Creates a UID set from an inclusive range.
    #[must_use]
    pub const fn range(start: Uid, end: Uid) -> Self {
        Self::Range(start, end)
    }

    /// Builds the smallest UID set covering the given UIDs.
    ///
    /// Consecutive UIDs are coalesced into ranges so that a large batch
    /// serializes as `100:149` rather than fifty comma-separated numbers,
    /// keeping command lines short for big mailboxes. Duplicates are
    /// ignored; input order does not matter.
    ///
    /// Returns `None` for an empty slice — an empty set is not expressible
    /// in the protocol.
    #[must_use]
    pub fn from_uids(uids: &[Uid]) -> Option<Self> {
        let mut sorted = uids.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        let mut parts = Vec::new();
        let mut iter = sorted.into_iter();
        let first = iter.next()?;
        let (mut start, mut end) = (first, first);

        for uid in iter {
            if uid.get() == end.get() + 1 {
                end = uid;
            } else {
                parts.push(Self::part(start, end));
                start = uid;
                end = uid;
            }
        }
        parts.push(Self::part(start, end));

        if parts.len() == 1 {
            parts.pop()
        } else {
            Some(Self::Set(parts))
        }
    }

    fn part(start: Uid, end: Uid) -> Self {
        if start.get() == end.get() {
            Self::Single(start)
        } else {
            Self::Range(start, end)
        }
    }

    /// Number of individual UIDs covered by this set.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Range(s, e) => (e.get() - s.get()) as usize + 1,
            Self::Set(items) => items.iter().map(Self::len).sum(),
        }
    }

    /// Returns true if the set covers no UIDs.
    ///
    /// Constructed sets are never empty; this exists for API completeness.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Display for UidSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single(n) => write!(f, "{n}"),
            Self::Range(start, end) => write!(f, "{start}:{end}"),
            Self::Set(items) => {
                let s: Vec<_> = items.iter().map(ToString::to_string).collect();
                write!(f, "{}", s.join(","))
            }
        }
    }
}
