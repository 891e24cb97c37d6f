//! Deletion plans and message descriptors.

use chrono::{DateTime, FixedOffset};
use mailsweep_imap::Uid;

use crate::session::{FolderHandle, MessageMetadata};

/// Metadata state for a planned message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Metadata {
    /// Metadata was fetched.
    Available(MessageMetadata),
    /// The metadata fetch failed; deletion proceeds by identifier alone.
    Unavailable {
        /// Why the fetch failed.
        reason: String,
    },
}

/// One message scheduled for deletion.
///
/// Immutable once planned; the identifier is session-scoped and never
/// persisted across runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDescriptor {
    /// Server identifier of the message.
    pub uid: Uid,
    /// Display metadata, if it could be fetched.
    pub metadata: Metadata,
}

impl MessageDescriptor {
    /// The internal date, when metadata is available.
    #[must_use]
    pub const fn internal_date(&self) -> Option<DateTime<FixedOffset>> {
        match &self.metadata {
            Metadata::Available(meta) => meta.internal_date,
            Metadata::Unavailable { .. } => None,
        }
    }

    /// One-line rendering for logs and reports.
    #[must_use]
    pub fn describe(&self) -> String {
        match &self.metadata {
            Metadata::Available(meta) => format!(
                "uid {} date {} from {} subject {}",
                self.uid,
                meta.internal_date
                    .map_or_else(|| "unknown".to_string(), |d| d.to_rfc3339()),
                meta.from.as_deref().unwrap_or("unknown"),
                meta.subject.as_deref().unwrap_or("(no subject)"),
            ),
            Metadata::Unavailable { reason } => {
                format!("uid {} (metadata unavailable: {reason})", self.uid)
            }
        }
    }
}

/// Ordered sequence of messages to delete, produced once per run.
///
/// The plan is never re-queried mid-execution: concurrent mailbox activity
/// must not shift the set under the engine.
#[derive(Debug, Clone)]
pub struct DeletionPlan {
    folder: FolderHandle,
    descriptors: Vec<MessageDescriptor>,
    truncation_note: Option<String>,
}

impl DeletionPlan {
    /// Creates a plan over an ordered descriptor list.
    #[must_use]
    pub const fn new(
        folder: FolderHandle,
        descriptors: Vec<MessageDescriptor>,
        truncation_note: Option<String>,
    ) -> Self {
        Self {
            folder,
            descriptors,
            truncation_note,
        }
    }

    /// The folder this plan applies to.
    #[must_use]
    pub const fn folder(&self) -> &FolderHandle {
        &self.folder
    }

    /// Messages in the plan, ascending by internal date.
    #[must_use]
    pub fn descriptors(&self) -> &[MessageDescriptor] {
        &self.descriptors
    }

    /// Number of messages the search matched.
    #[must_use]
    pub fn total_matched(&self) -> usize {
        self.descriptors.len()
    }

    /// Number of messages in the folder when it was selected.
    #[must_use]
    pub const fn total_examined(&self) -> u32 {
        self.folder.exists()
    }

    /// Note about day-granularity truncation, when it occurred.
    #[must_use]
    pub fn truncation_note(&self) -> Option<&str> {
        self.truncation_note.as_deref()
    }

    /// Decomposes the plan for execution.
    #[must_use]
    pub fn into_parts(self) -> (FolderHandle, Vec<MessageDescriptor>, Option<String>) {
        (self.folder, self.descriptors, self.truncation_note)
    }
}
