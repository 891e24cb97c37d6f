//! The mailbox session capability boundary.
//!
//! The planner and engine are generic over [`MailboxSession`], the small
//! capability surface the core needs from a mail server connection. The
//! production implementation is [`ImapMailbox`]; tests use an in-memory
//! fake. Keeping the protocol behind this trait is what makes the
//! selection/deletion logic testable without a server.

mod imap;

pub use imap::{ImapMailbox, ImapMailboxConfig};

use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use mailsweep_imap::Uid;

use crate::criteria::SearchPredicate;
use crate::error::SessionError;

/// Handle to a selected folder.
///
/// Valid until the next `select_folder` or reconnect on the same session.
#[derive(Debug, Clone)]
pub struct FolderHandle {
    name: Arc<str>,
    exists: u32,
}

impl FolderHandle {
    /// Creates a handle for a selected folder.
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>, exists: u32) -> Self {
        Self {
            name: name.into(),
            exists,
        }
    }

    /// The folder name as selected.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of messages in the folder at selection time.
    #[must_use]
    pub const fn exists(&self) -> u32 {
        self.exists
    }
}

/// Minimal per-message metadata for reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageMetadata {
    /// The internal date the server recorded for the message.
    pub internal_date: Option<DateTime<FixedOffset>>,
    /// Subject header, as stored.
    pub subject: Option<String>,
    /// From header, as stored.
    pub from: Option<String>,
}

/// Capability surface the core requires from a mailbox connection.
///
/// All operations are sequential; implementations are not expected to
/// support concurrent in-flight requests. An implementation classifies its
/// transport failures as [`SessionError::ConnectionLost`] or
/// [`SessionError::Timeout`] so the engine's reconnect policy applies.
#[allow(async_fn_in_trait)]
pub trait MailboxSession {
    /// Establishes an authenticated session, (re)connecting as needed.
    ///
    /// Idempotent: calling on an already-authenticated session is a no-op.
    async fn authenticate(&mut self) -> Result<(), SessionError>;

    /// Selects a folder for subsequent operations.
    async fn select_folder(&mut self, name: &str) -> Result<FolderHandle, SessionError>;

    /// Searches the folder, returning matching message identifiers in
    /// server order (which is not guaranteed to be meaningful).
    async fn search(
        &mut self,
        folder: &FolderHandle,
        predicate: &SearchPredicate,
    ) -> Result<Vec<Uid>, SessionError>;

    /// Fetches display metadata for one message.
    async fn fetch_metadata(
        &mut self,
        folder: &FolderHandle,
        uid: Uid,
    ) -> Result<MessageMetadata, SessionError>;

    /// Marks the given messages for deletion.
    async fn mark_deleted(
        &mut self,
        folder: &FolderHandle,
        uids: &[Uid],
    ) -> Result<(), SessionError>;

    /// Permanently removes messages marked for deletion.
    async fn expunge(&mut self, folder: &FolderHandle) -> Result<(), SessionError>;

    /// Disconnects from the server, best-effort.
    async fn disconnect(&mut self);
}
