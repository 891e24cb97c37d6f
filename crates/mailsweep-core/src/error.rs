//! Error types for the core library.

use thiserror::Error;

/// Reasons a criterion is rejected before any server contact.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CriterionError {
    /// Both an age and a time range were supplied.
    #[error("supply either an age threshold or a time range, not both")]
    BothSupplied,

    /// Neither an age nor a time range was supplied.
    #[error("supply an age threshold or a time range")]
    NoneSupplied,

    /// The age threshold is negative.
    #[error("age threshold must be non-negative, got {0}")]
    NegativeAge(i64),

    /// The range end precedes its start.
    #[error("range end precedes start")]
    EndBeforeStart,

    /// The range start equals its end and matches nothing.
    #[error("range start equals end; the range is empty")]
    EmptyRange,
}

/// Errors surfaced by the mailbox session collaborator.
///
/// The engine only distinguishes two classes: connection-shaped errors
/// (eligible for one reconnect-and-resume) and everything else.
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    /// Authentication failed or the session is not authenticated.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The requested folder does not exist on the server.
    #[error("folder not found: {0}")]
    FolderNotFound(String),

    /// The search could not be executed.
    #[error("search failed: {0}")]
    Search(String),

    /// Metadata could not be fetched for a message.
    #[error("metadata fetch failed: {0}")]
    Fetch(String),

    /// A mark-for-deletion or expunge request was rejected.
    #[error("mutation failed: {0}")]
    Mutation(String),

    /// The connection to the server was lost.
    #[error("connection lost: {0}")]
    ConnectionLost(String),

    /// The server did not answer within the configured timeout.
    #[error("operation timed out: {0}")]
    Timeout(String),

    /// The session is not in a state that permits the operation.
    #[error("invalid session state: {0}")]
    State(String),
}

impl SessionError {
    /// Returns true for errors the engine answers with its single
    /// reconnect-and-resume attempt. Timeouts count as connection loss.
    #[must_use]
    pub const fn is_connection_loss(&self) -> bool {
        matches!(self, Self::ConnectionLost(_) | Self::Timeout(_))
    }
}

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The user-supplied criterion is invalid.
    #[error("invalid criterion: {0}")]
    InvalidCriterion(#[from] CriterionError),

    /// A session operation failed during the setup or planning phase.
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
