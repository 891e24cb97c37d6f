//! IMAP-backed implementation of the mailbox session trait.
//!
//! Wraps the type-state client from `mailsweep-imap` behind an internal
//! state machine (Disconnected → Authenticated → Selected) so callers get
//! a mutable-reference API. Transport failures and timeouts are classified
//! as connection loss, which re-arms on `authenticate`: the engine's
//! reconnect policy is just `authenticate` + `select_folder` again.

use mailsweep_imap::connection::{Authenticated, Client, ImapStream, Selected, connect};
use mailsweep_imap::{
    Config, FetchAttribute, FetchItem, FetchItems, Flag, ListResponse, SearchCriteria,
    StoreAction, Uid, UidSet,
};

use crate::criteria::SearchPredicate;
use crate::error::SessionError;
use crate::session::{FolderHandle, MailboxSession, MessageMetadata};

/// Configuration for an IMAP-backed mailbox session.
#[derive(Debug, Clone)]
pub struct ImapMailboxConfig {
    /// Connection parameters (host, port, security, timeouts).
    pub connection: Config,
    /// Login username.
    pub username: String,
    /// Login password.
    pub password: String,
}

enum State {
    Disconnected,
    Authenticated(Client<ImapStream, Authenticated>),
    Selected(Client<ImapStream, Selected>),
}

/// Mailbox session over a real IMAP connection.
pub struct ImapMailbox {
    config: ImapMailboxConfig,
    state: State,
}

impl ImapMailbox {
    /// Creates a disconnected session; `authenticate` dials.
    #[must_use]
    pub const fn new(config: ImapMailboxConfig) -> Self {
        Self {
            config,
            state: State::Disconnected,
        }
    }

    /// Lists all folders on the server.
    ///
    /// # Errors
    ///
    /// Fails when the session is not authenticated or the LIST command is
    /// rejected.
    pub async fn list_folders(&mut self) -> Result<Vec<ListResponse>, SessionError> {
        let client = match &mut self.state {
            State::Authenticated(client) => client,
            State::Selected(_) => {
                return Err(SessionError::State(
                    "cannot list folders with a folder selected".to_string(),
                ));
            }
            State::Disconnected => {
                return Err(SessionError::Auth("not authenticated".to_string()));
            }
        };

        let result = client.list("", "*").await;
        result.map_err(|e| self.fail(e, SessionError::Search))
    }

    /// Classifies a protocol error, dropping the connection state when it
    /// is no longer usable.
    fn fail(
        &mut self,
        error: mailsweep_imap::Error,
        fallback: fn(String) -> SessionError,
    ) -> SessionError {
        let classified = classify(error, fallback);
        if classified.is_connection_loss() {
            self.state = State::Disconnected;
        }
        classified
    }

    fn selected_mut(&mut self) -> Result<&mut Client<ImapStream, Selected>, SessionError> {
        match &mut self.state {
            State::Selected(client) => Ok(client),
            State::Authenticated(_) => {
                Err(SessionError::State("no folder selected".to_string()))
            }
            State::Disconnected => Err(SessionError::Auth("not authenticated".to_string())),
        }
    }
}

impl MailboxSession for ImapMailbox {
    async fn authenticate(&mut self) -> Result<(), SessionError> {
        if !matches!(self.state, State::Disconnected) {
            return Ok(());
        }

        let stream = connect(&self.config.connection)
            .await
            .map_err(|e| classify(e, SessionError::ConnectionLost))?;
        let client = Client::with_io_timeout(stream, Some(self.config.connection.io_timeout))
            .await
            .map_err(|e| classify(e, SessionError::ConnectionLost))?;

        let authenticated = client
            .login(&self.config.username, &self.config.password)
            .await
            .map_err(|e| classify(e, SessionError::Auth))?;

        tracing::info!(
            host = %self.config.connection.host,
            username = %self.config.username,
            "connected and authenticated"
        );
        self.state = State::Authenticated(authenticated);
        Ok(())
    }

    async fn select_folder(&mut self, name: &str) -> Result<FolderHandle, SessionError> {
        let client = match std::mem::replace(&mut self.state, State::Disconnected) {
            State::Authenticated(client) => client,
            State::Selected(client) => client
                .close()
                .await
                .map_err(|e| self.fail(e, SessionError::State))?,
            State::Disconnected => {
                return Err(SessionError::Auth("not authenticated".to_string()));
            }
        };

        match client.select(name).await {
            Ok((selected, status)) => {
                let handle = FolderHandle::new(name, status.exists);
                self.state = State::Selected(selected);
                Ok(handle)
            }
            Err(mailsweep_imap::Error::No(text)) => {
                Err(SessionError::FolderNotFound(format!("{name}: {text}")))
            }
            Err(e) => Err(self.fail(e, SessionError::State)),
        }
    }

    async fn search(
        &mut self,
        _folder: &FolderHandle,
        predicate: &SearchPredicate,
    ) -> Result<Vec<Uid>, SessionError> {
        let criteria = predicate_criteria(predicate);
        let client = self.selected_mut()?;
        let result = client.uid_search(&criteria).await;
        result.map_err(|e| self.fail(e, SessionError::Search))
    }

    async fn fetch_metadata(
        &mut self,
        _folder: &FolderHandle,
        uid: Uid,
    ) -> Result<MessageMetadata, SessionError> {
        let items = FetchItems::Items(vec![
            FetchAttribute::Uid,
            FetchAttribute::InternalDate,
            FetchAttribute::HeaderFields(vec!["SUBJECT".to_string(), "FROM".to_string()]),
        ]);

        let client = self.selected_mut()?;
        let result = client.uid_fetch(&UidSet::single(uid), items).await;
        let responses = result.map_err(|e| self.fail(e, SessionError::Fetch))?;

        for (_seq, fetched) in responses {
            let mut metadata = MessageMetadata::default();
            let mut matched = None;

            for item in fetched {
                match item {
                    FetchItem::Uid(u) => matched = Some(u),
                    FetchItem::InternalDate(dt) => metadata.internal_date = Some(dt),
                    FetchItem::HeaderFields(raw) => {
                        let text = String::from_utf8_lossy(&raw).into_owned();
                        metadata.subject = header_field(&text, "Subject");
                        metadata.from = header_field(&text, "From");
                    }
                    _ => {}
                }
            }

            if matched == Some(uid) {
                return Ok(metadata);
            }
        }

        Err(SessionError::Fetch(format!("no data returned for uid {uid}")))
    }

    async fn mark_deleted(
        &mut self,
        _folder: &FolderHandle,
        uids: &[Uid],
    ) -> Result<(), SessionError> {
        let Some(set) = UidSet::from_uids(uids) else {
            return Ok(());
        };

        let client = self.selected_mut()?;
        let result = client
            .uid_store_silent(&set, StoreAction::AddFlags(vec![Flag::Deleted]))
            .await;
        result.map_err(|e| self.fail(e, SessionError::Mutation))
    }

    async fn expunge(&mut self, _folder: &FolderHandle) -> Result<(), SessionError> {
        let client = self.selected_mut()?;
        let result = client.expunge().await;
        let expunged = result.map_err(|e| self.fail(e, SessionError::Mutation))?;
        tracing::debug!(count = expunged.len(), "expunged messages");
        Ok(())
    }

    async fn disconnect(&mut self) {
        let logout = match std::mem::replace(&mut self.state, State::Disconnected) {
            State::Authenticated(client) => client.logout().await,
            State::Selected(client) => client.logout().await,
            State::Disconnected => return,
        };
        if let Err(e) = logout {
            tracing::debug!(error = %e, "logout failed; dropping connection");
        }
    }
}

fn classify(
    error: mailsweep_imap::Error,
    fallback: fn(String) -> SessionError,
) -> SessionError {
    match error {
        mailsweep_imap::Error::Timeout(d) => SessionError::Timeout(format!("{d:?}")),
        e if e.is_connection_error() => SessionError::ConnectionLost(e.to_string()),
        e => fallback(e.to_string()),
    }
}

fn predicate_criteria(predicate: &SearchPredicate) -> SearchCriteria {
    match *predicate {
        SearchPredicate::OlderThan { before } => SearchCriteria::Before(before),
        SearchPredicate::Within { since, before, .. } => SearchCriteria::And(vec![
            SearchCriteria::Since(since),
            SearchCriteria::Before(before),
        ]),
    }
}

/// Extracts a header value from raw header bytes, unfolding continuation
/// lines.
fn header_field(headers: &str, name: &str) -> Option<String> {
    let mut value: Option<String> = None;

    for line in headers.lines() {
        if let Some(v) = &mut value {
            if line.starts_with(' ') || line.starts_with('\t') {
                v.push(' ');
                v.push_str(line.trim());
                continue;
            }
            break;
        }
        if let Some((field, rest)) = line.split_once(':')
            && field.trim().eq_ignore_ascii_case(name)
        {
            value = Some(rest.trim().to_string());
        }
    }

    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn older_than_maps_to_before() {
        let predicate = SearchPredicate::OlderThan {
            before: date(2023, 5, 16),
        };
        assert_eq!(
            predicate_criteria(&predicate),
            SearchCriteria::Before(date(2023, 5, 16))
        );
    }

    #[test]
    fn within_maps_to_since_and_before() {
        let predicate = SearchPredicate::Within {
            since: date(2023, 1, 1),
            before: date(2023, 1, 31),
            truncated: false,
        };
        assert_eq!(
            predicate_criteria(&predicate),
            SearchCriteria::And(vec![
                SearchCriteria::Since(date(2023, 1, 1)),
                SearchCriteria::Before(date(2023, 1, 31)),
            ])
        );
    }

    #[test]
    fn header_field_basic() {
        let headers = "Subject: hello world\r\nFrom: a@b.test\r\n\r\n";
        assert_eq!(
            header_field(headers, "Subject"),
            Some("hello world".to_string())
        );
        assert_eq!(header_field(headers, "From"), Some("a@b.test".to_string()));
        assert_eq!(header_field(headers, "Date"), None);
    }

    #[test]
    fn header_field_unfolds_continuations() {
        let headers = "Subject: a very\r\n long subject\r\nFrom: a@b.test\r\n";
        assert_eq!(
            header_field(headers, "Subject"),
            Some("a very long subject".to_string())
        );
    }

    #[test]
    fn header_field_is_case_insensitive() {
        let headers = "SUBJECT: shouted\r\n";
        assert_eq!(header_field(headers, "Subject"), Some("shouted".to_string()));
    }

    #[test]
    fn timeout_classifies_as_timeout() {
        let e = mailsweep_imap::Error::Timeout(std::time::Duration::from_secs(60));
        assert!(matches!(
            classify(e, SessionError::Mutation),
            SessionError::Timeout(_)
        ));
    }

    #[test]
    fn io_error_classifies_as_connection_loss() {
        let e = mailsweep_imap::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "reset",
        ));
        assert!(matches!(
            classify(e, SessionError::Mutation),
            SessionError::ConnectionLost(_)
        ));
    }

    #[test]
    fn server_no_uses_fallback() {
        let e = mailsweep_imap::Error::No("denied".to_string());
        assert!(matches!(
            classify(e, SessionError::Mutation),
            SessionError::Mutation(_)
        ));
    }
}
