//! In-memory mailbox session for planner and engine tests.

#![allow(clippy::unwrap_used, dead_code)]

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{DateTime, Utc};
use mailsweep_imap::Uid;

use mailsweep_core::{
    CancelToken, FolderHandle, MailboxSession, MessageMetadata, SearchPredicate, SessionError,
};

/// One message in the fake mailbox.
#[derive(Debug, Clone)]
pub struct FakeMessage {
    pub uid: u32,
    pub date: DateTime<Utc>,
    pub subject: String,
    pub from: String,
}

impl FakeMessage {
    pub fn new(uid: u32, date: &str) -> Self {
        Self {
            uid,
            date: date.parse().unwrap(),
            subject: format!("message {uid}"),
            from: "sender@example.test".to_string(),
        }
    }
}

/// Scripted in-memory session.
///
/// Failure injection is by call index (1-based, per method), so tests can
/// place a connection drop or a server rejection at an exact point in the
/// run.
pub struct FakeSession {
    pub folder: String,
    pub messages: Vec<FakeMessage>,
    pub authenticated: bool,
    pub selected: bool,
    pub marked: BTreeSet<u32>,
    pub expunged: Vec<u32>,
    pub calls: Vec<String>,
    pub auth_count: usize,

    pub fail_search: Option<String>,
    pub fail_metadata: HashSet<u32>,
    pub drop_on_mark_calls: HashSet<usize>,
    pub fail_expunge_calls: HashMap<usize, String>,
    pub cancel_on_expunge: Option<(usize, CancelToken)>,

    mark_calls: usize,
    expunge_calls: usize,
}

impl FakeSession {
    pub fn new(folder: &str, messages: Vec<FakeMessage>) -> Self {
        Self {
            folder: folder.to_string(),
            messages,
            authenticated: false,
            selected: false,
            marked: BTreeSet::new(),
            expunged: Vec::new(),
            calls: Vec::new(),
            auth_count: 0,
            fail_search: None,
            fail_metadata: HashSet::new(),
            drop_on_mark_calls: HashSet::new(),
            fail_expunge_calls: HashMap::new(),
            cancel_on_expunge: None,
            mark_calls: 0,
            expunge_calls: 0,
        }
    }

    pub fn mutation_calls(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| c.starts_with("mark") || c.starts_with("expunge"))
            .count()
    }

    fn drop_connection(&mut self) -> SessionError {
        self.authenticated = false;
        self.selected = false;
        SessionError::ConnectionLost("simulated connection loss".to_string())
    }
}

impl MailboxSession for FakeSession {
    async fn authenticate(&mut self) -> Result<(), SessionError> {
        // Idempotent, per the `MailboxSession` contract: authenticating an
        // already-authenticated session is a no-op.
        if self.authenticated {
            return Ok(());
        }
        self.calls.push("authenticate".to_string());
        self.auth_count += 1;
        self.authenticated = true;
        self.selected = false;
        Ok(())
    }

    async fn select_folder(&mut self, name: &str) -> Result<FolderHandle, SessionError> {
        self.calls.push(format!("select {name}"));
        if !self.authenticated {
            return Err(SessionError::Auth("not authenticated".to_string()));
        }
        if name != self.folder {
            return Err(SessionError::FolderNotFound(name.to_string()));
        }
        self.selected = true;
        Ok(FolderHandle::new(
            name,
            u32::try_from(self.messages.len()).unwrap(),
        ))
    }

    async fn search(
        &mut self,
        _folder: &FolderHandle,
        predicate: &SearchPredicate,
    ) -> Result<Vec<Uid>, SessionError> {
        self.calls.push("search".to_string());
        if !self.selected {
            return Err(SessionError::State("no folder selected".to_string()));
        }
        if let Some(reason) = &self.fail_search {
            return Err(SessionError::Search(reason.clone()));
        }

        // Day-granular matching, like a real server.
        let mut uids: Vec<u32> = self
            .messages
            .iter()
            .filter(|m| {
                let day = m.date.date_naive();
                match *predicate {
                    SearchPredicate::OlderThan { before } => day < before,
                    SearchPredicate::Within { since, before, .. } => since <= day && day < before,
                }
            })
            .map(|m| m.uid)
            .collect();

        // Server order is not guaranteed; return newest-first to make the
        // planner do the sorting.
        uids.sort_unstable_by(|a, b| b.cmp(a));
        Ok(uids.iter().map(|&n| Uid::new(n).unwrap()).collect())
    }

    async fn fetch_metadata(
        &mut self,
        _folder: &FolderHandle,
        uid: Uid,
    ) -> Result<MessageMetadata, SessionError> {
        self.calls.push(format!("fetch {uid}"));
        if !self.selected {
            return Err(SessionError::State("no folder selected".to_string()));
        }
        if self.fail_metadata.contains(&uid.get()) {
            return Err(SessionError::Fetch("simulated metadata failure".to_string()));
        }

        self.messages
            .iter()
            .find(|m| m.uid == uid.get())
            .map(|m| MessageMetadata {
                internal_date: Some(m.date.fixed_offset()),
                subject: Some(m.subject.clone()),
                from: Some(m.from.clone()),
            })
            .ok_or_else(|| SessionError::Fetch(format!("unknown uid {uid}")))
    }

    async fn mark_deleted(
        &mut self,
        _folder: &FolderHandle,
        uids: &[Uid],
    ) -> Result<(), SessionError> {
        self.mark_calls += 1;
        self.calls.push(format!(
            "mark {}",
            uids.iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",")
        ));

        if self.drop_on_mark_calls.contains(&self.mark_calls) {
            return Err(self.drop_connection());
        }
        if !self.selected {
            return Err(SessionError::State("no folder selected".to_string()));
        }
        if uids
            .iter()
            .any(|u| !self.messages.iter().any(|m| m.uid == u.get()))
        {
            return Err(SessionError::Mutation("message not found".to_string()));
        }

        for uid in uids {
            self.marked.insert(uid.get());
        }
        Ok(())
    }

    async fn expunge(&mut self, _folder: &FolderHandle) -> Result<(), SessionError> {
        self.expunge_calls += 1;
        self.calls.push("expunge".to_string());

        if !self.selected {
            return Err(SessionError::State("no folder selected".to_string()));
        }
        if let Some(reason) = self.fail_expunge_calls.get(&self.expunge_calls) {
            return Err(SessionError::Mutation(reason.clone()));
        }
        if let Some((call, token)) = &self.cancel_on_expunge
            && *call == self.expunge_calls
        {
            token.cancel();
        }

        let marked = std::mem::take(&mut self.marked);
        let (removed, kept): (Vec<_>, Vec<_>) = self
            .messages
            .drain(..)
            .partition(|m| marked.contains(&m.uid));
        self.expunged.extend(removed.iter().map(|m| m.uid));
        self.messages = kept;
        Ok(())
    }

    async fn disconnect(&mut self) {
        self.calls.push("disconnect".to_string());
        self.authenticated = false;
        self.selected = false;
    }
}
