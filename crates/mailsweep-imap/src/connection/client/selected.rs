//! Implementation for the selected state.

use tokio::io::{AsyncRead, AsyncWrite};

use super::Client;
use super::states::{Authenticated, Selected};
use crate::Result;
use crate::command::{Command, FetchItems, SearchCriteria, StoreAction};
use crate::parser::{FetchItem, Response, ResponseParser, UntaggedResponse};
use crate::types::{MailboxStatus, SeqNum, Uid, UidSet};

impl<S> Client<S, Selected>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Returns the currently selected mailbox name.
    #[must_use]
    pub fn mailbox(&self) -> &str {
        self.state.mailbox()
    }

    /// Returns the mailbox status snapshot from SELECT.
    #[must_use]
    pub const fn status(&self) -> &MailboxStatus {
        self.state.status()
    }

    /// Searches for messages matching the given criteria, returning UIDs.
    pub async fn uid_search(&mut self, criteria: &SearchCriteria) -> Result<Vec<Uid>> {
        let cmd = Command::UidSearch {
            criteria: criteria.clone(),
        };
        let responses = self.exec(&cmd).await?;

        let mut results = Vec::new();
        for response_bytes in &responses {
            if let Ok(Response::Untagged(UntaggedResponse::Search(uids))) =
                ResponseParser::parse(response_bytes)
            {
                results.extend(uids);
            }
        }
        Ok(results)
    }

    /// Fetches message data for the given UID set.
    ///
    /// Returns a vector of (sequence number, fetch items) pairs.
    pub async fn uid_fetch(
        &mut self,
        uids: &UidSet,
        items: FetchItems,
    ) -> Result<Vec<(SeqNum, Vec<FetchItem>)>> {
        let cmd = Command::UidFetch {
            uids: uids.clone(),
            items,
        };
        let responses = self.exec(&cmd).await?;

        let mut results = Vec::new();
        for response_bytes in &responses {
            if let Ok(Response::Untagged(UntaggedResponse::Fetch { seq, items })) =
                ResponseParser::parse(response_bytes)
            {
                results.push((seq, items));
            }
        }
        Ok(results)
    }

    /// Modifies message flags by UID, silently (no FETCH echo).
    pub async fn uid_store_silent(&mut self, uids: &UidSet, action: StoreAction) -> Result<()> {
        let cmd = Command::UidStore {
            uids: uids.clone(),
            action,
            silent: true,
        };
        self.exec(&cmd).await?;
        Ok(())
    }

    /// Permanently removes messages marked as \Deleted.
    ///
    /// Returns the sequence numbers of expunged messages.
    pub async fn expunge(&mut self) -> Result<Vec<SeqNum>> {
        let responses = self.exec(&Command::Expunge).await?;

        let mut expunged = Vec::new();
        for response_bytes in &responses {
            if let Ok(Response::Untagged(UntaggedResponse::Expunge(seq))) =
                ResponseParser::parse(response_bytes)
            {
                expunged.push(seq);
            }
        }
        Ok(expunged)
    }

    /// Closes the current mailbox and returns to the authenticated state.
    pub async fn close(mut self) -> Result<Client<S, Authenticated>> {
        self.exec(&Command::Close).await?;

        Ok(Client {
            stream: self.stream,
            tag_gen: self.tag_gen,
            state: Authenticated,
        })
    }

    /// Gracefully disconnects from the server.
    pub async fn logout(mut self) -> Result<()> {
        self.logout_inner().await
    }
}
