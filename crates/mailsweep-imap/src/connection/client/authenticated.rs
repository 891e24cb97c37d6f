//! Implementation for the authenticated state.

use tokio::io::{AsyncRead, AsyncWrite};

use super::Client;
use super::states::{Authenticated, Selected};
use crate::Result;
use crate::command::Command;
use crate::parser::{Response, ResponseCode, ResponseParser, UntaggedResponse};
use crate::types::{ListResponse, Mailbox, MailboxStatus, Status};

impl<S> Client<S, Authenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Lists mailboxes matching the given reference and pattern.
    pub async fn list(&mut self, reference: &str, pattern: &str) -> Result<Vec<ListResponse>> {
        let cmd = Command::List {
            reference: reference.to_string(),
            pattern: pattern.to_string(),
        };
        let responses = self.exec(&cmd).await?;

        let mut mailboxes = Vec::new();
        for response_bytes in &responses {
            if let Ok(Response::Untagged(UntaggedResponse::List(list))) =
                ResponseParser::parse(response_bytes)
            {
                mailboxes.push(list);
            }
        }
        Ok(mailboxes)
    }

    /// Selects a mailbox.
    ///
    /// Consumes self and returns a selected client plus the mailbox status.
    /// A NO reply (no such mailbox) surfaces as [`crate::Error::No`] and
    /// leaves no client behind; callers reconnect or give up.
    pub async fn select(mut self, mailbox: &str) -> Result<(Client<S, Selected>, MailboxStatus)> {
        let cmd = Command::Select {
            mailbox: Mailbox::new(mailbox),
        };
        let responses = self.exec(&cmd).await?;
        let status = parse_mailbox_status(&responses);

        tracing::debug!(mailbox, exists = status.exists, "selected mailbox");

        let client = Client {
            stream: self.stream,
            tag_gen: self.tag_gen,
            state: Selected::new(mailbox, status.clone()),
        };
        Ok((client, status))
    }

    /// Gracefully disconnects from the server.
    pub async fn logout(mut self) -> Result<()> {
        self.logout_inner().await
    }
}

/// Collects mailbox status data from SELECT responses.
fn parse_mailbox_status(responses: &[Vec<u8>]) -> MailboxStatus {
    let mut status = MailboxStatus::default();

    for response_bytes in responses {
        let Ok(Response::Untagged(untagged)) = ResponseParser::parse(response_bytes) else {
            continue;
        };
        match untagged {
            UntaggedResponse::Exists(n) => status.exists = n,
            UntaggedResponse::Recent(n) => status.recent = n,
            UntaggedResponse::Status {
                status: Status::Ok,
                code: Some(code),
                ..
            } => match code {
                ResponseCode::UidValidity(v) => status.uid_validity = Some(v),
                ResponseCode::UidNext(n) => status.uid_next = Some(n),
                ResponseCode::Unseen(n) => status.unseen = Some(n),
                ResponseCode::Other(_) => {}
            },
            _ => {}
        }
    }

    status
}
