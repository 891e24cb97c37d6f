//! Implementation for the not-authenticated state.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};

use super::Client;
use super::states::{Authenticated, NotAuthenticated};
use crate::command::{Command, TagGenerator};
use crate::connection::framed::FramedStream;
use crate::parser::{Response, ResponseParser, UntaggedResponse};
use crate::types::Status;
use crate::{Error, Result};

impl<S> Client<S, NotAuthenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new client from a connected stream.
    ///
    /// Reads and validates the server greeting.
    pub async fn from_stream(stream: S) -> Result<Self> {
        Self::with_io_timeout(stream, None).await
    }

    /// Creates a new client with a per-exchange I/O timeout.
    pub async fn with_io_timeout(stream: S, timeout: Option<Duration>) -> Result<Self> {
        let mut framed = FramedStream::new(stream);
        framed.set_io_timeout(timeout);

        let greeting = framed.read_response().await?;
        match ResponseParser::parse(&greeting)? {
            Response::Untagged(UntaggedResponse::Status { status, text, .. }) => match status {
                Status::Ok | Status::PreAuth => {}
                Status::Bye => return Err(Error::Bye(text)),
                Status::No | Status::Bad => {
                    return Err(Error::Protocol(format!("unexpected greeting: {text}")));
                }
            },
            other => {
                return Err(Error::Protocol(format!("unexpected greeting: {other:?}")));
            }
        }

        Ok(Self {
            stream: framed,
            tag_gen: TagGenerator::default(),
            state: NotAuthenticated,
        })
    }

    /// Authenticates with the server using LOGIN.
    ///
    /// Consumes self and returns an authenticated client on success.
    pub async fn login(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<S, Authenticated>> {
        let cmd = Command::Login {
            username: username.to_string(),
            password: password.to_string(),
        };
        self.exec(&cmd).await?;

        tracing::debug!(username, "authenticated");

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
