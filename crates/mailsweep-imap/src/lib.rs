//! # mailsweep-imap
//!
//! A minimal async IMAP4rev1 (RFC 3501) client library, sized for mailbox
//! maintenance tools: authenticate, list, select, search by date, fetch
//! metadata, flag, and expunge.
//!
//! ## Features
//!
//! - **Type-state connection management**: Compile-time enforcement of valid
//!   IMAP state transitions (`NotAuthenticated` → `Authenticated` →
//!   `Selected`)
//! - **Typed date criteria**: SEARCH dates are `chrono::NaiveDate`, never
//!   hand-formatted strings
//! - **TLS via rustls**: Secure connections without an OpenSSL dependency
//! - **Lenient sans-I/O parser**: Protocol parsing separated from network
//!   I/O; unrecognized untagged data is preserved, not fatal
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailsweep_imap::{Client, Config, SearchCriteria};
//!
//! #[tokio::main]
//! async fn main() -> mailsweep_imap::Result<()> {
//!     let config = Config::new("imap.example.com");
//!     let stream = mailsweep_imap::connection::connect(&config).await?;
//!     let client = Client::from_stream(stream).await?;
//!
//!     let client = client.login("user@example.com", "password").await?;
//!     let (mut client, status) = client.select("INBOX").await?;
//!     println!("Messages: {}", status.exists);
//!
//!     let cutoff = chrono::NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
//!     let uids = client.uid_search(&SearchCriteria::Before(cutoff)).await?;
//!     println!("Stale messages: {}", uids.len());
//!
//!     client.logout().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Connection States
//!
//! ```text
//! NotAuthenticated ── login() ──→ Authenticated ── select() ──→ Selected
//!                                       ↑                          │
//!                                       └──────── close() ─────────┘
//! ```
//!
//! ## Modules
//!
//! - [`command`]: IMAP command builders and types
//! - [`connection`]: Connection management and type-state client
//! - [`parser`]: Sans-I/O response parser
//! - [`types`]: Core IMAP types (flags, mailboxes, UID sets, etc.)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod types;

pub use command::{Command, FetchAttribute, FetchItems, SearchCriteria, StoreAction, TagGenerator};
pub use connection::{
    Authenticated, Client, Config, ConfigBuilder, FramedStream, ImapStream, NotAuthenticated,
    ResponseAccumulator, Security, Selected,
};
pub use error::{Error, Result};
pub use parser::{FetchItem, Response, ResponseParser, UntaggedResponse};
pub use types::{
    Flag, Flags, ListResponse, Mailbox, MailboxAttribute, MailboxStatus, SeqNum, Status, Tag, Uid,
    UidSet, UidValidity,
};

/// IMAP protocol version supported.
pub const IMAP_VERSION: &str = "IMAP4rev1";
