//! Command-line arguments and input parsing.

use anyhow::Context;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use clap::Parser;

/// Delete old messages from an IMAP mailbox.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// IMAP server address.
    #[arg(long)]
    pub server: String,

    /// IMAP server port (default: 993, or 143 with --no-tls).
    #[arg(long)]
    pub port: Option<u16>,

    /// Email account username.
    #[arg(long)]
    pub username: String,

    /// Email account password (prompted securely when omitted).
    #[arg(long)]
    pub password: Option<String>,

    /// Disable TLS.
    #[arg(long)]
    pub no_tls: bool,

    /// Folder to clean.
    #[arg(long, default_value = "INBOX")]
    pub folder: String,

    /// List available folders and exit.
    #[arg(long)]
    pub list_folders: bool,

    /// Delete messages older than this many days.
    #[arg(long, value_name = "DAYS", conflicts_with = "time_range")]
    pub days: Option<i64>,

    /// Delete messages within a time range
    /// (format: YYYY-MM-DD or "YYYY-MM-DD HH:MM", interpreted as UTC).
    #[arg(long, num_args = 2, value_names = ["START", "END"])]
    pub time_range: Option<Vec<String>>,

    /// Report what would be deleted without deleting anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Messages per mark/expunge round trip.
    #[arg(long, default_value_t = mailsweep_core::DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Verbose logging.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Parses a timestamp as `YYYY-MM-DD HH:MM` or `YYYY-MM-DD` (midnight),
/// interpreted as UTC.
pub fn parse_timestamp(s: &str) -> anyhow::Result<DateTime<Utc>> {
    let naive: NaiveDateTime = if s.contains(' ') {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M")
            .with_context(|| format!("invalid timestamp {s:?}, expected YYYY-MM-DD HH:MM"))?
    } else {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("invalid date {s:?}, expected YYYY-MM-DD"))?
            .and_time(NaiveTime::MIN)
    };
    Ok(naive.and_utc())
}
