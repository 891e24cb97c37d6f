//! FETCH response data parsing.

use chrono::{DateTime, FixedOffset};

use crate::{Error, Result};
use crate::types::{Flags, Uid};

use super::cursor::Cursor;
use super::parse_flag_list;

/// One item from a FETCH response.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchItem {
    /// Message UID.
    Uid(Uid),
    /// Internal date recorded by the server.
    InternalDate(DateTime<FixedOffset>),
    /// Message flags.
    Flags(Flags),
    /// Raw bytes of a requested header-field section.
    HeaderFields(Vec<u8>),
    /// An item we did not ask for; value skipped.
    Other(String),
}

/// Parses the parenthesized item list of a FETCH response.
pub(crate) fn parse_fetch_items(cur: &mut Cursor<'_>) -> Result<Vec<FetchItem>> {
    cur.expect(b'(')?;
    let mut items = Vec::new();

    loop {
        cur.skip_space();
        if cur.eat(b")") {
            break;
        }

        // BODY items carry a section whose field list contains spaces and
        // parentheses, so they cannot be read as a plain atom:
        // BODY[HEADER.FIELDS (SUBJECT FROM)]
        let name = if cur.eat_ignore_ascii_case(b"BODY[") {
            let _section = cur.read_bracketed();
            "BODY[]".to_string()
        } else {
            cur.read_atom()?.to_uppercase()
        };
        cur.skip_space();

        match name.as_str() {
            "UID" => {
                let n = cur.read_number()?;
                let uid = Uid::new(n).ok_or_else(|| Error::Parse("FETCH returned UID 0".into()))?;
                items.push(FetchItem::Uid(uid));
            }
            "INTERNALDATE" => {
                let raw = cur.read_quoted()?;
                let text = String::from_utf8_lossy(&raw);
                items.push(FetchItem::InternalDate(parse_internal_date(&text)?));
            }
            "FLAGS" => {
                items.push(FetchItem::Flags(parse_flag_list(cur)?));
            }
            "BODY[]" => {
                let data = cur.read_nstring()?.unwrap_or_default();
                items.push(FetchItem::HeaderFields(data));
            }
            _ => {
                cur.skip_value()?;
                items.push(FetchItem::Other(name));
            }
        }
    }

    Ok(items)
}

/// Parses an INTERNALDATE value, e.g. `" 1-Jan-2023 00:12:59 +0000"`.
///
/// The day field is space-padded on the wire for days below 10.
fn parse_internal_date(s: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_str(s.trim(), "%d-%b-%Y %H:%M:%S %z")
        .map_err(|e| Error::Parse(format!("bad INTERNALDATE {s:?}: {e}")))
}
