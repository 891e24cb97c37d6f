//! IMAP response parser.
//!
//! A sans-I/O parser for the server responses this client consumes.
//! Input is one complete response as read off the wire, with any literals
//! already inlined by the framing layer.
//!
//! The parser is deliberately lenient: untagged data it does not recognize
//! is returned as [`UntaggedResponse::Other`] instead of an error, since
//! servers routinely send unsolicited status updates.

mod cursor;
mod fetch;

pub use fetch::FetchItem;

use crate::types::{
    Flag, Flags, ListResponse, Mailbox, MailboxAttribute, SeqNum, Status, Tag, Uid, UidValidity,
};
use crate::{Error, Result};

use cursor::Cursor;

/// A parsed IMAP response.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Tagged response (command completion).
    Tagged {
        /// The command tag.
        tag: Tag,
        /// Response status.
        status: Status,
        /// Human-readable text, including any bracketed response code.
        text: String,
    },
    /// Untagged response (server data).
    Untagged(UntaggedResponse),
    /// Continuation request.
    Continuation,
}

/// Resp-text code carried by an untagged status response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseCode {
    /// UIDVALIDITY of the selected mailbox.
    UidValidity(UidValidity),
    /// Next UID to be assigned.
    UidNext(Uid),
    /// First unseen message.
    Unseen(SeqNum),
    /// Any other code, kept verbatim.
    Other(String),
}

/// Untagged server data.
#[derive(Debug, Clone, PartialEq)]
pub enum UntaggedResponse {
    /// Untagged status (`* OK`, `* NO`, ...), with optional response code.
    Status {
        /// The status keyword.
        status: Status,
        /// Parsed response code, if one was present.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// Message count (`* n EXISTS`).
    Exists(u32),
    /// Recent count (`* n RECENT`).
    Recent(u32),
    /// A message was expunged (`* n EXPUNGE`).
    Expunge(SeqNum),
    /// SEARCH results. For UID SEARCH the numbers are UIDs.
    Search(Vec<Uid>),
    /// FETCH data for one message.
    Fetch {
        /// Message sequence number.
        seq: SeqNum,
        /// Fetched items.
        items: Vec<FetchItem>,
    },
    /// LIST response line.
    List(ListResponse),
    /// Mailbox flag list from SELECT (`* FLAGS (...)`).
    Flags(Flags),
    /// Anything else, kept verbatim for logging.
    Other(String),
}

/// Response parser.
pub struct ResponseParser;

impl ResponseParser {
    /// Parses a complete response.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] when the input does not start like any IMAP
    /// response or when recognized data is malformed beyond recovery.
    pub fn parse(input: &[u8]) -> Result<Response> {
        let mut cur = Cursor::new(input);

        if cur.eat(b"* ") {
            return Self::parse_untagged(&mut cur);
        }
        if cur.eat(b"+ ") || cur.eat(b"+\r\n") {
            return Ok(Response::Continuation);
        }

        let tag = cur.read_atom()?;
        cur.expect_space()?;
        let status_word = cur.read_atom()?;
        let status = Status::parse(&status_word)
            .ok_or_else(|| Error::Parse(format!("unknown status {status_word:?}")))?;
        cur.skip_space();
        let text = cur.rest_of_line();

        Ok(Response::Tagged {
            tag: Tag::new(tag),
            status,
            text,
        })
    }

    fn parse_untagged(cur: &mut Cursor<'_>) -> Result<Response> {
        // Numeric prefix means message data: EXISTS, RECENT, EXPUNGE, FETCH.
        if let Some(n) = cur.try_read_number() {
            cur.expect_space()?;
            let keyword = cur.read_atom()?.to_uppercase();
            return match keyword.as_str() {
                "EXISTS" => Ok(Response::Untagged(UntaggedResponse::Exists(n))),
                "RECENT" => Ok(Response::Untagged(UntaggedResponse::Recent(n))),
                "EXPUNGE" => {
                    let seq = SeqNum::new(n)
                        .ok_or_else(|| Error::Parse("sequence number 0".to_string()))?;
                    Ok(Response::Untagged(UntaggedResponse::Expunge(seq)))
                }
                "FETCH" => {
                    let seq = SeqNum::new(n)
                        .ok_or_else(|| Error::Parse("sequence number 0".to_string()))?;
                    cur.expect_space()?;
                    let items = fetch::parse_fetch_items(cur)?;
                    Ok(Response::Untagged(UntaggedResponse::Fetch { seq, items }))
                }
                _ => Ok(Response::Untagged(UntaggedResponse::Other(format!(
                    "{n} {keyword}"
                )))),
            };
        }

        let keyword = cur.read_atom()?.to_uppercase();
        match keyword.as_str() {
            "OK" | "NO" | "BAD" | "BYE" | "PREAUTH" => {
                // Status::parse succeeds for every keyword matched above.
                let status = Status::parse(&keyword)
                    .ok_or_else(|| Error::Parse(format!("unknown status {keyword:?}")))?;
                cur.skip_space();
                let (code, text) = parse_resp_text(cur);
                Ok(Response::Untagged(UntaggedResponse::Status {
                    status,
                    code,
                    text,
                }))
            }
            "SEARCH" => {
                let mut uids = Vec::new();
                loop {
                    cur.skip_space();
                    let Some(n) = cur.try_read_number() else { break };
                    let uid =
                        Uid::new(n).ok_or_else(|| Error::Parse("search returned UID 0".into()))?;
                    uids.push(uid);
                }
                Ok(Response::Untagged(UntaggedResponse::Search(uids)))
            }
            "LIST" => {
                cur.expect_space()?;
                let list = parse_list(cur)?;
                Ok(Response::Untagged(UntaggedResponse::List(list)))
            }
            "FLAGS" => {
                cur.expect_space()?;
                let flags = parse_flag_list(cur)?;
                Ok(Response::Untagged(UntaggedResponse::Flags(flags)))
            }
            _ => {
                let rest = cur.rest_of_line();
                Ok(Response::Untagged(UntaggedResponse::Other(format!(
                    "{keyword} {rest}"
                ))))
            }
        }
    }
}

/// Parses resp-text: an optional `[CODE ...]` followed by free text.
fn parse_resp_text(cur: &mut Cursor<'_>) -> (Option<ResponseCode>, String) {
    if !cur.peek_is(b'[') {
        return (None, cur.rest_of_line());
    }

    let bracketed = cur.read_bracketed();
    let code = parse_resp_code(&bracketed);
    cur.skip_space();
    (Some(code), cur.rest_of_line())
}

fn parse_resp_code(raw: &str) -> ResponseCode {
    let mut words = raw.splitn(2, ' ');
    let name = words.next().unwrap_or_default().to_uppercase();
    let arg = words.next().unwrap_or_default();

    let parsed = match name.as_str() {
        "UIDVALIDITY" => arg
            .parse()
            .ok()
            .and_then(UidValidity::new)
            .map(ResponseCode::UidValidity),
        "UIDNEXT" => arg.parse().ok().and_then(Uid::new).map(ResponseCode::UidNext),
        "UNSEEN" => arg
            .parse()
            .ok()
            .and_then(SeqNum::new)
            .map(ResponseCode::Unseen),
        _ => None,
    };
    parsed.unwrap_or_else(|| ResponseCode::Other(raw.to_string()))
}

/// Parses a LIST line: `(attributes) delimiter mailbox`.
fn parse_list(cur: &mut Cursor<'_>) -> Result<ListResponse> {
    cur.expect(b'(')?;
    let mut attributes = Vec::new();
    loop {
        cur.skip_space();
        if cur.eat(b")") {
            break;
        }
        let attr = cur.read_atom()?;
        attributes.push(MailboxAttribute::parse(&attr));
    }

    cur.expect_space()?;
    let delimiter = match cur.read_nstring()? {
        Some(bytes) => String::from_utf8_lossy(&bytes).chars().next(),
        None => None,
    };

    cur.expect_space()?;
    let name = cur
        .read_nstring()?
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default();

    Ok(ListResponse {
        attributes,
        delimiter,
        mailbox: Mailbox::new(name),
    })
}

/// Parses a parenthesized flag list.
pub(crate) fn parse_flag_list(cur: &mut Cursor<'_>) -> Result<Flags> {
    cur.expect(b'(')?;
    let mut flags = Flags::new();
    loop {
        cur.skip_space();
        if cur.eat(b")") {
            break;
        }
        let word = cur.read_atom()?;
        flags.insert(Flag::parse(&word));
    }
    Ok(flags)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn tagged_ok() {
        let parsed = ResponseParser::parse(b"A001 OK LOGIN completed\r\n").unwrap();
        match parsed {
            Response::Tagged { tag, status, text } => {
                assert_eq!(tag.as_str(), "A001");
                assert_eq!(status, Status::Ok);
                assert_eq!(text, "LOGIN completed");
            }
            other => panic!("expected tagged response, got {other:?}"),
        }
    }

    #[test]
    fn tagged_no_keeps_text() {
        let parsed = ResponseParser::parse(b"A002 NO [TRYCREATE] no such mailbox\r\n").unwrap();
        match parsed {
            Response::Tagged { status, text, .. } => {
                assert_eq!(status, Status::No);
                assert!(text.contains("no such mailbox"));
            }
            other => panic!("expected tagged response, got {other:?}"),
        }
    }

    #[test]
    fn untagged_exists() {
        let parsed = ResponseParser::parse(b"* 23 EXISTS\r\n").unwrap();
        assert_eq!(parsed, Response::Untagged(UntaggedResponse::Exists(23)));
    }

    #[test]
    fn untagged_expunge() {
        let parsed = ResponseParser::parse(b"* 4 EXPUNGE\r\n").unwrap();
        assert_eq!(
            parsed,
            Response::Untagged(UntaggedResponse::Expunge(SeqNum::new(4).unwrap()))
        );
    }

    #[test]
    fn untagged_search_uids() {
        let parsed = ResponseParser::parse(b"* SEARCH 2 84 882\r\n").unwrap();
        let expected = vec![
            Uid::new(2).unwrap(),
            Uid::new(84).unwrap(),
            Uid::new(882).unwrap(),
        ];
        assert_eq!(parsed, Response::Untagged(UntaggedResponse::Search(expected)));
    }

    #[test]
    fn untagged_search_empty() {
        let parsed = ResponseParser::parse(b"* SEARCH\r\n").unwrap();
        assert_eq!(
            parsed,
            Response::Untagged(UntaggedResponse::Search(Vec::new()))
        );
    }

    #[test]
    fn untagged_ok_uidvalidity() {
        let parsed = ResponseParser::parse(b"* OK [UIDVALIDITY 3857529045] UIDs valid\r\n").unwrap();
        match parsed {
            Response::Untagged(UntaggedResponse::Status { status, code, .. }) => {
                assert_eq!(status, Status::Ok);
                assert_eq!(
                    code,
                    Some(ResponseCode::UidValidity(
                        UidValidity::new(3_857_529_045).unwrap()
                    ))
                );
            }
            other => panic!("expected status response, got {other:?}"),
        }
    }

    #[test]
    fn untagged_list() {
        let parsed =
            ResponseParser::parse(b"* LIST (\\HasNoChildren) \"/\" \"Old Mail\"\r\n").unwrap();
        match parsed {
            Response::Untagged(UntaggedResponse::List(list)) => {
                assert_eq!(list.mailbox.as_str(), "Old Mail");
                assert_eq!(list.delimiter, Some('/'));
                assert!(list.is_selectable());
            }
            other => panic!("expected list response, got {other:?}"),
        }
    }

    #[test]
    fn untagged_list_noselect() {
        let parsed = ResponseParser::parse(b"* LIST (\\Noselect) \"/\" foo\r\n").unwrap();
        match parsed {
            Response::Untagged(UntaggedResponse::List(list)) => {
                assert!(!list.is_selectable());
                assert_eq!(list.mailbox.as_str(), "foo");
            }
            other => panic!("expected list response, got {other:?}"),
        }
    }

    #[test]
    fn untagged_flags() {
        let parsed = ResponseParser::parse(b"* FLAGS (\\Answered \\Seen \\Deleted)\r\n").unwrap();
        match parsed {
            Response::Untagged(UntaggedResponse::Flags(flags)) => {
                assert_eq!(flags.len(), 3);
                assert!(flags.contains(&Flag::Deleted));
            }
            other => panic!("expected flags response, got {other:?}"),
        }
    }

    #[test]
    fn unknown_untagged_is_lenient() {
        let parsed = ResponseParser::parse(b"* CAPABILITY IMAP4rev1 IDLE\r\n").unwrap();
        match parsed {
            Response::Untagged(UntaggedResponse::Other(text)) => {
                assert!(text.contains("IMAP4REV1") || text.contains("IMAP4rev1"));
            }
            other => panic!("expected lenient catch-all, got {other:?}"),
        }
    }

    #[test]
    fn continuation() {
        let parsed = ResponseParser::parse(b"+ Ready for literal\r\n").unwrap();
        assert_eq!(parsed, Response::Continuation);
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(ResponseParser::parse(b"\r\n").is_err());
    }
}
