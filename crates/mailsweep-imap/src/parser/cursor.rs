//! Byte cursor over a single response.

use crate::{Error, Result};

/// Cursor over raw response bytes.
pub(crate) struct Cursor<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) const fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    pub(crate) fn peek_is(&self, b: u8) -> bool {
        self.peek() == Some(b)
    }

    /// Consumes the prefix if present.
    pub(crate) fn eat(&mut self, prefix: &[u8]) -> bool {
        if self.input[self.pos..].starts_with(prefix) {
            self.pos += prefix.len();
            true
        } else {
            false
        }
    }

    /// Consumes the prefix if present, ignoring ASCII case.
    pub(crate) fn eat_ignore_ascii_case(&mut self, prefix: &[u8]) -> bool {
        let matches = self
            .input
            .get(self.pos..self.pos + prefix.len())
            .is_some_and(|chunk| chunk.eq_ignore_ascii_case(prefix));
        if matches {
            self.pos += prefix.len();
        }
        matches
    }

    pub(crate) fn expect(&mut self, b: u8) -> Result<()> {
        if self.peek_is(b) {
            self.pos += 1;
            Ok(())
        } else {
            Err(Error::Parse(format!(
                "expected {:?} at offset {}",
                char::from(b),
                self.pos
            )))
        }
    }

    pub(crate) fn expect_space(&mut self) -> Result<()> {
        self.expect(b' ')
    }

    pub(crate) fn skip_space(&mut self) {
        while self.peek_is(b' ') {
            self.pos += 1;
        }
    }

    /// Reads an atom: bytes up to a space, parenthesis, or line end.
    pub(crate) fn read_atom(&mut self) -> Result<String> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if matches!(b, b' ' | b'(' | b')' | b'\r' | b'\n') {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(Error::Parse(format!("expected atom at offset {start}")));
        }
        Ok(String::from_utf8_lossy(&self.input[start..self.pos]).into_owned())
    }

    /// Reads a number if the next byte is a digit.
    pub(crate) fn try_read_number(&mut self) -> Option<u32> {
        if !self.peek().is_some_and(|b| b.is_ascii_digit()) {
            return None;
        }
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        let digits = std::str::from_utf8(&self.input[start..self.pos]).ok()?;
        match digits.parse() {
            Ok(n) => Some(n),
            Err(_) => {
                self.pos = start;
                None
            }
        }
    }

    pub(crate) fn read_number(&mut self) -> Result<u32> {
        self.try_read_number()
            .ok_or_else(|| Error::Parse(format!("expected number at offset {}", self.pos)))
    }

    /// Reads a quoted string, handling backslash escapes.
    pub(crate) fn read_quoted(&mut self) -> Result<Vec<u8>> {
        self.expect(b'"')?;
        let mut out = Vec::new();
        loop {
            match self.peek() {
                Some(b'"') => {
                    self.pos += 1;
                    return Ok(out);
                }
                Some(b'\\') => {
                    self.pos += 1;
                    let escaped = self
                        .peek()
                        .ok_or_else(|| Error::Parse("unterminated escape".to_string()))?;
                    out.push(escaped);
                    self.pos += 1;
                }
                Some(b) => {
                    out.push(b);
                    self.pos += 1;
                }
                None => return Err(Error::Parse("unterminated quoted string".to_string())),
            }
        }
    }

    /// Reads a literal: `{n}\r\n` followed by n bytes (already inlined).
    pub(crate) fn read_literal(&mut self) -> Result<Vec<u8>> {
        self.expect(b'{')?;
        let len = self.read_number()? as usize;
        // Non-synchronizing literals ({n+}) appear in some server replies.
        let _ = self.eat(b"+");
        self.expect(b'}')?;
        if !self.eat(b"\r\n") {
            return Err(Error::Parse("literal header not followed by CRLF".to_string()));
        }
        let end = self.pos + len;
        if end > self.input.len() {
            return Err(Error::Parse(format!(
                "literal of {len} bytes exceeds response"
            )));
        }
        let data = self.input[self.pos..end].to_vec();
        self.pos = end;
        Ok(data)
    }

    /// Reads an nstring: NIL, a quoted string, or a literal.
    pub(crate) fn read_nstring(&mut self) -> Result<Option<Vec<u8>>> {
        match self.peek() {
            Some(b'"') => Ok(Some(self.read_quoted()?)),
            Some(b'{') => Ok(Some(self.read_literal()?)),
            _ => {
                let word = self.read_atom()?;
                if word.eq_ignore_ascii_case("NIL") {
                    Ok(None)
                } else {
                    Ok(Some(word.into_bytes()))
                }
            }
        }
    }

    /// Reads a `[...]` section including nothing of the brackets themselves.
    pub(crate) fn read_bracketed(&mut self) -> String {
        let _ = self.eat(b"[");
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b == b']' {
                break;
            }
            self.pos += 1;
        }
        let inner = String::from_utf8_lossy(&self.input[start..self.pos]).into_owned();
        let _ = self.eat(b"]");
        inner
    }

    /// Consumes and returns everything up to the trailing CRLF.
    pub(crate) fn rest_of_line(&mut self) -> String {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b == b'\r' || b == b'\n' {
                break;
            }
            self.pos += 1;
        }
        let text = String::from_utf8_lossy(&self.input[start..self.pos]).into_owned();
        self.pos = self.input.len();
        text
    }

    /// Skips one value of any shape (used for unrecognized FETCH items).
    pub(crate) fn skip_value(&mut self) -> Result<()> {
        match self.peek() {
            Some(b'"') => {
                self.read_quoted()?;
            }
            Some(b'{') => {
                self.read_literal()?;
            }
            Some(b'(') => {
                self.pos += 1;
                let mut depth = 1u32;
                while depth > 0 {
                    match self.peek() {
                        Some(b'(') => depth += 1,
                        Some(b')') => depth -= 1,
                        Some(b'"') => {
                            self.read_quoted()?;
                            continue;
                        }
                        Some(b'{') => {
                            self.read_literal()?;
                            continue;
                        }
                        Some(_) => {}
                        None => {
                            return Err(Error::Parse("unbalanced parenthesis".to_string()));
                        }
                    }
                    self.pos += 1;
                }
            }
            _ => {
                self.read_atom()?;
            }
        }
        Ok(())
    }
}
