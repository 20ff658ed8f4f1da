//! Value parser: reads the text form back into a [`Value`].
//!
//! The grammar is small enough for a hand-written recursive-descent parser:
//!
//! - `{}` or `{ key: value, ... }` (trailing comma allowed) → complex
//! - `"..."` with `\" \\ \/ \n \r \t \uXXXX` escapes → scalar
//! - a bare token (letters, digits, `_ - + $ @ ~`, and `.` after the first char) → scalar
//!
//! Whitespace (including newlines) is insignificant between tokens, so compact and
//! indented output parse to the same value.
//!
//! # Key design decisions
//!
//! - **Whole-input parsing**: [`parse`] fails on trailing characters, so a caller
//!   never mutates anything based on a prefix of what the user typed.
//! - **Shared cursor**: reference literals (`</a/b>`) reuse [`Parser`] so that
//!   segments go through exactly the same value grammar.
//! - **Duplicate keys**: a later entry replaces the earlier one in place, matching
//!   [`Complex::put`].

use crate::error::{Error, Result};
use crate::generator::{is_bare_char, is_bare_start};
use crate::value::{Complex, Value};

/// Nesting limit for complex values; deeper input is rejected instead of
/// exhausting the stack.
pub(crate) const MAX_DEPTH: usize = 256;

/// Parse a complete value. Surrounding whitespace is ignored.
pub fn parse(text: &str) -> Result<Value> {
    let mut parser = Parser::new(text);
    parser.skip_ws();
    let value = parser.parse_value()?;
    parser.skip_ws();
    parser.expect_end()?;
    Ok(value)
}

/// Cursor over the input text, tracking a byte offset for error positions.
pub(crate) struct Parser<'a> {
    text: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        Self {
            text,
            pos: 0,
            depth: 0,
        }
    }

    pub(crate) fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    pub(crate) fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    pub(crate) fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    pub(crate) fn expect(&mut self, expected: char) -> Result<()> {
        match self.peek() {
            Some(c) if c == expected => {
                self.pos += c.len_utf8();
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected '{expected}', found '{c}'"))),
            None => Err(self.error(format!("expected '{expected}', found end of input"))),
        }
    }

    pub(crate) fn expect_end(&self) -> Result<()> {
        match self.peek() {
            None => Ok(()),
            Some(c) => Err(self.error(format!("unexpected trailing character '{c}'"))),
        }
    }

    /// Parse one value starting at the cursor. Leading whitespace must already be
    /// skipped; trailing whitespace is left in place.
    pub(crate) fn parse_value(&mut self) -> Result<Value> {
        match self.peek() {
            Some('{') => self.parse_complex(),
            Some('"') => self.parse_quoted().map(Value::Scalar),
            Some(c) if is_bare_start(c) => Ok(Value::Scalar(self.parse_bare())),
            Some(c) => Err(self.error(format!("unexpected character '{c}'"))),
            None => Err(self.error("expected a value, found end of input")),
        }
    }

    fn parse_complex(&mut self) -> Result<Value> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error("complex values nested too deeply"));
        }
        self.depth += 1;
        self.expect('{')?;
        let mut complex = Complex::new();
        self.skip_ws();
        while self.peek() != Some('}') {
            let key = self.parse_value()?;
            self.skip_ws();
            self.expect(':')?;
            self.skip_ws();
            let value = self.parse_value()?;
            complex.put(key, value);
            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.pos += 1;
                    self.skip_ws();
                }
                Some('}') => break,
                Some(c) => return Err(self.error(format!("expected ',' or '}}', found '{c}'"))),
                None => return Err(self.error("unterminated complex value, expected '}'")),
            }
        }
        self.expect('}')?;
        self.depth -= 1;
        Ok(Value::Complex(complex))
    }

    fn parse_bare(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !is_bare_char(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        self.text[start..self.pos].to_string()
    }

    fn parse_quoted(&mut self) -> Result<String> {
        self.expect('"')?;
        let mut out = String::new();
        loop {
            let escape_pos = self.pos;
            match self.bump() {
                Some('"') => return Ok(out),
                Some('\\') => match self.bump() {
                    Some('"') => out.push('"'),
                    Some('\\') => out.push('\\'),
                    Some('/') => out.push('/'),
                    Some('n') => out.push('\n'),
                    Some('r') => out.push('\r'),
                    Some('t') => out.push('\t'),
                    Some('u') => out.push(self.parse_unicode_escape(escape_pos)?),
                    Some(other) => {
                        self.pos = escape_pos;
                        return Err(self.error(format!("invalid escape sequence '\\{other}'")));
                    }
                    None => return Err(self.error("unterminated string")),
                },
                Some(c) => out.push(c),
                None => return Err(self.error("unterminated string")),
            }
        }
    }

    fn parse_unicode_escape(&mut self, escape_pos: usize) -> Result<char> {
        let end = self.pos + 4;
        let hex = self.text.get(self.pos..end).filter(|h| h.chars().all(|c| c.is_ascii_hexdigit()));
        let code = hex.and_then(|h| u32::from_str_radix(h, 16).ok());
        match code.and_then(char::from_u32) {
            Some(c) => {
                self.pos = end;
                Ok(c)
            }
            None => {
                self.pos = escape_pos;
                Err(self.error("invalid unicode escape, expected \\uXXXX"))
            }
        }
    }

    /// Build a parse error at the current cursor position.
    pub(crate) fn error(&self, message: impl Into<String>) -> Error {
        let consumed = &self.text[..self.pos];
        let line = consumed.matches('\n').count() + 1;
        let column = match consumed.rfind('\n') {
            Some(nl) => consumed[nl + 1..].chars().count() + 1,
            None => consumed.chars().count() + 1,
        };
        Error::Parse {
            line,
            column,
            message: message.into(),
        }
    }
}
