//! References: absolute paths into the store.
//!
//! A [`Reference`] is an ordered sequence of [`Value`] segments below the root.
//! Segments are values, not raw strings, so `/a/{x:1}/"hello world"` addresses a
//! complex key and a key containing a space.
//!
//! Two text forms exist:
//!
//! - the **literal** `</a/b>` (root is `</>`), produced by `Display` and read by
//!   [`Reference::parse`];
//! - the **path** `/a/b` (root is `/`), the literal without its delimiters, produced
//!   by [`Reference::to_path`] and read by [`Reference::from_path`]. Paths are what
//!   the HTTP layer puts after `/browse`, `/view` and friends.

use std::fmt;
use std::str::FromStr;

use crate::error::Result;
use crate::generator;
use crate::parser::{self, Parser};
use crate::value::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Reference {
    segments: Vec<Value>,
}

impl Reference {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_segments(segments: impl IntoIterator<Item = Value>) -> Self {
        Self {
            segments: segments.into_iter().collect(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[Value] {
        &self.segments
    }

    pub fn last_segment(&self) -> Option<&Value> {
        self.segments.last()
    }

    /// The reference with the last segment removed, or `None` for the root.
    pub fn parent(&self) -> Option<Reference> {
        let (_, init) = self.segments.split_last()?;
        Some(Reference {
            segments: init.to_vec(),
        })
    }

    pub fn child(&self, segment: impl Into<Value>) -> Reference {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend_from_slice(&self.segments);
        segments.push(segment.into());
        Reference { segments }
    }

    /// Parse a reference literal such as `</a/b>` or `</>`.
    pub fn parse(text: &str) -> Result<Reference> {
        let mut parser = Parser::new(text);
        parser.skip_ws();
        parser.expect('<')?;
        parser.expect('/')?;
        parser.skip_ws();
        let mut segments = Vec::new();
        if parser.peek() == Some('>') {
            parser.bump();
        } else {
            loop {
                parser.skip_ws();
                segments.push(parser.parse_value()?);
                parser.skip_ws();
                match parser.bump() {
                    Some('/') => continue,
                    Some('>') => break,
                    Some(c) => return Err(parser.error(format!("expected '/' or '>', found '{c}'"))),
                    None => return Err(parser.error("unterminated reference, expected '>'")),
                }
            }
        }
        parser.skip_ws();
        parser.expect_end()?;
        Ok(Reference { segments })
    }

    /// Build a reference from a filesystem-like path.
    ///
    /// The path is normalized first: empty and `.` segments are dropped and `..`
    /// removes the previous segment (staying at the root if there is none). Every
    /// remaining segment must then be a valid value literal.
    pub fn from_path(path: &str) -> Result<Reference> {
        let mut normalized: Vec<&str> = Vec::new();
        for part in split_path(path) {
            match part.trim() {
                "" | "." => {}
                ".." => {
                    normalized.pop();
                }
                _ => normalized.push(part),
            }
        }
        let segments = normalized
            .into_iter()
            .map(parser::parse)
            .collect::<Result<Vec<_>>>()?;
        Ok(Reference { segments })
    }

    /// The literal without its `<` `>` delimiters, usable as a URL path suffix.
    pub fn to_path(&self) -> String {
        if self.segments.is_empty() {
            return "/".to_string();
        }
        let mut out = String::new();
        for segment in &self.segments {
            out.push('/');
            out.push_str(&generator::generate(segment, false));
        }
        out
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.to_path())
    }
}

impl FromStr for Reference {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        Reference::parse(s)
    }
}

/// Split a path on `/`, ignoring separators inside quoted strings and braces.
fn split_path(path: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut depth = 0usize;
    let mut in_quotes = false;
    let mut escaped = false;
    for (i, c) in path.char_indices() {
        if in_quotes {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_quotes = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_quotes = true,
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            '/' if depth == 0 => {
                parts.push(&path[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&path[start..]);
    parts
}
