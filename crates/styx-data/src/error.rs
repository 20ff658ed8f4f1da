//! Error types for value parsing, reference navigation and store access.

use thiserror::Error;

/// Errors that can occur while parsing text or accessing a store.
#[derive(Error, Debug)]
pub enum Error {
    /// The input text was not a valid value or reference literal.
    /// Line and column are 1-based.
    #[error("parse error at line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    /// A value was used as the wrong variant (e.g. a scalar treated as complex).
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// The reference does not address an existing complex value.
    #[error("invalid access: {0} does not address a complex value")]
    InvalidAccess(String),

    /// The write would nest complex values deeper than the text form can be read back.
    #[error("value at {reference} nested too deeply: {depth} levels, at most {limit} allowed")]
    TooDeep {
        reference: String,
        depth: usize,
        limit: usize,
    },

    /// Nothing is stored at the reference. Explorer operations report this as
    /// `Outcome::NotFound`; the CLI turns it into this error.
    #[error("not found: {0}")]
    NotFound(String),

    /// The datastore URL names a backend this crate does not provide.
    #[error("unsupported datastore URL: {0}")]
    UnsupportedStore(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for errors caused by malformed user input.
    pub fn is_parse(&self) -> bool {
        matches!(self, Error::Parse { .. })
    }
}

/// Convenience alias used throughout styx-data.
pub type Result<T> = std::result::Result<T, Error>;
