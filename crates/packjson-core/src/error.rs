//! Error types for parsing and for typed access to parsed values.

use std::fmt;

use thiserror::Error;

use crate::value::Tag;

/// The reason a parse was rejected.
///
/// The set is closed: every rejection path of the parser maps to exactly one
/// of these kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// Malformed number literal (`01`, `1.`, `1.2.3`, a lone `-`, ...).
    BadNumber,
    /// Unterminated string, invalid escape, raw control character or
    /// invalid UTF-8 inside a string.
    BadString,
    /// A bare word that is not `true`, `false` or `null`.
    UnknownIdentifier,
    /// A number whose magnitude is too large to be represented as a finite double.
    Overflow,
    /// A number with non-zero digits whose magnitude rounds to zero.
    Underflow,
    /// A closing bracket that does not match, input ending inside a container,
    /// or content after the top-level value.
    MismatchBracket,
    /// Any other character where a value, key or separator was expected.
    UnexpectedCharacter,
}

/// Outcome of a parse as a flat status code.
///
/// [`ParseStatus::Ok`] plus one variant per [`ParseErrorKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseStatus {
    Ok,
    BadNumber,
    BadString,
    UnknownIdentifier,
    Overflow,
    Underflow,
    MismatchBracket,
    UnexpectedCharacter,
}

impl ParseStatus {
    /// Every status, in declaration order.
    pub const ALL: [ParseStatus; 8] = [
        ParseStatus::Ok,
        ParseStatus::BadNumber,
        ParseStatus::BadString,
        ParseStatus::UnknownIdentifier,
        ParseStatus::Overflow,
        ParseStatus::Underflow,
        ParseStatus::MismatchBracket,
        ParseStatus::UnexpectedCharacter,
    ];

    /// Fixed human-readable description of the status.
    pub const fn as_str(self) -> &'static str {
        match self {
            ParseStatus::Ok => "ok",
            ParseStatus::BadNumber => "bad number",
            ParseStatus::BadString => "bad string",
            ParseStatus::UnknownIdentifier => "unknown identifier",
            ParseStatus::Overflow => "number overflow",
            ParseStatus::Underflow => "number underflow",
            ParseStatus::MismatchBracket => "mismatched bracket",
            ParseStatus::UnexpectedCharacter => "unexpected character",
        }
    }

    pub fn is_ok(self) -> bool {
        self == ParseStatus::Ok
    }
}

impl fmt::Display for ParseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ParseErrorKind> for ParseStatus {
    fn from(kind: ParseErrorKind) -> Self {
        match kind {
            ParseErrorKind::BadNumber => ParseStatus::BadNumber,
            ParseErrorKind::BadString => ParseStatus::BadString,
            ParseErrorKind::UnknownIdentifier => ParseStatus::UnknownIdentifier,
            ParseErrorKind::Overflow => ParseStatus::Overflow,
            ParseErrorKind::Underflow => ParseStatus::Underflow,
            ParseErrorKind::MismatchBracket => ParseStatus::MismatchBracket,
            ParseErrorKind::UnexpectedCharacter => ParseStatus::UnexpectedCharacter,
        }
    }
}

impl ParseErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            ParseErrorKind::BadNumber => ParseStatus::BadNumber.as_str(),
            ParseErrorKind::BadString => ParseStatus::BadString.as_str(),
            ParseErrorKind::UnknownIdentifier => ParseStatus::UnknownIdentifier.as_str(),
            ParseErrorKind::Overflow => ParseStatus::Overflow.as_str(),
            ParseErrorKind::Underflow => ParseStatus::Underflow.as_str(),
            ParseErrorKind::MismatchBracket => ParseStatus::MismatchBracket.as_str(),
            ParseErrorKind::UnexpectedCharacter => ParseStatus::UnexpectedCharacter.as_str(),
        }
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Human-readable description of a parse status.
pub fn str_error(status: ParseStatus) -> &'static str {
    status.as_str()
}

/// Collapse a parse result into its status code.
pub fn status_of<T>(result: &std::result::Result<T, ParseError>) -> ParseStatus {
    match result {
        Ok(_) => ParseStatus::Ok,
        Err(err) => err.kind.into(),
    }
}

/// A rejected parse: what went wrong and the byte offset where it was detected.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("{kind} at byte {position}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// Offset into the input buffer.
    pub position: usize,
}

impl ParseError {
    pub(crate) fn new(kind: ParseErrorKind, position: usize) -> Self {
        Self { kind, position }
    }

    pub fn status(&self) -> ParseStatus {
        self.kind.into()
    }
}

/// Errors raised by the typed accessors on [`Value`](crate::Value).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessError {
    /// The accessor does not match the value's tag.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: Tag, found: Tag },
}

/// Errors raised when copying a tree into another representation.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertError {
    /// The tree nests containers deeper than the conversion allows.
    #[error("value nests deeper than {limit} levels")]
    TooDeep { limit: usize },
}

/// Convenience alias used throughout packjson-core.
pub type Result<T> = std::result::Result<T, ParseError>;
