//! Single-pass JSON parser that builds a [`Value`] tree inside an [`Arena`].
//!
//! The parser walks the input once, left to right, and handles:
//!
//! - Objects and arrays of any depth
//! - Strings with `\" \\ \/ \b \f \n \r \t` and `\uXXXX` escapes, including
//!   surrogate pairs
//! - Numbers with optional sign, fraction and exponent
//! - The literals `true`, `false` and `null`
//!
//! # Key design decisions
//!
//! - **Explicit stack**: open containers live on a `Vec<Frame>` instead of the
//!   call stack, so deeply nested input cannot overflow the thread stack.
//! - **Tail append**: each frame keeps a tail pointer and appends cells as they
//!   are discovered, so link order equals source order without a final
//!   reversal.
//! - **Strings are copied**: decoded strings are written to the arena with a
//!   NUL terminator. The input is never mutated and may be dropped as soon as
//!   parsing returns.
//! - **NUL ends the text**: the scan stops at the end of the slice or at the
//!   first NUL byte, whichever comes first.
//! - **Numbers** are validated against the JSON grammar, then converted with
//!   the correctly rounded `f64` parser. Results that round to infinity are
//!   rejected as overflow; results that round to zero from non-zero digits are
//!   rejected as underflow.

use std::ptr::NonNull;

use tracing::{debug, trace};

use crate::arena::Arena;
use crate::error::{ParseError, ParseErrorKind, Result};
use crate::node::{Element, List, Pair, StrNode};
use crate::value::Value;

/// A successful parse: the root value and the offset where scanning stopped.
#[derive(Debug, Clone, Copy)]
pub struct Parsed<'a> {
    pub value: Value<'a>,
    /// Offset just past the top-level value and any trailing whitespace. Equal
    /// to the input length unless the text was terminated by a NUL byte.
    pub end: usize,
}

/// Parse `input` into `arena`.
///
/// On failure, memory already taken from the arena stays allocated and is
/// released with the arena; no partial tree is returned.
///
/// ```rust
/// use packjson_core::{parse_in, Arena};
///
/// let arena = Arena::new();
/// let first = parse_in(&arena, br#"{"id":1}"#).unwrap();
/// let second = parse_in(&arena, b"[true]").unwrap();
/// assert_eq!(first.value.get("id").unwrap().as_number().unwrap(), 1.0);
/// assert!(second.value.at(0).unwrap().as_bool().unwrap());
/// ```
///
/// The result borrows the arena and cannot outlive it:
///
/// ```compile_fail
/// use packjson_core::{parse_in, Arena};
///
/// let arena = Arena::new();
/// let parsed = parse_in(&arena, br#"["kept"]"#).unwrap();
/// drop(arena);
/// assert!(parsed.value.is_array());
/// ```
pub fn parse_in<'a>(arena: &'a Arena, input: &[u8]) -> Result<Parsed<'a>> {
    let mut parser = Parser::new(arena, input);
    match parser.parse_document() {
        Ok(value) => {
            trace!(bytes = input.len(), end = parser.pos, "parsed document");
            Ok(Parsed {
                value,
                end: parser.pos,
            })
        }
        Err(err) => {
            debug!(kind = %err.kind, position = err.position, "parse failed");
            Err(err)
        }
    }
}

/// An open container.
enum Frame {
    Array(List<Element>),
    /// `key` is the key of the member whose value is being parsed.
    Object { list: List<Pair>, key: NonNull<StrNode> },
}

impl Frame {
    fn push(&mut self, arena: &Arena, value: Value<'_>) {
        match self {
            Frame::Array(list) => list.append(arena.alloc(Element {
                next: None,
                value: value.to_bits(),
            })),
            Frame::Object { list, key } => list.append(arena.alloc(Pair {
                next: None,
                key: *key,
                value: value.to_bits(),
            })),
        }
    }

    fn closer(&self) -> u8 {
        match self {
            Frame::Array(_) => b']',
            Frame::Object { .. } => b'}',
        }
    }

    fn finish<'a>(self) -> Value<'a> {
        match self {
            Frame::Array(list) => Value::array(list.head()),
            Frame::Object { list, .. } => Value::object(list.head()),
        }
    }
}

fn is_whitespace(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r')
}

/// Bytes that may legally follow a number.
fn is_delimiter(byte: u8) -> bool {
    is_whitespace(byte) || matches!(byte, b',' | b':' | b']' | b'}' | 0)
}

struct Parser<'a, 'i> {
    arena: &'a Arena,
    input: &'i [u8],
    pos: usize,
    stack: Vec<Frame>,
    /// Decode buffer for strings containing escapes, reused across strings.
    scratch: Vec<u8>,
}

impl<'a, 'i> Parser<'a, 'i> {
    fn new(arena: &'a Arena, input: &'i [u8]) -> Self {
        Self {
            arena,
            input,
            pos: 0,
            stack: Vec::new(),
            scratch: Vec::new(),
        }
    }

    /// Byte at `pos`, or NUL past the end of the input.
    fn byte_at(&self, pos: usize) -> u8 {
        self.input.get(pos).copied().unwrap_or(0)
    }

    fn peek(&self) -> u8 {
        self.byte_at(self.pos)
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(kind, self.pos)
    }

    fn skip_whitespace(&mut self) {
        while is_whitespace(self.peek()) {
            self.pos += 1;
        }
    }

    fn parse_document(&mut self) -> Result<Value<'a>> {
        'value: loop {
            self.skip_whitespace();
            let mut value = match self.peek() {
                b'{' => {
                    self.pos += 1;
                    self.skip_whitespace();
                    if self.peek() == b'}' {
                        self.pos += 1;
                        Value::object(None)
                    } else {
                        let key = self.parse_key()?;
                        self.stack.push(Frame::Object {
                            list: List::new(),
                            key,
                        });
                        continue 'value;
                    }
                }
                b'[' => {
                    self.pos += 1;
                    self.skip_whitespace();
                    if self.peek() == b']' {
                        self.pos += 1;
                        Value::array(None)
                    } else {
                        self.stack.push(Frame::Array(List::new()));
                        continue 'value;
                    }
                }
                b'"' => {
                    self.pos += 1;
                    Value::string(self.parse_string()?)
                }
                b'-' | b'0'..=b'9' => Value::from_f64(self.parse_number()?),
                b'a'..=b'z' | b'A'..=b'Z' => self.parse_literal()?,
                b']' | b'}' if self.stack.is_empty() => {
                    return Err(self.error(ParseErrorKind::MismatchBracket));
                }
                0 if !self.stack.is_empty() => {
                    return Err(self.error(ParseErrorKind::MismatchBracket));
                }
                _ => return Err(self.error(ParseErrorKind::UnexpectedCharacter)),
            };

            // Attach the finished value to its container, then consume
            // separators and closing brackets until another value is expected.
            loop {
                let Some(frame) = self.stack.last_mut() else {
                    self.skip_whitespace();
                    if self.peek() != 0 {
                        return Err(self.error(ParseErrorKind::MismatchBracket));
                    }
                    return Ok(value);
                };
                frame.push(self.arena, value);
                let closer = frame.closer();

                self.skip_whitespace();
                match self.peek() {
                    b',' => {
                        self.pos += 1;
                        if closer == b'}' {
                            self.skip_whitespace();
                            let next_key = self.parse_key()?;
                            if let Some(Frame::Object { key, .. }) = self.stack.last_mut() {
                                *key = next_key;
                            }
                        }
                        continue 'value;
                    }
                    byte if byte == closer => {
                        self.pos += 1;
                        value = match self.stack.pop() {
                            Some(frame) => frame.finish(),
                            None => unreachable!("closing bracket without an open container"),
                        };
                    }
                    b']' | b'}' | 0 => return Err(self.error(ParseErrorKind::MismatchBracket)),
                    _ => return Err(self.error(ParseErrorKind::UnexpectedCharacter)),
                }
            }
        }
    }

    /// Parse `"key"` followed by `:`; the cursor must be on the opening quote.
    fn parse_key(&mut self) -> Result<NonNull<StrNode>> {
        match self.peek() {
            b'"' => {
                self.pos += 1;
                let key = self.parse_string()?;
                self.skip_whitespace();
                match self.peek() {
                    b':' => {
                        self.pos += 1;
                        Ok(key)
                    }
                    0 => Err(self.error(ParseErrorKind::MismatchBracket)),
                    _ => Err(self.error(ParseErrorKind::UnexpectedCharacter)),
                }
            }
            0 => Err(self.error(ParseErrorKind::MismatchBracket)),
            _ => Err(self.error(ParseErrorKind::UnexpectedCharacter)),
        }
    }

    fn parse_literal(&mut self) -> Result<Value<'a>> {
        let start = self.pos;
        let mut end = start;
        while matches!(self.byte_at(end), b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_') {
            end += 1;
        }
        let value = match &self.input[start..end] {
            b"true" => Value::from_bool(true),
            b"false" => Value::from_bool(false),
            b"null" => Value::null(),
            _ => return Err(ParseError::new(ParseErrorKind::UnknownIdentifier, start)),
        };
        self.pos = end;
        Ok(value)
    }

    /// Advance over ASCII digits; returns the end offset and whether any digit was non-zero.
    fn scan_digits(&self, mut pos: usize) -> (usize, bool) {
        let mut nonzero = false;
        while let digit @ b'0'..=b'9' = self.byte_at(pos) {
            nonzero |= digit != b'0';
            pos += 1;
        }
        (pos, nonzero)
    }

    fn parse_number(&mut self) -> Result<f64> {
        let bad = |pos| ParseError::new(ParseErrorKind::BadNumber, pos);
        let start = self.pos;
        let mut pos = start;

        if self.byte_at(pos) == b'-' {
            pos += 1;
        }

        let mut significant = false;
        match self.byte_at(pos) {
            b'0' => {
                pos += 1;
                if self.byte_at(pos).is_ascii_digit() {
                    return Err(bad(pos));
                }
            }
            b'1'..=b'9' => {
                (pos, _) = self.scan_digits(pos);
                significant = true;
            }
            _ => return Err(bad(pos)),
        }

        if self.byte_at(pos) == b'.' {
            pos += 1;
            let (end, nonzero) = self.scan_digits(pos);
            if end == pos {
                return Err(bad(pos));
            }
            significant |= nonzero;
            pos = end;
        }

        if matches!(self.byte_at(pos), b'e' | b'E') {
            pos += 1;
            if matches!(self.byte_at(pos), b'+' | b'-') {
                pos += 1;
            }
            let (end, _) = self.scan_digits(pos);
            if end == pos {
                return Err(bad(pos));
            }
            pos = end;
        }

        if !is_delimiter(self.byte_at(pos)) {
            return Err(bad(pos));
        }

        let text = std::str::from_utf8(&self.input[start..pos]).map_err(|_| bad(start))?;
        let number: f64 = text.parse().map_err(|_| bad(start))?;
        if number.is_infinite() {
            return Err(ParseError::new(ParseErrorKind::Overflow, start));
        }
        if number == 0.0 && significant {
            return Err(ParseError::new(ParseErrorKind::Underflow, start));
        }

        self.pos = pos;
        Ok(number)
    }

    /// Parse a string body; the cursor must be just past the opening quote.
    fn parse_string(&mut self) -> Result<NonNull<StrNode>> {
        let input = self.input;
        let start = self.pos;
        let mut pos = start;

        // Fast path: no escapes, copy the raw bytes.
        loop {
            match self.byte_at(pos) {
                b'"' => {
                    let raw = &input[start..pos];
                    validate_utf8(raw, start)?;
                    self.pos = pos + 1;
                    return Ok(StrNode::alloc(self.arena, raw));
                }
                b'\\' => break,
                0x00..=0x1F => return Err(ParseError::new(ParseErrorKind::BadString, pos)),
                _ => pos += 1,
            }
        }

        self.scratch.clear();
        let mut segment = start;
        loop {
            match self.byte_at(pos) {
                b'"' => {
                    let raw = &input[segment..pos];
                    validate_utf8(raw, segment)?;
                    self.scratch.extend_from_slice(raw);
                    self.pos = pos + 1;
                    return Ok(StrNode::alloc(self.arena, &self.scratch));
                }
                b'\\' => {
                    let raw = &input[segment..pos];
                    validate_utf8(raw, segment)?;
                    self.scratch.extend_from_slice(raw);
                    pos = self.decode_escape(pos + 1)?;
                    segment = pos;
                }
                0x00..=0x1F => return Err(ParseError::new(ParseErrorKind::BadString, pos)),
                _ => pos += 1,
            }
        }
    }

    /// Decode the escape whose letter is at `pos`; returns the offset after it.
    fn decode_escape(&mut self, pos: usize) -> Result<usize> {
        let byte = match self.byte_at(pos) {
            b'"' => b'"',
            b'\\' => b'\\',
            b'/' => b'/',
            b'b' => 0x08,
            b'f' => 0x0C,
            b'n' => b'\n',
            b'r' => b'\r',
            b't' => b'\t',
            b'u' => return self.decode_unicode(pos + 1),
            _ => return Err(ParseError::new(ParseErrorKind::BadString, pos)),
        };
        self.scratch.push(byte);
        Ok(pos + 1)
    }

    /// Decode `XXXX` (and a trailing `\uXXXX` low surrogate when needed) at `pos`.
    fn decode_unicode(&mut self, pos: usize) -> Result<usize> {
        let bad = |pos| ParseError::new(ParseErrorKind::BadString, pos);
        let high = self.hex4(pos)?;
        let mut next = pos + 4;

        let code = match high {
            0xD800..=0xDBFF => {
                if self.byte_at(next) != b'\\' || self.byte_at(next + 1) != b'u' {
                    return Err(bad(next));
                }
                let low = self.hex4(next + 2)?;
                if !(0xDC00..=0xDFFF).contains(&low) {
                    return Err(bad(next));
                }
                next += 6;
                0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
            }
            // Lone low surrogate; point at its backslash.
            0xDC00..=0xDFFF => return Err(bad(pos - 2)),
            _ => high,
        };

        let ch = char::from_u32(code).ok_or_else(|| bad(pos))?;
        let mut buf = [0u8; 4];
        self.scratch.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
        Ok(next)
    }

    fn hex4(&self, pos: usize) -> Result<u32> {
        (pos..pos + 4).try_fold(0u32, |acc, at| {
            let digit = char::from(self.byte_at(at))
                .to_digit(16)
                .ok_or(ParseError::new(ParseErrorKind::BadString, at))?;
            Ok((acc << 4) | digit)
        })
    }
}

fn validate_utf8(bytes: &[u8], offset: usize) -> Result<()> {
    std::str::from_utf8(bytes)
        .map(drop)
        .map_err(|err| ParseError::new(ParseErrorKind::BadString, offset + err.valid_up_to()))
}
