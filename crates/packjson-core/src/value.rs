//! The 8-byte NaN-boxed JSON value.
//!
//! A [`Value`] is a single `u64`. Numbers are stored as their raw IEEE-754
//! bits; every other kind lives in the negative quiet-NaN band:
//!
//! ```text
//! Number:  any double whose bits are below 0xFFF9_0000_0000_0000
//! Boxed:   0xFFF8_0000_0000_0000 | tag << 48 | payload
//!                                  ^^^ 3-bit tag (1..=5)
//!                                             ^^^^^^^ 48-bit payload
//! ```
//!
//! | tag | kind   | payload                            |
//! |-----|--------|------------------------------------|
//! | 1   | String | address of a `StrNode`             |
//! | 2   | Bool   | 0 or 1                             |
//! | 3   | Array  | address of the first element, or 0 |
//! | 4   | Object | address of the first pair, or 0    |
//! | 5   | Null   | 0                                  |
//!
//! NaN numbers are canonicalized to the positive quiet NaN so a hand-built
//! NaN can never be mistaken for a boxed word. The parser never produces NaN.
//!
//! Pointer payloads must fit in 48 bits. This holds for user-space addresses
//! on x86-64 and AArch64 and trivially on 32-bit targets; boxing a pointer
//! outside that range panics instead of corrupting the word.

use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::ptr::{self, NonNull};

use crate::arena::Arena;
use crate::error::AccessError;
use crate::node::{Element, Pair, StrNode};

const BOX_BASE: u64 = 0xFFF8_0000_0000_0000;
const BOX_MIN: u64 = 0xFFF9_0000_0000_0000;
const TAG_SHIFT: u32 = 48;
const TAG_MASK: u64 = 0x7;
const PAYLOAD_MASK: u64 = 0x0000_FFFF_FFFF_FFFF;
const CANONICAL_NAN: u64 = 0x7FF8_0000_0000_0000;

const TAG_STRING: u64 = 1;
const TAG_BOOL: u64 = 2;
const TAG_ARRAY: u64 = 3;
const TAG_OBJECT: u64 = 4;
const TAG_NULL: u64 = 5;

const fn boxed(tag: u64, payload: u64) -> u64 {
    BOX_BASE | (tag << TAG_SHIFT) | payload
}

/// The kind of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Number,
    String,
    Bool,
    Array,
    Object,
    Null,
}

impl Tag {
    pub const fn as_str(self) -> &'static str {
        match self {
            Tag::Number => "number",
            Tag::String => "string",
            Tag::Bool => "bool",
            Tag::Array => "array",
            Tag::Object => "object",
            Tag::Null => "null",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A JSON value packed into one machine word.
///
/// Scalars are self-contained. Strings, arrays and objects point into the
/// [`Arena`] they were parsed into, and the lifetime `'a` keeps them from
/// outliving it.
#[derive(Clone, Copy)]
#[repr(transparent)]
pub struct Value<'a> {
    bits: u64,
    _arena: PhantomData<&'a Arena>,
}

/// A [`Value`] unpacked into an ordinary enum for matching.
#[derive(Debug, Clone)]
pub enum Unpacked<'a> {
    Null,
    Bool(bool),
    Number(f64),
    String(&'a str),
    Array(Elements<'a>),
    Object(Members<'a>),
}

fn pointer_payload<T>(ptr: Option<NonNull<T>>) -> u64 {
    let addr = ptr.map_or(0, |p| p.as_ptr().expose_provenance()) as u64;
    assert!(
        addr <= PAYLOAD_MASK,
        "arena address {addr:#x} does not fit the 48-bit value payload"
    );
    addr
}

impl<'a> Value<'a> {
    pub const fn null() -> Self {
        Self::from_bits(boxed(TAG_NULL, 0))
    }

    pub const fn from_bool(b: bool) -> Self {
        Self::from_bits(boxed(TAG_BOOL, b as u64))
    }

    /// A number. NaN is stored as the canonical quiet NaN.
    pub fn from_f64(x: f64) -> Self {
        let bits = if x.is_nan() { CANONICAL_NAN } else { x.to_bits() };
        Self::from_bits(bits)
    }

    pub(crate) fn string(node: NonNull<StrNode>) -> Self {
        Self::from_bits(boxed(TAG_STRING, pointer_payload(Some(node))))
    }

    pub(crate) fn array(head: Option<NonNull<Element>>) -> Self {
        Self::from_bits(boxed(TAG_ARRAY, pointer_payload(head)))
    }

    pub(crate) fn object(head: Option<NonNull<Pair>>) -> Self {
        Self::from_bits(boxed(TAG_OBJECT, pointer_payload(head)))
    }

    pub(crate) const fn from_bits(bits: u64) -> Self {
        Self {
            bits,
            _arena: PhantomData,
        }
    }

    /// The raw packed word.
    pub const fn to_bits(self) -> u64 {
        self.bits
    }

    fn payload(self) -> u64 {
        self.bits & PAYLOAD_MASK
    }

    fn payload_ptr<T>(self) -> Option<NonNull<T>> {
        NonNull::new(ptr::with_exposed_provenance_mut::<T>(self.payload() as usize))
    }

    pub fn tag(self) -> Tag {
        if self.bits < BOX_MIN {
            return Tag::Number;
        }
        match (self.bits >> TAG_SHIFT) & TAG_MASK {
            TAG_STRING => Tag::String,
            TAG_BOOL => Tag::Bool,
            TAG_ARRAY => Tag::Array,
            TAG_OBJECT => Tag::Object,
            TAG_NULL => Tag::Null,
            other => unreachable!("invalid value tag {other}"),
        }
    }

    pub fn is_null(self) -> bool {
        self.tag() == Tag::Null
    }

    pub fn is_bool(self) -> bool {
        self.tag() == Tag::Bool
    }

    pub fn is_number(self) -> bool {
        self.bits < BOX_MIN
    }

    pub fn is_string(self) -> bool {
        self.tag() == Tag::String
    }

    pub fn is_array(self) -> bool {
        self.tag() == Tag::Array
    }

    pub fn is_object(self) -> bool {
        self.tag() == Tag::Object
    }

    fn check_tag(self, expected: Tag) -> Result<(), AccessError> {
        let found = self.tag();
        if found == expected {
            Ok(())
        } else {
            Err(AccessError::TypeMismatch { expected, found })
        }
    }

    pub fn as_number(self) -> Result<f64, AccessError> {
        self.check_tag(Tag::Number)?;
        Ok(f64::from_bits(self.bits))
    }

    pub fn as_bool(self) -> Result<bool, AccessError> {
        self.check_tag(Tag::Bool)?;
        Ok(self.payload() != 0)
    }

    /// String contents. Strings are validated as UTF-8 when parsed.
    pub fn as_str(self) -> Result<&'a str, AccessError> {
        let bytes = self.as_bytes()?;
        // SAFETY: string nodes are only created by the parser, which rejects
        // invalid UTF-8 and only emits UTF-8 from escapes.
        Ok(unsafe { std::str::from_utf8_unchecked(bytes) })
    }

    pub fn as_bytes(self) -> Result<&'a [u8], AccessError> {
        self.string_bytes(false)
    }

    /// String contents followed by the NUL terminator stored in the arena.
    pub fn as_bytes_with_nul(self) -> Result<&'a [u8], AccessError> {
        self.string_bytes(true)
    }

    fn string_bytes(self, with_nul: bool) -> Result<&'a [u8], AccessError> {
        self.check_tag(Tag::String)?;
        match self.payload_ptr::<StrNode>() {
            // SAFETY: string payloads point to a `StrNode` in an arena that lives for `'a`.
            Some(node) => Ok(unsafe { StrNode::bytes(node, with_nul) }),
            None => unreachable!("string value without a node"),
        }
    }

    /// Iterate the elements of an array, in source order.
    pub fn as_array(self) -> Result<Elements<'a>, AccessError> {
        self.check_tag(Tag::Array)?;
        Ok(Elements {
            next: self.payload_ptr(),
            _arena: PhantomData,
        })
    }

    /// Iterate the members of an object, in source order, duplicates included.
    pub fn as_object(self) -> Result<Members<'a>, AccessError> {
        self.check_tag(Tag::Object)?;
        Ok(Members {
            next: self.payload_ptr(),
            _arena: PhantomData,
        })
    }

    pub fn unpack(self) -> Unpacked<'a> {
        match self.tag() {
            Tag::Null => Unpacked::Null,
            Tag::Bool => Unpacked::Bool(self.payload() != 0),
            Tag::Number => Unpacked::Number(f64::from_bits(self.bits)),
            Tag::String => match self.as_str() {
                Ok(s) => Unpacked::String(s),
                Err(_) => unreachable!(),
            },
            Tag::Array => Unpacked::Array(Elements {
                next: self.payload_ptr(),
                _arena: PhantomData,
            }),
            Tag::Object => Unpacked::Object(Members {
                next: self.payload_ptr(),
                _arena: PhantomData,
            }),
        }
    }

    /// First member named `key`, or `None` if absent or if this is not an object.
    pub fn get(self, key: &str) -> Option<Value<'a>> {
        self.as_object()
            .ok()?
            .find_map(|(k, v)| (k == key).then_some(v))
    }

    /// Element at `index`, or `None` if out of range or if this is not an array.
    pub fn at(self, index: usize) -> Option<Value<'a>> {
        self.as_array().ok()?.nth(index)
    }
}

impl Default for Value<'_> {
    fn default() -> Self {
        Self::null()
    }
}

impl From<bool> for Value<'_> {
    fn from(b: bool) -> Self {
        Self::from_bool(b)
    }
}

impl From<f64> for Value<'_> {
    fn from(x: f64) -> Self {
        Self::from_f64(x)
    }
}

/// Iterator over array elements. Obtained from [`Value::as_array`].
#[derive(Clone)]
pub struct Elements<'a> {
    next: Option<NonNull<Element>>,
    _arena: PhantomData<&'a Arena>,
}

impl<'a> Iterator for Elements<'a> {
    type Item = Value<'a>;

    fn next(&mut self) -> Option<Value<'a>> {
        let node = self.next?;
        // SAFETY: elements are immutable once parsed and live as long as the arena (`'a`).
        let Element { next, value } = unsafe { node.as_ptr().read() };
        self.next = next;
        Some(Value::from_bits(value))
    }
}

impl FusedIterator for Elements<'_> {}

impl fmt::Debug for Elements<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

/// Iterator over object members as `(key, value)`. Obtained from [`Value::as_object`].
#[derive(Clone)]
pub struct Members<'a> {
    next: Option<NonNull<Pair>>,
    _arena: PhantomData<&'a Arena>,
}

impl<'a> Iterator for Members<'a> {
    type Item = (&'a str, Value<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        // SAFETY: pairs and their keys are immutable once parsed and live as long as the arena.
        let Pair { next, key, value } = unsafe { node.as_ptr().read() };
        self.next = next;
        // SAFETY: keys are parser-created, UTF-8 validated string nodes.
        let key = unsafe { std::str::from_utf8_unchecked(StrNode::bytes(key, false)) };
        Some((key, Value::from_bits(value)))
    }
}

impl FusedIterator for Members<'_> {}

impl fmt::Debug for Members<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.clone()).finish()
    }
}

/// Pair of containers being compared side by side.
enum Compare<'a, 'b> {
    Arrays(Elements<'a>, Elements<'b>),
    Objects(Members<'a>, Members<'b>),
}

impl<'a, 'b> PartialEq<Value<'b>> for Value<'a> {
    /// Structural equality: same kind, same scalars, same members in the same order.
    ///
    /// Walks both trees with an explicit stack, so any depth the parser
    /// accepts can be compared.
    fn eq(&self, other: &Value<'b>) -> bool {
        let mut pending: Vec<Compare<'a, 'b>> = Vec::new();
        let (mut left, mut right) = (*self, *other);
        loop {
            let same = match (left.unpack(), right.unpack()) {
                (Unpacked::Null, Unpacked::Null) => true,
                (Unpacked::Bool(a), Unpacked::Bool(b)) => a == b,
                (Unpacked::Number(a), Unpacked::Number(b)) => a == b,
                (Unpacked::String(a), Unpacked::String(b)) => a == b,
                (Unpacked::Array(a), Unpacked::Array(b)) => {
                    pending.push(Compare::Arrays(a, b));
                    true
                }
                (Unpacked::Object(a), Unpacked::Object(b)) => {
                    pending.push(Compare::Objects(a, b));
                    true
                }
                _ => false,
            };
            if !same {
                return false;
            }

            // Advance the innermost open pair to its next children.
            loop {
                let Some(top) = pending.last_mut() else {
                    return true;
                };
                match top {
                    Compare::Arrays(a, b) => match (a.next(), b.next()) {
                        (Some(x), Some(y)) => {
                            (left, right) = (x, y);
                            break;
                        }
                        (None, None) => {
                            pending.pop();
                        }
                        _ => return false,
                    },
                    Compare::Objects(a, b) => match (a.next(), b.next()) {
                        (Some((ka, x)), Some((kb, y))) if ka == kb => {
                            (left, right) = (x, y);
                            break;
                        }
                        (None, None) => {
                            pending.pop();
                        }
                        _ => return false,
                    },
                }
            }
        }
    }
}

/// A container whose remaining children are still to be rendered.
enum Open<'a> {
    Array { items: Elements<'a>, started: bool },
    Object { members: Members<'a>, started: bool },
}

impl fmt::Debug for Value<'_> {
    /// JSON-like rendering, e.g. `{"a": [1, true, null], "b": "x"}`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut open: Vec<Open<'_>> = Vec::new();
        let mut next = Some(*self);
        loop {
            if let Some(value) = next.take() {
                match value.unpack() {
                    Unpacked::Null => f.write_str("null")?,
                    Unpacked::Bool(b) => write!(f, "{b}")?,
                    Unpacked::Number(x) => write!(f, "{x}")?,
                    Unpacked::String(s) => write!(f, "{s:?}")?,
                    Unpacked::Array(items) => {
                        f.write_str("[")?;
                        open.push(Open::Array {
                            items,
                            started: false,
                        });
                    }
                    Unpacked::Object(members) => {
                        f.write_str("{")?;
                        open.push(Open::Object {
                            members,
                            started: false,
                        });
                    }
                }
            }

            let Some(top) = open.last_mut() else {
                return Ok(());
            };
            match top {
                Open::Array { items, started } => match items.next() {
                    Some(item) => {
                        if *started {
                            f.write_str(", ")?;
                        }
                        *started = true;
                        next = Some(item);
                    }
                    None => {
                        f.write_str("]")?;
                        open.pop();
                    }
                },
                Open::Object { members, started } => match members.next() {
                    Some((key, member)) => {
                        if *started {
                            f.write_str(", ")?;
                        }
                        *started = true;
                        write!(f, "{key:?}: ")?;
                        next = Some(member);
                    }
                    None => {
                        f.write_str("}")?;
                        open.pop();
                    }
                },
            }
        }
    }
}
