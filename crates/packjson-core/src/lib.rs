//! # packjson-core
//!
//! Arena-backed JSON parser with an **8-byte NaN-boxed value** representation.
//!
//! Parsing turns a byte buffer into a tree whose every node lives in a
//! bump-pointer [`Arena`]. Each [`Value`] is a single `u64`: numbers are stored
//! as raw doubles, everything else is a tag plus a pointer tucked inside a
//! quiet NaN. Arrays and objects are singly linked lists of arena cells kept in
//! source order.
//!
//! ## Quick start
//!
//! ```rust
//! use packjson_core::{Document, Tag};
//!
//! let doc = Document::parse(br#"[3, 1, {"ok": true}]"#).unwrap();
//! let root = doc.root();
//! assert_eq!(root.tag(), Tag::Array);
//!
//! let mut items = root.as_array().unwrap();
//! assert_eq!(items.next().unwrap().as_number().unwrap(), 3.0);
//! assert_eq!(items.next().unwrap().as_number().unwrap(), 1.0);
//! assert!(items.next().unwrap().get("ok").unwrap().as_bool().unwrap());
//! assert!(items.next().is_none());
//!
//! let err = Document::parse(b"[1, 2").unwrap_err();
//! assert_eq!(err.to_string(), "mismatched bracket at byte 5");
//! ```
//!
//! ## Modules
//!
//! - [`arena`]: zone-based bump allocator, released as one unit
//! - [`value`]: packed `Value`, its tag and the array/object iterators
//! - [`parser`]: single-pass parser building a tree inside an arena
//! - [`document`]: `Document`, an arena bundled with its root value
//! - [`error`]: parse status codes, `ParseError`, `AccessError` and `ConvertError`
//!
//! `Value::to_json_value` converts a tree of at most [`MAX_CONVERT_DEPTH`]
//! nested containers into a `serde_json::Value`.

#![deny(unsafe_op_in_unsafe_fn)]

pub mod arena;
pub mod document;
pub mod error;
mod interop;
mod node;
pub mod parser;
pub mod value;

pub use arena::{Arena, DEFAULT_ZONE_SIZE};
pub use document::Document;
pub use error::{
    status_of, str_error, AccessError, ConvertError, ParseError, ParseErrorKind, ParseStatus,
    Result,
};
pub use interop::MAX_CONVERT_DEPTH;
pub use parser::{parse_in, Parsed};
pub use value::{Elements, Members, Tag, Unpacked, Value};
