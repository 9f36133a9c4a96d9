//! Owned parse result: an arena together with the root value built in it.

use std::fmt;

use crate::arena::Arena;
use crate::error::Result;
use crate::parser::parse_in;
use crate::value::Value;

/// A parsed JSON document.
///
/// Owns the [`Arena`] holding the tree. Values obtained through
/// [`root`](Document::root) borrow the document, so none of them can outlive
/// it; dropping the document releases the whole tree at once. Scalars copied
/// out (`f64`, `bool`) stay valid after the drop.
///
/// ```rust
/// use packjson_core::Document;
///
/// let doc = Document::parse_str(r#"{"name":"Alice","scores":[95,87,92]}"#).unwrap();
/// let root = doc.root();
/// assert_eq!(root.get("name").unwrap().as_str().unwrap(), "Alice");
///
/// let scores: Vec<f64> = root
///     .get("scores")
///     .unwrap()
///     .as_array()
///     .unwrap()
///     .map(|v| v.as_number().unwrap())
///     .collect();
/// assert_eq!(scores, [95.0, 87.0, 92.0]);
/// ```
///
/// Strings, arrays and objects are views into the arena, so none of them can
/// be used once the document is gone. A borrowed value:
///
/// ```compile_fail
/// use packjson_core::Document;
///
/// let doc = Document::parse_str(r#"{"tags":["a","b"]}"#).unwrap();
/// let tags = doc.root().get("tags").unwrap();
/// drop(doc);
/// assert!(tags.is_array());
/// ```
///
/// An array iterator:
///
/// ```compile_fail
/// use packjson_core::Document;
///
/// let doc = Document::parse_str("[1, 2, 3]").unwrap();
/// let items = doc.root().as_array().unwrap();
/// drop(doc);
/// assert_eq!(items.count(), 3);
/// ```
///
/// A string slice:
///
/// ```compile_fail
/// use packjson_core::Document;
///
/// let doc = Document::parse_str(r#"{"name":"Alice"}"#).unwrap();
/// let name: &str = doc.root().get("name").unwrap().as_str().unwrap();
/// drop(doc);
/// assert_eq!(name, "Alice");
/// ```
///
/// Nor can a value escape the function that owns its document:
///
/// ```compile_fail
/// use packjson_core::{Document, Value};
///
/// fn first_item(json: &str) -> Value<'static> {
///     let doc = Document::parse_str(json).unwrap();
///     doc.root().at(0).unwrap()
/// }
/// ```
pub struct Document {
    arena: Arena,
    root: u64,
    end: usize,
}

impl Document {
    /// Parse `input` into a fresh arena.
    pub fn parse(input: &[u8]) -> Result<Self> {
        Self::parse_with_arena(Arena::new(), input)
    }

    pub fn parse_str(input: &str) -> Result<Self> {
        Self::parse(input.as_bytes())
    }

    /// Parse `input` into `arena`, which the document takes over.
    ///
    /// Useful to pick a zone size up front, e.g. `Arena::with_zone_size(1 << 16)`
    /// for large inputs.
    pub fn parse_with_arena(arena: Arena, input: &[u8]) -> Result<Self> {
        let (root, end) = {
            let parsed = parse_in(&arena, input)?;
            (parsed.value.to_bits(), parsed.end)
        };
        // Moving the arena does not move its zones, so `root` stays valid.
        Ok(Self { arena, root, end })
    }

    pub fn root(&self) -> Value<'_> {
        Value::from_bits(self.root)
    }

    /// Offset in the input where parsing stopped.
    pub fn end(&self) -> usize {
        self.end
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("root", &self.root())
            .field("end", &self.end)
            .field("arena", &self.arena)
            .finish()
    }
}
