//! Conversion into `serde_json::Value`.

use serde_json::{Map, Number};

use crate::error::ConvertError;
use crate::value::{Unpacked, Value};

/// Deepest container nesting [`Value::to_json_value`] will copy.
///
/// `serde_json::Value` is built, serialized and dropped recursively, so the
/// limit matches the recursion limit of `serde_json`'s own parser.
pub const MAX_CONVERT_DEPTH: usize = 128;

impl Value<'_> {
    /// Copy the tree into an owned `serde_json::Value`.
    ///
    /// Member order is kept. When an object has duplicate keys the last
    /// occurrence wins, since `serde_json::Map` holds one entry per key.
    /// Trees nesting more than [`MAX_CONVERT_DEPTH`] containers are rejected
    /// with [`ConvertError::TooDeep`].
    pub fn to_json_value(self) -> Result<serde_json::Value, ConvertError> {
        convert(self, 0)
    }
}

/// `depth` counts the containers enclosing `value`.
fn convert(value: Value<'_>, depth: usize) -> Result<serde_json::Value, ConvertError> {
    let json = match value.unpack() {
        Unpacked::Null => serde_json::Value::Null,
        Unpacked::Bool(b) => serde_json::Value::Bool(b),
        // Only hand-built non-finite numbers fail here.
        Unpacked::Number(x) => Number::from_f64(x)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Unpacked::String(s) => serde_json::Value::String(s.to_owned()),
        Unpacked::Array(elements) => {
            let depth = enter(depth)?;
            serde_json::Value::Array(
                elements
                    .map(|element| convert(element, depth))
                    .collect::<Result<_, _>>()?,
            )
        }
        Unpacked::Object(members) => {
            let depth = enter(depth)?;
            let mut map = Map::new();
            for (key, member) in members {
                map.insert(key.to_owned(), convert(member, depth)?);
            }
            serde_json::Value::Object(map)
        }
    };
    Ok(json)
}

fn enter(depth: usize) -> Result<usize, ConvertError> {
    if depth >= MAX_CONVERT_DEPTH {
        return Err(ConvertError::TooDeep {
            limit: MAX_CONVERT_DEPTH,
        });
    }
    Ok(depth + 1)
}

impl TryFrom<Value<'_>> for serde_json::Value {
    type Error = ConvertError;

    fn try_from(value: Value<'_>) -> Result<Self, Self::Error> {
        value.to_json_value()
    }
}
