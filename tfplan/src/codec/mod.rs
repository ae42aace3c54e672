//! Projection of msgpack dynamic values to editable JSON and back.
//!
//! Two strategies are tried in order. The [`typed`] strategy infers the
//! value's type from the msgpack encoding itself and edits plain JSON that is
//! converted back according to that type. When the type cannot be inferred,
//! for instance because the value embeds dynamically typed attributes, the
//! [`untyped`] strategy edits the generic msgpack structure, with the parts
//! that JSON cannot represent written as tagged objects.

pub mod typed;
pub mod untyped;

use anyhow::{bail, Context, Result};
use serde::Deserialize as _;
use serde_json::Value as Json;
use std::{fmt, path::Path};
use tracing::debug;

use crate::{
    editor::{self, Editor},
    plan::DynamicValue,
};

pub use typed::{InferenceError, TypedProjection, ValueType};

/// Which of the two projections a value was edited with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Typed,
    Untyped,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Typed => write!(f, "typed"),
            Strategy::Untyped => write!(f, "untyped"),
        }
    }
}

/// Render a value as text, picking the strategy the same way an edit would.
pub fn decode(bytes: &[u8]) -> Result<(Strategy, String)> {
    match TypedProjection::infer(bytes) {
        Ok(projection) => Ok((Strategy::Typed, projection.render()?)),
        Err(_) => Ok((Strategy::Untyped, untyped::decode(bytes)?)),
    }
}

/// Runs the decode, edit, encode cycle for single dynamic values.
pub struct ValueCodec<'a> {
    text_editor: &'a dyn Editor,
    value_editor: &'a dyn Editor,
    work_dir: &'a Path,
}

impl<'a> ValueCodec<'a> {
    /// Typed values are edited with `text_editor`, the generic fallback
    /// projection with `value_editor`. Files are staged in `work_dir`.
    pub fn new(text_editor: &'a dyn Editor, value_editor: &'a dyn Editor, work_dir: &'a Path) -> Self {
        Self {
            text_editor,
            value_editor,
            work_dir,
        }
    }

    /// Edit `value` in place. Empty values are left alone.
    pub fn edit(&self, value: &mut DynamicValue, description: &str) -> Result<Strategy> {
        let (strategy, bytes) = self.edit_bytes(&value.msgpack, description)?;
        value.msgpack = bytes;
        Ok(strategy)
    }

    pub fn edit_bytes(&self, bytes: &[u8], description: &str) -> Result<(Strategy, Vec<u8>)> {
        if bytes.is_empty() {
            return Ok((Strategy::Typed, Vec::new()));
        }

        match TypedProjection::infer(bytes) {
            Ok(projection) => Ok((Strategy::Typed, self.edit_known_type(&projection, description)?)),
            Err(err) => {
                debug!(description, reason = %err, "editing dynamic value without a known type");
                Ok((Strategy::Untyped, self.edit_unknown_type(bytes, description)?))
            }
        }
    }

    fn edit_known_type(&self, projection: &TypedProjection, description: &str) -> Result<Vec<u8>> {
        let text = projection.render().with_context(|| {
            format!(
                "cannot edit dynamic value: {}, unable to render {} as JSON",
                description,
                projection.value_type()
            )
        })?;

        let edited = editor::edit_text(
            self.text_editor,
            self.work_dir,
            &format!("dynamic-value-known-type-{}", description),
            ".json",
            &text,
        )?;

        projection
            .encode(&edited)
            .with_context(|| format!("failed to encode edited dynamic value: {}", description))
    }

    fn edit_unknown_type(&self, bytes: &[u8], description: &str) -> Result<Vec<u8>> {
        let text = untyped::decode(bytes).with_context(|| {
            format!(
                "cannot edit dynamic value: {}, unable to decode msgpack data for editing",
                description
            )
        })?;

        let edited = editor::edit_text(
            self.value_editor,
            self.work_dir,
            &format!("dynamic-value-unknown-type-{}", description),
            ".json",
            &text,
        )?;

        untyped::encode(&edited)
            .with_context(|| format!("failed to encode edited dynamic value: {}", description))
    }
}

/// Read exactly one msgpack value from `bytes`.
pub(crate) fn read_value(bytes: &[u8]) -> Result<rmpv::Value> {
    let mut reader = bytes;
    let value = rmpv::decode::read_value(&mut reader).context("malformed msgpack data")?;
    if !reader.is_empty() {
        bail!("{} unexpected bytes after the msgpack value", reader.len());
    }
    Ok(value)
}

/// Parse edited JSON. Values nest as deep as msgpack decoding allows, which
/// is deeper than serde_json's default limit.
pub(crate) fn parse_json(text: &str) -> Result<Json> {
    let mut deserializer = serde_json::Deserializer::from_str(text);
    deserializer.disable_recursion_limit();
    let json = Json::deserialize(&mut deserializer).context("the edited value is not valid JSON")?;
    deserializer.end().context("the edited value is not valid JSON")?;
    Ok(json)
}

#[cfg(test)]
pub(crate) mod test_support {
    use rmpv::Value;

    pub(crate) fn msgpack(value: &Value) -> Vec<u8> {
        let mut buf = Vec::new();
        rmpv::encode::write_value(&mut buf, value).unwrap();
        buf
    }

    pub(crate) fn object(entries: Vec<(&str, Value)>) -> Value {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (Value::from(k), v))
                .collect(),
        )
    }

    /// cty's encoding of an unknown value.
    pub(crate) fn unknown() -> Value {
        Value::Ext(0, vec![0])
    }

    /// An attribute of dynamic type the way cty writes it: `[type, value]`.
    pub(crate) fn dynamic(type_json: &str, value: Value) -> Value {
        Value::Array(vec![Value::Binary(type_json.as_bytes().to_vec()), value])
    }

    /// `depth` objects nested in each other under the key `a`.
    pub(crate) fn nested(depth: usize) -> Value {
        (0..depth).fold(Value::from("leaf"), |inner, _| object(vec![("a", inner)]))
    }
}
