//! JSON output through `serde_json`.

use std::io::Write;

use serde::Serialize;
use serde_json::{Map, Number, Value, ser::PrettyFormatter};

use super::{EncodeError, Encoder, resolve};
use crate::{
    config::EncoderPreferences,
    node::{Node, NodeId, NodeKind, Tag, Tree},
};

pub struct JsonEncoder {
    preferences: EncoderPreferences,
}

impl JsonEncoder {
    pub fn new(preferences: EncoderPreferences) -> Self {
        JsonEncoder { preferences }
    }
}

impl Encoder for JsonEncoder {
    fn encode(&mut self, writer: &mut dyn Write, tree: &Tree, node: NodeId) -> Result<(), EncodeError> {
        let value = to_json(tree, node)?;
        if self.preferences.indent == 0 {
            serde_json::to_writer(&mut *writer, &value)?;
        } else {
            let indent = " ".repeat(self.preferences.indent);
            let formatter = PrettyFormatter::with_indent(indent.as_bytes());
            let mut serializer = serde_json::Serializer::with_formatter(&mut *writer, formatter);
            value.serialize(&mut serializer)?;
        }
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Converts the subtree at `node` into a JSON value.
///
/// Scalars convert according to their guessed tag; aliases are resolved.
pub fn to_json(tree: &Tree, node: NodeId) -> Result<Value, EncodeError> {
    let id = resolve(tree, node)?;
    let current = tree.get(id);
    Ok(match &current.kind {
        NodeKind::Scalar(value) => scalar_to_json(current, value),
        NodeKind::Sequence(items) => Value::Array(
            items
                .iter()
                .map(|item| to_json(tree, *item))
                .collect::<Result<Vec<_>, _>>()?,
        ),
        NodeKind::Mapping(_) => {
            let mut map = Map::new();
            for (key, value) in tree.map_entries(id) {
                map.insert(key_text(tree, key)?, to_json(tree, value)?);
            }
            Value::Object(map)
        }
        NodeKind::Document(content) => match content.first() {
            Some(root) => to_json(tree, *root)?,
            None => Value::Null,
        },
        NodeKind::Alias(_) => return Err(EncodeError::AliasCycle),
    })
}

fn key_text(tree: &Tree, key: NodeId) -> Result<String, EncodeError> {
    let key = resolve(tree, key)?;
    match tree.get(key).value() {
        Some(text) => Ok(text.to_string()),
        None => Ok(serde_json::to_string(&to_json(tree, key)?)?),
    }
}

fn scalar_to_json(node: &Node, value: &str) -> Value {
    match node.guess_tag() {
        Tag::Null => Value::Null,
        Tag::Bool => Value::Bool(value.eq_ignore_ascii_case("true")),
        Tag::Int => parse_int(value)
            .map(|number| Value::Number(number.into()))
            .unwrap_or_else(|| Value::String(value.to_string())),
        Tag::Float => value
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(value.to_string())),
        _ => Value::String(value.to_string()),
    }
}

fn parse_int(value: &str) -> Option<i64> {
    let (negative, digits) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value.strip_prefix('+').unwrap_or(value)),
    };
    let magnitude = if let Some(hex) = digits.strip_prefix("0x") {
        i64::from_str_radix(hex, 16).ok()?
    } else if let Some(octal) = digits.strip_prefix("0o") {
        i64::from_str_radix(octal, 8).ok()?
    } else {
        digits.parse::<i64>().ok()?
    };
    Some(if negative { -magnitude } else { magnitude })
}
