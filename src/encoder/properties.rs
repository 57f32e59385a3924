//! Java-style `.properties` output.
//!
//! Nested documents are flattened into `path = value` lines. Mapping keys join
//! with `.`; sequence positions are written as `.0` or, with
//! `use_array_brackets`, as `[0]`. Comments on an entry (its key and value
//! nodes) and on the containers above it are written as `# ` lines before the
//! entry.

use std::io::Write;

use super::{EncodeError, Encoder, clean_comment, resolve};
use crate::{
    config::EncoderPreferences,
    node::{NodeId, NodeKind, Tree},
};

pub struct PropertiesEncoder {
    preferences: EncoderPreferences,
}

/// One step below the current path.
enum Step<'a> {
    Key(&'a str),
    Index(usize),
}

impl PropertiesEncoder {
    pub fn new(preferences: EncoderPreferences) -> Self {
        PropertiesEncoder { preferences }
    }

    fn append_path(&self, path: &str, step: Step<'_>) -> String {
        match step {
            Step::Key(key) if path.is_empty() => escape_key(key),
            Step::Index(index) if path.is_empty() => index.to_string(),
            Step::Key(key) => format!("{}.{}", path, escape_key(key)),
            Step::Index(index) if self.preferences.use_array_brackets => format!("{}[{}]", path, index),
            Step::Index(index) => format!("{}.{}", path, index),
        }
    }

    /// Walks the subtree at `node`, writing one line per scalar leaf.
    ///
    /// `pending` carries comments from enclosing containers and keys until
    /// the next line is written.
    fn flatten(
        &self,
        tree: &Tree,
        node: NodeId,
        path: &str,
        pending: &mut Vec<String>,
        out: &mut String,
    ) -> Result<(), EncodeError> {
        let current = tree.get(node);
        pending.extend(clean_comment(&current.head_comment));
        pending.extend(clean_comment(&current.line_comment));

        match &current.kind {
            NodeKind::Scalar(value) => {
                for comment in pending.drain(..) {
                    out.push_str("# ");
                    out.push_str(&comment);
                    out.push('\n');
                }
                out.push_str(path);
                out.push_str(&self.preferences.key_value_separator);
                out.push_str(&self.format_value(value));
                out.push('\n');
            }
            NodeKind::Sequence(items) => {
                for (index, item) in items.iter().enumerate() {
                    let child = self.append_path(path, Step::Index(index));
                    self.flatten(tree, *item, &child, pending, out)?;
                }
            }
            NodeKind::Mapping(_) => {
                for (key, value) in tree.map_entries(node) {
                    let key_node = tree.get(resolve(tree, key)?);
                    pending.extend(clean_comment(&key_node.head_comment));
                    pending.extend(clean_comment(&key_node.line_comment));
                    let key_text = key_node.value().unwrap_or_default();
                    let child = self.append_path(path, Step::Key(key_text));
                    self.flatten(tree, value, &child, pending, out)?;
                }
            }
            NodeKind::Alias(_) => {
                let target = resolve(tree, node)?;
                self.flatten(tree, target, path, pending, out)?;
            }
            NodeKind::Document(content) => {
                for root in content {
                    self.flatten(tree, *root, path, pending, out)?;
                }
            }
        }
        Ok(())
    }

    fn format_value(&self, value: &str) -> String {
        let escaped = escape_value(value);
        if self.preferences.unwrap_scalar || !value.contains(' ') {
            escaped
        } else {
            format!("\"{}\"", escaped.replace('"', "\\\""))
        }
    }
}

impl Encoder for PropertiesEncoder {
    fn encode(&mut self, writer: &mut dyn Write, tree: &Tree, node: NodeId) -> Result<(), EncodeError> {
        let root = resolve(tree, node)?;
        let root = match &tree.get(root).kind {
            NodeKind::Document(content) => match content.first() {
                Some(first) => resolve(tree, *first)?,
                None => return Ok(()),
            },
            _ => root,
        };

        if let Some(value) = tree.get(root).value() {
            writeln!(writer, "{}", value)?;
            return Ok(());
        }

        let mut out = String::new();
        let mut pending = Vec::new();
        self.flatten(tree, root, "", &mut pending, &mut out)?;
        writer.write_all(out.as_bytes())?;
        Ok(())
    }
}

/// Escapes the characters that would end a key early.
fn escape_key(key: &str) -> String {
    let mut escaped = String::with_capacity(key.len());
    for ch in key.chars() {
        match ch {
            ' ' | ':' | '=' | '#' | '!' | '\\' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            _ => push_escaped(&mut escaped, ch),
        }
    }
    escaped
}

fn escape_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            _ => push_escaped(&mut escaped, ch),
        }
    }
    escaped
}

fn push_escaped(out: &mut String, ch: char) {
    match ch {
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        '\u{c}' => out.push_str("\\f"),
        ch => out.push(ch),
    }
}
