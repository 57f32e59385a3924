//! YAML output.
//!
//! A small block-style printer in the spirit of a pretty JSON printer: each
//! container opens a new indentation level, scalars are written plain unless
//! reading them back would change their meaning, in which case they are
//! double-quoted. Tags, anchors, aliases and comments are carried through.

use std::io::Write;

use super::{EncodeError, Encoder, resolve};
use crate::{
    config::EncoderPreferences,
    node::{Node, NodeId, NodeKind, Style, Tag, Tree},
};

pub struct YamlEncoder {
    preferences: EncoderPreferences,
}

impl YamlEncoder {
    pub fn new(preferences: EncoderPreferences) -> Self {
        YamlEncoder { preferences }
    }

    fn indent(&self, level: usize) -> String {
        " ".repeat(level * self.preferences.indent.max(1))
    }

    fn print_document(&self, tree: &Tree, node: NodeId, out: &mut String) -> Result<(), EncodeError> {
        let document = tree.get(node);
        let NodeKind::Document(content) = &document.kind else {
            return self.print_root(tree, node, out);
        };
        self.print_comment(&document.head_comment, 0, out);
        for root in content {
            self.print_root(tree, *root, out)?;
        }
        self.print_comment(&document.foot_comment, 0, out);
        Ok(())
    }

    fn print_root(&self, tree: &Tree, node: NodeId, out: &mut String) -> Result<(), EncodeError> {
        let current = tree.get(node);
        self.print_comment(&current.head_comment, 0, out);
        if self.is_block(tree, node) {
            let properties = self.properties(current);
            if !properties.is_empty() {
                out.push_str(&properties);
                out.push('\n');
            }
            self.print_block(tree, node, 0, false, out)?;
        } else {
            out.push_str(&self.print_inline(tree, node, 0)?);
            self.print_line_comment(current, out);
            out.push('\n');
        }
        self.print_comment(&current.foot_comment, 0, out);
        Ok(())
    }

    /// Whether `node` is printed as an indented block rather than on one line.
    fn is_block(&self, tree: &Tree, node: NodeId) -> bool {
        let current = tree.get(node);
        current.style != Style::Flow
            && match &current.kind {
                NodeKind::Mapping(content) | NodeKind::Sequence(content) => !content.is_empty(),
                _ => false,
            }
    }

    /// Prints a non-empty block mapping or sequence.
    ///
    /// With `inline_first` the first line continues the current one (after a
    /// sequence dash) instead of starting with indentation.
    fn print_block(
        &self,
        tree: &Tree,
        node: NodeId,
        level: usize,
        inline_first: bool,
        out: &mut String,
    ) -> Result<(), EncodeError> {
        match &tree.get(node).kind {
            NodeKind::Mapping(_) => {
                for (position, (key, value)) in tree.map_entries(node).enumerate() {
                    let continues = inline_first && position == 0;
                    self.print_entry(tree, key, value, level, continues, out)?;
                }
            }
            NodeKind::Sequence(items) => {
                for (position, item) in items.iter().enumerate() {
                    let continues = inline_first && position == 0;
                    self.print_item(tree, *item, level, continues, out)?;
                }
            }
            _ => return Err(EncodeError::Unsupported(tree.get(node).kind_name().to_string())),
        }
        Ok(())
    }

    fn print_entry(
        &self,
        tree: &Tree,
        key: NodeId,
        value: NodeId,
        level: usize,
        continues: bool,
        out: &mut String,
    ) -> Result<(), EncodeError> {
        let key_node = tree.get(key);
        let value_node = tree.get(value);
        let has_comment = !key_node.head_comment.is_empty() || !value_node.head_comment.is_empty();
        if has_comment && continues {
            // The dash already started this line; comments go on the next ones
            out.push('\n');
        }
        self.print_comment(&key_node.head_comment, level, out);
        self.print_comment(&value_node.head_comment, level, out);
        if !continues || has_comment {
            out.push_str(&self.indent(level));
        }

        out.push_str(&self.print_inline(tree, key, level)?);
        out.push(':');
        self.print_value(tree, value, level, out)?;
        self.print_comment(&value_node.foot_comment, level, out);
        Ok(())
    }

    fn print_item(
        &self,
        tree: &Tree,
        item: NodeId,
        level: usize,
        continues: bool,
        out: &mut String,
    ) -> Result<(), EncodeError> {
        let item_node = tree.get(item);
        if !item_node.head_comment.is_empty() && continues {
            out.push('\n');
        }
        self.print_comment(&item_node.head_comment, level, out);
        if !continues || !item_node.head_comment.is_empty() {
            out.push_str(&self.indent(level));
        }
        out.push('-');

        if self.is_block(tree, item) && self.properties(item_node).is_empty() {
            out.push(' ');
            self.print_block(tree, item, level + 1, true, out)?;
        } else {
            self.print_value(tree, item, level, out)?;
        }
        self.print_comment(&item_node.foot_comment, level, out);
        Ok(())
    }

    /// Prints what follows `key:` or `-`, including the line break.
    fn print_value(&self, tree: &Tree, value: NodeId, level: usize, out: &mut String) -> Result<(), EncodeError> {
        let value_node = tree.get(value);
        if self.is_block(tree, value) {
            let properties = self.properties(value_node);
            if !properties.is_empty() {
                out.push(' ');
                out.push_str(&properties);
            }
            self.print_line_comment(value_node, out);
            out.push('\n');
            self.print_block(tree, value, level + 1, false, out)
        } else {
            out.push(' ');
            out.push_str(&self.print_inline(tree, value, level)?);
            self.print_line_comment(value_node, out);
            out.push('\n');
            Ok(())
        }
    }

    /// Anchor and non-default tag, e.g. `&base !config`.
    fn properties(&self, node: &Node) -> String {
        let mut parts = Vec::new();
        if let Some(anchor) = &node.anchor {
            parts.push(format!("&{}", anchor));
        }
        if let Tag::Custom(name) = &node.tag {
            if !name.is_empty() {
                parts.push(name.clone());
            }
        }
        parts.join(" ")
    }

    /// Renders a node on a single line: scalars, aliases, empty or flow
    /// containers.
    fn print_inline(&self, tree: &Tree, node: NodeId, level: usize) -> Result<String, EncodeError> {
        let current = tree.get(node);
        let properties = self.properties(current);
        let body = match &current.kind {
            NodeKind::Scalar(value) => self.print_scalar(current, value, level),
            NodeKind::Alias(target) => {
                return match &tree.get(*target).anchor {
                    Some(anchor) => Ok(format!("*{}", anchor)),
                    None => self.print_inline(tree, resolve(tree, *target)?, level),
                };
            }
            NodeKind::Mapping(_) => {
                let entries = tree
                    .map_entries(node)
                    .map(|(key, value)| {
                        Ok(format!(
                            "{}: {}",
                            self.print_flow(tree, key)?,
                            self.print_flow(tree, value)?
                        ))
                    })
                    .collect::<Result<Vec<_>, EncodeError>>()?;
                format!("{{{}}}", entries.join(", "))
            }
            NodeKind::Sequence(items) => {
                let items = items
                    .iter()
                    .map(|item| self.print_flow(tree, *item))
                    .collect::<Result<Vec<_>, EncodeError>>()?;
                format!("[{}]", items.join(", "))
            }
            NodeKind::Document(_) => return Err(EncodeError::Unsupported("nested document".to_string())),
        };
        Ok(if properties.is_empty() { body } else { format!("{} {}", properties, body) })
    }

    fn print_flow(&self, tree: &Tree, node: NodeId) -> Result<String, EncodeError> {
        let current = tree.get(node);
        match &current.kind {
            NodeKind::Scalar(value) if needs_quotes(current, value, true) => {
                let properties = self.properties(current);
                let quoted = double_quoted(value);
                Ok(if properties.is_empty() { quoted } else { format!("{} {}", properties, quoted) })
            }
            _ => self.print_inline(tree, node, 0),
        }
    }

    fn print_scalar(&self, node: &Node, value: &str, level: usize) -> String {
        let prefix = explicit_tag(node, value);
        let body = match node.style {
            Style::DoubleQuoted => double_quoted(value),
            Style::SingleQuoted if !value.contains('\n') => format!("'{}'", value.replace('\'', "''")),
            Style::Literal | Style::Folded if value.contains('\n') => self.literal(value, level),
            _ if needs_quotes(node, value, false) => double_quoted(value),
            _ => value.to_string(),
        };
        match prefix {
            Some(tag) => format!("{} {}", tag, body),
            None => body,
        }
    }

    /// A `|` block scalar; the indentation is one level deeper than the key.
    fn literal(&self, value: &str, level: usize) -> String {
        let chomping = if value.ends_with('\n') { "" } else { "-" };
        let indent = self.indent(level + 1);
        let mut block = format!("|{}", chomping);
        for line in value.trim_end_matches('\n').split('\n') {
            block.push('\n');
            if !line.is_empty() {
                block.push_str(&indent);
                block.push_str(line);
            }
        }
        block
    }

    fn print_comment(&self, comment: &str, level: usize, out: &mut String) {
        for line in comment.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            out.push_str(&self.indent(level));
            if !line.starts_with('#') {
                out.push_str("# ");
            }
            out.push_str(line);
            out.push('\n');
        }
    }

    fn print_line_comment(&self, node: &Node, out: &mut String) {
        let comment = node.line_comment.trim();
        if comment.is_empty() {
            return;
        }
        out.push(' ');
        if !comment.starts_with('#') {
            out.push_str("# ");
        }
        out.push_str(comment);
    }
}

impl Encoder for YamlEncoder {
    fn encode(&mut self, writer: &mut dyn Write, tree: &Tree, node: NodeId) -> Result<(), EncodeError> {
        if self.preferences.unwrap_scalar {
            let root = resolve(tree, node)?;
            let root = match &tree.get(root).kind {
                NodeKind::Document(content) if content.len() == 1 => resolve(tree, content[0])?,
                _ => root,
            };
            if let Some(value) = tree.get(root).value() {
                writeln!(writer, "{}", value)?;
                return Ok(());
            }
        }

        let mut out = String::new();
        self.print_document(tree, node, &mut out)?;
        writer.write_all(out.as_bytes())?;
        Ok(())
    }

    fn document_separator(&self) -> &'static str {
        "---\n"
    }
}

/// A core tag that content inference would not arrive at, e.g. `!!int` on
/// `abc`. Strings are quoted instead of tagged.
fn explicit_tag(node: &Node, value: &str) -> Option<String> {
    match &node.tag {
        Tag::Str | Tag::Custom(_) => None,
        tag if Tag::infer(value) == *tag => None,
        tag => Some(tag.to_string()),
    }
}

/// Whether a plain scalar would be read back differently.
fn needs_quotes(node: &Node, value: &str, flow: bool) -> bool {
    if value.is_empty() {
        return node.tag == Tag::Str || node.tag.is_custom();
    }
    if node.guess_tag() == Tag::Str && Tag::infer(value) != Tag::Str {
        return true;
    }
    let first = value.chars().next().unwrap_or(' ');
    let last = value.chars().last().unwrap_or(' ');
    let indicator = match first {
        '-' | '?' | ':' => value.len() == 1 || value[1..].starts_with(' '),
        ',' | '[' | ']' | '{' | '}' | '#' | '&' | '*' | '!' | '|' | '>' | '\'' | '"' | '%' | '@' | '`' => true,
        _ => false,
    };
    indicator
        || first.is_whitespace()
        || last.is_whitespace()
        || value.contains(": ")
        || value.contains(" #")
        || value.ends_with(':')
        || value.contains(|ch: char| ch.is_control())
        || (flow && value.contains(|ch| ",[]{}".contains(ch)))
}

fn double_quoted(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for ch in value.chars() {
        match ch {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            ch if ch.is_control() => quoted.push_str(&format!("\\u{:04x}", ch as u32)),
            ch => quoted.push(ch),
        }
    }
    quoted.push('"');
    quoted
}
