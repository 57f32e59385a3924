//! Java-style `.properties` input, read with `java_properties`.
//!
//! Each flattened key is split on `.` into a path (digit segments that fit an
//! `i32` address sequence positions) and the value is assigned into a single
//! mapping document with [`Navigator::deeply_assign`]. Comments preceding a key end up
//! as the head comment of that key.

use std::io::Read;

use encoding_rs::UTF_8;
use java_properties::{LineContent, PropertiesIter};
use tracing::debug;

use super::{DecodeError, Decoder, read_to_string};
use crate::{
    context::{Context, split_path},
    navigator::Navigator,
    node::{Node, NodeId, Tree},
};

/// One key/value pair together with the comment lines written above it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub key: String,
    pub value: String,
    pub comments: Vec<String>,
}

/// Parses properties text into entries in first-seen key order.
///
/// A repeated key keeps its original position but takes the later value and
/// comments. `${...}` references are not expanded.
pub fn parse_properties(text: &str) -> Result<Vec<Property>, DecodeError> {
    let mut properties: Vec<Property> = Vec::new();
    let mut comments = Vec::new();

    for line in PropertiesIter::new_with_encoding(text.as_bytes(), UTF_8) {
        let line = line.map_err(|err| DecodeError::Properties {
            line: err.line_number().unwrap_or_default(),
            message: err.to_string(),
        })?;
        let (key, value) = match line.consume_content() {
            LineContent::Comment(comment) => {
                comments.push(comment_text(&comment));
                continue;
            }
            LineContent::KVPair(key, value) => (key, value),
        };

        let property = Property {
            key,
            value,
            comments: std::mem::take(&mut comments),
        };
        match properties.iter_mut().find(|existing| existing.key == property.key) {
            Some(existing) => *existing = property,
            None => properties.push(property),
        }
    }
    Ok(properties)
}

fn comment_text(comment: &str) -> String {
    let comment = comment.trim_start();
    comment
        .strip_prefix(['#', '!'])
        .unwrap_or(comment)
        .trim()
        .to_string()
}

/// Decodes a whole properties file into one mapping document.
#[derive(Debug, Default)]
pub struct PropertiesDecoder {
    navigator: Navigator,
    text: Option<String>,
}

impl PropertiesDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    fn apply(&self, tree: &mut Tree, context: &Context, property: Property) -> Result<(), DecodeError> {
        let path = split_path(&property.key, '.');
        let value = tree.add(Node::inferred(property.value));
        self.navigator.deeply_assign(tree, context, &path, value)?;

        let Some(last) = path.last() else {
            return Ok(());
        };
        if !property.comments.is_empty() {
            let mut key = Node::string(last.as_key());
            key.head_comment = property
                .comments
                .iter()
                .map(|comment| format!("# {}", comment))
                .collect::<Vec<_>>()
                .join("\n");
            let key = tree.add(key);
            self.navigator.deeply_assign_key(tree, context, &path, key)?;
        }
        Ok(())
    }
}

impl Decoder for PropertiesDecoder {
    fn init(&mut self, reader: &mut dyn Read) -> Result<(), DecodeError> {
        self.text = Some(read_to_string(reader)?);
        Ok(())
    }

    fn decode(&mut self, tree: &mut Tree) -> Result<Option<NodeId>, DecodeError> {
        let Some(text) = self.text.take() else {
            return Ok(None);
        };
        if text.is_empty() {
            return Ok(None);
        }

        let properties = parse_properties(&text)?;
        debug!(entries = properties.len(), "decoded properties");

        let root = tree.add(Node::mapping());
        let context = Context::root(root);
        for property in properties {
            self.apply(tree, &context, property)?;
        }
        Ok(Some(tree.add(Node::document(root))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{decoder::decode_all, node::Tag};

    #[test]
    fn test_parse_separators_and_escapes() {
        let text = "a=1\nb : two words\nc three\nd\\:e = x\\ty\nsnow = \\u2603\n";
        let properties = parse_properties(text).unwrap();
        let pairs: Vec<(&str, &str)> =
            properties.iter().map(|p| (p.key.as_str(), p.value.as_str())).collect();
        assert_eq!(
            pairs,
            vec![("a", "1"), ("b", "two words"), ("c", "three"), ("d:e", "x\ty"), ("snow", "☃")]
        );
    }

    #[test]
    fn test_parse_comments_continuations_and_duplicates() {
        let text = "# first\n! second\nkey = one \\\n    two\nother = x\nkey = three\n";
        let properties = parse_properties(text).unwrap();
        assert_eq!(properties.len(), 2);
        assert_eq!(properties[0].key, "key");
        assert_eq!(properties[0].value, "three");
        assert!(properties[0].comments.is_empty());
        assert_eq!(properties[1].key, "other");

        let properties = parse_properties("# note\nkey = one \\\n  two\n").unwrap();
        assert_eq!(properties[0].value, "one two");
        assert_eq!(properties[0].comments, vec!["note"]);
    }

    #[test]
    fn test_parse_bad_unicode_escape() {
        let err = parse_properties("ok = 1\nbad = \\u12\n").unwrap_err();
        assert!(matches!(err, DecodeError::Properties { .. }));
    }

    #[test]
    fn test_decode_builds_nested_tree() {
        let mut tree = Tree::new();
        let input = b"# server settings\nserver.port = 8080\nserver.hosts.0 = a\nserver.hosts.1 = b\nname = demo\n";
        let documents = decode_all(&mut PropertiesDecoder::new(), &mut tree, input).unwrap();
        assert_eq!(documents.len(), 1);

        let root = tree.get(documents[0]).content()[0];
        let server = tree.map_value(root, "server").unwrap();
        let port = tree.map_value(server, "port").unwrap();
        assert_eq!(tree.get(port).tag, Tag::Int);

        let (port_key, _) = tree.map_entries(server).next().unwrap();
        assert_eq!(tree.get(port_key).head_comment, "# server settings");

        let hosts = tree.map_value(server, "hosts").unwrap();
        assert_eq!(tree.get(hosts).content().len(), 2);
    }

    #[test]
    fn test_comment_on_sequence_entry() {
        let mut tree = Tree::new();
        let input = b"list.0 = a\n# second\nlist.1 = b\n";
        let documents = decode_all(&mut PropertiesDecoder::new(), &mut tree, input).unwrap();
        let root = tree.get(documents[0]).content()[0];
        let list = tree.map_value(root, "list").unwrap();
        let second = tree.get(list).content()[1];
        assert_eq!(tree.get(second).head_comment, "# second");
        assert_eq!(tree.get(second).value(), Some("b"));
    }

    #[test]
    fn test_empty_input() {
        let mut tree = Tree::new();
        let documents = decode_all(&mut PropertiesDecoder::new(), &mut tree, b"").unwrap();
        assert!(documents.is_empty());
    }
}
