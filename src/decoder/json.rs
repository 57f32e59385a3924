use std::collections::VecDeque;
use std::io::Read;

use serde_json::Value;

use super::{DecodeError, Decoder, read_to_string};
use crate::node::{Node, NodeId, Tag, Tree};

/// JSON input; a stream of whitespace-separated values yields one document
/// each.
#[derive(Debug, Default)]
pub struct JsonDecoder {
    documents: VecDeque<Value>,
}

impl JsonDecoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for JsonDecoder {
    fn init(&mut self, reader: &mut dyn Read) -> Result<(), DecodeError> {
        let text = read_to_string(reader)?;
        self.documents = serde_json::Deserializer::from_str(&text)
            .into_iter::<Value>()
            .collect::<Result<_, _>>()?;
        Ok(())
    }

    fn decode(&mut self, tree: &mut Tree) -> Result<Option<NodeId>, DecodeError> {
        let Some(value) = self.documents.pop_front() else {
            return Ok(None);
        };
        let root = add_value(tree, value);
        Ok(Some(tree.add(Node::document(root))))
    }
}

fn add_value(tree: &mut Tree, value: Value) -> NodeId {
    match value {
        Value::Null => tree.add(Node::null()),
        Value::Bool(flag) => tree.add(Node::boolean(flag)),
        Value::Number(number) => {
            let tag = if number.is_f64() { Tag::Float } else { Tag::Int };
            tree.add(Node::scalar(tag, number.to_string()))
        }
        Value::String(text) => tree.add(Node::string(text)),
        Value::Array(items) => {
            let items = items.into_iter().map(|item| add_value(tree, item)).collect();
            tree.add(Node::sequence_of(items))
        }
        Value::Object(entries) => {
            let map = tree.add(Node::mapping());
            for (key, value) in entries {
                let key = tree.add(Node::string(key));
                let value = add_value(tree, value);
                tree.add_key_value(map, key, value);
            }
            map
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::decode_all;

    #[test]
    fn test_object_order_and_types() {
        let mut tree = Tree::new();
        let input = br#"{"z": 1, "a": [true, null, 1.5, "s"]}"#;
        let documents = decode_all(&mut JsonDecoder::new(), &mut tree, input).unwrap();
        let root = tree.get(documents[0]).content()[0];

        let keys: Vec<_> = tree
            .map_entries(root)
            .map(|(key, _)| tree.get(key).value().unwrap_or_default().to_string())
            .collect();
        assert_eq!(keys, vec!["z", "a"]);

        let a = tree.map_value(root, "a").unwrap();
        let tags: Vec<Tag> = tree.get(a).content().iter().map(|item| tree.get(*item).tag.clone()).collect();
        assert_eq!(tags, vec![Tag::Bool, Tag::Null, Tag::Float, Tag::Str]);
    }

    #[test]
    fn test_value_stream() {
        let mut tree = Tree::new();
        let documents = decode_all(&mut JsonDecoder::new(), &mut tree, b"1 \"two\"\n[3]").unwrap();
        assert_eq!(documents.len(), 3);

        let documents = decode_all(&mut JsonDecoder::new(), &mut tree, b"").unwrap();
        assert!(documents.is_empty());
    }

    #[test]
    fn test_invalid_json() {
        let mut tree = Tree::new();
        let err = decode_all(&mut JsonDecoder::new(), &mut tree, b"{\"a\":").unwrap_err();
        assert!(matches!(err, DecodeError::Json(_)));
    }
}
