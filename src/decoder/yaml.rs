use std::collections::VecDeque;
use std::io::Read;

use serde::Deserialize;
use serde_yaml::Value;
use tracing::debug;

use super::{DecodeError, Decoder, read_to_string};
use crate::node::{Node, NodeId, Tag, Tree};

/// Multi-document YAML input.
///
/// `serde_yaml` expands aliases and drops comments, so decoded trees carry
/// neither; custom tags are kept.
#[derive(Debug, Default)]
pub struct YamlDecoder {
    documents: VecDeque<Value>,
}

impl YamlDecoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for YamlDecoder {
    fn init(&mut self, reader: &mut dyn Read) -> Result<(), DecodeError> {
        let text = read_to_string(reader)?;
        self.documents.clear();
        if text.trim().is_empty() {
            return Ok(());
        }
        for document in serde_yaml::Deserializer::from_str(&text) {
            self.documents.push_back(Value::deserialize(document)?);
        }
        debug!(documents = self.documents.len(), "decoded YAML stream");
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

/// Builds the node tree for a `serde_yaml` value.
pub(super) fn add_value(tree: &mut Tree, value: Value) -> NodeId {
    match value {
        Value::Null => tree.add(Node::null()),
        Value::Bool(flag) => tree.add(Node::boolean(flag)),
        Value::Number(number) => {
            let tag = if number.is_f64() { Tag::Float } else { Tag::Int };
            tree.add(Node::scalar(tag, number.to_string()))
        }
        Value::String(text) => tree.add(Node::string(text)),
        Value::Sequence(items) => {
            let items = items.into_iter().map(|item| add_value(tree, item)).collect();
            tree.add(Node::sequence_of(items))
        }
        Value::Mapping(entries) => {
            let map = tree.add(Node::mapping());
            for (key, value) in entries {
                let key = add_value(tree, key);
                let value = add_value(tree, value);
                tree.add_key_value(map, key, value);
            }
            map
        }
        Value::Tagged(tagged) => {
            let tag = Tag::parse(&tagged.tag.to_string());
            let id = add_value(tree, tagged.value);
            tree.get_mut(id).tag = tag;
            id
        }
    }
}
