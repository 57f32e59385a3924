//! Delimiter-separated tables read as a sequence of objects.
//!
//! The first row names the columns and every later row becomes one mapping of
//! column name to cell. A cell that parses as a YAML snippet keeps that type
//! (`31` is an `!!int`, `a: b` a mapping); anything else stays a string.

use std::io::Read;

use csv::ReaderBuilder;
use serde_yaml::Value;
use tracing::debug;

use super::{DecodeError, Decoder, read_to_string, yaml::add_value};
use crate::node::{Node, NodeId, Tree};

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Decodes a CSV or TSV table into one sequence document.
#[derive(Debug)]
pub struct CsvObjectDecoder {
    delimiter: u8,
    text: Option<String>,
}

impl CsvObjectDecoder {
    pub fn new(delimiter: u8) -> Self {
        CsvObjectDecoder { delimiter, text: None }
    }

    /// Comma separated
    pub fn csv() -> Self {
        Self::new(b',')
    }

    /// Tab separated
    pub fn tsv() -> Self {
        Self::new(b'\t')
    }
}

fn cell_node(tree: &mut Tree, cell: &str) -> NodeId {
    match serde_yaml::from_str::<Value>(cell) {
        Ok(value) => add_value(tree, value),
        Err(_) => tree.add(Node::string(cell)),
    }
}

impl Decoder for CsvObjectDecoder {
    fn init(&mut self, reader: &mut dyn Read) -> Result<(), DecodeError> {
        self.text = Some(read_to_string(reader)?);
        Ok(())
    }

    fn decode(&mut self, tree: &mut Tree) -> Result<Option<NodeId>, DecodeError> {
        let Some(text) = self.text.take() else {
            return Ok(None);
        };
        let input = text.strip_prefix(BYTE_ORDER_MARK).unwrap_or(&text);
        if input.trim().is_empty() {
            return Ok(None);
        }

        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .from_reader(input.as_bytes());
        let headers = reader.headers()?.clone();
        debug!(columns = headers.len(), "read table header");

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let row = tree.add(Node::mapping());
            for (header, cell) in headers.iter().zip(record.iter()) {
                let key = tree.add(Node::string(header));
                let value = cell_node(tree, cell);
                tree.add_key_value(row, key, value);
            }
            rows.push(row);
        }
        debug!(rows = rows.len(), "decoded table");

        let root = tree.add(Node::sequence_of(rows));
        Ok(Some(tree.add(Node::document(root))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{decoder::decode_all, node::Tag};

    fn decode_rows(decoder: &mut CsvObjectDecoder, tree: &mut Tree, input: &[u8]) -> Vec<NodeId> {
        let documents = decode_all(decoder, tree, input).unwrap();
        assert_eq!(documents.len(), 1);
        let root = tree.get(documents[0]).content()[0];
        tree.get(root).content().to_vec()
    }

    #[test]
    fn test_rows_become_mappings() {
        let mut tree = Tree::new();
        let input = b"name,age,active\nann,31,true\nbob,,false\n";
        let rows = decode_rows(&mut CsvObjectDecoder::csv(), &mut tree, input);
        assert_eq!(rows.len(), 2);

        let name = tree.map_value(rows[0], "name").unwrap();
        assert_eq!(tree.get(name).value(), Some("ann"));
        let age = tree.map_value(rows[0], "age").unwrap();
        assert_eq!(tree.get(age).tag, Tag::Int);
        let active = tree.map_value(rows[1], "active").unwrap();
        assert_eq!(tree.get(active).tag, Tag::Bool);

        let missing_age = tree.map_value(rows[1], "age").unwrap();
        assert!(tree.get(missing_age).is_null());
    }

    #[test]
    fn test_cells_fall_back_to_strings() {
        let mut tree = Tree::new();
        let input = b"note,nested\n\"x: [\",\"a: b\"\n\"one, two\",plain\n";
        let rows = decode_rows(&mut CsvObjectDecoder::csv(), &mut tree, input);

        let note = tree.map_value(rows[0], "note").unwrap();
        assert_eq!(tree.get(note).value(), Some("x: ["));
        assert_eq!(tree.get(note).tag, Tag::Str);

        let nested = tree.map_value(rows[0], "nested").unwrap();
        let b = tree.map_value(nested, "a").unwrap();
        assert_eq!(tree.get(b).value(), Some("b"));

        let note = tree.map_value(rows[1], "note").unwrap();
        assert_eq!(tree.get(note).value(), Some("one, two"));
    }

    #[test]
    fn test_tab_separated() {
        let mut tree = Tree::new();
        let rows = decode_rows(&mut CsvObjectDecoder::tsv(), &mut tree, b"a\tb\n1\tx, y\n");
        let b = tree.map_value(rows[0], "b").unwrap();
        assert_eq!(tree.get(b).value(), Some("x, y"));
    }

    #[test]
    fn test_byte_order_mark_is_skipped() {
        let mut tree = Tree::new();
        let rows = decode_rows(&mut CsvObjectDecoder::csv(), &mut tree, "\u{feff}id\n7\n".as_bytes());
        assert!(tree.map_value(rows[0], "id").is_some());
    }

    #[test]
    fn test_header_only_is_empty_sequence() {
        let mut tree = Tree::new();
        let rows = decode_rows(&mut CsvObjectDecoder::csv(), &mut tree, b"a,b\n");
        assert!(rows.is_empty());
    }

    #[test]
    fn test_ragged_row_fails() {
        let mut tree = Tree::new();
        let err = decode_all(&mut CsvObjectDecoder::csv(), &mut tree, b"a,b\n1\n").unwrap_err();
        assert!(matches!(err, DecodeError::Csv(_)));
    }

    #[test]
    fn test_empty_input() {
        let mut tree = Tree::new();
        let documents = decode_all(&mut CsvObjectDecoder::csv(), &mut tree, b"").unwrap();
        assert!(documents.is_empty());
    }
}
