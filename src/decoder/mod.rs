//! Input decoders.
//!
//! A [`Decoder`] is initialised with a reader and then yields one document per
//! [`Decoder::decode`] call until it returns `Ok(None)`.

mod csv_object;
mod json;
mod properties;
mod yaml;

pub use csv_object::CsvObjectDecoder;
pub use json::JsonDecoder;
pub use properties::{PropertiesDecoder, Property, parse_properties};
pub use yaml::YamlDecoder;

use std::io::{self, Read};

use thiserror::Error;

use crate::{
    config::InputFormat,
    navigator::EvalError,
    node::{NodeId, Tree},
};

/// Errors raised while reading input documents.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to read input: {0}")]
    Io(#[from] io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid properties at line {line}: {message}")]
    Properties { line: usize, message: String },

    #[error("invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Building the document tree failed (e.g. conflicting flattened keys)
    #[error(transparent)]
    Eval(#[from] EvalError),
}

pub trait Decoder {
    /// Takes the input to decode, replacing any previous input.
    fn init(&mut self, reader: &mut dyn Read) -> Result<(), DecodeError>;

    /// Decodes the next document into `tree`; `None` marks the end of input.
    fn decode(&mut self, tree: &mut Tree) -> Result<Option<NodeId>, DecodeError>;
}

/// Builds the decoder for `format`.
pub fn decoder_for(format: InputFormat) -> Box<dyn Decoder> {
    match format {
        InputFormat::Yaml => Box::new(YamlDecoder::new()),
        InputFormat::Json => Box::new(JsonDecoder::new()),
        InputFormat::Properties => Box::new(PropertiesDecoder::new()),
        InputFormat::Csv => Box::new(CsvObjectDecoder::csv()),
        InputFormat::Tsv => Box::new(CsvObjectDecoder::tsv()),
    }
}

/// Decodes every document of `input`.
pub fn decode_all(
    decoder: &mut dyn Decoder,
    tree: &mut Tree,
    mut input: &[u8],
) -> Result<Vec<NodeId>, DecodeError> {
    decoder.init(&mut input)?;
    let mut documents = Vec::new();
    while let Some(document) = decoder.decode(tree)? {
        documents.push(document);
    }
    Ok(documents)
}

fn read_to_string(reader: &mut dyn Read) -> Result<String, DecodeError> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    Ok(text)
}
