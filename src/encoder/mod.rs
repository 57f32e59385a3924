//! Output encoders.
//!
//! An [`Encoder`] writes the subtree below one node of a [`Tree`] to a writer.
//! All encoders resolve aliases through [`Tree::resolve_alias`], so a cyclic
//! alias chain surfaces as [`EncodeError::AliasCycle`] rather than unbounded
//! recursion.

mod json;
mod properties;
mod yaml;

pub use json::JsonEncoder;
pub use properties::PropertiesEncoder;
pub use yaml::YamlEncoder;

use std::io::{self, Write};

use thiserror::Error;

use crate::{
    config::{EncoderPreferences, OutputFormat},
    node::{NodeId, Tree},
};

/// Errors raised while rendering a tree.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),

    #[error("failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("alias cycle detected while encoding")]
    AliasCycle,

    /// The node kind has no representation in the target format
    #[error("cannot encode {0}")]
    Unsupported(String),
}

/// Renders document trees in one output format.
pub trait Encoder {
    /// Writes the subtree rooted at `node`.
    fn encode(&mut self, writer: &mut dyn Write, tree: &Tree, node: NodeId) -> Result<(), EncodeError>;

    /// Written between consecutive documents of a stream.
    fn document_separator(&self) -> &'static str {
        ""
    }
}

/// Builds the encoder for `format`.
pub fn encoder_for(format: OutputFormat, preferences: EncoderPreferences) -> Box<dyn Encoder> {
    match format {
        OutputFormat::Yaml => Box::new(YamlEncoder::new(preferences)),
        OutputFormat::Json => Box::new(JsonEncoder::new(preferences)),
        OutputFormat::Properties => Box::new(PropertiesEncoder::new(preferences)),
    }
}

/// Encodes `node` into a string.
pub fn encode_to_string(
    encoder: &mut dyn Encoder,
    tree: &Tree,
    node: NodeId,
) -> Result<String, EncodeError> {
    let mut buffer = Vec::new();
    encoder.encode(&mut buffer, tree, node)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

fn resolve(tree: &Tree, node: NodeId) -> Result<NodeId, EncodeError> {
    tree.resolve_alias(node).ok_or(EncodeError::AliasCycle)
}

/// Strips `#` markers and surrounding blanks from each comment line.
fn clean_comment(comment: &str) -> Vec<String> {
    comment
        .lines()
        .map(|line| line.trim().trim_start_matches('#').trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}
