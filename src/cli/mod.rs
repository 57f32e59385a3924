//! CLI support for treeq
//!
//! Provides programmatic access to the `treeq` command so other tools can
//! embed it without spawning a process.

mod docs;
mod eval;

pub use docs::{DocCategory, get_doc_category, get_docs_overview};
pub use eval::{EvalOptions, EvalResult, execute_eval};

use std::io;

use thiserror::Error;

use crate::{DecodeError, EncodeError, EvalError, ParseError};

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Evaluation error: {0}")]
    Eval(#[from] EvalError),

    #[error("Invalid input: {0}")]
    Decode(#[from] DecodeError),

    #[error("Output error: {0}")]
    Encode(#[from] EncodeError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("No input provided. Pass a file, use --input or pipe a document to stdin.")]
    NoInput,

    #[error("Unknown category: '{0}'\nRun 'treeq docs' to see available categories.")]
    UnknownCategory(String),
}
