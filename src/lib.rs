pub mod ast;
pub mod config;
pub mod context;
pub mod decoder;
pub mod encoder;
pub mod lexer;
pub mod navigator;
pub mod node;
pub mod operators;
pub mod parser;

#[cfg(feature = "cli")]
pub mod cli;

pub use ast::{ExpressionNode, Operation, Token};
pub use config::{EncoderPreferences, EvalConfig, InputFormat, OutputFormat};
pub use context::{Candidate, Context, Origin, PathSegment};
pub use decoder::{DecodeError, Decoder, decoder_for};
pub use encoder::{EncodeError, Encoder, encoder_for};
pub use lexer::{LexError, Lexer};
pub use navigator::{EvalError, Navigator};
pub use node::{Node, NodeId, NodeKind, Style, Tag, Tree};
pub use parser::{ParseError, Parser, parse_expression};
