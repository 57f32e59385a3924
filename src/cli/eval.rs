//! Evaluate treeq expressions against input documents

use tracing::debug;

use super::CliError;
use crate::{
    Context, EncoderPreferences, EvalConfig, InputFormat, Navigator, OutputFormat, Tree, decoder,
    encoder, parse_expression,
};

/// Options for the eval command
#[derive(Debug, Clone, Default)]
pub struct EvalOptions {
    /// The expression to evaluate
    pub expression: String,
    /// Document text
    pub input: Option<String>,
    pub input_format: InputFormat,
    pub output_format: OutputFormat,
    pub preferences: EncoderPreferences,
    pub config: EvalConfig,
    /// Only validate syntax, don't execute
    pub syntax_only: bool,
}

/// Result of an eval operation
#[derive(Debug, PartialEq, Eq)]
pub enum EvalResult {
    /// Syntax validation passed
    SyntaxValid,
    /// Expression evaluated; the encoded results of every document
    Success(String),
}

/// Evaluates the expression once per input document and encodes every
/// result.
pub fn execute_eval(options: &EvalOptions) -> Result<EvalResult, CliError> {
    let expr = parse_expression(&options.expression)?;
    if options.syntax_only {
        return Ok(EvalResult::SyntaxValid);
    }

    let input = options.input.as_ref().ok_or(CliError::NoInput)?;

    let mut tree = Tree::new();
    let mut decoder = decoder::decoder_for(options.input_format);
    let documents = decoder::decode_all(decoder.as_mut(), &mut tree, input.as_bytes())?;
    debug!(documents = documents.len(), format = ?options.input_format, "decoded input");

    let navigator = Navigator::new(options.config.clone());
    let mut encoder = encoder::encoder_for(options.output_format, options.preferences.clone());
    let mut output = Vec::new();
    for (position, document) in documents.into_iter().enumerate() {
        let result = navigator.evaluate(&mut tree, &Context::root(document), &expr)?;
        if position > 0 && !result.is_empty() {
            output.extend_from_slice(encoder.document_separator().as_bytes());
        }
        for node in result.nodes() {
            encoder.encode(&mut output, &tree, node)?;
        }
    }

    Ok(EvalResult::Success(String::from_utf8_lossy(&output).into_owned()))
}
