//! Evaluation and encoding settings.
//!
//! Nothing here is global: an [`EvalConfig`] is handed to
//! [`Navigator::new`](crate::Navigator::new) and [`EncoderPreferences`] to each
//! encoder, so differently configured pipelines can run side by side.

use std::fmt;

/// Settings that change how expressions evaluate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalConfig {
    /// Expand `\( ... )` sequences inside string literals
    pub interpolation: bool,
}

impl Default for EvalConfig {
    fn default() -> Self {
        EvalConfig { interpolation: true }
    }
}

/// Settings shared by the output encoders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderPreferences {
    /// Spaces per nesting level; `0` selects compact JSON
    pub indent: usize,

    /// Print scalar values without surrounding quotes
    pub unwrap_scalar: bool,

    /// Write sequence positions as `a[0]` instead of `a.0` in properties output
    pub use_array_brackets: bool,

    /// Separator between a flattened key and its value
    pub key_value_separator: String,
}

impl Default for EncoderPreferences {
    fn default() -> Self {
        EncoderPreferences {
            indent: 2,
            unwrap_scalar: true,
            use_array_brackets: false,
            key_value_separator: " = ".to_string(),
        }
    }
}

/// Document formats that can be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum InputFormat {
    #[default]
    Yaml,
    Json,
    #[cfg_attr(feature = "cli", value(alias = "props"))]
    Properties,
    /// Comma-separated rows under a header row
    Csv,
    /// Tab-separated rows under a header row
    Tsv,
}

/// Document formats that can be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
    #[cfg_attr(feature = "cli", value(alias = "props"))]
    Properties,
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputFormat::Yaml => write!(f, "yaml"),
            InputFormat::Json => write!(f, "json"),
            InputFormat::Properties => write!(f, "properties"),
            InputFormat::Csv => write!(f, "csv"),
            InputFormat::Tsv => write!(f, "tsv"),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Yaml => write!(f, "yaml"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Properties => write!(f, "properties"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert!(EvalConfig::default().interpolation);

        let prefs = EncoderPreferences::default();
        assert_eq!(prefs.indent, 2);
        assert!(prefs.unwrap_scalar);
        assert!(!prefs.use_array_brackets);
        assert_eq!(prefs.key_value_separator, " = ");
    }

    #[test]
    fn test_format_names() {
        assert_eq!(InputFormat::Properties.to_string(), "properties");
        assert_eq!(InputFormat::Tsv.to_string(), "tsv");
        assert_eq!(OutputFormat::default().to_string(), "yaml");
    }
}
