//! Structured error types for the flowline layout core.
//!
//! Almost nothing in line layout is allowed to fail: missing glyphs, broken
//! font tables and over-constrained justification all degrade to a complete
//! (if imperfect) line. The variants here cover what is left: bad input,
//! unparsable fonts at registration time, and a font request that cannot be
//! satisfied by any registered font.

use thiserror::Error;

/// The unified error type returned by all public flowline API functions.
#[derive(Debug, Error)]
pub enum FlowError {
    /// JSON input failed to parse as a valid flowline document or config.
    #[error("Failed to parse input: {}{}", .source, render_hint(.hint))]
    ParseError {
        source: serde_json::Error,
        hint: String,
    },
    /// A font could not be loaded or parsed.
    #[error("Font error: {0}")]
    FontError(String),
    /// No registered font matches the request and no fallback exists.
    #[error("No usable font for family '{family}' and no fallback family registered")]
    FontUnavailable { family: String },
    /// A configuration value is out of range.
    #[error("Config error: {0}")]
    ConfigError(String),
}

fn render_hint(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for FlowError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the flowline schema. Check field names and types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input, is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        FlowError::ParseError { source: e, hint }
    }
}
