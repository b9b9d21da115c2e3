//! # Flowline
//!
//! The line layout core of a fixed-page document renderer: it takes a
//! stream of styled text fragments and inline objects, breaks it into
//! lines, justifies them, resolves their vertical metrics and emits
//! positioned draw commands page by page.
//!
//! ## Architecture
//!
//! ```text
//! Input (JSON/API): fragments + block style
//!       ↓
//!   [text]     : glyph metrics, break classes, hyphenation, shaping
//!       ↓
//!   [line]     : accumulate → break → justify → vertical metrics
//!       ↓
//!   [text::bidi] : visual order
//!       ↓
//!   [paint]    : draw commands + page cursor
//!       ↓
//!   [layout]   : paragraph driver, pages
//! ```
//!
//! Shaping, hyphenation and bidi reordering are consumed through traits
//! with default implementations on `rustybuzz`, `hypher` and
//! `unicode-bidi`. Serializing the draw commands into a concrete page
//! description format is left to the caller.

pub mod config;
pub mod error;
pub mod font;
pub mod layout;
pub mod line;
pub mod model;
pub mod paint;
pub mod style;
pub mod text;

pub use config::LayoutConfig;
pub use error::FlowError;
pub use font::FontContext;
pub use layout::{layout_document, LayoutOutput, LayoutPage, Typesetter};
pub use model::Document;

/// Lay out a document with the built-in core fonts.
pub fn layout(document: &Document, config: &LayoutConfig) -> Result<LayoutOutput, FlowError> {
    let fonts = FontContext::new();
    layout_document(document, &fonts, config)
}

/// Lay out a document described as JSON, with an optional JSON config, and
/// return the pages as JSON.
pub fn layout_json(document: &str, config: Option<&str>) -> Result<String, FlowError> {
    let document: Document = serde_json::from_str(document)?;
    let config = match config {
        Some(json) => LayoutConfig::from_json(json)?,
        None => LayoutConfig::default(),
    };
    let output = layout(&document, &config)?;
    Ok(serde_json::to_string_pretty(&output)?)
}
