//! # Text
//!
//! Per-character services used while a line is built: advance widths,
//! character classes for the break rules, hyphenation, shaping annotations
//! and the visual reordering of finished lines.

pub mod bidi;
pub mod classes;
pub mod hyphenate;
pub mod metrics;
pub mod shaping;

pub use bidi::{BidiReorder, UnicodeBidi, VisualSpan};
pub use hyphenate::{DictionaryHyphenator, Hyphenator, NoHyphenation};
pub use metrics::{GlyphMetrics, GlyphPositioning};
