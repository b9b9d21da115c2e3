//! # Font Management
//!
//! Font lookup and the metric tables the line core measures with.
//!
//! The core PDF fonts (Helvetica, Times, Courier) are always registered with
//! built-in metrics. TrueType/OpenType fonts are parsed with ttf-parser when
//! they are registered. Font files are never read from disk here; callers hand
//! over bytes.

pub mod standard;
pub mod truetype;
pub mod usage;

pub use standard::StandardFont;
pub use usage::{UsedFont, UsedGlyphs};

use std::collections::HashMap;

use crate::error::FlowError;
use crate::style::FontState;

#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct FontKey {
    pub family: String,
    pub weight: u32,
    pub italic: bool,
}

impl FontKey {
    pub fn new(family: &str, weight: u32, italic: bool) -> Self {
        Self {
            family: family.to_string(),
            weight,
            italic,
        }
    }

    fn snapped(&self) -> Self {
        Self {
            family: self.family.clone(),
            weight: if self.weight >= 600 { 700 } else { 400 },
            italic: self.italic,
        }
    }

    fn with_family(&self, family: &str) -> Self {
        Self {
            family: family.to_string(),
            ..self.snapped()
        }
    }
}

impl From<&FontState> for FontKey {
    fn from(state: &FontState) -> Self {
        FontKey::new(&state.family, state.weight, state.is_italic())
    }
}

/// Position and thickness of a decoration line, in font units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineMetric {
    pub position: i16,
    pub thickness: i16,
}

/// Everything the line core needs to know about one font face.
#[derive(Debug, Clone)]
pub struct FontMetrics {
    pub name: String,
    pub units_per_em: u16,
    pub advances: HashMap<char, u16>,
    /// Advance of the font's own missing glyph, if it declares one.
    pub missing_width: Option<u16>,
    pub ascent: Option<i16>,
    pub descent: Option<i16>,
    pub x_height: Option<i16>,
    pub underline: Option<LineMetric>,
    pub strikeout: Option<LineMetric>,
    pub kerning: HashMap<(char, char), i16>,
    /// CJK / composite font.
    pub is_cjk: bool,
    /// One of the built-in core fonts.
    pub is_core: bool,
}

impl FontMetrics {
    fn to_em(&self, units: f64) -> f64 {
        units / self.units_per_em.max(1) as f64
    }

    /// Advance of `ch` as a fraction of an em, if the font defines it.
    pub fn advance_em(&self, ch: char) -> Option<f64> {
        self.advances.get(&ch).map(|&w| self.to_em(w as f64))
    }

    pub fn has_glyph(&self, ch: char) -> bool {
        self.advances.contains_key(&ch)
    }

    /// Pair adjustment as a fraction of an em; 0 when the pair is unknown.
    pub fn kern_em(&self, left: char, right: char) -> f64 {
        self.kerning
            .get(&(left, right))
            .map(|&k| self.to_em(k as f64))
            .unwrap_or(0.0)
    }

    pub fn has_kerning(&self) -> bool {
        !self.kerning.is_empty()
    }

    /// Missing-glyph advance as a fraction of an em, if the font sets one.
    pub fn missing_width_em(&self) -> Option<f64> {
        self.missing_width
            .filter(|&w| w > 0)
            .map(|w| self.to_em(w as f64))
    }

    pub fn ascent_em(&self) -> Option<f64> {
        self.ascent.map(|a| self.to_em(a as f64))
    }

    pub fn descent_em(&self) -> Option<f64> {
        self.descent.map(|d| self.to_em(d as f64))
    }

    pub fn x_height_em(&self) -> Option<f64> {
        self.x_height
            .filter(|&x| x > 0)
            .map(|x| self.to_em(x as f64))
    }

    /// Underline (position, thickness) as fractions of an em.
    pub fn underline_em(&self) -> Option<(f64, f64)> {
        self.underline
            .map(|m| (self.to_em(m.position as f64), self.to_em(m.thickness as f64)))
    }

    pub fn strikeout_em(&self) -> Option<(f64, f64)> {
        self.strikeout
            .map(|m| (self.to_em(m.position as f64), self.to_em(m.thickness as f64)))
    }

    /// Whether Arabic text in this font can be elongated with tatweel.
    pub fn supports_kashida(&self) -> bool {
        self.has_glyph('\u{0640}')
    }
}

#[derive(Debug, Clone)]
pub enum FontData {
    /// One of the core PDF fonts. No embedding needed.
    Standard { metrics: FontMetrics },
    /// A TrueType/OpenType font that needs to be embedded.
    Custom {
        data: Vec<u8>,
        /// Parsed metrics, if the font's tables could be read.
        metrics: Option<FontMetrics>,
    },
}

impl FontData {
    fn metrics(&self) -> Option<&FontMetrics> {
        match self {
            FontData::Standard { metrics } => Some(metrics),
            FontData::Custom { metrics, .. } => metrics.as_ref(),
        }
    }
}

/// A font looked up for a `FontState`.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedFont<'a> {
    /// Key of the face actually used (after fallback).
    pub key: &'a FontKey,
    pub metrics: &'a FontMetrics,
    /// Raw font bytes for embedded fonts.
    pub data: Option<&'a [u8]>,
}

/// A font registry that maps font family + weight + style to font data.
pub struct FontRegistry {
    fonts: HashMap<FontKey, FontData>,
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FontRegistry {
    pub fn new() -> Self {
        let mut fonts = HashMap::new();

        let standard_mappings = [
            (("Helvetica", 400, false), StandardFont::Helvetica),
            (("Helvetica", 700, false), StandardFont::HelveticaBold),
            (("Helvetica", 400, true), StandardFont::HelveticaOblique),
            (("Helvetica", 700, true), StandardFont::HelveticaBoldOblique),
            (("Times", 400, false), StandardFont::TimesRoman),
            (("Times", 700, false), StandardFont::TimesBold),
            (("Times", 400, true), StandardFont::TimesItalic),
            (("Times", 700, true), StandardFont::TimesBoldItalic),
            (("Courier", 400, false), StandardFont::Courier),
            (("Courier", 700, false), StandardFont::CourierBold),
            (("Courier", 400, true), StandardFont::CourierOblique),
            (("Courier", 700, true), StandardFont::CourierBoldOblique),
        ];

        for ((family, weight, italic), font) in standard_mappings {
            fonts.insert(
                FontKey::new(family, weight, italic),
                FontData::Standard {
                    metrics: font.metrics(),
                },
            );
        }

        Self { fonts }
    }

    /// A registry with no fonts at all, not even the core ones.
    pub fn empty() -> Self {
        Self {
            fonts: HashMap::new(),
        }
    }

    /// Register a custom font.
    ///
    /// A font whose tables cannot be parsed is still registered; lookups of
    /// it fall back to the substitute family.
    pub fn register(&mut self, family: &str, weight: u32, italic: bool, data: Vec<u8>) {
        let metrics = match FontMetrics::from_truetype(family, &data) {
            Ok(m) => Some(m),
            Err(e) => {
                log::warn!("{}; text in this font will use the fallback font", e);
                None
            }
        };
        self.fonts
            .insert(FontKey::new(family, weight, italic), FontData::Custom { data, metrics });
    }

    /// Register pre-built metrics under a key (no font bytes).
    pub fn register_metrics(&mut self, key: FontKey, metrics: FontMetrics) {
        self.fonts.insert(
            key,
            FontData::Custom {
                data: Vec::new(),
                metrics: Some(metrics),
            },
        );
    }

    /// Look up a font with usable metrics.
    ///
    /// Tries the exact key, then the weight snapped to 400/700, then the
    /// fallback family. Only when all of those miss is this an error.
    pub fn resolve(&self, key: &FontKey, fallback_family: &str) -> Result<ResolvedFont<'_>, FlowError> {
        let candidates = [
            key.clone(),
            key.snapped(),
            key.with_family(fallback_family),
            FontKey::new(fallback_family, 400, false),
        ];
        for candidate in &candidates {
            let Some((stored_key, data)) = self.fonts.get_key_value(candidate) else {
                continue;
            };
            match data.metrics() {
                Some(metrics) => {
                    return Ok(ResolvedFont {
                        key: stored_key,
                        metrics,
                        data: match data {
                            FontData::Custom { data, .. } if !data.is_empty() => Some(data),
                            _ => None,
                        },
                    })
                }
                None => log::warn!(
                    "Font '{}' has no usable metrics, substituting '{}'",
                    candidate.family,
                    fallback_family
                ),
            }
        }
        Err(FlowError::FontUnavailable {
            family: key.family.clone(),
        })
    }
}

/// Shared font context used by measurement, vertical metrics and painting.
///
/// The substitute family is not stored here; callers pass the one from
/// their `MetricsConfig`.
pub struct FontContext {
    registry: FontRegistry,
}

impl Default for FontContext {
    fn default() -> Self {
        Self::new()
    }
}

impl FontContext {
    pub fn new() -> Self {
        Self::with_registry(FontRegistry::new())
    }

    pub fn with_registry(registry: FontRegistry) -> Self {
        Self { registry }
    }

    /// Resolve the face for a font state, substituting `fallback_family`
    /// when nothing closer is registered.
    pub fn resolve(&self, state: &FontState, fallback_family: &str) -> Result<ResolvedFont<'_>, FlowError> {
        self.registry.resolve(&FontKey::from(state), fallback_family)
    }

    /// Access the underlying font registry.
    pub fn registry(&self) -> &FontRegistry {
        &self.registry
    }

    /// Access the underlying font registry mutably.
    pub fn registry_mut(&mut self) -> &mut FontRegistry {
        &mut self.registry
    }
}
