//! # Glyph Metrics
//!
//! Advance widths for the characters of one fragment.
//!
//! The positioning mode is picked once per fragment: shaper annotations win
//! over pair kerning, and pair kerning is only used when the fragment asks
//! for it and the font carries a pair table. Each mode has its own branch in
//! [`GlyphMetrics::advance`]; the two adjustment sources are never combined
//! for the same character.

use crate::config::MetricsConfig;
use crate::font::{FontMetrics, ResolvedFont, UsedGlyphs};
use crate::model::{GlyphAnnotation, GlyphGroup};
use crate::style::{FontState, InlineStyle};

use super::classes::{is_justifiable_space, is_zero_width};

/// How horizontal adjustments are sourced for a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GlyphPositioning {
    /// Nominal advances only.
    #[default]
    Plain,
    /// Nominal advances plus the font's pair-kerning table.
    KerningPairs,
    /// Nominal advances plus the shaper's per-character overrides.
    ShapingAnnotated,
}

impl GlyphPositioning {
    pub fn select(font: &FontState, metrics: &FontMetrics, has_shaping: bool) -> Self {
        if has_shaping {
            GlyphPositioning::ShapingAnnotated
        } else if font.kerning && metrics.has_kerning() {
            GlyphPositioning::KerningPairs
        } else {
            GlyphPositioning::Plain
        }
    }
}

/// A measured character, ready to be placed on a line.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasuredGlyph {
    /// The character drawn (the capital for a small-caps letter).
    pub render: char,
    pub advance: f64,
    /// Drawn as a scaled capital.
    pub small_cap: bool,
}

/// Measures characters in one font state.
pub struct GlyphMetrics<'a> {
    font: ResolvedFont<'a>,
    state: &'a FontState,
    letter_spacing: f64,
    word_spacing: f64,
    config: &'a MetricsConfig,
    positioning: GlyphPositioning,
    rtl: bool,
}

impl<'a> GlyphMetrics<'a> {
    pub fn new(
        font: ResolvedFont<'a>,
        state: &'a FontState,
        style: &InlineStyle,
        config: &'a MetricsConfig,
        positioning: GlyphPositioning,
    ) -> Self {
        Self {
            font,
            state,
            letter_spacing: style.letter_spacing,
            word_spacing: style.word_spacing,
            config,
            positioning,
            rtl: false,
        }
    }

    /// Pick the direction-specific advance overrides of the shaper.
    pub fn with_rtl(mut self, rtl: bool) -> Self {
        self.rtl = rtl;
        self
    }

    pub fn positioning(&self) -> GlyphPositioning {
        self.positioning
    }

    pub fn font(&self) -> &ResolvedFont<'a> {
        &self.font
    }

    /// Advance of `ch` after `prev`, in points.
    pub fn advance(&self, prev: Option<char>, ch: char, annotation: Option<&GlyphAnnotation>) -> f64 {
        self.measure_glyph(prev, ch, annotation).advance
    }

    /// Measure `ch` and record the glyph it draws in `used`.
    pub fn measure(
        &self,
        prev: Option<char>,
        ch: char,
        annotation: Option<&GlyphAnnotation>,
        used: &mut UsedGlyphs,
    ) -> MeasuredGlyph {
        let glyph = self.measure_glyph(prev, ch, annotation);
        if !is_zero_width(ch) {
            used.record(self.font.key, glyph.render);
        }
        glyph
    }

    /// Width of a literal hyphen in this font.
    pub fn hyphen_width(&self) -> f64 {
        self.nominal('-') + self.letter_spacing
    }

    fn measure_glyph(
        &self,
        prev: Option<char>,
        ch: char,
        annotation: Option<&GlyphAnnotation>,
    ) -> MeasuredGlyph {
        if is_zero_width(ch) {
            return MeasuredGlyph {
                render: ch,
                advance: 0.0,
                small_cap: false,
            };
        }

        let (render, mut advance, small_cap) = self.base_advance(ch);

        match (self.positioning, annotation) {
            (GlyphPositioning::ShapingAnnotated, Some(a)) => {
                if a.group == GlyphGroup::Mark {
                    return MeasuredGlyph {
                        render,
                        advance: 0.0,
                        small_cap,
                    };
                }
                if let Some(adjust) = a.advance_adjustment(self.rtl) {
                    advance += adjust / 1000.0 * self.state.size;
                }
            }
            (GlyphPositioning::KerningPairs, _) => {
                if let Some(prev) = prev {
                    advance += self.font.metrics.kern_em(prev, ch) * self.state.size;
                }
            }
            _ => {}
        }

        advance += self.letter_spacing;
        if is_justifiable_space(ch) {
            advance += self.word_spacing;
        }

        MeasuredGlyph {
            render,
            advance,
            small_cap,
        }
    }

    /// Nominal advance with small-caps substitution applied.
    fn base_advance(&self, ch: char) -> (char, f64, bool) {
        if self.state.small_caps && ch.is_lowercase() {
            if let Some(upper) = single_uppercase(ch) {
                if let Some(w) = self.font.metrics.advance_em(upper) {
                    let scaled = w
                        * self.state.size
                        * self.config.small_caps_scale
                        * self.config.small_caps_stretch;
                    return (upper, scaled, true);
                }
            }
        }
        (ch, self.nominal(ch), false)
    }

    fn nominal(&self, ch: char) -> f64 {
        let metrics = self.font.metrics;
        let em = metrics.advance_em(ch).unwrap_or_else(|| {
            metrics.missing_width_em().unwrap_or_else(|| {
                if metrics.is_cjk {
                    self.config.cjk_missing_glyph_width / 1000.0
                } else {
                    self.config.missing_glyph_width / 1000.0
                }
            })
        });
        em * self.state.size
    }
}

fn single_uppercase(ch: char) -> Option<char> {
    let mut upper = ch.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(u), None) if u != ch => Some(u),
        _ => None,
    }
}
