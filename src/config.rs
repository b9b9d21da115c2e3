//! # Layout Configuration
//!
//! Tunables for justification, line breaking and glyph measurement. Every
//! field has a default, so an empty JSON object is a valid configuration.

use serde::Deserialize;

use crate::error::FlowError;
use crate::style::Hyphens;

/// Complete configuration for the line core.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConfig {
    pub justify: JustifyConfig,
    pub breaking: BreakConfig,
    pub metrics: MetricsConfig,
}

/// How justification slack may be distributed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum SpacingMode {
    /// Split between word and character spacing by `word_share`.
    #[default]
    Auto,
    /// Character spacing only.
    Character,
    /// Word spacing only (character spacing when a line has no spaces).
    Word,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JustifyConfig {
    pub spacing_mode: SpacingMode,
    /// Fraction of the slack given to word spacing when both are used.
    pub word_share: f64,
    /// Maximum character spacing. 0 means unlimited.
    pub max_char_spacing: f64,
    /// Maximum word spacing. 0 means unlimited.
    pub max_word_spacing: f64,
    /// Justify the last line of a paragraph too.
    pub justify_last_line: bool,
    pub max_char_spacing_last: f64,
    pub max_word_spacing_last: f64,
    /// Fraction of the slack given to kashida elongation.
    pub kashida_share: f64,
    /// Smallest per-opportunity elongation, relative to the tatweel width,
    /// that is still worth drawing.
    pub min_kashida_ratio: f64,
}

impl Default for JustifyConfig {
    fn default() -> Self {
        Self {
            spacing_mode: SpacingMode::Auto,
            word_share: 0.6,
            max_char_spacing: 2.0,
            max_word_spacing: 0.0,
            justify_last_line: false,
            max_char_spacing_last: 1.0,
            max_word_spacing_last: 2.0,
            kashida_share: 0.5,
            min_kashida_ratio: 0.5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BreakConfig {
    pub hyphens: Hyphens,
    /// BCP 47 language tag for dictionary hyphenation.
    pub lang: Option<String>,
    /// Minimum characters left before an automatic hyphen.
    pub min_prefix: usize,
    /// Minimum characters carried after an automatic hyphen.
    pub min_suffix: usize,
    /// Let a CJK character that may not start a line stay on the current one.
    pub allow_cjk_orphans: bool,
    /// Let such characters overhang instead of squeezing the line.
    pub allow_cjk_overflow: bool,
}

impl Default for BreakConfig {
    fn default() -> Self {
        Self {
            hyphens: Hyphens::Manual,
            lang: None,
            min_prefix: 2,
            min_suffix: 2,
            allow_cjk_orphans: true,
            allow_cjk_overflow: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetricsConfig {
    /// Advance of an undefined glyph, in thousandths of an em.
    pub missing_glyph_width: f64,
    /// Same, for CJK / composite fonts.
    pub cjk_missing_glyph_width: f64,
    /// Size factor of small capitals.
    pub small_caps_scale: f64,
    /// Horizontal stretch of small capitals.
    pub small_caps_stretch: f64,
    /// Ascent used when a font has no vertical metrics, as a fraction of an em.
    pub fallback_ascent: f64,
    /// Descent used when a font has no vertical metrics (negative).
    pub fallback_descent: f64,
    /// Family substituted when a requested font is missing or unusable.
    pub fallback_family: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            missing_glyph_width: 500.0,
            cjk_missing_glyph_width: 1000.0,
            small_caps_scale: 0.75,
            small_caps_stretch: 1.1,
            fallback_ascent: 0.8,
            fallback_descent: -0.2,
            fallback_family: "Helvetica".to_string(),
        }
    }
}

impl LayoutConfig {
    /// Parse a configuration from JSON and validate it.
    pub fn from_json(json: &str) -> Result<Self, FlowError> {
        let config: LayoutConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the solvers misbehave.
    pub fn validate(&self) -> Result<(), FlowError> {
        let j = &self.justify;
        for (name, value) in [
            ("wordShare", j.word_share),
            ("kashidaShare", j.kashida_share),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(FlowError::ConfigError(format!(
                    "{} must be between 0 and 1, got {}",
                    name, value
                )));
            }
        }
        for (name, value) in [
            ("maxCharSpacing", j.max_char_spacing),
            ("maxWordSpacing", j.max_word_spacing),
            ("maxCharSpacingLast", j.max_char_spacing_last),
            ("maxWordSpacingLast", j.max_word_spacing_last),
            ("minKashidaRatio", j.min_kashida_ratio),
        ] {
            if value < 0.0 {
                return Err(FlowError::ConfigError(format!(
                    "{} must not be negative, got {}",
                    name, value
                )));
            }
        }
        if self.metrics.small_caps_scale <= 0.0 || self.metrics.small_caps_stretch <= 0.0 {
            return Err(FlowError::ConfigError(
                "small caps scale and stretch must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
