//! # Style System
//!
//! The resolved style values the line core works with. The cascade that
//! produces them lives upstream; by the time a fragment reaches the line
//! accumulator every value here is concrete.
//!
//! `FontState` is a plain value. Components receive it by reference or by
//! clone and never mutate a shared "current font"; nested style changes are
//! expressed by handing a different `FontState` to the next fragment.

use serde::{Deserialize, Serialize};

/// The font-related state of one fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontState {
    /// Font family name.
    pub family: String,
    /// Font weight (100-900).
    #[serde(default = "default_weight")]
    pub weight: u32,
    /// Font style.
    #[serde(default)]
    pub style: FontStyle,
    /// Font size in points.
    pub size: f64,
    /// Text color.
    #[serde(default)]
    pub color: Color,
    /// Whether pair kerning from the font is applied.
    #[serde(default)]
    pub kerning: bool,
    /// Whether lowercase letters are drawn as scaled capitals.
    #[serde(default)]
    pub small_caps: bool,
}

fn default_weight() -> u32 {
    400
}

impl FontState {
    pub fn new(family: &str, size: f64) -> Self {
        Self {
            family: family.to_string(),
            weight: 400,
            style: FontStyle::Normal,
            size,
            color: Color::BLACK,
            kerning: false,
            small_caps: false,
        }
    }

    pub fn is_italic(&self) -> bool {
        matches!(self.style, FontStyle::Italic | FontStyle::Oblique)
    }
}

impl Default for FontState {
    fn default() -> Self {
        Self::new("Helvetica", 12.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
    Oblique,
}

/// Horizontal alignment of a line inside its block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlign {
    #[default]
    Left,
    Right,
    Center,
    Justify,
    /// Align the first decimal separator of the line on a fixed column.
    DecimalAlign,
}

/// Block (paragraph) direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
}

impl Direction {
    pub fn is_rtl(self) -> bool {
        matches!(self, Direction::Rtl)
    }
}

/// Text decoration lines. Several may be active at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextDecoration {
    pub underline: bool,
    pub line_through: bool,
    pub overline: bool,
}

impl TextDecoration {
    pub const NONE: TextDecoration = TextDecoration {
        underline: false,
        line_through: false,
        overline: false,
    };

    pub fn is_none(&self) -> bool {
        !(self.underline || self.line_through || self.overline)
    }
}

/// Vertical alignment of an inline object against the line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerticalAlign {
    #[default]
    Baseline,
    Middle,
    TextTop,
    TextBottom,
    /// Aligned with the top of the line box.
    Top,
    /// Aligned with the bottom of the line box.
    Bottom,
}

/// Which inline contributions count toward the height of a line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineStacking {
    /// Union of the strut and every inline box including its half-leading.
    #[default]
    InlineLineHeight,
    /// The strut alone.
    BlockLineHeight,
    /// Union of the strut and every inline content area.
    MaxHeight,
    /// Like `InlineLineHeight`, rounded up to a whole multiple of the strut.
    GridHeight,
}

/// Hyphenation mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Hyphens {
    /// No hyphenation; soft hyphens are ignored as break points.
    None,
    /// Only soft hyphens (U+00AD) in the text are break points.
    #[default]
    Manual,
    /// Soft hyphens plus dictionary hyphenation.
    Auto,
}

/// An inline border drawn around a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineBorder {
    pub width: f64,
    #[serde(default)]
    pub color: Color,
    /// Horizontal padding between the border and the text.
    #[serde(default)]
    pub padding: f64,
}

impl InlineBorder {
    /// Horizontal space one edge of the border takes up.
    pub fn edge_width(&self) -> f64 {
        self.width + self.padding
    }
}

/// Whether an inline border begins or ends at this fragment's edges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BorderFlags {
    pub left: bool,
    pub right: bool,
}

impl BorderFlags {
    pub const BOTH: BorderFlags = BorderFlags {
        left: true,
        right: true,
    };
}

/// Non-font style of a fragment: decoration, box painting, spacing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InlineStyle {
    pub decoration: TextDecoration,
    /// Decoration color; the text color when absent.
    pub decoration_color: Option<Color>,
    pub background: Option<Color>,
    pub border: Option<InlineBorder>,
    /// Upward shift of the baseline (superscript positive, subscript negative).
    pub baseline_shift: f64,
    /// Line height as a multiplier of the font size; `None` is the font's
    /// own content height.
    pub line_height: Option<f64>,
    /// Explicit extra space after every character.
    pub letter_spacing: f64,
    /// Explicit extra space after every space character.
    pub word_spacing: f64,
}

/// An RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64, // 0.0 - 1.0
    pub g: f64,
    pub b: f64,
    #[serde(default = "opaque")]
    pub a: f64,
}

fn opaque() -> f64 {
    1.0
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}
