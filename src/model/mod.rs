//! # Document Model
//!
//! The input the line core consumes: styled fragments grouped into
//! paragraphs, plus the page geometry the document driver flows them into.
//!
//! Fragments are produced by the (external) styling pass. The core never
//! mutates one; breaking a line splits a fragment into two new ones.

use serde::{Deserialize, Serialize};

use crate::style::{
    BorderFlags, Direction, FontState, InlineStyle, LineStacking, TextAlign, VerticalAlign,
};

/// A maximal run of text, or a single inline object, sharing one style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fragment {
    #[serde(flatten)]
    pub content: FragmentContent,
    #[serde(default)]
    pub font: FontState,
    #[serde(default)]
    pub style: InlineStyle,
    /// Shaper output, parallel to the text.
    #[serde(default)]
    pub shaping: Option<ShapingAnnotations>,
    #[serde(default)]
    pub border_flags: BorderFlags,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FragmentContent {
    Text(#[serde(with = "char_string")] Vec<char>),
    Object(InlineObject),
}

impl Fragment {
    /// A plain text fragment.
    pub fn text(text: &str, font: FontState) -> Self {
        Self {
            content: FragmentContent::Text(text.chars().collect()),
            font,
            style: InlineStyle::default(),
            shaping: None,
            border_flags: BorderFlags::default(),
        }
    }

    /// An inline object fragment.
    pub fn object(object: InlineObject, font: FontState) -> Self {
        Self {
            content: FragmentContent::Object(object),
            font,
            style: InlineStyle::default(),
            shaping: None,
            border_flags: BorderFlags::default(),
        }
    }

    pub fn with_style(mut self, style: InlineStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_shaping(mut self, shaping: ShapingAnnotations) -> Self {
        self.shaping = Some(shaping);
        self
    }

    pub fn with_border_flags(mut self, flags: BorderFlags) -> Self {
        self.border_flags = flags;
        self
    }

    /// The characters of a text fragment; empty for objects.
    pub fn chars(&self) -> &[char] {
        match &self.content {
            FragmentContent::Text(chars) => chars,
            FragmentContent::Object(_) => &[],
        }
    }

    pub fn object_ref(&self) -> Option<&InlineObject> {
        match &self.content {
            FragmentContent::Object(obj) => Some(obj),
            FragmentContent::Text(_) => None,
        }
    }

    pub fn annotation(&self, index: usize) -> Option<&GlyphAnnotation> {
        self.shaping.as_ref().and_then(|s| s.glyphs.get(index))
    }

    /// Split off everything from char `at` onward into a new fragment.
    ///
    /// The head keeps the left border edge, the tail the right one. A head
    /// left without characters hands its left edge to the tail. The shaping
    /// slice travels with the characters it describes.
    pub fn split_off(&mut self, at: usize) -> Fragment {
        let tail_content = match &mut self.content {
            FragmentContent::Text(chars) => {
                let at = at.min(chars.len());
                FragmentContent::Text(chars.split_off(at))
            }
            FragmentContent::Object(obj) => FragmentContent::Object(obj.clone()),
        };
        let tail_shaping = self.shaping.as_mut().map(|s| ShapingAnnotations {
            glyphs: s.glyphs.split_off(at.min(s.glyphs.len())),
        });
        let tail_flags = BorderFlags {
            left: self.is_empty_text() && self.border_flags.left,
            right: self.border_flags.right,
        };
        self.border_flags.right = false;
        if tail_flags.left {
            self.border_flags.left = false;
        }
        Fragment {
            content: tail_content,
            font: self.font.clone(),
            style: self.style.clone(),
            shaping: tail_shaping,
            border_flags: tail_flags,
        }
    }

    /// Drop the first character (a consumed break character). The left
    /// border edge stays with what remains.
    pub fn skip_first(mut self) -> Fragment {
        let left = self.border_flags.left;
        let mut rest = self.split_off(1);
        rest.border_flags.left |= left;
        rest
    }

    pub fn is_empty_text(&self) -> bool {
        matches!(&self.content, FragmentContent::Text(chars) if chars.is_empty())
    }
}

/// An opaque reference to an object owned by the caller (image, widget, ...).
pub type InlineObjectHandle = u64;

/// An atomic inline object placed on a line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineObject {
    pub handle: InlineObjectHandle,
    pub kind: ObjectKind,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub vertical_align: VerticalAlign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectKind {
    Image,
    FormField,
    /// A list marker.
    Marker,
    /// A dot leader that fills the free space of its line.
    DotTab,
}

impl ObjectKind {
    /// Objects allowed to stay at the end of a line they do not fit on.
    pub fn may_trail(self) -> bool {
        matches!(self, ObjectKind::DotTab)
    }
}

impl InlineObject {
    /// Width and height with non-positive or non-finite measurements zeroed.
    pub fn clamped_size(&self) -> (f64, f64) {
        let clamp = |v: f64| if v.is_finite() && v > 0.0 { v } else { 0.0 };
        let size = (clamp(self.width), clamp(self.height));
        if size != (self.width, self.height) {
            log::warn!(
                "Inline object {} reported size {}x{}, treating as {}x{}",
                self.handle,
                self.width,
                self.height,
                size.0,
                size.1
            );
        }
        size
    }
}

/// Per-character shaping output, parallel to a fragment's text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShapingAnnotations {
    pub glyphs: Vec<GlyphAnnotation>,
}

/// Shaper data for one character. Offsets and advances are in thousandths
/// of an em, so they scale with the font size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GlyphAnnotation {
    pub group: GlyphGroup,
    pub x_placement: f64,
    pub y_placement: f64,
    /// Advance adjustment when the run flows left to right.
    pub x_advance_ltr: Option<f64>,
    /// Advance adjustment when the run flows right to left.
    pub x_advance_rtl: Option<f64>,
    /// Elongation opportunity after this glyph; 0 means none, higher wins.
    pub kashida: u8,
}

impl GlyphAnnotation {
    pub fn advance_adjustment(&self, rtl: bool) -> Option<f64> {
        if rtl {
            self.x_advance_rtl.or(self.x_advance_ltr)
        } else {
            self.x_advance_ltr.or(self.x_advance_rtl)
        }
    }
}

/// Visual grouping class assigned by the shaper.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GlyphGroup {
    #[default]
    Base,
    /// A combining mark; it takes no advance of its own.
    Mark,
    /// A cursively joined letter.
    Cursive,
}

/// A block of fragments laid out together.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paragraph {
    pub fragments: Vec<Fragment>,
    #[serde(default)]
    pub block: BlockStyle,
}

/// Block-level settings shared by every line of a paragraph.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlockStyle {
    /// Content width available to each line.
    pub width: f64,
    pub align: TextAlign,
    pub direction: Direction,
    /// The block's own font; it defines the strut.
    pub font: FontState,
    /// Block line height as a multiplier of the font size.
    pub line_height: Option<f64>,
    pub text_indent: f64,
    pub line_stacking: LineStacking,
    /// Letter/word spacing was set explicitly on the block; justification
    /// then only widens spaces.
    pub fixed_spacing: bool,
    /// Position of the decimal separator column from the line start.
    pub decimal_anchor: f64,
    pub decimal_char: char,
    /// Vertical space after the paragraph.
    pub space_after: f64,
}

impl Default for BlockStyle {
    fn default() -> Self {
        Self {
            width: 0.0,
            align: TextAlign::Left,
            direction: Direction::Ltr,
            font: FontState::default(),
            line_height: None,
            text_indent: 0.0,
            line_stacking: LineStacking::InlineLineHeight,
            fixed_spacing: false,
            decimal_anchor: 0.0,
            decimal_char: '.',
            space_after: 0.0,
        }
    }
}

/// A whole input document: page geometry plus paragraphs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub page: PageConfig,
    pub paragraphs: Vec<Paragraph>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageConfig {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub margin: Edges,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            width: 595.28,
            height: 841.89,
            margin: Edges::uniform(54.0), // ~0.75 inch
        }
    }
}

impl PageConfig {
    pub fn content_width(&self) -> f64 {
        self.width - self.margin.horizontal()
    }

    pub fn content_height(&self) -> f64 {
        self.height - self.margin.vertical()
    }
}

/// Edge values (top, right, bottom, left) in points.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Edges {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Edges {
    pub fn uniform(v: f64) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

/// Serialize `Vec<char>` as a plain JSON string.
mod char_string {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(chars: &[char], serializer: S) -> Result<S::Ok, S::Error> {
        let s: String = chars.iter().collect();
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<char>, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(s.chars().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_off_moves_border_edges_and_shaping() {
        let mut frag = Fragment::text("abcd", FontState::default())
            .with_border_flags(BorderFlags::BOTH)
            .with_shaping(ShapingAnnotations {
                glyphs: (0..4)
                    .map(|i| GlyphAnnotation {
                        kashida: i as u8,
                        ..Default::default()
                    })
                    .collect(),
            });
        let tail = frag.split_off(1);
        assert_eq!(frag.chars(), &['a']);
        assert_eq!(tail.chars(), &['b', 'c', 'd']);
        assert!(frag.border_flags.left && !frag.border_flags.right);
        assert!(!tail.border_flags.left && tail.border_flags.right);
        assert_eq!(tail.annotation(0).map(|a| a.kashida), Some(1));
        assert_eq!(frag.shaping.as_ref().map(|s| s.glyphs.len()), Some(1));
    }

    #[test]
    fn test_split_at_start_hands_left_edge_to_tail() {
        let mut frag = Fragment::text("abc", FontState::default()).with_border_flags(BorderFlags::BOTH);
        let tail = frag.split_off(0);
        assert!(frag.is_empty_text());
        assert!(!frag.border_flags.left && !frag.border_flags.right);
        assert_eq!(tail.chars(), &['a', 'b', 'c']);
        assert!(tail.border_flags.left && tail.border_flags.right);

        let rest = tail.skip_first();
        assert_eq!(rest.chars(), &['b', 'c']);
        assert!(rest.border_flags.left && rest.border_flags.right);
    }

    #[test]
    fn test_fragment_json_text_and_object() {
        let text: Fragment =
            serde_json::from_str(r#"{"text": "hi", "font": {"family": "Times", "size": 9}}"#)
                .unwrap();
        assert_eq!(text.chars(), &['h', 'i']);
        assert_eq!(text.font.family, "Times");

        let obj: Fragment = serde_json::from_str(
            r#"{"object": {"handle": 7, "kind": "Image", "width": 20, "height": 10}}"#,
        )
        .unwrap();
        let o = obj.object_ref().unwrap();
        assert_eq!(o.handle, 7);
        assert_eq!(o.vertical_align, VerticalAlign::Baseline);
        assert!(obj.chars().is_empty());
    }

    #[test]
    fn test_negative_object_size_is_zeroed() {
        let obj = InlineObject {
            handle: 1,
            kind: ObjectKind::Image,
            width: -3.0,
            height: 12.0,
            vertical_align: VerticalAlign::Baseline,
        };
        assert_eq!(obj.clamped_size(), (0.0, 12.0));
    }

    #[test]
    fn test_advance_adjustment_prefers_direction() {
        let a = GlyphAnnotation {
            x_advance_ltr: Some(10.0),
            x_advance_rtl: Some(-5.0),
            ..Default::default()
        };
        assert_eq!(a.advance_adjustment(false), Some(10.0));
        assert_eq!(a.advance_adjustment(true), Some(-5.0));
        let only_ltr = GlyphAnnotation {
            x_advance_ltr: Some(3.0),
            ..Default::default()
        };
        assert_eq!(only_ltr.advance_adjustment(true), Some(3.0));
    }
}
