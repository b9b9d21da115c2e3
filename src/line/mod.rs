//! # Line Core
//!
//! The types a line passes through on its way from fragments to draw
//! commands, plus the components that move it along:
//!
//! - [`accumulator`]: builds an open line glyph by glyph.
//! - [`breaker`]: chooses where an overflowing line is cut.
//! - [`justify`]: distributes the slack of a finished line.
//! - [`vertical`]: computes the line box.
//!
//! A line's lifecycle is encoded in its type. [`Line`] is open (accumulated
//! and cut, not yet measured vertically). [`ResolvedLine`] carries the
//! justification, visual order and line box. [`crate::paint::PaintedLine`]
//! is the emitted result. Each transition consumes the previous value.

pub mod accumulator;
pub mod breaker;
pub mod justify;
pub mod vertical;

use crate::model::{Fragment, FragmentContent, GlyphAnnotation, InlineObject, ShapingAnnotations};
use crate::style::{BorderFlags, Direction, FontState, InlineStyle, TextAlign};
use crate::text::classes::{is_justifiable_space, is_zero_width};
use crate::text::metrics::GlyphPositioning;

use self::justify::JustificationResult;
use self::vertical::{LineBox, RunPlacement};

/// One measured character on a line.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    /// The source character.
    pub ch: char,
    /// The character drawn.
    pub render: char,
    pub advance: f64,
    pub annotation: Option<GlyphAnnotation>,
    pub small_cap: bool,
    /// Inserted by the line breaker (automatic hyphen); not part of the input.
    pub synthetic: bool,
    /// Kashida elongation drawn after this glyph.
    pub kashida: f64,
    /// Natural width of one tatweel in this glyph's font, for drawing the
    /// elongation.
    pub tatweel_width: f64,
}

impl Glyph {
    pub fn new(ch: char, advance: f64) -> Self {
        Self {
            ch,
            render: ch,
            advance,
            annotation: None,
            small_cap: false,
            synthetic: false,
            kashida: 0.0,
            tatweel_width: 0.0,
        }
    }

    pub fn is_mark(&self) -> bool {
        self.annotation
            .is_some_and(|a| a.group == crate::model::GlyphGroup::Mark)
    }

    /// Receives character spacing when the line is justified.
    pub fn takes_char_spacing(&self) -> bool {
        !self.is_mark() && !is_zero_width(self.render)
    }

    /// Receives word spacing when the line is justified.
    pub fn takes_word_spacing(&self) -> bool {
        is_justifiable_space(self.ch)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunContent {
    Text(Vec<Glyph>),
    /// An atomic object and the width it occupies on this line.
    Object { object: InlineObject, width: f64 },
}

/// The part of one fragment that sits on a line.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub font: FontState,
    pub style: InlineStyle,
    pub border_flags: BorderFlags,
    pub positioning: GlyphPositioning,
    pub content: RunContent,
    /// Set by the bidi hand-off for runs drawn right to left.
    pub rtl: bool,
}

impl Run {
    pub fn text(fragment: &Fragment, positioning: GlyphPositioning) -> Self {
        Self {
            font: fragment.font.clone(),
            style: fragment.style.clone(),
            border_flags: BorderFlags {
                left: fragment.border_flags.left,
                right: false,
            },
            positioning,
            content: RunContent::Text(Vec::new()),
            rtl: false,
        }
    }

    pub fn object(fragment: &Fragment, object: InlineObject, width: f64) -> Self {
        Self {
            font: fragment.font.clone(),
            style: fragment.style.clone(),
            border_flags: fragment.border_flags,
            positioning: GlyphPositioning::Plain,
            content: RunContent::Object { object, width },
            rtl: false,
        }
    }

    pub fn glyphs(&self) -> &[Glyph] {
        match &self.content {
            RunContent::Text(glyphs) => glyphs,
            RunContent::Object { .. } => &[],
        }
    }

    pub fn glyphs_mut(&mut self) -> Option<&mut Vec<Glyph>> {
        match &mut self.content {
            RunContent::Text(glyphs) => Some(glyphs),
            RunContent::Object { .. } => None,
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self.content, RunContent::Object { .. })
    }

    /// Number of break positions in the run (glyphs, or 1 for an object).
    pub fn len(&self) -> usize {
        match &self.content {
            RunContent::Text(glyphs) => glyphs.len(),
            RunContent::Object { .. } => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn left_edge(&self) -> f64 {
        match (&self.style.border, self.border_flags.left) {
            (Some(b), true) => b.edge_width(),
            _ => 0.0,
        }
    }

    pub fn right_edge(&self) -> f64 {
        match (&self.style.border, self.border_flags.right) {
            (Some(b), true) => b.edge_width(),
            _ => 0.0,
        }
    }

    /// Content width without border edges.
    pub fn content_width(&self) -> f64 {
        match &self.content {
            RunContent::Text(glyphs) => glyphs.iter().map(|g| g.advance + g.kashida).sum(),
            RunContent::Object { width, .. } => *width,
        }
    }

    pub fn width(&self) -> f64 {
        self.left_edge() + self.content_width() + self.right_edge()
    }

    /// Turn the run back into an input fragment for the next line.
    pub fn into_fragment(self) -> Fragment {
        match self.content {
            RunContent::Object { object, .. } => Fragment {
                content: FragmentContent::Object(object),
                font: self.font,
                style: self.style,
                shaping: None,
                border_flags: self.border_flags,
            },
            RunContent::Text(glyphs) => {
                let glyphs: Vec<Glyph> = glyphs.into_iter().filter(|g| !g.synthetic).collect();
                let shaping = glyphs.iter().any(|g| g.annotation.is_some()).then(|| ShapingAnnotations {
                    glyphs: glyphs.iter().map(|g| g.annotation.unwrap_or_default()).collect(),
                });
                Fragment {
                    content: FragmentContent::Text(glyphs.iter().map(|g| g.ch).collect()),
                    font: self.font,
                    style: self.style,
                    shaping,
                    border_flags: self.border_flags,
                }
            }
        }
    }
}

/// A position between two elements of a line: before glyph `offset` of run
/// `run`. The end of the line is `run == runs.len()`, `offset == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LinePos {
    pub run: usize,
    pub offset: usize,
}

impl LinePos {
    pub fn new(run: usize, offset: usize) -> Self {
        Self { run, offset }
    }
}

/// What happens to the character at a break position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutPolicy {
    /// The character at the position is dropped (a space or zero-width break).
    Discard,
    /// Everything from the position onward moves to the next line.
    Cut,
    /// Like `Cut`, with a hyphen added at the end of this line.
    Hyphen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakCandidate {
    pub pos: LinePos,
    pub policy: CutPolicy,
}

/// The break finder's answer for an overflowing character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakDecision {
    /// Keep the character on this line anyway (CJK "oikomi").
    KeepOnLine,
    Break(BreakCandidate),
}

/// Per-line settings handed to the accumulator.
#[derive(Debug, Clone, Copy)]
pub struct LineSetup {
    pub available_width: f64,
    pub alignment: TextAlign,
    pub direction: Direction,
    pub is_first_line: bool,
    /// Start-side indent already subtracted from `available_width`.
    pub indent: f64,
}

/// A line that has been accumulated and cut but not yet resolved.
#[derive(Debug, Clone)]
pub struct Line {
    /// Runs in logical order.
    pub runs: Vec<Run>,
    pub available_width: f64,
    pub consumed_width: f64,
    pub alignment: TextAlign,
    pub direction: Direction,
    pub is_first_line: bool,
    /// Ends the paragraph or a hard line break.
    pub is_last_line: bool,
    pub indent: f64,
    /// Extended past the available width by the oikomi override.
    pub squeezed: bool,
    /// How the line was ended; `None` for the end of input or a hard break.
    pub policy: Option<CutPolicy>,
}

impl Line {
    /// The line's source text (synthetic glyphs excluded, objects as U+FFFC).
    pub fn text(&self) -> String {
        self.runs
            .iter()
            .flat_map(|run| match &run.content {
                RunContent::Text(glyphs) => glyphs
                    .iter()
                    .filter(|g| !g.synthetic)
                    .map(|g| g.ch)
                    .collect::<Vec<_>>(),
                RunContent::Object { .. } => vec!['\u{FFFC}'],
            })
            .collect()
    }

    /// The text as drawn (synthetic hyphens and replaced soft hyphens included).
    pub fn rendered_text(&self) -> String {
        self.runs
            .iter()
            .flat_map(|run| run.glyphs().iter().map(|g| g.render))
            .collect()
    }

    pub fn measured_width(&self) -> f64 {
        self.runs.iter().map(Run::width).sum()
    }

    pub fn slack(&self) -> f64 {
        self.available_width - self.consumed_width
    }

    pub fn is_empty(&self) -> bool {
        self.runs.iter().all(Run::is_empty)
    }

    /// Characters and spaces that take justification spacing.
    pub fn spacing_counts(&self) -> (usize, usize) {
        spacing_counts(&self.runs)
    }
}

pub(crate) fn spacing_counts(runs: &[Run]) -> (usize, usize) {
    runs.iter()
        .flat_map(|r| r.glyphs())
        .fold((0, 0), |(chars, spaces), g| {
            (
                chars + usize::from(g.takes_char_spacing()),
                spaces + usize::from(g.takes_word_spacing()),
            )
        })
}

/// A line with its justification, visual order and line box.
#[derive(Debug, Clone)]
pub struct ResolvedLine {
    /// Runs in visual order, left to right.
    pub runs: Vec<Run>,
    /// Vertical placement of each entry of `runs`.
    pub placements: Vec<RunPlacement>,
    pub justification: JustificationResult,
    pub line_box: LineBox,
    pub available_width: f64,
    /// Width after justification and leader expansion.
    pub final_width: f64,
    pub alignment: TextAlign,
    pub direction: Direction,
    pub indent: f64,
    pub decimal: Option<DecimalAnchor>,
}

/// Decimal-tab settings for a line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecimalAnchor {
    pub position: f64,
    pub separator: char,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ObjectKind;
    use crate::style::{Color, InlineBorder, VerticalAlign};

    fn bordered_run() -> Run {
        let fragment = Fragment::text("ab", FontState::default())
            .with_style(InlineStyle {
                border: Some(InlineBorder {
                    width: 1.0,
                    color: Color::BLACK,
                    padding: 2.0,
                }),
                ..Default::default()
            })
            .with_border_flags(BorderFlags::BOTH);
        let mut run = Run::text(&fragment, GlyphPositioning::Plain);
        if let Some(glyphs) = run.glyphs_mut() {
            glyphs.push(Glyph::new('a', 5.0));
            glyphs.push(Glyph::new('b', 5.0));
        }
        run
    }

    #[test]
    fn test_run_width_counts_open_edges_only() {
        let mut run = bordered_run();
        assert_eq!(run.width(), 13.0);
        run.border_flags.right = true;
        assert_eq!(run.width(), 16.0);
    }

    #[test]
    fn test_into_fragment_drops_synthetic_glyphs() {
        let mut run = bordered_run();
        if let Some(glyphs) = run.glyphs_mut() {
            glyphs.push(Glyph {
                synthetic: true,
                ..Glyph::new('-', 3.0)
            });
        }
        let frag = run.into_fragment();
        assert_eq!(frag.chars(), &['a', 'b']);
        assert!(frag.shaping.is_none());
        assert!(frag.border_flags.left);
    }

    #[test]
    fn test_object_run_round_trips() {
        let obj = InlineObject {
            handle: 3,
            kind: ObjectKind::Marker,
            width: 4.0,
            height: 4.0,
            vertical_align: VerticalAlign::Middle,
        };
        let frag = Fragment::object(obj.clone(), FontState::default());
        let run = Run::object(&frag, obj.clone(), 4.0);
        assert_eq!(run.len(), 1);
        assert_eq!(run.into_fragment().object_ref(), Some(&obj));
    }

    #[test]
    fn test_positions_order_by_run_then_offset() {
        assert!(LinePos::new(0, 5) < LinePos::new(1, 0));
        assert!(LinePos::new(1, 1) > LinePos::new(1, 0));
    }
}
