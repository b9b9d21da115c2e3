//! # BiDi Hand-off
//!
//! Visual reordering of a finished line. The line arrives in logical order
//! with its widths already fixed; reordering only moves runs (and pieces of
//! runs) around, so the line width never changes here.
//!
//! Levels come from `unicode-bidi`. Reordering follows rule L2: every
//! maximal same-level piece of a run is a segment, segments at or above
//! each level are reversed from the highest level down to the lowest odd
//! one, and the glyphs of odd-level segments are drawn reversed.

use std::ops::Range;

use unicode_bidi::{BidiInfo, Level};

use crate::line::{Run, RunContent};
use crate::style::Direction;

/// A piece of a logical run placed in visual order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualSpan {
    /// Index of the run in logical order.
    pub run: usize,
    /// Glyph range within the run (`0..1` for an object).
    pub range: Range<usize>,
    pub rtl: bool,
}

/// Produces the visual order of a line's runs.
pub trait BidiReorder {
    fn reorder(&self, runs: &[Run], base: Direction) -> Vec<VisualSpan>;
}

/// UAX#9 reordering backed by `unicode-bidi`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnicodeBidi;

impl BidiReorder for UnicodeBidi {
    fn reorder(&self, runs: &[Run], base: Direction) -> Vec<VisualSpan> {
        let chars: Vec<char> = runs.iter().flat_map(run_chars).collect();
        if chars.is_empty() {
            return Vec::new();
        }
        if is_pure_ltr(&chars, base) {
            return runs
                .iter()
                .enumerate()
                .filter(|(_, run)| !run.is_empty())
                .map(|(i, run)| VisualSpan {
                    run: i,
                    range: 0..run.len(),
                    rtl: false,
                })
                .collect();
        }

        let levels = char_levels(&chars, base);
        let segments = segments(runs, &levels);
        reorder_segments(segments)
    }
}

/// Stand-in for lines that are never reordered.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogicalOrder;

impl BidiReorder for LogicalOrder {
    fn reorder(&self, runs: &[Run], base: Direction) -> Vec<VisualSpan> {
        let rtl = base.is_rtl();
        let mut spans: Vec<VisualSpan> = runs
            .iter()
            .enumerate()
            .filter(|(_, run)| !run.is_empty())
            .map(|(i, run)| VisualSpan {
                run: i,
                range: 0..run.len(),
                rtl,
            })
            .collect();
        if rtl {
            spans.reverse();
        }
        spans
    }
}

fn run_chars(run: &Run) -> Vec<char> {
    match &run.content {
        RunContent::Text(glyphs) => glyphs.iter().map(|g| g.ch).collect(),
        RunContent::Object { .. } => vec!['\u{FFFC}'],
    }
}

/// True when no character could be right to left and the base is LTR.
pub fn is_pure_ltr(chars: &[char], base: Direction) -> bool {
    !base.is_rtl() && !chars.iter().copied().any(is_rtl_char)
}

fn is_rtl_char(ch: char) -> bool {
    matches!(ch,
        '\u{0590}'..='\u{08FF}' |
        '\u{FB1D}'..='\u{FDFF}' |
        '\u{FE70}'..='\u{FEFF}' |
        '\u{10800}'..='\u{10FFF}' |
        '\u{1E800}'..='\u{1EEFF}' |
        '\u{200F}' | '\u{202B}' | '\u{202E}' | '\u{2067}'
    )
}

fn char_levels(chars: &[char], base: Direction) -> Vec<Level> {
    let text: String = chars.iter().collect();
    let para_level = if base.is_rtl() { Level::rtl() } else { Level::ltr() };
    let info = BidiInfo::new(&text, Some(para_level));
    text.char_indices()
        .map(|(byte, _)| info.levels.get(byte).copied().unwrap_or(para_level))
        .collect()
}

struct Segment {
    run: usize,
    range: Range<usize>,
    level: Level,
}

fn segments(runs: &[Run], levels: &[Level]) -> Vec<Segment> {
    let mut out = Vec::new();
    let mut flat = 0;
    for (i, run) in runs.iter().enumerate() {
        let len = run.len();
        let mut start = 0;
        while start < len {
            let level = levels[flat + start];
            let mut end = start + 1;
            while end < len && levels[flat + end] == level {
                end += 1;
            }
            out.push(Segment {
                run: i,
                range: start..end,
                level,
            });
            start = end;
        }
        flat += len;
    }
    out
}

fn reorder_segments(mut segments: Vec<Segment>) -> Vec<VisualSpan> {
    let max = segments.iter().map(|s| s.level).max().unwrap_or(Level::ltr());
    let min = segments.iter().map(|s| s.level).min().unwrap_or(Level::ltr());
    let lowest_odd = if min.is_rtl() { min.number() } else { 1 };

    let mut current = max.number();
    while current >= lowest_odd && current > 0 {
        let mut i = 0;
        while i < segments.len() {
            if segments[i].level.number() >= current {
                let start = i;
                while i < segments.len() && segments[i].level.number() >= current {
                    i += 1;
                }
                segments[start..i].reverse();
            } else {
                i += 1;
            }
        }
        current -= 1;
    }

    segments
        .into_iter()
        .map(|s| VisualSpan {
            run: s.run,
            range: s.range,
            rtl: s.level.is_rtl(),
        })
        .collect()
}

/// Cut the logical runs into the pieces named by `spans`, in span order.
/// Right-to-left pieces have their glyphs reversed and their border edges
/// swapped so that the fragment start sits on the right.
pub fn apply_visual_order(runs: Vec<Run>, spans: &[VisualSpan]) -> Vec<Run> {
    spans
        .iter()
        .filter_map(|span| {
            let run = runs.get(span.run)?;
            let len = run.len();
            let mut piece = run.clone();
            let starts = span.range.start == 0;
            let ends = span.range.end >= len;
            let left = run.border_flags.left && starts;
            let right = run.border_flags.right && ends;
            if let RunContent::Text(glyphs) = &mut piece.content {
                let mut slice = glyphs.get(span.range.clone())?.to_vec();
                if span.rtl {
                    slice.reverse();
                }
                *glyphs = slice;
            }
            piece.border_flags.left = if span.rtl { right } else { left };
            piece.border_flags.right = if span.rtl { left } else { right };
            piece.rtl = span.rtl;
            Some(piece)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::Glyph;
    use crate::model::Fragment;
    use crate::style::{BorderFlags, FontState};
    use crate::text::metrics::GlyphPositioning;

    fn run(text: &str) -> Run {
        let frag = Fragment::text(text, FontState::default()).with_border_flags(BorderFlags::BOTH);
        let mut run = Run::text(&frag, GlyphPositioning::Plain);
        run.border_flags = BorderFlags::BOTH;
        if let Some(glyphs) = run.glyphs_mut() {
            glyphs.extend(text.chars().map(|c| Glyph::new(c, 5.0)));
        }
        run
    }

    fn visual(runs: Vec<Run>, base: Direction) -> String {
        let spans = UnicodeBidi.reorder(&runs, base);
        apply_visual_order(runs, &spans)
            .iter()
            .flat_map(|r| r.glyphs().iter().map(|g| g.ch).collect::<Vec<_>>())
            .collect()
    }

    #[test]
    fn test_ltr_text_is_untouched() {
        let runs = vec![run("abc "), run("def")];
        let spans = UnicodeBidi.reorder(&runs, Direction::Ltr);
        assert_eq!(spans.len(), 2);
        assert!(spans.iter().all(|s| !s.rtl));
        assert_eq!(visual(runs, Direction::Ltr), "abc def");
    }

    #[test]
    fn test_hebrew_inside_ltr_is_reversed() {
        let runs = vec![run("ab \u{05D0}\u{05D1}\u{05D2} cd")];
        assert_eq!(visual(runs, Direction::Ltr), "ab \u{05D2}\u{05D1}\u{05D0} cd");
    }

    #[test]
    fn test_rtl_base_reverses_run_order() {
        let runs = vec![run("\u{05D0}\u{05D1} "), run("\u{05D2}\u{05D3}")];
        assert_eq!(visual(runs, Direction::Rtl), "\u{05D3}\u{05D2} \u{05D1}\u{05D0}");
    }

    #[test]
    fn test_latin_inside_rtl_keeps_its_order() {
        let runs = vec![run("\u{05D0} abc \u{05D1}")];
        assert_eq!(visual(runs, Direction::Rtl), "\u{05D1} abc \u{05D0}");
    }

    #[test]
    fn test_rtl_pieces_swap_border_edges() {
        let mut r = run("\u{05D0}\u{05D1}");
        r.border_flags = BorderFlags {
            left: true,
            right: false,
        };
        let runs = vec![r];
        let spans = UnicodeBidi.reorder(&runs, Direction::Rtl);
        let out = apply_visual_order(runs, &spans);
        assert_eq!(out.len(), 1);
        assert!(out[0].rtl);
        assert!(!out[0].border_flags.left);
        assert!(out[0].border_flags.right);
    }

    #[test]
    fn test_reordering_preserves_width() {
        let runs = vec![run("ab \u{05D0}\u{05D1}"), run(" cd")];
        let before: f64 = runs.iter().map(Run::width).sum();
        let spans = UnicodeBidi.reorder(&runs, Direction::Ltr);
        let after: f64 = apply_visual_order(runs, &spans).iter().map(Run::width).sum();
        assert!((before - after).abs() < 1e-9);
    }
}
