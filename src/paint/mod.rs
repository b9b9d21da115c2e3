//! # Line Painter
//!
//! Turns a resolved line into draw commands and moves the page cursor.
//!
//! Coordinates are in points with the origin at the top-left of the page
//! and y growing downward, the way the page cursor moves. Text commands
//! carry the baseline y and an explicit x for every glyph, so justification
//! and shaping offsets never have to be re-derived by the sink.
//!
//! Each run is emitted in visual order as: background, border, text (or
//! object), then decoration lines.

use serde::Serialize;

use crate::config::MetricsConfig;
use crate::line::vertical::RunPlacement;
use crate::line::{spacing_counts, Glyph, ResolvedLine, Run, RunContent};
use crate::model::{ObjectKind, PageConfig};
use crate::style::{Color, TextAlign};
use crate::text::classes::{is_zero_width, TATWEEL};

/// One primitive for the page sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum DrawCommand {
    Text {
        /// Baseline.
        y: f64,
        font_family: String,
        weight: u32,
        italic: bool,
        size: f64,
        color: Color,
        glyphs: Vec<PositionedGlyph>,
    },
    FillRect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        color: Color,
    },
    StrokeLine {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        width: f64,
        color: Color,
    },
    StrokeRect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        line_width: f64,
        color: Color,
    },
    /// Placeholder for an inline object drawn by the caller.
    PlaceObject {
        handle: u64,
        kind: ObjectKind,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedGlyph {
    pub ch: char,
    pub x: f64,
    /// Baseline of this glyph (differs from the run's for placed marks).
    pub y: f64,
    pub size: f64,
    /// Horizontal stretch; 1.0 except for small capitals.
    pub horizontal_scale: f64,
}

/// Where the next line goes.
#[derive(Debug, Clone, PartialEq)]
pub struct PageCursor {
    /// Left edge of the text column.
    pub x: f64,
    /// Top of the next line.
    pub y: f64,
    /// Top of the page area; a cursor here has placed nothing yet.
    pub top: f64,
    pub width: f64,
    /// Bottom limit of the page area.
    pub bottom: f64,
    /// Extents of everything painted so far, if anything.
    pub ink_left: Option<f64>,
    pub ink_right: Option<f64>,
}

impl PageCursor {
    pub fn new(page: &PageConfig) -> Self {
        Self {
            x: page.margin.left,
            y: page.margin.top,
            top: page.margin.top,
            width: page.content_width(),
            bottom: page.height - page.margin.bottom,
            ink_left: None,
            ink_right: None,
        }
    }

    pub fn at_top(&self) -> bool {
        self.y <= self.top + 1e-9
    }

    pub fn remaining_height(&self) -> f64 {
        (self.bottom - self.y).max(0.0)
    }

    fn record_ink(&mut self, left: f64, right: f64) {
        self.ink_left = Some(self.ink_left.map_or(left, |l| l.min(left)));
        self.ink_right = Some(self.ink_right.map_or(right, |r| r.max(right)));
    }
}

/// Asked before a line is committed to the page.
pub trait PageArea {
    fn would_overflow(&self, cursor: &PageCursor, stack_height: f64) -> bool;
}

/// A fixed-height page. A line always fits on an empty page.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedPage;

impl PageArea for FixedPage {
    fn would_overflow(&self, cursor: &PageCursor, stack_height: f64) -> bool {
        !cursor.at_top() && cursor.y + stack_height > cursor.bottom + 1e-9
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaintedLine {
    pub commands: Vec<DrawCommand>,
    /// Top of the line on the page.
    pub top: f64,
    pub baseline: f64,
    pub stack_height: f64,
    pub ink_left: f64,
    pub ink_right: f64,
}

#[derive(Debug)]
pub enum PaintOutcome {
    Painted(PaintedLine),
    /// The line did not fit; it is handed back untouched for the next page.
    PageBreak(ResolvedLine),
}

/// Spacing bookkeeping across the runs of one line.
struct Spacing {
    char_spacing: f64,
    word_spacing: f64,
    /// Spacing slots left on the line, including the current glyph.
    slots_left: usize,
    single: bool,
}

impl Spacing {
    fn after(&mut self, glyph: &Glyph) -> f64 {
        let mut extra = 0.0;
        if glyph.takes_char_spacing() {
            self.slots_left = self.slots_left.saturating_sub(1);
            if self.slots_left > 0 || self.single {
                extra += self.char_spacing;
            }
        }
        if glyph.takes_word_spacing() {
            extra += self.word_spacing;
        }
        extra
    }
}

pub struct LinePainter<'a> {
    config: &'a MetricsConfig,
}

impl<'a> LinePainter<'a> {
    pub fn new(config: &'a MetricsConfig) -> Self {
        Self { config }
    }

    pub fn paint(&self, line: ResolvedLine, cursor: &mut PageCursor, area: &dyn PageArea) -> PaintOutcome {
        let stack_height = line.line_box.stack_height;
        if area.would_overflow(cursor, stack_height) {
            log::debug!("Line of height {:.2} does not fit, requesting page break", stack_height);
            return PaintOutcome::PageBreak(line);
        }

        let top = cursor.y;
        let start = if line.direction.is_rtl() { 0.0 } else { line.indent };
        let left = cursor.x + start + alignment_offset(&line);

        let (chars, _) = spacing_counts(&line.runs);
        let mut spacing = Spacing {
            char_spacing: line.justification.char_spacing,
            word_spacing: line.justification.word_spacing,
            slots_left: chars,
            single: chars == 1,
        };

        let mut commands = Vec::new();
        let mut x = left;
        for (run, placement) in line.runs.iter().zip(&line.placements) {
            x += self.paint_run(run, placement, x, top, &mut spacing, &mut commands);
        }

        let right = x;
        cursor.record_ink(left, right);
        cursor.y += stack_height;
        PaintOutcome::Painted(PaintedLine {
            commands,
            top,
            baseline: top + line.line_box.glyph_baseline_origin,
            stack_height,
            ink_left: left,
            ink_right: right,
        })
    }

    /// Emit one run starting at `x`; returns the width it took.
    fn paint_run(
        &self,
        run: &Run,
        placement: &RunPlacement,
        x: f64,
        line_top: f64,
        spacing: &mut Spacing,
        out: &mut Vec<DrawCommand>,
    ) -> f64 {
        let baseline = line_top + placement.baseline;
        let content_x = x + run.left_edge();

        let mut glyphs = Vec::new();
        let mut width = 0.0;
        match &run.content {
            RunContent::Text(items) => {
                for glyph in items {
                    let pen = content_x + width;
                    if run.rtl && glyph.kashida > 0.0 {
                        kashida_glyphs(pen, baseline, run.font.size, glyph, &mut glyphs);
                        width += glyph.kashida;
                    }
                    if let Some(g) = self.position(glyph, run, content_x + width, baseline) {
                        glyphs.push(g);
                    }
                    width += glyph.advance;
                    if !run.rtl && glyph.kashida > 0.0 {
                        kashida_glyphs(content_x + width, baseline, run.font.size, glyph, &mut glyphs);
                        width += glyph.kashida;
                    }
                    width += spacing.after(glyph);
                }
            }
            RunContent::Object { width: w, .. } => width = *w,
        }

        let total = run.left_edge() + width + run.right_edge();
        let (box_top, box_bottom) = match &run.content {
            RunContent::Text(_) => (
                baseline - placement.font.ascent,
                baseline - placement.font.descent,
            ),
            RunContent::Object { .. } => (line_top + placement.top, line_top + placement.bottom),
        };

        if let Some(color) = run.style.background {
            out.push(DrawCommand::FillRect {
                x,
                y: box_top,
                width: total,
                height: box_bottom - box_top,
                color,
            });
        }
        if let Some(border) = run.style.border.filter(|b| b.width > 0.0) {
            border_lines(run, &border, x, total, box_top, box_bottom, out);
        }

        match &run.content {
            RunContent::Text(_) if !glyphs.is_empty() => out.push(DrawCommand::Text {
                y: baseline,
                font_family: run.font.family.clone(),
                weight: run.font.weight,
                italic: run.font.is_italic(),
                size: run.font.size,
                color: run.font.color,
                glyphs,
            }),
            RunContent::Object { object, .. } if object.kind == ObjectKind::DotTab => {
                let mut dots = Vec::new();
                leader_dots(content_x, baseline, width, run.font.size, &mut dots);
                if !dots.is_empty() {
                    out.push(DrawCommand::Text {
                        y: baseline,
                        font_family: run.font.family.clone(),
                        weight: run.font.weight,
                        italic: run.font.is_italic(),
                        size: run.font.size,
                        color: run.font.color,
                        glyphs: dots,
                    });
                }
            }
            RunContent::Object { object, .. } => out.push(DrawCommand::PlaceObject {
                handle: object.handle,
                kind: object.kind,
                x: content_x,
                y: line_top + placement.top,
                width,
                height: placement.bottom - placement.top,
            }),
            RunContent::Text(_) => {}
        }

        if !run.is_object() && width > 0.0 {
            decorations(run, placement, content_x, width, baseline, out);
        }
        total
    }

    fn position(&self, glyph: &Glyph, run: &Run, pen: f64, baseline: f64) -> Option<PositionedGlyph> {
        if is_zero_width(glyph.render) {
            return None;
        }
        let size = run.font.size;
        let (dx, dy) = glyph
            .annotation
            .map(|a| (a.x_placement as f64 * size / 1000.0, a.y_placement as f64 * size / 1000.0))
            .unwrap_or((0.0, 0.0));
        let (size, horizontal_scale) = if glyph.small_cap {
            (size * self.config.small_caps_scale, self.config.small_caps_stretch)
        } else {
            (size, 1.0)
        };
        Some(PositionedGlyph {
            ch: glyph.render,
            x: pen + dx,
            y: baseline - dy,
            size,
            horizontal_scale,
        })
    }
}

/// Horizontal offset of the line inside the available width.
fn alignment_offset(line: &ResolvedLine) -> f64 {
    let slack = (line.available_width - line.final_width).max(0.0);
    match line.alignment {
        TextAlign::Left => 0.0,
        TextAlign::Right => slack,
        TextAlign::Center => slack / 2.0,
        TextAlign::Justify if line.direction.is_rtl() => slack,
        TextAlign::Justify => 0.0,
        TextAlign::DecimalAlign => match line.decimal {
            Some(anchor) => {
                let before = line.runs.first().map_or(0.0, |run| width_to_separator(run, anchor.separator));
                (anchor.position - before).clamp(0.0, slack)
            }
            None => 0.0,
        },
    }
}

/// Width of `run` up to its first `separator`, or all of it without one.
fn width_to_separator(run: &Run, separator: char) -> f64 {
    let glyphs = run.glyphs();
    match glyphs.iter().position(|g| g.ch == separator) {
        Some(i) => run.left_edge() + glyphs[..i].iter().map(|g| g.advance + g.kashida).sum::<f64>(),
        None => run.width(),
    }
}

/// Cover the elongation of `glyph` with tatweels, starting at `x`.
///
/// Whole tatweels are laid end to end and stretched evenly so the last one
/// ends exactly at `x + glyph.kashida`.
fn kashida_glyphs(x: f64, baseline: f64, size: f64, glyph: &Glyph, out: &mut Vec<PositionedGlyph>) {
    let amount = glyph.kashida;
    let unit = glyph.tatweel_width;
    if unit <= 0.0 {
        out.push(PositionedGlyph {
            ch: TATWEEL,
            x,
            y: baseline,
            size,
            horizontal_scale: 1.0,
        });
        return;
    }
    let count = (amount / unit - 1e-9).ceil().max(1.0);
    let pitch = amount / count;
    for i in 0..count as usize {
        out.push(PositionedGlyph {
            ch: TATWEEL,
            x: x + pitch * i as f64,
            y: baseline,
            size,
            horizontal_scale: pitch / unit,
        });
    }
}

fn leader_dots(x: f64, baseline: f64, width: f64, size: f64, out: &mut Vec<PositionedGlyph>) {
    let pitch = size * 0.5;
    if pitch <= 0.0 {
        return;
    }
    let count = (width / pitch).floor() as usize;
    // Right-align the dots so leaders of stacked lines line up.
    let start = x + width - count as f64 * pitch;
    out.extend((0..count).map(|i| PositionedGlyph {
        ch: '.',
        x: start + i as f64 * pitch,
        y: baseline,
        size,
        horizontal_scale: 1.0,
    }));
}

fn border_lines(
    run: &Run,
    border: &crate::style::InlineBorder,
    x: f64,
    width: f64,
    top: f64,
    bottom: f64,
    out: &mut Vec<DrawCommand>,
) {
    let half = border.width / 2.0;
    let (x1, x2) = (x + half, x + width - half);
    let (y1, y2) = (top - half, bottom + half);
    if run.border_flags.left && run.border_flags.right {
        out.push(DrawCommand::StrokeRect {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
            line_width: border.width,
            color: border.color,
        });
        return;
    }
    let mut line = |ax: f64, ay: f64, bx: f64, by: f64| {
        out.push(DrawCommand::StrokeLine {
            x1: ax,
            y1: ay,
            x2: bx,
            y2: by,
            width: border.width,
            color: border.color,
        })
    };
    line(x, y1, x + width, y1);
    line(x, y2, x + width, y2);
    if run.border_flags.left {
        line(x1, y1, x1, y2);
    }
    if run.border_flags.right {
        line(x2, y1, x2, y2);
    }
}

fn decorations(run: &Run, placement: &RunPlacement, x: f64, width: f64, baseline: f64, out: &mut Vec<DrawCommand>) {
    let decoration = run.style.decoration;
    if decoration.is_none() {
        return;
    }
    let color = run.style.decoration_color.unwrap_or(run.font.color);
    let font = &placement.font;
    let mut stroke = |offset: f64, thickness: f64| {
        let y = baseline - offset;
        out.push(DrawCommand::StrokeLine {
            x1: x,
            y1: y,
            x2: x + width,
            y2: y,
            width: thickness,
            color,
        });
    };
    if decoration.underline {
        stroke(font.underline.0, font.underline.1);
    }
    if decoration.line_through {
        stroke(font.strikeout.0, font.strikeout.1);
    }
    if decoration.overline {
        stroke(font.ascent, font.underline.1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::justify::JustificationResult;
    use crate::line::vertical::{FontExtent, LineBox};
    use crate::line::DecimalAnchor;
    use crate::model::{Edges, Fragment, InlineObject};
    use crate::style::{Direction, FontState, InlineStyle, TextDecoration, VerticalAlign};
    use crate::text::metrics::GlyphPositioning;

    const EPS: f64 = 1e-9;

    fn extent() -> FontExtent {
        FontExtent {
            ascent: 8.0,
            descent: -2.0,
            x_height: 5.0,
            underline: (-1.0, 0.5),
            strikeout: (2.5, 0.5),
        }
    }

    fn placement() -> RunPlacement {
        RunPlacement {
            top: 1.0,
            bottom: 11.0,
            baseline: 9.0,
            font: extent(),
        }
    }

    fn text_run(text: &str, advance: f64, style: InlineStyle) -> Run {
        let frag = Fragment::text(text, FontState::new("Helvetica", 10.0)).with_style(style);
        let mut run = Run::text(&frag, GlyphPositioning::Plain);
        if let Some(g) = run.glyphs_mut() {
            g.extend(text.chars().map(|c| Glyph::new(c, advance)));
        }
        run
    }

    fn resolved(runs: Vec<Run>, align: TextAlign, justification: JustificationResult) -> ResolvedLine {
        let natural: f64 = runs.iter().map(Run::width).sum();
        let (chars, spaces) = spacing_counts(&runs);
        let final_width = natural + justification.added_width(chars, spaces);
        let placements = runs.iter().map(|_| placement()).collect();
        ResolvedLine {
            runs,
            placements,
            justification,
            line_box: LineBox {
                box_top: 9.0,
                box_bottom: -3.0,
                glyph_baseline_origin: 9.0,
                stack_height: 12.0,
            },
            available_width: 100.0,
            final_width,
            alignment: align,
            direction: Direction::Ltr,
            indent: 0.0,
            decimal: None,
        }
    }

    fn page() -> PageConfig {
        PageConfig {
            width: 200.0,
            height: 100.0,
            margin: Edges::uniform(10.0),
        }
    }

    fn painted(line: ResolvedLine, cursor: &mut PageCursor) -> PaintedLine {
        let config = MetricsConfig::default();
        match LinePainter::new(&config).paint(line, cursor, &FixedPage) {
            PaintOutcome::Painted(p) => p,
            PaintOutcome::PageBreak(_) => panic!("unexpected page break"),
        }
    }

    fn glyph_xs(p: &PaintedLine) -> Vec<f64> {
        p.commands
            .iter()
            .flat_map(|c| match c {
                DrawCommand::Text { glyphs, .. } => glyphs.iter().map(|g| g.x).collect(),
                _ => Vec::new(),
            })
            .collect()
    }

    #[test]
    fn test_kashida_is_covered_by_stretched_tatweels() {
        let mut cursor = PageCursor::new(&page());
        let mut run = text_run("\u{0628}\u{0628}", 5.0, InlineStyle::default());
        if let Some(g) = run.glyphs_mut() {
            g[0].kashida = 30.0;
            g[0].tatweel_width = 4.0;
        }
        let p = painted(resolved(vec![run], TextAlign::Left, Default::default()), &mut cursor);

        let glyphs: Vec<&PositionedGlyph> = p
            .commands
            .iter()
            .flat_map(|c| match c {
                DrawCommand::Text { glyphs, .. } => glyphs.iter().collect(),
                _ => Vec::new(),
            })
            .collect();
        let tatweels: Vec<_> = glyphs.iter().filter(|g| g.ch == TATWEEL).collect();
        // 30pt of elongation needs eight 4pt tatweels, squeezed to 3.75pt each.
        assert_eq!(tatweels.len(), 8);
        assert!(tatweels.iter().all(|g| (g.horizontal_scale - 0.9375).abs() < EPS));
        assert!((tatweels[0].x - 15.0).abs() < EPS);
        assert!((tatweels[7].x + 3.75 - 45.0).abs() < EPS);
        let last = glyphs.last().map(|g| (g.ch, g.x));
        assert!(matches!(last, Some(('\u{0628}', x)) if (x - 45.0).abs() < EPS));
    }

    #[test]
    fn test_alignment_offsets() {
        let mut cursor = PageCursor::new(&page());
        let run = || vec![text_run("ab", 10.0, InlineStyle::default())];
        let left = painted(resolved(run(), TextAlign::Left, Default::default()), &mut cursor);
        let right = painted(resolved(run(), TextAlign::Right, Default::default()), &mut cursor);
        let center = painted(resolved(run(), TextAlign::Center, Default::default()), &mut cursor);
        assert!((left.ink_left - 10.0).abs() < EPS);
        assert!((right.ink_left - 90.0).abs() < EPS);
        assert!((center.ink_left - 50.0).abs() < EPS);
        assert!((cursor.y - 46.0).abs() < EPS);
    }

    #[test]
    fn test_justified_line_fills_the_width() {
        let mut cursor = PageCursor::new(&page());
        // 5 glyphs of 10pt, 1 space: slack 50.
        let justification = JustificationResult {
            char_spacing: 5.0,
            word_spacing: 30.0,
            ..Default::default()
        };
        let line = resolved(
            vec![text_run("ab cd", 10.0, InlineStyle::default())],
            TextAlign::Justify,
            justification,
        );
        assert!((line.final_width - 100.0).abs() < EPS);
        let p = painted(line, &mut cursor);
        assert!((p.ink_right - p.ink_left - 100.0).abs() < EPS);
        assert_eq!(glyph_xs(&p), vec![10.0, 25.0, 40.0, 85.0, 100.0]);
    }

    #[test]
    fn test_decimal_alignment_uses_the_separator() {
        let mut cursor = PageCursor::new(&page());
        let mut line = resolved(
            vec![text_run("12.5", 5.0, InlineStyle::default())],
            TextAlign::DecimalAlign,
            Default::default(),
        );
        line.decimal = Some(DecimalAnchor {
            position: 50.0,
            separator: '.',
        });
        let p = painted(line, &mut cursor);
        assert!((p.ink_left - (10.0 + 40.0)).abs() < EPS);
    }

    #[test]
    fn test_decorations_follow_the_run() {
        let mut cursor = PageCursor::new(&page());
        let style = InlineStyle {
            decoration: TextDecoration {
                underline: true,
                line_through: true,
                overline: false,
            },
            background: Some(Color::WHITE),
            ..Default::default()
        };
        let p = painted(
            resolved(vec![text_run("ab", 10.0, style)], TextAlign::Left, Default::default()),
            &mut cursor,
        );
        let ys: Vec<f64> = p
            .commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::StrokeLine { y1, .. } => Some(*y1),
                _ => None,
            })
            .collect();
        // Baseline at 10 + 9.
        assert_eq!(ys, vec![20.0, 16.5]);
        assert!(matches!(p.commands[0], DrawCommand::FillRect { y, height, .. } if (y - 11.0).abs() < EPS && (height - 10.0).abs() < EPS));
    }

    #[test]
    fn test_page_break_is_requested_but_not_on_an_empty_page() {
        let config = MetricsConfig::default();
        let painter = LinePainter::new(&config);
        let mut cursor = PageCursor::new(&page());
        let mut tall = resolved(vec![text_run("a", 10.0, InlineStyle::default())], TextAlign::Left, Default::default());
        tall.line_box.stack_height = 500.0;
        assert!(matches!(painter.paint(tall.clone(), &mut cursor, &FixedPage), PaintOutcome::Painted(_)));
        assert!(matches!(painter.paint(tall, &mut cursor, &FixedPage), PaintOutcome::PageBreak(_)));
    }

    #[test]
    fn test_objects_and_leaders() {
        let obj = InlineObject {
            handle: 9,
            kind: ObjectKind::Image,
            width: 20.0,
            height: 10.0,
            vertical_align: VerticalAlign::Baseline,
        };
        let frag = Fragment::object(obj.clone(), FontState::default());
        let image = Run::object(&frag, obj.clone(), 20.0);
        let leader_obj = InlineObject {
            kind: ObjectKind::DotTab,
            ..obj
        };
        let leader = Run::object(&frag, leader_obj, 30.0);
        let mut cursor = PageCursor::new(&page());
        let p = painted(resolved(vec![image, leader], TextAlign::Left, Default::default()), &mut cursor);
        assert!(matches!(p.commands[0], DrawCommand::PlaceObject { handle: 9, x, .. } if (x - 10.0).abs() < EPS));
        match &p.commands[1] {
            DrawCommand::Text { glyphs, .. } => {
                assert_eq!(glyphs.len(), 5);
                assert!(glyphs.iter().all(|g| g.ch == '.'));
            }
            other => panic!("expected leader dots, got {:?}", other),
        }
    }
}
