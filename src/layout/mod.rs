//! # Paragraph Layout
//!
//! Drives the line core over a paragraph and flows the result into pages.
//!
//! The paragraph's fragments sit in a queue. Each line gets a fresh
//! [`LineAccumulator`]; characters are measured and appended until one does
//! not fit, the [`BreakFinder`] picks the cut, and whatever did not make it
//! onto the line goes back to the front of the queue for the next one. A
//! finished [`Line`] is then resolved (justification, visual order, line
//! box) and handed to the [`LinePainter`].
//!
//! Pagination is fixed-size pages with one column, and
//! lines never split. A line that does not fit moves to the next page,
//! unless the page is empty.

use std::collections::VecDeque;

use serde::Serialize;

use crate::config::LayoutConfig;
use crate::error::FlowError;
use crate::font::{FontContext, ResolvedFont, UsedFont, UsedGlyphs};
use crate::line::accumulator::{AppendOutcome, LineAccumulator, ObjectOutcome};
use crate::line::breaker::BreakFinder;
use crate::line::justify::{
    spacing_gaps, JustificationResult, JustificationSolver, JustifyParams, KashidaInput,
    KashidaOpportunity,
};
use crate::line::vertical::{RunExtent, VerticalMetricsResolver};
use crate::line::{
    BreakCandidate, BreakDecision, CutPolicy, DecimalAnchor, Glyph, Line, LineSetup, ResolvedLine,
    Run, RunContent,
};
use crate::model::{BlockStyle, Document, Fragment, FragmentContent, ObjectKind, Paragraph};
use crate::paint::{DrawCommand, FixedPage, LinePainter, PageCursor, PaintOutcome};
use crate::style::{Direction, FontState, Hyphens, TextAlign};
use crate::text::bidi::{apply_visual_order, is_pure_ltr, BidiReorder, UnicodeBidi};
use crate::text::classes::{is_arabic, is_mandatory_break, TATWEEL};
use crate::text::hyphenate::{DictionaryHyphenator, Hyphenator, NoHyphenation};
use crate::text::metrics::{GlyphMetrics, GlyphPositioning};
use crate::text::shaping::shape_annotations;

/// How a line came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineEnd {
    /// The fragment queue ran dry.
    Input,
    /// A mandatory break character.
    HardBreak,
    /// The break finder cut it.
    Cut,
}

/// Lays out paragraphs with one font context and configuration.
///
/// The used-glyph set accumulates across every paragraph laid out with
/// the same typesetter.
pub struct Typesetter<'a> {
    fonts: &'a FontContext,
    config: &'a LayoutConfig,
    hyphenator: &'a dyn Hyphenator,
    bidi: &'a dyn BidiReorder,
    used: UsedGlyphs,
}

impl<'a> Typesetter<'a> {
    pub fn new(
        fonts: &'a FontContext,
        config: &'a LayoutConfig,
        hyphenator: &'a dyn Hyphenator,
        bidi: &'a dyn BidiReorder,
    ) -> Self {
        Self {
            fonts,
            config,
            hyphenator,
            bidi,
            used: UsedGlyphs::new(),
        }
    }

    pub fn used_glyphs(&self) -> &UsedGlyphs {
        &self.used
    }

    pub fn into_used_glyphs(self) -> UsedGlyphs {
        self.used
    }

    fn resolve_font(&self, state: &FontState) -> Result<ResolvedFont<'a>, FlowError> {
        let fonts: &'a FontContext = self.fonts;
        fonts.resolve(state, &self.config.metrics.fallback_family)
    }

    /// Break and resolve every line of `paragraph` at `width`.
    pub fn layout_paragraph(&mut self, paragraph: &Paragraph, width: f64) -> Result<Vec<ResolvedLine>, FlowError> {
        self.break_lines(paragraph, width)?
            .into_iter()
            .map(|line| self.resolve(line, &paragraph.block))
            .collect()
    }

    /// Break `paragraph` into lines of at most `width` (the first line is
    /// shortened by the block's text indent).
    pub fn break_lines(&mut self, paragraph: &Paragraph, width: f64) -> Result<Vec<Line>, FlowError> {
        let block = &paragraph.block;
        let config: &'a LayoutConfig = self.config;
        let hyphenator: &'a dyn Hyphenator = self.hyphenator;
        let finder = BreakFinder::new(&config.breaking, hyphenator);
        let mut queue: VecDeque<Fragment> = paragraph.fragments.iter().cloned().collect();
        let mut lines = Vec::new();

        while !queue.is_empty() {
            let setup = line_setup(block, width, lines.is_empty());
            let (mut line, end) = self.next_line(setup, &mut queue, &finder)?;
            if queue.is_empty() {
                line.is_last_line = true;
            }
            match end {
                LineEnd::Input if line.is_empty() => {}
                _ => lines.push(line),
            }
        }
        Ok(lines)
    }

    fn next_line(
        &mut self,
        setup: LineSetup,
        queue: &mut VecDeque<Fragment>,
        finder: &BreakFinder<'_>,
    ) -> Result<(Line, LineEnd), FlowError> {
        let config: &'a LayoutConfig = self.config;
        let mut acc = LineAccumulator::new(setup);

        while let Some(mut fragment) = queue.pop_front() {
            let object = match &fragment.content {
                FragmentContent::Object(object) => Some(object.clone()),
                FragmentContent::Text(chars) if chars.is_empty() => continue,
                FragmentContent::Text(_) => None,
            };
            if let Some(object) = object {
                match acc.try_append_object(&fragment, &object) {
                    ObjectOutcome::Fitted => continue,
                    ObjectOutcome::Trailing => return Ok(self.cut_at_end(acc, queue)),
                    ObjectOutcome::Overflow => {
                        queue.push_front(fragment);
                        return Ok(self.cut_at_end(acc, queue));
                    }
                }
            }

            let font = self.resolve_font(&fragment.font)?;
            self.auto_shape(&mut fragment, &font);
            let chars = fragment.chars().to_vec();
            let rtl = !is_pure_ltr(&chars, Direction::Ltr);
            let positioning = GlyphPositioning::select(&fragment.font, font.metrics, fragment.shaping.is_some());
            let state = fragment.font.clone();
            let style = fragment.style.clone();
            let metrics = GlyphMetrics::new(font, &state, &style, &config.metrics, positioning).with_rtl(rtl);

            acc.begin_fragment(&fragment, positioning);
            let n = chars.len();
            for (i, &ch) in chars.iter().enumerate() {
                if is_mandatory_break(ch) {
                    let rest = fragment.split_off(i).skip_first();
                    if !rest.is_empty_text() {
                        queue.push_front(rest);
                    }
                    return Ok((acc.finish(true), LineEnd::HardBreak));
                }

                let annotation = fragment.annotation(i).copied();
                let measured = metrics.measure(acc.prev_char(), ch, annotation.as_ref(), &mut self.used);
                let glyph = Glyph {
                    ch,
                    render: measured.render,
                    advance: measured.advance,
                    annotation,
                    small_cap: measured.small_cap,
                    synthetic: false,
                    kashida: 0.0,
                    tatweel_width: 0.0,
                };
                let closes = i + 1 == n;
                let AppendOutcome::Overflow(glyph) = acc.try_append_glyph(glyph, closes) else {
                    continue;
                };

                let hyphen_width = |run: &Run| self.hyphen_glyph(run).advance;
                match finder.find_break(&acc, ch, &chars[i + 1..], &hyphen_width) {
                    BreakDecision::KeepOnLine => acc.keep_on_line(glyph, closes),
                    BreakDecision::Break(candidate) => {
                        let mut rest = fragment.split_off(i);
                        let cut = acc.cut(candidate, |run| self.hyphen_glyph(run));
                        if cut.consumed_failing {
                            rest = rest.skip_first();
                        }
                        if !rest.is_empty_text() {
                            queue.push_front(rest);
                        }
                        for carried in cut.carry.into_iter().rev() {
                            queue.push_front(carried);
                        }
                        return Ok((cut.line, LineEnd::Cut));
                    }
                }
            }
        }

        Ok((acc.finish(true), LineEnd::Input))
    }

    /// End the line after its last element, carrying nothing.
    fn cut_at_end(&self, acc: LineAccumulator, queue: &mut VecDeque<Fragment>) -> (Line, LineEnd) {
        let end = acc.end();
        let cut = acc.cut(
            BreakCandidate {
                pos: end,
                policy: CutPolicy::Cut,
            },
            |run| self.hyphen_glyph(run),
        );
        for carried in cut.carry.into_iter().rev() {
            queue.push_front(carried);
        }
        (cut.line, LineEnd::Cut)
    }

    /// A visible hyphen in the font of `run`.
    fn hyphen_glyph(&self, run: &Run) -> Glyph {
        let advance = match self.resolve_font(&run.font) {
            Ok(font) => GlyphMetrics::new(font, &run.font, &run.style, &self.config.metrics, GlyphPositioning::Plain)
                .hyphen_width(),
            Err(_) => 0.0,
        };
        Glyph::new('-', advance)
    }

    /// Shape Arabic text in embedded fonts when the caller supplied no
    /// annotations.
    fn auto_shape(&self, fragment: &mut Fragment, font: &ResolvedFont<'_>) {
        if fragment.shaping.is_some() {
            return;
        }
        let Some(data) = font.data else {
            return;
        };
        let chars = fragment.chars();
        if !chars.iter().copied().any(is_arabic) {
            return;
        }
        if let Some(shaping) = shape_annotations(chars, data, font.metrics, true) {
            fragment.shaping = Some(shaping);
        }
    }

    /// Justify, reorder and measure a finished line.
    pub fn resolve(&mut self, line: Line, block: &BlockStyle) -> Result<ResolvedLine, FlowError> {
        let settings: &'a LayoutConfig = self.config;
        let config = &settings.justify;
        let justify = line.alignment == TextAlign::Justify && (!line.is_last_line || config.justify_last_line);
        let (chars, spaces) = line.spacing_counts();
        let slack = line.slack();
        let mut runs = line.runs;

        let core_fonts = runs
            .iter()
            .all(|r| self.resolve_font(&r.font).is_ok_and(|f| f.metrics.is_core));
        let (max_char, max_word) = if line.is_last_line {
            (config.max_char_spacing_last, config.max_word_spacing_last)
        } else {
            (config.max_char_spacing, config.max_word_spacing)
        };
        let solver = JustificationSolver::new(JustifyParams {
            mode: config.spacing_mode,
            word_share: config.word_share,
            max_char_spacing: max_char,
            max_word_spacing: max_word,
            fixed_spacing: block.fixed_spacing,
            core_fonts,
            kashida_share: config.kashida_share,
            min_kashida_ratio: config.min_kashida_ratio,
        });

        let justification = if line.squeezed && !settings.breaking.allow_cjk_overflow {
            solver.solve(slack, chars, spaces, None)
        } else if justify && slack > 0.0 {
            let (input, slots) = self.kashida_input(&runs);
            let result = solver.solve(slack, chars, spaces, input.as_ref());
            self.apply_kashida(&mut runs, &slots, &result);
            result
        } else {
            JustificationResult {
                shortfall: slack,
                ..Default::default()
            }
        };

        if !justify && slack > 0.0 {
            expand_leader(&mut runs, slack);
        }

        for run in &runs {
            self.record_substitutes(run)?;
        }

        let natural: f64 = runs.iter().map(Run::width).sum();
        let final_width = natural
            + justification.char_spacing * spacing_gaps(chars)
            + justification.word_spacing * spaces as f64;

        let spans = self.bidi.reorder(&runs, line.direction);
        let mut runs = apply_visual_order(runs, &spans);

        let resolver = VerticalMetricsResolver::new(&settings.metrics);
        let block_font = self.resolve_font(&block.font)?;
        let strut = resolver.strut(block_font.metrics, &block.font, block.line_height);
        let mut extents: Vec<RunExtent> = Vec::with_capacity(runs.len());
        for run in &mut runs {
            let font = self.resolve_font(&run.font)?;
            extents.push(resolver.run_extent(run, font.metrics, &strut));
            // Runs leave here naming the face actually used.
            run.font.family = font.key.family.clone();
            run.font.weight = font.key.weight;
        }
        let (line_box, placements) = resolver.resolve(&strut, &extents, block.line_stacking);

        Ok(ResolvedLine {
            runs,
            placements,
            justification,
            line_box,
            available_width: line.available_width,
            final_width,
            alignment: line.alignment,
            direction: line.direction,
            indent: line.indent,
            decimal: (line.alignment == TextAlign::DecimalAlign).then_some(DecimalAnchor {
                position: block.decimal_anchor,
                separator: block.decimal_char,
            }),
        })
    }

    /// Kashida opportunities of the line, with the (run, glyph) each one
    /// belongs to.
    fn kashida_input(&self, runs: &[Run]) -> (Option<KashidaInput>, Vec<(usize, usize)>) {
        let mut opportunities = Vec::new();
        let mut slots = Vec::new();
        let mut tatweel_width = None;
        let mut word = 0;
        for (ri, run) in runs.iter().enumerate() {
            let Ok(font) = self.resolve_font(&run.font) else {
                continue;
            };
            let usable = font.metrics.supports_kashida();
            for (gi, glyph) in run.glyphs().iter().enumerate() {
                if glyph.takes_word_spacing() {
                    word += 1;
                    continue;
                }
                let priority = glyph.annotation.map_or(0, |a| a.kashida);
                if usable && priority > 0 {
                    opportunities.push(KashidaOpportunity { word, priority });
                    slots.push((ri, gi));
                    if tatweel_width.is_none() {
                        tatweel_width = font.metrics.advance_em(TATWEEL).map(|w| w * run.font.size);
                    }
                }
            }
        }
        let input = match tatweel_width {
            Some(width) if width > 0.0 && !opportunities.is_empty() => Some(KashidaInput {
                opportunities,
                tatweel_width: width,
            }),
            _ => None,
        };
        if input.is_none() {
            slots.clear();
        }
        (input, slots)
    }

    fn apply_kashida(&mut self, runs: &mut [Run], slots: &[(usize, usize)], result: &JustificationResult) {
        for (&(ri, gi), &amount) in slots.iter().zip(&result.kashida) {
            if amount <= 0.0 {
                continue;
            }
            let Some(run) = runs.get_mut(ri) else {
                continue;
            };
            let mut tatweel_width = 0.0;
            if let Ok(font) = self.resolve_font(&run.font) {
                self.used.record(font.key, TATWEEL);
                tatweel_width = font.metrics.advance_em(TATWEEL).map_or(0.0, |w| w * run.font.size);
            }
            if let Some(glyph) = run.glyphs_mut().and_then(|g| g.get_mut(gi)) {
                glyph.kashida = amount;
                glyph.tatweel_width = tatweel_width;
            }
        }
    }

    /// Glyphs drawn in place of their source character (hyphens added at a
    /// break) still need to be in the used set.
    fn record_substitutes(&mut self, run: &Run) -> Result<(), FlowError> {
        let substitutes: Vec<char> = run
            .glyphs()
            .iter()
            .filter(|g| g.synthetic || (g.render != g.ch && !g.small_cap))
            .map(|g| g.render)
            .collect();
        if substitutes.is_empty() {
            return Ok(());
        }
        let font = self.resolve_font(&run.font)?;
        for ch in substitutes {
            self.used.record(font.key, ch);
        }
        Ok(())
    }
}

fn line_setup(block: &BlockStyle, width: f64, first: bool) -> LineSetup {
    let indent = if first { block.text_indent.max(0.0) } else { 0.0 };
    LineSetup {
        available_width: (width - indent).max(0.0),
        alignment: block.align,
        direction: block.direction,
        is_first_line: first,
        indent,
    }
}

/// Give the slack of a non-justified line to its first dot leader.
fn expand_leader(runs: &mut [Run], slack: f64) {
    let leader = runs.iter_mut().find_map(|run| match &mut run.content {
        RunContent::Object { object, width } if object.kind == ObjectKind::DotTab => Some(width),
        _ => None,
    });
    if let Some(width) = leader {
        *width += slack;
    }
}

/// A hyphenator for the configured language and mode.
pub fn hyphenator_for(config: &LayoutConfig) -> Box<dyn Hyphenator> {
    let breaking = &config.breaking;
    if breaking.hyphens != Hyphens::Auto {
        return Box::new(NoHyphenation);
    }
    match DictionaryHyphenator::for_lang(breaking.lang.as_deref(), breaking.min_prefix, breaking.min_suffix) {
        Some(h) => Box::new(h),
        None => {
            log::warn!(
                "No hyphenation patterns for '{}', automatic hyphenation disabled",
                breaking.lang.as_deref().unwrap_or("")
            );
            Box::new(NoHyphenation)
        }
    }
}

/// One laid-out page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutPage {
    pub width: f64,
    pub height: f64,
    pub commands: Vec<DrawCommand>,
}

/// Everything a document layout produces.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutOutput {
    pub pages: Vec<LayoutPage>,
    /// Characters drawn per font, for subsetting.
    pub used_glyphs: Vec<UsedFont>,
}

/// Flow every paragraph of `document` onto fixed-size pages.
pub fn layout_document(
    document: &Document,
    fonts: &FontContext,
    config: &LayoutConfig,
) -> Result<LayoutOutput, FlowError> {
    config.validate()?;
    let hyphenator = hyphenator_for(config);
    let bidi = UnicodeBidi;
    let mut typesetter = Typesetter::new(fonts, config, hyphenator.as_ref(), &bidi);
    let painter = LinePainter::new(&config.metrics);

    let page = document.page;
    let new_page = |commands: Vec<DrawCommand>| LayoutPage {
        width: page.width,
        height: page.height,
        commands,
    };
    let mut pages = Vec::new();
    let mut cursor = PageCursor::new(&page);
    let mut commands = Vec::new();

    for paragraph in &document.paragraphs {
        let width = if paragraph.block.width > 0.0 {
            paragraph.block.width
        } else {
            cursor.width
        };
        for line in typesetter.layout_paragraph(paragraph, width)? {
            let mut pending = line;
            loop {
                match painter.paint(pending, &mut cursor, &FixedPage) {
                    PaintOutcome::Painted(painted) => {
                        commands.extend(painted.commands);
                        break;
                    }
                    PaintOutcome::PageBreak(line) => {
                        pages.push(new_page(std::mem::take(&mut commands)));
                        cursor = PageCursor::new(&page);
                        pending = line;
                    }
                }
            }
        }
        cursor.y += paragraph.block.space_after;
    }

    if !commands.is_empty() || pages.is_empty() {
        pages.push(new_page(commands));
    }
    log::debug!("Laid out {} paragraph(s) on {} page(s)", document.paragraphs.len(), pages.len());

    Ok(LayoutOutput {
        pages,
        used_glyphs: typesetter.used_glyphs().summary(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::font::{FontKey, FontMetrics, FontRegistry};
    use crate::model::{GlyphAnnotation, InlineObject, PageConfig, ShapingAnnotations};
    use crate::paint::PositionedGlyph;
    use crate::style::{BorderFlags, Color, InlineBorder, InlineStyle, VerticalAlign};
    use crate::text::bidi::LogicalOrder;

    fn paragraph(text: &str, size: f64, align: TextAlign) -> Paragraph {
        Paragraph {
            fragments: vec![Fragment::text(text, FontState::new("Helvetica", size))],
            block: BlockStyle {
                align,
                font: FontState::new("Helvetica", size),
                ..Default::default()
            },
        }
    }

    fn with_typesetter<T>(config: &LayoutConfig, f: impl FnOnce(&mut Typesetter<'_>) -> T) -> T {
        let fonts = FontContext::new();
        let hyphenator = hyphenator_for(config);
        let mut typesetter = Typesetter::new(&fonts, config, hyphenator.as_ref(), &LogicalOrder);
        f(&mut typesetter)
    }

    fn texts(lines: &[Line]) -> Vec<String> {
        lines.iter().map(Line::text).collect()
    }

    #[test]
    fn test_breaks_at_spaces() {
        let config = LayoutConfig::default();
        let lines = with_typesetter(&config, |t| {
            t.break_lines(&paragraph("The quick brown fox jumps", 10.0, TextAlign::Left), 60.0)
        })
        .unwrap();
        assert_eq!(texts(&lines), vec!["The quick", "brown fox", "jumps"]);
        assert!(lines.iter().all(|l| l.consumed_width <= 60.0 + 1e-9));
        assert!(lines[2].is_last_line);
        assert!(!lines[0].is_last_line);
    }

    #[test]
    fn test_hard_breaks_end_lines() {
        let config = LayoutConfig::default();
        let lines = with_typesetter(&config, |t| {
            t.break_lines(&paragraph("one\n\ntwo", 10.0, TextAlign::Justify), 200.0)
        })
        .unwrap();
        assert_eq!(texts(&lines), vec!["one", "", "two"]);
        assert!(lines.iter().all(|l| l.is_last_line));
    }

    #[test]
    fn test_text_indent_shortens_first_line() {
        let config = LayoutConfig::default();
        let mut para = paragraph("aaa aaa aaa", 10.0, TextAlign::Left);
        para.block.text_indent = 20.0;
        let lines = with_typesetter(&config, |t| t.break_lines(&para, 50.0)).unwrap();
        assert!((lines[0].available_width - 30.0).abs() < 1e-9);
        assert!((lines[0].indent - 20.0).abs() < 1e-9);
        assert!((lines[1].available_width - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_justified_lines_fill_the_width() {
        let config = LayoutConfig::default();
        let para = paragraph("The quick brown fox jumps over the lazy dog", 10.0, TextAlign::Justify);
        let resolved = with_typesetter(&config, |t| t.layout_paragraph(&para, 100.0)).unwrap();
        assert!(resolved.len() > 1);
        let (last, rest) = resolved.split_last().unwrap();
        for line in rest {
            assert!(
                (line.final_width + line.justification.shortfall - 100.0).abs() < 1e-6,
                "width {} shortfall {}",
                line.final_width,
                line.justification.shortfall
            );
        }
        assert_eq!(last.justification.char_spacing, 0.0);
        assert!(last.final_width <= 100.0);
    }

    #[test]
    fn test_dot_leader_takes_the_slack() {
        let config = LayoutConfig::default();
        let font = FontState::new("Helvetica", 10.0);
        let leader = InlineObject {
            handle: 1,
            kind: ObjectKind::DotTab,
            width: 0.0,
            height: 0.0,
            vertical_align: VerticalAlign::Baseline,
        };
        let para = Paragraph {
            fragments: vec![
                Fragment::text("Intro", font.clone()),
                Fragment::object(leader, font.clone()),
                Fragment::text("7", font.clone()),
            ],
            block: BlockStyle {
                font,
                ..Default::default()
            },
        };
        let resolved = with_typesetter(&config, |t| t.layout_paragraph(&para, 150.0)).unwrap();
        assert_eq!(resolved.len(), 1);
        assert!((resolved[0].final_width - 150.0).abs() < 1e-6);
    }

    #[test]
    fn test_used_glyphs_include_break_hyphens() {
        let config = LayoutConfig::default();
        let para = paragraph("extra\u{AD}ordinary", 10.0, TextAlign::Left);
        let used = with_typesetter(&config, |t| {
            let lines = t.layout_paragraph(&para, 40.0).unwrap();
            assert_eq!(lines.len(), 2);
            t.used_glyphs().clone()
        });
        let key = FontKey::new("Helvetica", 400, false);
        assert!(used.contains(&key, '-'));
        assert!(used.contains(&key, 'x'));
        assert!(!used.contains(&key, '\u{AD}'));
    }

    #[test]
    fn test_document_flows_onto_pages() {
        let para = paragraph("line\nline\nline\nline", 10.0, TextAlign::Left);
        let document = Document {
            page: PageConfig {
                width: 100.0,
                height: 40.0,
                margin: crate::model::Edges::uniform(5.0),
            },
            paragraphs: vec![para],
        };
        let out = layout_document(&document, &FontContext::new(), &LayoutConfig::default()).unwrap();
        // Helvetica 10pt lines are 9.25pt; three fit in 30pt.
        assert_eq!(out.pages.len(), 2);
        assert!(out.used_glyphs.iter().any(|f| f.family == "Helvetica" && f.chars.contains('l')));
    }

    #[test]
    fn test_moved_fragment_keeps_left_border() {
        let config = LayoutConfig::default();
        let courier = FontState::new("Courier", 10.0);
        let boxed = InlineStyle {
            border: Some(InlineBorder {
                width: 1.0,
                color: Color::BLACK,
                padding: 1.0,
            }),
            ..Default::default()
        };
        let para = Paragraph {
            fragments: vec![
                Fragment::text("aaaa ", courier.clone()),
                Fragment::text("bbbb", courier.clone())
                    .with_style(boxed)
                    .with_border_flags(BorderFlags::BOTH),
            ],
            block: BlockStyle {
                font: courier,
                ..Default::default()
            },
        };
        // Courier is 6pt wide at 10pt; the first 'b' plus its left edge
        // does not fit after "aaaa ".
        let lines = with_typesetter(&config, |t| t.break_lines(&para, 35.0)).unwrap();
        assert_eq!(texts(&lines), vec!["aaaa", "bbbb"]);
        let flags = lines[1].runs[0].border_flags;
        assert!(flags.left && flags.right);
        assert!((lines[1].consumed_width - 28.0).abs() < 1e-9);
    }

    #[test]
    fn test_hard_break_keeps_left_border_on_following_text() {
        let config = LayoutConfig::default();
        let courier = FontState::new("Courier", 10.0);
        let boxed = InlineStyle {
            border: Some(InlineBorder {
                width: 1.0,
                color: Color::BLACK,
                padding: 0.0,
            }),
            ..Default::default()
        };
        let para = Paragraph {
            fragments: vec![
                Fragment::text("a", courier.clone()),
                Fragment::text("\nbb", courier.clone())
                    .with_style(boxed)
                    .with_border_flags(BorderFlags::BOTH),
            ],
            block: BlockStyle {
                font: courier,
                ..Default::default()
            },
        };
        let lines = with_typesetter(&config, |t| t.break_lines(&para, 100.0)).unwrap();
        assert_eq!(texts(&lines), vec!["a", "bb"]);
        let flags = lines[1].runs[0].border_flags;
        assert!(flags.left && flags.right);
    }

    /// An Arabic test face: beh 500, space 250, tatweel 200 units per 1000.
    fn arabic_fonts() -> FontContext {
        let metrics = FontMetrics {
            name: "TestNaskh".to_string(),
            units_per_em: 1000,
            advances: HashMap::from([('\u{0628}', 500), (' ', 250), (TATWEEL, 200)]),
            missing_width: None,
            ascent: Some(800),
            descent: Some(-300),
            x_height: None,
            underline: None,
            strikeout: None,
            kerning: HashMap::new(),
            is_cjk: false,
            is_core: false,
        };
        let mut registry = FontRegistry::new();
        registry.register_metrics(FontKey::new("TestNaskh", 400, false), metrics);
        FontContext::with_registry(registry)
    }

    #[test]
    fn test_kashida_is_painted_across_its_full_width() {
        let mut config = LayoutConfig::default();
        config.justify.justify_last_line = true;
        config.justify.max_char_spacing_last = 0.0;
        config.justify.max_word_spacing_last = 0.0;
        let fonts = arabic_fonts();
        let font = FontState::new("TestNaskh", 10.0);
        let text = "\u{0628}\u{0628}\u{0628} \u{0628}\u{0628}\u{0628}";
        // The middle letter of each word is the preferred elongation point.
        let shaping = ShapingAnnotations {
            glyphs: [1u8, 2, 1, 0, 1, 2, 1]
                .iter()
                .map(|&kashida| GlyphAnnotation {
                    kashida,
                    ..Default::default()
                })
                .collect(),
        };
        let para = Paragraph {
            fragments: vec![Fragment::text(text, font.clone()).with_shaping(shaping)],
            block: BlockStyle {
                align: TextAlign::Justify,
                font,
                ..Default::default()
            },
        };

        let mut typesetter = Typesetter::new(&fonts, &config, &NoHyphenation, &LogicalOrder);
        let mut lines = typesetter.layout_paragraph(&para, 100.0).unwrap();
        assert_eq!(lines.len(), 1);
        let line = lines.remove(0);

        // Natural width 32.5, slack 67.5; half of it goes to the two words.
        let elongated: Vec<_> = line.runs[0].glyphs().iter().filter(|g| g.kashida > 0.0).collect();
        assert_eq!(elongated.len(), 2);
        for g in &elongated {
            assert!((g.kashida - 16.875).abs() < 1e-9);
            assert!((g.tatweel_width - 2.0).abs() < 1e-9);
        }
        assert!((line.final_width + line.justification.shortfall - 100.0).abs() < 1e-6);
        assert!(typesetter.used_glyphs().contains(&FontKey::new("TestNaskh", 400, false), TATWEEL));

        let painter = LinePainter::new(&config.metrics);
        let mut cursor = PageCursor::new(&PageConfig::default());
        let PaintOutcome::Painted(painted) = painter.paint(line, &mut cursor, &FixedPage) else {
            panic!("line should fit on an empty page");
        };
        let tatweels: Vec<PositionedGlyph> = painted
            .commands
            .iter()
            .flat_map(|c| match c {
                DrawCommand::Text { glyphs, .. } => glyphs.clone(),
                _ => Vec::new(),
            })
            .filter(|g| g.ch == TATWEEL)
            .collect();
        // ceil(16.875 / 2) = 9 stretched tatweels per elongation.
        assert_eq!(tatweels.len(), 18);
        let covered: f64 = tatweels.iter().map(|g| 2.0 * g.horizontal_scale).sum();
        assert!((covered - 33.75).abs() < 1e-9);
    }

    #[test]
    fn test_missing_fallback_is_an_error() {
        let mut config = LayoutConfig::default();
        config.metrics.fallback_family = "Nope".to_string();
        let para = paragraph("text", 10.0, TextAlign::Left);
        let mut para = para;
        para.fragments[0].font.family = "Missing".to_string();
        let result = with_typesetter(&config, |t| t.break_lines(&para, 100.0));
        assert!(matches!(result, Err(FlowError::FontUnavailable { .. })));
    }
}
