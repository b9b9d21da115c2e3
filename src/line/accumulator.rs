//! # Line Accumulator
//!
//! Owns the line currently being built. Glyphs arrive one at a time already
//! measured; the accumulator decides whether they fit, and when the break
//! finder has picked a position it cuts the line there, handing back the
//! finished [`Line`] and the carry-over fragments for the next one.
//!
//! A fresh accumulator is created for every line. Nothing from the previous
//! line survives except the carry-over fragments the caller feeds back in.

use crate::model::{Fragment, InlineObject};
use crate::style::BorderFlags;
use crate::text::classes::{is_break_space, is_zero_width, SOFT_HYPHEN};
use crate::text::metrics::GlyphPositioning;

use super::{BreakCandidate, CutPolicy, Glyph, Line, LinePos, LineSetup, Run, RunContent};

/// Widths closer than this are considered equal.
pub const WIDTH_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineState {
    Empty,
    Accumulating,
    /// A character did not fit; the line must be cut before more is added.
    Overflowed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppendOutcome {
    Fitted,
    /// The glyph was not added.
    Overflow(Glyph),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectOutcome {
    Fitted,
    /// Added, shrunk to the remaining width; the line must end after it.
    Trailing,
    /// Not added; it starts the next line.
    Overflow,
}

/// The result of cutting a line.
#[derive(Debug)]
pub struct CutLine {
    pub line: Line,
    /// Fragments that move to the next line, in order.
    pub carry: Vec<Fragment>,
    /// The overflowing character itself was the discarded break character.
    pub consumed_failing: bool,
}

pub struct LineAccumulator {
    setup: LineSetup,
    runs: Vec<Run>,
    consumed: f64,
    state: LineState,
    /// Right border edge of the fragment being appended.
    pending_right: bool,
    oikomi: usize,
}

impl LineAccumulator {
    pub fn new(setup: LineSetup) -> Self {
        Self {
            setup,
            runs: Vec::new(),
            consumed: 0.0,
            state: LineState::Empty,
            pending_right: false,
            oikomi: 0,
        }
    }

    pub fn state(&self) -> LineState {
        self.state
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    pub fn setup(&self) -> &LineSetup {
        &self.setup
    }

    pub fn consumed_width(&self) -> f64 {
        self.consumed
    }

    pub fn available_width(&self) -> f64 {
        self.setup.available_width
    }

    pub fn remaining_width(&self) -> f64 {
        self.setup.available_width - self.consumed
    }

    pub fn is_empty(&self) -> bool {
        self.state == LineState::Empty
    }

    /// Number of characters kept on the line by the oikomi override.
    pub fn oikomi_count(&self) -> usize {
        self.oikomi
    }

    /// The position after the last element.
    pub fn end(&self) -> LinePos {
        LinePos::new(self.runs.len(), 0)
    }

    /// Start a text run for `fragment`. Its glyphs follow via
    /// [`try_append_glyph`](Self::try_append_glyph).
    pub fn begin_fragment(&mut self, fragment: &Fragment, positioning: GlyphPositioning) {
        self.runs.push(Run::text(fragment, positioning));
        self.pending_right = fragment.border_flags.right;
    }

    /// The character before the next glyph, for pair kerning. Only reported
    /// when the previous run uses the same font.
    pub fn prev_char(&self) -> Option<char> {
        let (current, before) = self.runs.split_last()?;
        if let Some(g) = current.glyphs().last() {
            return Some(g.ch);
        }
        let prev = before.last()?;
        (prev.font == current.font)
            .then(|| prev.glyphs().last().map(|g| g.ch))
            .flatten()
    }

    /// Append a glyph to the current run if it fits.
    ///
    /// The first element of a line is always accepted. `closes_fragment`
    /// marks the last character of its fragment, which carries the
    /// fragment's right border edge.
    pub fn try_append_glyph(&mut self, glyph: Glyph, closes_fragment: bool) -> AppendOutcome {
        let cost = self.glyph_cost(&glyph, closes_fragment);
        if self.state == LineState::Empty
            || cost <= 0.0
            || self.consumed + cost <= self.setup.available_width + WIDTH_EPSILON
        {
            self.push_glyph(glyph, closes_fragment);
            AppendOutcome::Fitted
        } else {
            self.state = LineState::Overflowed;
            AppendOutcome::Overflow(glyph)
        }
    }

    /// Keep an overflowing glyph on the line (oikomi).
    pub fn keep_on_line(&mut self, glyph: Glyph, closes_fragment: bool) {
        self.push_glyph(glyph, closes_fragment);
        self.oikomi += 1;
        self.state = LineState::Overflowed;
    }

    fn glyph_cost(&self, glyph: &Glyph, closes_fragment: bool) -> f64 {
        let Some(run) = self.runs.last() else {
            return glyph.advance;
        };
        let mut cost = glyph.advance;
        if run.glyphs().is_empty() {
            cost += run.left_edge();
        }
        if closes_fragment && self.pending_right {
            if let Some(border) = &run.style.border {
                cost += border.edge_width();
            }
        }
        cost
    }

    fn push_glyph(&mut self, glyph: Glyph, closes_fragment: bool) {
        let cost = self.glyph_cost(&glyph, closes_fragment);
        let pending_right = self.pending_right;
        let Some(glyphs) = self.runs.last_mut().and_then(Run::glyphs_mut) else {
            log::warn!("Glyph appended without an open text run, dropping '{}'", glyph.ch);
            return;
        };
        glyphs.push(glyph);
        if closes_fragment && pending_right {
            if let Some(run) = self.runs.last_mut() {
                run.border_flags.right = true;
            }
        }
        self.consumed += cost;
        if self.state == LineState::Empty {
            self.state = LineState::Accumulating;
        }
    }

    /// Append an atomic inline object.
    pub fn try_append_object(&mut self, fragment: &Fragment, object: &InlineObject) -> ObjectOutcome {
        let (width, _) = object.clamped_size();
        let mut run = Run::object(fragment, object.clone(), width);
        let cost = run.width();
        if self.state == LineState::Empty
            || self.consumed + cost <= self.setup.available_width + WIDTH_EPSILON
        {
            self.push_object(run);
            return ObjectOutcome::Fitted;
        }
        if object.kind.may_trail() {
            let edges = run.left_edge() + run.right_edge();
            let shrunk = (self.remaining_width() - edges).max(0.0);
            if let RunContent::Object { width, .. } = &mut run.content {
                *width = shrunk;
            }
            self.push_object(run);
            return ObjectOutcome::Trailing;
        }
        self.state = LineState::Overflowed;
        ObjectOutcome::Overflow
    }

    fn push_object(&mut self, run: Run) {
        self.consumed += run.width();
        self.runs.push(run);
        self.state = LineState::Accumulating;
    }

    /// Width of everything before `pos`.
    pub fn width_before(&self, pos: LinePos) -> f64 {
        let full: f64 = self.runs.iter().take(pos.run).map(Run::width).sum();
        let partial = match self.runs.get(pos.run) {
            Some(run) if pos.offset > 0 => match &run.content {
                RunContent::Text(glyphs) => {
                    run.left_edge()
                        + glyphs
                            .iter()
                            .take(pos.offset)
                            .map(|g| g.advance + g.kashida)
                            .sum::<f64>()
                }
                RunContent::Object { .. } => run.width(),
            },
            _ => 0.0,
        };
        full + partial
    }

    /// Close the line at the end of its input (paragraph end or hard break).
    pub fn finish(self, is_last_line: bool) -> Line {
        let setup = self.setup;
        let squeezed = self.oikomi > 0;
        build_line(setup, self.runs, is_last_line, None, squeezed)
    }

    /// Cut the line at `candidate`.
    ///
    /// `hyphen` measures a hyphen in the font of the run it is added to; it
    /// is used for the `Hyphen` policy and for soft hyphens that become
    /// visible at the end of the line.
    pub fn cut(self, candidate: BreakCandidate, mut hyphen: impl FnMut(&Run) -> Glyph) -> CutLine {
        let setup = self.setup;
        let squeezed = self.oikomi > 0;
        let mut head = self.runs;
        let end = LinePos::new(head.len(), 0);
        let pos = candidate.pos.min(end);
        let mut consumed_failing = false;

        let mut tail: Vec<Run> = Vec::new();
        if pos == end {
            if candidate.policy == CutPolicy::Discard {
                consumed_failing = true;
            }
        } else {
            tail = head.split_off(pos.run);
            if pos.offset > 0 {
                let mut first = tail.remove(0);
                let rest = split_run(&mut first, pos.offset);
                head.push(first);
                if let Some(rest) = rest {
                    tail.insert(0, rest);
                }
            }
            if candidate.policy == CutPolicy::Discard {
                if let Some(glyphs) = tail.first_mut().and_then(Run::glyphs_mut) {
                    if !glyphs.is_empty() {
                        glyphs.remove(0);
                    }
                }
            }
        }

        match candidate.policy {
            CutPolicy::Hyphen => {
                if let Some(run) = head.last_mut().filter(|r| !r.is_object()) {
                    let mut glyph = hyphen(run);
                    glyph.synthetic = true;
                    if let Some(glyphs) = run.glyphs_mut() {
                        glyphs.push(glyph);
                    }
                }
            }
            CutPolicy::Cut => {
                if let Some(run) = head
                    .last_mut()
                    .filter(|r| r.glyphs().last().is_some_and(|g| g.ch == SOFT_HYPHEN))
                {
                    let visible = hyphen(run);
                    if let Some(last) = run.glyphs_mut().and_then(|g| g.last_mut()) {
                        last.render = visible.render;
                        last.advance = visible.advance;
                    }
                }
            }
            CutPolicy::Discard => {}
        }

        log::debug!(
            "Line cut at run {} offset {} ({:?}), {} run(s) carried",
            pos.run,
            pos.offset,
            candidate.policy,
            tail.len()
        );

        let carry = tail
            .into_iter()
            .filter(|r| !r.is_empty())
            .map(Run::into_fragment)
            .collect();
        let line = build_line(setup, head, false, Some(candidate.policy), squeezed);
        CutLine {
            line,
            carry,
            consumed_failing,
        }
    }
}

/// Split `run` before glyph `at`, returning the tail piece.
///
/// The head keeps the left border edge and loses the right one; the tail
/// gets the right edge.
fn split_run(run: &mut Run, at: usize) -> Option<Run> {
    let rest = {
        let glyphs = run.glyphs_mut()?;
        if at >= glyphs.len() {
            return None;
        }
        glyphs.split_off(at)
    };
    let tail = Run {
        font: run.font.clone(),
        style: run.style.clone(),
        border_flags: BorderFlags {
            left: false,
            right: run.border_flags.right,
        },
        positioning: run.positioning,
        content: RunContent::Text(rest),
        rtl: run.rtl,
    };
    run.border_flags.right = false;
    Some(tail)
}

fn build_line(
    setup: LineSetup,
    mut runs: Vec<Run>,
    is_last_line: bool,
    policy: Option<CutPolicy>,
    squeezed: bool,
) -> Line {
    trim_trailing(&mut runs);
    runs.retain(|r| !r.is_empty());
    let consumed_width: f64 = runs.iter().map(Run::width).sum();
    Line {
        runs,
        available_width: setup.available_width,
        consumed_width,
        alignment: setup.alignment,
        direction: setup.direction,
        is_first_line: setup.is_first_line,
        is_last_line,
        indent: setup.indent,
        squeezed: squeezed && consumed_width > setup.available_width + WIDTH_EPSILON,
        policy,
    }
}

/// Strip trailing spaces and zero-width characters from the end of the line.
fn trim_trailing(runs: &mut [Run]) {
    for run in runs.iter_mut().rev() {
        let Some(glyphs) = run.glyphs_mut() else {
            return;
        };
        while glyphs
            .last()
            .is_some_and(|g| is_break_space(g.render) || is_zero_width(g.render))
        {
            glyphs.pop();
        }
        if !glyphs.is_empty() {
            return;
        }
    }
}
