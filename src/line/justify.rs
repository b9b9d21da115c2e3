//! # Justification Solver
//!
//! Splits the slack of a justified line into character spacing, word
//! spacing and Arabic kashida elongation so that
//!
//! ```text
//! char_spacing * (chars - 1) + word_spacing * spaces + kashida_total + shortfall == slack
//! ```
//!
//! `shortfall` is the part the configured caps did not allow to be placed;
//! the line is then drawn short rather than overflowing. A negative slack
//! (a squeezed line) is taken out of the character spacing.

use crate::config::SpacingMode;

/// Spacing of a justified line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JustificationResult {
    pub char_spacing: f64,
    pub word_spacing: f64,
    pub kashida_total: f64,
    /// Elongation per kashida opportunity, parallel to the input.
    pub kashida: Vec<f64>,
    /// Slack left unplaced because of the caps.
    pub shortfall: f64,
}

impl JustificationResult {
    /// Width the spacing adds to a line with the given counts.
    pub fn added_width(&self, char_count: usize, space_count: usize) -> f64 {
        self.char_spacing * spacing_gaps(char_count)
            + self.word_spacing * space_count as f64
            + self.kashida_total
    }
}

/// Gaps that receive character spacing. A lone character takes the
/// spacing itself.
pub fn spacing_gaps(char_count: usize) -> f64 {
    match char_count {
        0 => 0.0,
        1 => 1.0,
        n => (n - 1) as f64,
    }
}

/// One place a word may be elongated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KashidaOpportunity {
    /// Index of the word the opportunity belongs to.
    pub word: usize,
    /// Higher wins within a word.
    pub priority: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KashidaInput {
    pub opportunities: Vec<KashidaOpportunity>,
    /// Natural width of one tatweel glyph.
    pub tatweel_width: f64,
}

/// Tunables for one line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JustifyParams {
    pub mode: SpacingMode,
    pub word_share: f64,
    /// 0 means unlimited.
    pub max_char_spacing: f64,
    /// 0 means unlimited.
    pub max_word_spacing: f64,
    /// Letter/word spacing fixed by the block: only spaces stretch.
    pub fixed_spacing: bool,
    /// Every font on the line is a core font.
    pub core_fonts: bool,
    pub kashida_share: f64,
    pub min_kashida_ratio: f64,
}

impl Default for JustifyParams {
    fn default() -> Self {
        Self {
            mode: SpacingMode::Auto,
            word_share: 0.6,
            max_char_spacing: 2.0,
            max_word_spacing: 0.0,
            fixed_spacing: false,
            core_fonts: false,
            kashida_share: 0.5,
            min_kashida_ratio: 0.5,
        }
    }
}

pub struct JustificationSolver {
    params: JustifyParams,
}

impl JustificationSolver {
    pub fn new(params: JustifyParams) -> Self {
        Self { params }
    }

    pub fn solve(
        &self,
        slack: f64,
        char_count: usize,
        space_count: usize,
        kashida: Option<&KashidaInput>,
    ) -> JustificationResult {
        let mut result = JustificationResult::default();
        if let Some(input) = kashida {
            result.kashida = vec![0.0; input.opportunities.len()];
        }
        if char_count == 0 || slack == 0.0 || !slack.is_finite() {
            result.shortfall = if slack.is_finite() { slack } else { 0.0 };
            return result;
        }

        if slack < 0.0 {
            // Squeeze: only character spacing can shrink.
            if char_count > 1 {
                result.char_spacing = slack / (char_count - 1) as f64;
            } else {
                result.shortfall = slack;
            }
            return result;
        }

        let mut remaining = slack;
        if let Some(input) = kashida {
            remaining -= self.elongate(slack, input, &mut result);
        }

        let (cs, ws) = self.distribute(remaining, char_count, space_count);
        result.char_spacing = cs;
        result.word_spacing = ws;
        result.shortfall = remaining - cs * spacing_gaps(char_count) - ws * space_count as f64;
        if result.shortfall.abs() < 1e-9 {
            result.shortfall = 0.0;
        }
        result
    }

    /// Allocate kashida elongation; returns the width used.
    fn elongate(&self, slack: f64, input: &KashidaInput, result: &mut JustificationResult) -> f64 {
        let mut best: Vec<(usize, usize, u8)> = Vec::new(); // (word, index, priority)
        for (i, opp) in input.opportunities.iter().enumerate() {
            if opp.priority == 0 {
                continue;
            }
            match best.iter_mut().find(|(w, _, _)| *w == opp.word) {
                Some(entry) if opp.priority > entry.2 => *entry = (opp.word, i, opp.priority),
                Some(_) => {}
                None => best.push((opp.word, i, opp.priority)),
            }
        }
        if best.is_empty() || input.tatweel_width <= 0.0 {
            return 0.0;
        }

        let share = slack * self.params.kashida_share;
        let per = share / best.len() as f64;
        if per / input.tatweel_width < self.params.min_kashida_ratio {
            log::debug!(
                "Kashida abandoned: {:.3} per opportunity against tatweel width {:.3}",
                per,
                input.tatweel_width
            );
            return 0.0;
        }
        for (_, index, _) in &best {
            result.kashida[*index] = per;
        }
        result.kashida_total = share;
        share
    }

    fn distribute(&self, slack: f64, nc: usize, ns: usize) -> (f64, f64) {
        let p = &self.params;
        let cap = |v: f64, max: f64| if max > 0.0 { v.min(max) } else { v };
        let gaps = nc.saturating_sub(1) as f64;

        if p.fixed_spacing {
            return if ns > 0 { (0.0, cap(slack / ns as f64, p.max_word_spacing)) } else { (0.0, 0.0) };
        }
        if nc == 1 {
            return (slack, 0.0);
        }

        let chars_only = |slack: f64| (cap(slack / gaps, p.max_char_spacing), 0.0);
        let words_only = |slack: f64| (0.0, cap(slack / ns as f64, p.max_word_spacing));

        match p.mode {
            SpacingMode::Character => chars_only(slack),
            _ if ns == 0 => chars_only(slack),
            SpacingMode::Word => words_only(slack),
            SpacingMode::Auto if ns == nc - 1 || p.core_fonts => {
                let (_, ws) = words_only(slack);
                let rest = slack - ws * ns as f64;
                if rest > 1e-9 {
                    // Word spacing hit its cap; let the characters take the rest.
                    (cap(rest / gaps, p.max_char_spacing), ws)
                } else {
                    (0.0, ws)
                }
            }
            SpacingMode::Auto => {
                let cs = cap(slack * (1.0 - p.word_share) / gaps, p.max_char_spacing);
                let ws = cap((slack - cs * gaps) / ns as f64, p.max_word_spacing);
                (cs, ws)
            }
        }
    }
}
