//! # Break Finder
//!
//! Picks the position at which an overflowing line is cut.
//!
//! Two rules are tried before anything else: the CJK "oikomi" override,
//! which keeps a character that may not start a line on the current one,
//! and automatic dictionary hyphenation of the overflowing word. After that
//! the line is scanned backward from the overflowing character, and the
//! nearest position that qualifies wins:
//!
//! | at a ...                         | policy    |
//! |----------------------------------|-----------|
//! | space                            | `Discard` |
//! | zero-width space                 | `Discard` |
//! | hyphen or dash                   | `Cut` after it |
//! | soft hyphen (if the hyphen fits) | `Cut` after it |
//! | CJK/CJK boundary                 | `Cut`     |
//! | inline object                    | `Cut` before it |
//!
//! With no candidate the line is cut right before the overflowing
//! character. The chosen position is never after it.

use crate::config::BreakConfig;
use crate::style::Hyphens;
use crate::text::classes::{
    cjk_break_allowed, is_break_space, is_cjk, is_hyphen, is_no_start, SOFT_HYPHEN,
    ZERO_WIDTH_SPACE,
};
use crate::text::hyphenate::Hyphenator;

use super::accumulator::{LineAccumulator, WIDTH_EPSILON};
use super::{BreakCandidate, BreakDecision, CutPolicy, LinePos, Run, RunContent};

/// How many characters one line may keep past its end.
pub const MAX_OIKOMI: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Element {
    Char(char),
    Object,
}

pub struct BreakFinder<'a> {
    config: &'a BreakConfig,
    hyphenator: &'a dyn Hyphenator,
}

impl<'a> BreakFinder<'a> {
    pub fn new(config: &'a BreakConfig, hyphenator: &'a dyn Hyphenator) -> Self {
        Self { config, hyphenator }
    }

    /// Decide what to do with `failing`, the character that did not fit.
    ///
    /// `lookahead` holds the characters following it in the same fragment;
    /// `hyphen_width` measures a hyphen in a run's font.
    pub fn find_break(
        &self,
        line: &LineAccumulator,
        failing: char,
        lookahead: &[char],
        hyphen_width: &dyn Fn(&Run) -> f64,
    ) -> BreakDecision {
        let end = line.end();

        if self.config.allow_cjk_orphans
            && !line.is_empty()
            && is_cjk(failing)
            && is_no_start(failing)
            && line.oikomi_count() < MAX_OIKOMI
        {
            log::debug!("Keeping '{}' on the line (oikomi)", failing);
            return BreakDecision::KeepOnLine;
        }

        let discard_failing = is_break_space(failing) || failing == ZERO_WIDTH_SPACE;
        if line.oikomi_count() > 0 {
            return at(end, if discard_failing { CutPolicy::Discard } else { CutPolicy::Cut });
        }

        if self.config.hyphens == Hyphens::Auto && failing.is_alphabetic() {
            if let Some(candidate) = self.auto_hyphen(line, failing, lookahead, hyphen_width) {
                return BreakDecision::Break(candidate);
            }
        }

        if discard_failing {
            return at(end, CutPolicy::Discard);
        }

        let elements = elements(line);
        let n = elements.len();
        let first_content = elements
            .iter()
            .position(|(_, e)| !matches!(e, Element::Char(c) if is_break_space(*c)));

        for k in (0..n).rev() {
            let (pos, element) = elements[k];
            let next_pos = elements.get(k + 1).map_or(end, |(p, _)| *p);
            let next_char = match elements.get(k + 1) {
                Some((_, Element::Char(c))) => Some(*c),
                Some((_, Element::Object)) => None,
                None => Some(failing),
            };

            let ch = match element {
                Element::Object => {
                    if k > 0 {
                        return at(pos, CutPolicy::Cut);
                    }
                    continue;
                }
                Element::Char(ch) => ch,
            };

            if next_char.is_some_and(|next| cjk_break_allowed(ch, next)) {
                return at(next_pos, CutPolicy::Cut);
            }

            if is_hyphen(ch) && k > 0 && self.hyphen_breaks(&elements, k, next_char, failing) {
                return at(next_pos, CutPolicy::Cut);
            }

            if ch == SOFT_HYPHEN && k > 0 && self.config.hyphens != Hyphens::None {
                let width = line.width_before(next_pos) + hyphen_width(&line.runs()[pos.run]);
                if width <= line.available_width() + WIDTH_EPSILON {
                    return at(next_pos, CutPolicy::Cut);
                }
            }

            if (is_break_space(ch) || ch == ZERO_WIDTH_SPACE) && first_content.is_some_and(|f| f < k) {
                return at(pos, CutPolicy::Discard);
            }
        }

        log::debug!("No break opportunity on the line, cutting before '{}'", failing);
        at(end, CutPolicy::Cut)
    }

    /// A literal hyphen breaks unless it sits in a URL-like token, follows a
    /// space, or precedes a digit or `>`.
    fn hyphen_breaks(
        &self,
        elements: &[(LinePos, Element)],
        k: usize,
        next: Option<char>,
        failing: char,
    ) -> bool {
        if matches!(elements[k - 1].1, Element::Char(prev) if prev.is_whitespace()) {
            return false;
        }
        if next.is_some_and(|c| c.is_ascii_digit() || c == '>') {
            return false;
        }
        let start = elements[..k]
            .iter()
            .rposition(|(_, e)| !matches!(e, Element::Char(c) if !c.is_whitespace()))
            .map_or(0, |i| i + 1);
        let mut token: String = elements[start..]
            .iter()
            .map_while(|(_, e)| match e {
                Element::Char(c) if !c.is_whitespace() => Some(*c),
                _ => None,
            })
            .collect();
        if token.chars().count() == elements.len() - start {
            token.push(failing);
        }
        let token = token.to_lowercase();
        !(token.contains("://") || token.contains("www."))
    }

    fn auto_hyphen(
        &self,
        line: &LineAccumulator,
        failing: char,
        lookahead: &[char],
        hyphen_width: &dyn Fn(&Run) -> f64,
    ) -> Option<BreakCandidate> {
        let mut prefix: Vec<(LinePos, char)> = Vec::new();
        'runs: for (ri, run) in line.runs().iter().enumerate().rev() {
            let RunContent::Text(glyphs) = &run.content else {
                break;
            };
            for (gi, g) in glyphs.iter().enumerate().rev() {
                if g.ch == SOFT_HYPHEN {
                    // The word carries manual hyphens; those take precedence.
                    return None;
                }
                if !g.ch.is_alphabetic() {
                    break 'runs;
                }
                prefix.push((LinePos::new(ri, gi), g.ch));
            }
        }
        if prefix.is_empty() {
            return None;
        }
        prefix.reverse();

        let word: Vec<char> = prefix
            .iter()
            .map(|(_, c)| *c)
            .chain(std::iter::once(failing))
            .chain(lookahead.iter().copied().take_while(|c| c.is_alphabetic()))
            .collect();

        let mut caret = prefix.len();
        while let Some(b) = self.hyphenator.hyphenate(&word, caret) {
            if b == 0 || b > prefix.len() {
                break;
            }
            let pos = if b < prefix.len() { prefix[b].0 } else { line.end() };
            let run = &line.runs()[prefix[b - 1].0.run];
            if line.width_before(pos) + hyphen_width(run) <= line.available_width() + WIDTH_EPSILON {
                log::debug!("Hyphenating '{}' after {} chars", word.iter().collect::<String>(), b);
                return Some(BreakCandidate {
                    pos,
                    policy: CutPolicy::Hyphen,
                });
            }
            if b <= 1 {
                break;
            }
            caret = b - 1;
        }
        None
    }
}

fn at(pos: LinePos, policy: CutPolicy) -> BreakDecision {
    BreakDecision::Break(BreakCandidate { pos, policy })
}

fn elements(line: &LineAccumulator) -> Vec<(LinePos, Element)> {
    let mut out = Vec::new();
    for (ri, run) in line.runs().iter().enumerate() {
        match &run.content {
            RunContent::Text(glyphs) => out.extend(
                glyphs
                    .iter()
                    .enumerate()
                    .map(|(gi, g)| (LinePos::new(ri, gi), Element::Char(g.ch))),
            ),
            RunContent::Object { .. } => out.push((LinePos::new(ri, 0), Element::Object)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::accumulator::AppendOutcome;
    use crate::line::{Glyph, LineSetup};
    use crate::model::{Fragment, InlineObject, ObjectKind};
    use crate::style::{Direction, FontState, TextAlign, VerticalAlign};
    use crate::text::classes::is_zero_width;
    use crate::text::hyphenate::{DictionaryHyphenator, NoHyphenation};
    use crate::text::metrics::GlyphPositioning;

    const W: f64 = 10.0;

    fn accumulator(width: f64) -> LineAccumulator {
        LineAccumulator::new(LineSetup {
            available_width: width,
            alignment: TextAlign::Left,
            direction: Direction::Ltr,
            is_first_line: false,
            indent: 0.0,
        })
    }

    /// Feed `text` (every visible char `W` wide) until something overflows.
    fn overflow(acc: &mut LineAccumulator, text: &str) -> Option<(char, Vec<char>)> {
        let chars: Vec<char> = text.chars().collect();
        let frag = Fragment::text(text, FontState::default());
        acc.begin_fragment(&frag, GlyphPositioning::Plain);
        for (i, &ch) in chars.iter().enumerate() {
            let advance = if is_zero_width(ch) { 0.0 } else { W };
            if let AppendOutcome::Overflow(g) = acc.try_append_glyph(Glyph::new(ch, advance), i + 1 == chars.len()) {
                return Some((g.ch, chars[i + 1..].to_vec()));
            }
        }
        None
    }

    fn find(text: &str, width: f64, config: &BreakConfig) -> (LineAccumulator, BreakDecision) {
        let mut acc = accumulator(width);
        let (failing, rest) = overflow(&mut acc, text).expect("text should overflow");
        let finder = BreakFinder::new(config, &NoHyphenation);
        let decision = finder.find_break(&acc, failing, &rest, &|_| 5.0);
        (acc, decision)
    }

    fn candidate(decision: BreakDecision) -> BreakCandidate {
        match decision {
            BreakDecision::Break(c) => c,
            BreakDecision::KeepOnLine => panic!("expected a break"),
        }
    }

    #[test]
    fn test_breaks_after_hard_hyphen() {
        let (acc, decision) = find("The quick-brown fox", 100.0, &BreakConfig::default());
        let c = candidate(decision);
        assert_eq!(c.policy, CutPolicy::Cut);
        assert_eq!(c.pos, acc.end());
    }

    #[test]
    fn test_breaks_at_nearest_space() {
        let (_, decision) = find("one two three", 95.0, &BreakConfig::default());
        let c = candidate(decision);
        assert_eq!(c.policy, CutPolicy::Discard);
        assert_eq!(c.pos, LinePos::new(0, 7));
    }

    #[test]
    fn test_overflowing_space_is_discarded_at_end() {
        let (acc, decision) = find("abc def", 30.0, &BreakConfig::default());
        assert_eq!(candidate(decision), BreakCandidate { pos: acc.end(), policy: CutPolicy::Discard });
    }

    #[test]
    fn test_unbreakable_word_cuts_at_overflow() {
        let (acc, decision) = find("abcdefghij", 55.0, &BreakConfig::default());
        let c = candidate(decision);
        assert_eq!(c.policy, CutPolicy::Cut);
        assert_eq!(c.pos, acc.end());
        assert!((acc.width_before(c.pos) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_hyphen_before_digit_or_in_url_does_not_break() {
        let (_, decision) = find("pages 10-20", 95.0, &BreakConfig::default());
        assert_eq!(candidate(decision).pos, LinePos::new(0, 5));

        let (_, decision) = find("see http://a-b.example", 130.0, &BreakConfig::default());
        assert_eq!(candidate(decision).pos, LinePos::new(0, 3));
    }

    #[test]
    fn test_soft_hyphen_breaks_when_hyphen_fits() {
        let (_, decision) = find("ab co\u{00AD}operate", 60.0, &BreakConfig::default());
        let c = candidate(decision);
        assert_eq!(c.policy, CutPolicy::Cut);
        assert_eq!(c.pos, LinePos::new(0, 6));

        let none = BreakConfig {
            hyphens: Hyphens::None,
            ..Default::default()
        };
        let (_, decision) = find("ab co\u{00AD}operate", 60.0, &none);
        assert_eq!(candidate(decision), BreakCandidate { pos: LinePos::new(0, 2), policy: CutPolicy::Discard });
    }

    #[test]
    fn test_cjk_breaks_between_ideographs() {
        let (acc, decision) = find("漢字漢字漢字", 35.0, &BreakConfig::default());
        assert_eq!(candidate(decision), BreakCandidate { pos: acc.end(), policy: CutPolicy::Cut });
    }

    #[test]
    fn test_cjk_closing_punctuation_is_kept_on_line() {
        let (_, decision) = find("漢字漢。", 30.0, &BreakConfig::default());
        assert_eq!(decision, BreakDecision::KeepOnLine);

        let strict = BreakConfig {
            allow_cjk_orphans: false,
            ..Default::default()
        };
        let (_, decision) = find("漢字漢。", 30.0, &strict);
        // Not between 漢 and 。, so one ideograph further back.
        assert_eq!(candidate(decision).pos, LinePos::new(0, 2));
    }

    #[test]
    fn test_after_oikomi_the_line_ends() {
        let mut acc = accumulator(30.0);
        let (failing, _) = overflow(&mut acc, "漢字漢。字").unwrap();
        acc.keep_on_line(Glyph::new(failing, W), false);
        let config = BreakConfig::default();
        let finder = BreakFinder::new(&config, &NoHyphenation);
        let decision = finder.find_break(&acc, '字', &[], &|_| 5.0);
        assert_eq!(candidate(decision), BreakCandidate { pos: acc.end(), policy: CutPolicy::Cut });
    }

    #[test]
    fn test_breaks_before_inline_object() {
        let mut acc = accumulator(40.0);
        assert!(overflow(&mut acc, "ab").is_none());
        let obj = InlineObject {
            handle: 9,
            kind: ObjectKind::Image,
            width: 10.0,
            height: 10.0,
            vertical_align: VerticalAlign::Baseline,
        };
        let frag = Fragment::object(obj.clone(), FontState::default());
        acc.try_append_object(&frag, &obj);
        let (failing, rest) = overflow(&mut acc, "cdef").unwrap();
        let config = BreakConfig::default();
        let finder = BreakFinder::new(&config, &NoHyphenation);
        let c = candidate(finder.find_break(&acc, failing, &rest, &|_| 5.0));
        assert_eq!(c, BreakCandidate { pos: LinePos::new(1, 0), policy: CutPolicy::Cut });
    }

    #[test]
    fn test_automatic_hyphenation_splits_the_word() {
        let config = BreakConfig {
            hyphens: Hyphens::Auto,
            ..Default::default()
        };
        let hyphenator = DictionaryHyphenator::for_lang(Some("en"), 2, 2).unwrap();
        let mut acc = accumulator(120.0);
        let (failing, rest) = overflow(&mut acc, "an extraordinary thing").unwrap();
        let finder = BreakFinder::new(&config, &hyphenator);
        let c = candidate(finder.find_break(&acc, failing, &rest, &|_| 5.0));
        assert_eq!(c.policy, CutPolicy::Hyphen);
        assert!(c.pos.offset > 3 && c.pos.offset < 12);
        assert!(acc.width_before(c.pos) + 5.0 <= 120.0);
        assert!(c.pos <= acc.end());
    }
}
