//! # OpenType Shaping
//!
//! Wraps rustybuzz to turn a fragment's text into the per-character
//! annotation stream the line core consumes. Only the positioning side of
//! shaping survives: advance deltas against the nominal `hmtx` advances,
//! GPOS placement offsets, mark grouping and kashida opportunities.
//!
//! Standard PDF fonts have no font program and are never shaped.

use crate::font::FontMetrics;
use crate::model::{GlyphAnnotation, GlyphGroup, ShapingAnnotations};

use super::classes::{is_arabic, TATWEEL};

/// Shape `text` with the font program in `font_data`.
///
/// Returns `None` if rustybuzz cannot read the font.
pub fn shape_annotations(
    text: &[char],
    font_data: &[u8],
    metrics: &FontMetrics,
    rtl: bool,
) -> Option<ShapingAnnotations> {
    let face = rustybuzz::Face::from_slice(font_data, 0)?;
    let s: String = text.iter().collect();

    let mut buffer = rustybuzz::UnicodeBuffer::new();
    buffer.push_str(&s);
    if rtl {
        buffer.set_direction(rustybuzz::Direction::RightToLeft);
    }
    let output = rustybuzz::shape(&face, &[], buffer);

    // Clusters are byte offsets into the UTF-8 buffer.
    let mut byte_to_char = vec![0usize; s.len() + 1];
    for (ci, (bi, _)) in s.char_indices().enumerate() {
        byte_to_char[bi] = ci;
    }

    let upem = metrics.units_per_em.max(1) as f64;
    let to_milli = |v: i32| v as f64 * 1000.0 / upem;

    let mut advance_sum = vec![0i32; text.len()];
    let mut first_offset: Vec<Option<(i32, i32)>> = vec![None; text.len()];
    for (info, pos) in output.glyph_infos().iter().zip(output.glyph_positions()) {
        let Some(&ci) = byte_to_char.get(info.cluster as usize) else {
            continue;
        };
        if ci >= text.len() {
            continue;
        }
        advance_sum[ci] += pos.x_advance;
        if first_offset[ci].is_none() {
            first_offset[ci] = Some((pos.x_offset, pos.y_offset));
        }
    }

    let kashida = kashida_opportunities(text);
    let glyphs = text
        .iter()
        .enumerate()
        .map(|(i, &ch)| {
            let Some((x_off, y_off)) = first_offset[i] else {
                // Swallowed by a ligature that starts at an earlier character.
                return GlyphAnnotation {
                    group: GlyphGroup::Mark,
                    kashida: kashida[i],
                    ..Default::default()
                };
            };
            let group = if advance_sum[i] == 0 {
                GlyphGroup::Mark
            } else if is_arabic(ch) {
                GlyphGroup::Cursive
            } else {
                GlyphGroup::Base
            };
            let nominal = metrics.advances.get(&ch).copied().unwrap_or(0) as i32;
            let delta = to_milli(advance_sum[i] - nominal);
            let delta = (delta != 0.0).then_some(delta);
            GlyphAnnotation {
                group,
                x_placement: to_milli(x_off),
                y_placement: to_milli(y_off),
                x_advance_ltr: if rtl { None } else { delta },
                x_advance_rtl: if rtl { delta } else { None },
                kashida: kashida[i],
            }
        })
        .collect();

    Some(ShapingAnnotations { glyphs })
}

/// Kashida opportunities per character, 0 where elongation is not allowed.
///
/// An opportunity sits after a dual-joining Arabic letter that connects to
/// the next letter. Letters of the seen/sad family rank highest, the join
/// before a word-final heh or teh marbuta next, any other join last.
pub fn kashida_opportunities(text: &[char]) -> Vec<u8> {
    let mut out = vec![0u8; text.len()];
    for i in 0..text.len() {
        if !is_dual_joining(text[i]) {
            continue;
        }
        let mut j = i + 1;
        while j < text.len() && is_arabic_mark(text[j]) {
            j += 1;
        }
        let Some(&next) = text.get(j) else {
            continue;
        };
        if !(is_dual_joining(next) || is_right_joining(next)) {
            continue;
        }
        let word_final = text
            .get(j + 1..)
            .map(|rest| rest.iter().find(|c| !is_arabic_mark(**c)))
            .map_or(true, |after| after.map_or(true, |c| !is_arabic(*c)));
        let priority = if matches!(text[i], 'س' | 'ش' | 'ص' | 'ض') {
            3
        } else if word_final && matches!(next, 'ه' | 'ة') {
            2
        } else {
            1
        };
        // The elongation is drawn after the last mark of the letter.
        out[j - 1] = priority;
    }
    out
}

fn is_arabic_mark(ch: char) -> bool {
    matches!(ch, '\u{064B}'..='\u{065F}' | '\u{0670}')
}

/// Letters that only join to the preceding letter.
fn is_right_joining(ch: char) -> bool {
    matches!(
        ch,
        'ا' | 'أ' | 'إ' | 'آ' | 'ٱ' | 'د' | 'ذ' | 'ر' | 'ز' | 'و' | 'ؤ' | 'ة' | 'ژ'
    )
}

/// Letters that join on both sides.
fn is_dual_joining(ch: char) -> bool {
    let code = ch as u32;
    let in_letter_block = (0x0626..=0x064A).contains(&code) || (0x066E..=0x06D3).contains(&code);
    in_letter_block && !is_right_joining(ch) && ch != TATWEEL && ch != 'ء'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_seen_family_ranks_highest() {
        // "سلام": seen joins lam, lam joins alef, alef does not join on.
        let k = kashida_opportunities(&chars("سلام"));
        assert_eq!(k, vec![3, 1, 0, 0]);
    }

    #[test]
    fn test_final_heh_ranks_second() {
        // "كله": kaf-lam (1), lam-heh final (2).
        let k = kashida_opportunities(&chars("كله"));
        assert_eq!(k, vec![1, 2, 0]);
    }

    #[test]
    fn test_right_joining_letters_end_a_join() {
        let k = kashida_opportunities(&chars("دار"));
        assert!(k.iter().all(|&p| p == 0));
    }

    #[test]
    fn test_latin_has_no_opportunities() {
        assert!(kashida_opportunities(&chars("word")).iter().all(|&p| p == 0));
    }

    #[test]
    fn test_marks_are_transparent() {
        // beh + fatha + teh: the opportunity moves after the mark.
        let k = kashida_opportunities(&chars("بَت"));
        assert_eq!(k, vec![0, 1, 0]);
    }

    #[test]
    fn test_unreadable_font_is_none() {
        let metrics = crate::font::StandardFont::Helvetica.metrics();
        assert!(shape_annotations(&chars("abc"), &[0, 1, 2], &metrics, false).is_none());
    }
}
