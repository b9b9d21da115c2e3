//! Character classes used by measurement, break search and justification.

use unicode_linebreak::{break_property, BreakClass};
use unicode_script::{Script, UnicodeScript};

pub const SOFT_HYPHEN: char = '\u{00AD}';
pub const ZERO_WIDTH_SPACE: char = '\u{200B}';
pub const NO_BREAK_SPACE: char = '\u{00A0}';
pub const TATWEEL: char = '\u{0640}';

/// Characters that never take horizontal space.
pub fn is_zero_width(ch: char) -> bool {
    matches!(
        ch,
        SOFT_HYPHEN | ZERO_WIDTH_SPACE | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}'
    )
}

/// A space the line may break at.
pub fn is_break_space(ch: char) -> bool {
    ch == ' '
}

/// A space that receives word spacing.
pub fn is_justifiable_space(ch: char) -> bool {
    ch == ' ' || ch == NO_BREAK_SPACE
}

/// Hard line breaks.
pub fn is_mandatory_break(ch: char) -> bool {
    matches!(ch, '\n' | '\u{2028}' | '\u{2029}')
}

/// Literal hyphens and dashes that allow a break after them.
pub fn is_hyphen(ch: char) -> bool {
    matches!(ch, '-' | '\u{2010}' | '\u{2013}' | '\u{2014}')
}

/// Han, kana, hangul and bopomofo, plus the CJK punctuation blocks.
pub fn is_cjk(ch: char) -> bool {
    matches!(
        ch.script(),
        Script::Han | Script::Hiragana | Script::Katakana | Script::Hangul | Script::Bopomofo
    ) || matches!(ch as u32, 0x3000..=0x303F | 0xFF00..=0xFFEF)
}

pub fn is_arabic(ch: char) -> bool {
    ch.script() == Script::Arabic
}

/// Characters that may not begin a line (closing brackets, small kana,
/// full stops and the like).
pub fn is_no_start(ch: char) -> bool {
    matches!(
        break_property(ch as u32),
        BreakClass::ClosePunctuation
            | BreakClass::CloseParenthesis
            | BreakClass::Exclamation
            | BreakClass::NonStarter
            | BreakClass::ConditionalJapaneseStarter
            | BreakClass::InfixSeparator
    )
}

/// Characters that may not end a line (opening brackets).
pub fn is_no_end(ch: char) -> bool {
    matches!(break_property(ch as u32), BreakClass::OpenPunctuation)
}

/// ASCII and fullwidth digits.
pub fn is_numeral(ch: char) -> bool {
    ch.is_ascii_digit() || ('\u{FF10}'..='\u{FF19}').contains(&ch)
}

/// Whether a break is allowed between two adjacent CJK characters.
pub fn cjk_break_allowed(prev: char, next: char) -> bool {
    is_cjk(prev)
        && is_cjk(next)
        && !is_no_start(next)
        && !is_no_end(prev)
        && !(is_numeral(prev) && is_numeral(next))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cjk_detection() {
        assert!(is_cjk('漢'));
        assert!(is_cjk('か'));
        assert!(is_cjk('。'));
        assert!(is_cjk('한'));
        assert!(!is_cjk('a'));
        assert!(!is_cjk('ب'));
        assert!(is_arabic('ب'));
    }

    #[test]
    fn test_kinsoku_classes() {
        assert!(is_no_start('。'));
        assert!(is_no_start('」'));
        assert!(is_no_start(')'));
        assert!(is_no_end('「'));
        assert!(is_no_end('('));
        assert!(!is_no_start('漢'));
    }

    #[test]
    fn test_cjk_boundaries() {
        assert!(cjk_break_allowed('漢', '字'));
        assert!(!cjk_break_allowed('漢', '。'));
        assert!(!cjk_break_allowed('「', '漢'));
        assert!(!cjk_break_allowed('１', '２'));
        assert!(!cjk_break_allowed('a', '字'));
    }

    #[test]
    fn test_spaces_and_zero_width() {
        assert!(is_break_space(' '));
        assert!(!is_break_space(NO_BREAK_SPACE));
        assert!(is_justifiable_space(NO_BREAK_SPACE));
        assert!(is_zero_width(SOFT_HYPHEN));
        assert!(is_zero_width(ZERO_WIDTH_SPACE));
        assert!(!is_zero_width(' '));
    }
}
