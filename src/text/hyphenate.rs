//! Dictionary hyphenation.
//!
//! The break finder asks for the best hyphenation point at or before a caret
//! offset inside a word. The default implementation uses the Liang patterns
//! bundled with `hypher`.

/// Hyphenation lookup used by the break finder.
pub trait Hyphenator {
    /// The largest break offset `b <= caret` inside `word` (a break between
    /// `word[b - 1]` and `word[b]`), or `None` if the word has none.
    fn hyphenate(&self, word: &[char], caret: usize) -> Option<usize>;
}

/// Never hyphenates.
pub struct NoHyphenation;

impl Hyphenator for NoHyphenation {
    fn hyphenate(&self, _word: &[char], _caret: usize) -> Option<usize> {
        None
    }
}

/// Pattern-based hyphenation for one language.
#[derive(Debug, Clone, Copy)]
pub struct DictionaryHyphenator {
    lang: hypher::Lang,
    min_prefix: usize,
    min_suffix: usize,
}

impl DictionaryHyphenator {
    /// Build a hyphenator for a BCP 47 tag; English when no tag is given.
    /// Returns `None` for languages without patterns.
    pub fn for_lang(lang: Option<&str>, min_prefix: usize, min_suffix: usize) -> Option<Self> {
        let lang = resolve_hypher_lang(lang)?;
        Some(Self {
            lang,
            min_prefix: min_prefix.max(1),
            min_suffix: min_suffix.max(1),
        })
    }
}

impl Hyphenator for DictionaryHyphenator {
    fn hyphenate(&self, word: &[char], caret: usize) -> Option<usize> {
        if word.len() < self.min_prefix + self.min_suffix || !word.iter().all(|c| c.is_alphabetic()) {
            return None;
        }
        let text: String = word.iter().collect();
        let lowered = text.to_lowercase();
        // Lowercasing can change lengths (e.g. 'İ'); offsets would no longer line up.
        if lowered.chars().count() != word.len() {
            return None;
        }

        let mut best = None;
        let mut offset = 0;
        for syllable in hypher::hyphenate(&lowered, self.lang) {
            offset += syllable.chars().count();
            if offset >= word.len() || offset > caret {
                break;
            }
            if offset >= self.min_prefix && word.len() - offset >= self.min_suffix {
                best = Some(offset);
            }
        }
        best
    }
}

/// Map a BCP 47 language tag to a hypher language.
fn resolve_hypher_lang(lang: Option<&str>) -> Option<hypher::Lang> {
    let Some(tag) = lang else {
        return Some(hypher::Lang::English);
    };
    let primary = tag.split(['-', '_']).next().unwrap_or(tag).to_lowercase();
    let lang = match primary.as_str() {
        "af" => hypher::Lang::Afrikaans,
        "sq" => hypher::Lang::Albanian,
        "be" => hypher::Lang::Belarusian,
        "bg" => hypher::Lang::Bulgarian,
        "ca" => hypher::Lang::Catalan,
        "hr" => hypher::Lang::Croatian,
        "cs" => hypher::Lang::Czech,
        "da" => hypher::Lang::Danish,
        "nl" => hypher::Lang::Dutch,
        "en" => hypher::Lang::English,
        "et" => hypher::Lang::Estonian,
        "fi" => hypher::Lang::Finnish,
        "fr" => hypher::Lang::French,
        "ka" => hypher::Lang::Georgian,
        "de" => hypher::Lang::German,
        "el" => hypher::Lang::Greek,
        "hu" => hypher::Lang::Hungarian,
        "is" => hypher::Lang::Icelandic,
        "it" => hypher::Lang::Italian,
        "ku" => hypher::Lang::Kurmanji,
        "la" => hypher::Lang::Latin,
        "lt" => hypher::Lang::Lithuanian,
        "mn" => hypher::Lang::Mongolian,
        "nb" | "nn" | "no" => hypher::Lang::Norwegian,
        "pl" => hypher::Lang::Polish,
        "pt" => hypher::Lang::Portuguese,
        "ru" => hypher::Lang::Russian,
        "sr" => hypher::Lang::Serbian,
        "sk" => hypher::Lang::Slovak,
        "sl" => hypher::Lang::Slovenian,
        "es" => hypher::Lang::Spanish,
        "sv" => hypher::Lang::Swedish,
        "tr" => hypher::Lang::Turkish,
        "tk" => hypher::Lang::Turkmen,
        "uk" => hypher::Lang::Ukrainian,
        _ => return None,
    };
    Some(lang)
}
