//! The per-document set of characters drawn in each font.
//!
//! Measurement appends to it; the embedding step downstream reads it to
//! decide which glyphs to subset. Nothing is ever removed.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use super::FontKey;

#[derive(Debug, Clone, Default)]
pub struct UsedGlyphs {
    fonts: HashMap<FontKey, BTreeSet<char>>,
}

impl UsedGlyphs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, key: &FontKey, ch: char) {
        if let Some(set) = self.fonts.get_mut(key) {
            set.insert(ch);
        } else {
            self.fonts.insert(key.clone(), BTreeSet::from([ch]));
        }
    }

    pub fn get(&self, key: &FontKey) -> Option<&BTreeSet<char>> {
        self.fonts.get(key)
    }

    pub fn contains(&self, key: &FontKey, ch: char) -> bool {
        self.fonts.get(key).is_some_and(|set| set.contains(&ch))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FontKey, &BTreeSet<char>)> {
        self.fonts.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    /// Fold another set into this one (e.g. one collected per page).
    pub fn merge(&mut self, other: UsedGlyphs) {
        for (key, chars) in other.fonts {
            self.fonts.entry(key).or_default().extend(chars);
        }
    }

    /// A stable, serializable listing sorted by font key.
    pub fn summary(&self) -> Vec<UsedFont> {
        let mut fonts: Vec<UsedFont> = self
            .fonts
            .iter()
            .map(|(key, chars)| UsedFont {
                family: key.family.clone(),
                weight: key.weight,
                italic: key.italic,
                chars: chars.iter().collect(),
            })
            .collect();
        fonts.sort_by(|a, b| {
            (a.family.as_str(), a.weight, a.italic).cmp(&(b.family.as_str(), b.weight, b.italic))
        });
        fonts
    }
}

/// One font's entry in the serialized glyph listing.
#[derive(Debug, Clone, Serialize)]
pub struct UsedFont {
    pub family: String,
    pub weight: u32,
    pub italic: bool,
    pub chars: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_merge() {
        let helv = FontKey::new("Helvetica", 400, false);
        let times = FontKey::new("Times", 700, true);
        let mut a = UsedGlyphs::new();
        a.record(&helv, 'b');
        a.record(&helv, 'a');
        a.record(&helv, 'b');
        let mut b = UsedGlyphs::new();
        b.record(&helv, 'c');
        b.record(&times, 'x');
        a.merge(b);

        assert!(a.contains(&helv, 'c'));
        assert!(a.contains(&times, 'x'));
        let summary = a.summary();
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].family, "Helvetica");
        assert_eq!(summary[0].chars, "abc");
    }
}
