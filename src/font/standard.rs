//! Built-in metrics for the core PDF fonts.
//!
//! Widths come from the Adobe AFM files (thousandths of an em) for the
//! printable ASCII range. Latin-1 letters borrow the width of their base
//! letter, which is exact for the accented forms in these fonts.

use std::collections::HashMap;

use super::{FontMetrics, LineMetric};

/// The core fonts that ship with every PDF reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
    TimesRoman,
    TimesBold,
    TimesItalic,
    TimesBoldItalic,
    Courier,
    CourierBold,
    CourierOblique,
    CourierBoldOblique,
}

impl StandardFont {
    /// The PDF name for this font.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::HelveticaOblique => "Helvetica-Oblique",
            Self::HelveticaBoldOblique => "Helvetica-BoldOblique",
            Self::TimesRoman => "Times-Roman",
            Self::TimesBold => "Times-Bold",
            Self::TimesItalic => "Times-Italic",
            Self::TimesBoldItalic => "Times-BoldItalic",
            Self::Courier => "Courier",
            Self::CourierBold => "Courier-Bold",
            Self::CourierOblique => "Courier-Oblique",
            Self::CourierBoldOblique => "Courier-BoldOblique",
        }
    }

    /// Build the metric table for this font.
    pub fn metrics(&self) -> FontMetrics {
        let (widths, ascent, descent, x_height): (&[u16; 95], i16, i16, i16) = match self {
            Self::Helvetica | Self::HelveticaOblique => (&HELVETICA, 718, -207, 523),
            Self::HelveticaBold | Self::HelveticaBoldOblique => (&HELVETICA_BOLD, 718, -207, 532),
            Self::TimesRoman | Self::TimesItalic => (&TIMES_ROMAN, 683, -217, 450),
            Self::TimesBold | Self::TimesBoldItalic => (&TIMES_BOLD, 676, -205, 461),
            _ => (&[600; 95], 629, -157, 426),
        };

        let mut advances: HashMap<char, u16> = (0x20u8..=0x7E)
            .map(|b| (b as char, widths[(b - 0x20) as usize]))
            .collect();
        for code in 0xA0u32..=0xFF {
            let Some(ch) = char::from_u32(code) else {
                continue;
            };
            if let Some(w) = latin1_base(ch).and_then(|base| advances.get(&base).copied()) {
                advances.insert(ch, w);
            }
        }
        let hyphen = advances.get(&'-').copied().unwrap_or(333);
        let quote = advances.get(&'\'').copied().unwrap_or(222);
        let dquote = advances.get(&'"').copied().unwrap_or(333);
        let period = advances.get(&'.').copied().unwrap_or(278);
        for (ch, w) in [
            ('\u{2010}', hyphen),
            ('\u{2011}', hyphen),
            ('\u{2013}', if self.is_courier() { 600 } else { 500 + (hyphen / 6) }),
            ('\u{2014}', if self.is_courier() { 600 } else { 1000 }),
            ('\u{2018}', quote),
            ('\u{2019}', quote),
            ('\u{201C}', dquote),
            ('\u{201D}', dquote),
            ('\u{2022}', if self.is_courier() { 600 } else { 350 }),
            ('\u{2026}', if self.is_courier() { 600 } else { period * 3 + 166 }),
        ] {
            advances.insert(ch, w);
        }

        let kerning = if matches!(self, Self::Helvetica | Self::HelveticaOblique) {
            HELVETICA_KERNING
                .iter()
                .map(|&(a, b, k)| ((a, b), k))
                .collect()
        } else {
            HashMap::new()
        };

        FontMetrics {
            name: self.pdf_name().to_string(),
            units_per_em: 1000,
            advances,
            missing_width: None,
            ascent: Some(ascent),
            descent: Some(descent),
            x_height: Some(x_height),
            underline: Some(LineMetric {
                position: -100,
                thickness: 50,
            }),
            strikeout: None,
            kerning,
            is_cjk: false,
            is_core: true,
        }
    }

    fn is_courier(&self) -> bool {
        matches!(
            self,
            Self::Courier | Self::CourierBold | Self::CourierOblique | Self::CourierBoldOblique
        )
    }
}

/// Base letter of an accented Latin-1 character, or the ASCII character
/// with the same width for the few punctuation marks we map.
fn latin1_base(ch: char) -> Option<char> {
    Some(match ch {
        '\u{00A0}' => ' ',
        '\u{00AD}' => '-',
        'À'..='Å' => 'A',
        'Ç' => 'C',
        'È'..='Ë' => 'E',
        'Ì'..='Ï' => 'I',
        'Ð' => 'D',
        'Ñ' => 'N',
        'Ò'..='Ö' | 'Ø' => 'O',
        'Ù'..='Ü' => 'U',
        'Ý' => 'Y',
        'à'..='å' => 'a',
        'ç' => 'c',
        'è'..='ë' => 'e',
        'ì'..='ï' => 'i',
        'ñ' => 'n',
        'ò'..='ö' | 'ø' => 'o',
        'ù'..='ü' => 'u',
        'ý' | 'ÿ' => 'y',
        '«' | '»' => '<',
        '×' => '+',
        '÷' => '+',
        _ => return None,
    })
}

#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

#[rustfmt::skip]
const TIMES_ROMAN: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444,
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722,
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500,
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500,
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,
];

#[rustfmt::skip]
const TIMES_BOLD: [u16; 95] = [
    250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500,
    930, 722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944, 722, 778,
    611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667, 333, 278, 333, 581, 500,
    333, 500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833, 556, 500,
    556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444, 394, 220, 394, 520,
];

/// A subset of the Helvetica KPX table.
const HELVETICA_KERNING: &[(char, char, i16)] = &[
    ('A', 'T', -120),
    ('A', 'V', -70),
    ('A', 'W', -50),
    ('A', 'Y', -100),
    ('A', 'v', -40),
    ('A', 'w', -40),
    ('A', 'y', -40),
    ('F', 'A', -80),
    ('F', ',', -150),
    ('F', '.', -150),
    ('L', 'T', -110),
    ('L', 'V', -110),
    ('L', 'W', -70),
    ('L', 'Y', -140),
    ('P', 'A', -120),
    ('P', ',', -180),
    ('P', '.', -180),
    ('T', 'A', -120),
    ('T', 'a', -120),
    ('T', 'e', -120),
    ('T', 'o', -120),
    ('T', ',', -120),
    ('T', '.', -120),
    ('V', 'A', -80),
    ('V', 'a', -70),
    ('V', 'e', -80),
    ('V', 'o', -80),
    ('W', 'A', -50),
    ('W', 'a', -40),
    ('W', 'o', -30),
    ('Y', 'A', -110),
    ('Y', 'a', -140),
    ('Y', 'e', -140),
    ('Y', 'o', -140),
    ('r', ',', -50),
    ('r', '.', -50),
    ('v', ',', -90),
    ('v', '.', -90),
    ('y', ',', -100),
    ('y', '.', -100),
];
