//! TrueType / OpenType metric extraction via ttf-parser.

use std::collections::HashMap;

use ttf_parser::{Face, GlyphId};

use super::{FontMetrics, LineMetric};
use crate::error::FlowError;

/// Characters checked to decide whether a font is a CJK font.
const CJK_SAMPLES: [char; 4] = ['\u{4E00}', '\u{3042}', '\u{30A2}', '\u{AC00}'];

/// Highest code point whose pairs are pulled from the `kern` table.
const KERN_RANGE_END: u32 = 0x24F;

impl FontMetrics {
    /// Parse metrics from font data using ttf-parser.
    pub fn from_truetype(name: &str, data: &[u8]) -> Result<Self, FlowError> {
        let face = Face::parse(data, 0)
            .map_err(|e| FlowError::FontError(format!("Failed to parse '{}': {:?}", name, e)))?;

        let mut advances = HashMap::new();
        let mut glyph_ids: Vec<(char, GlyphId)> = Vec::new();
        for code in 32u32..=0xFFFF {
            let Some(ch) = char::from_u32(code) else {
                continue;
            };
            if let Some(gid) = face.glyph_index(ch) {
                advances.insert(ch, face.glyph_hor_advance(gid).unwrap_or(0));
                if code <= KERN_RANGE_END {
                    glyph_ids.push((ch, gid));
                }
            }
        }

        let is_cjk = CJK_SAMPLES.iter().any(|&ch| face.glyph_index(ch).is_some());
        let kerning = if is_cjk {
            HashMap::new()
        } else {
            kerning_pairs(&face, &glyph_ids)
        };

        // A zero ascender means the hhea/OS2 tables carry nothing useful.
        let (ascent, descent) = match (face.ascender(), face.descender()) {
            (0, 0) => (None, None),
            (a, d) => (Some(a), Some(d)),
        };

        Ok(FontMetrics {
            name: name.to_string(),
            units_per_em: face.units_per_em(),
            advances,
            missing_width: face.glyph_hor_advance(GlyphId(0)),
            ascent,
            descent,
            x_height: face.x_height(),
            underline: face.underline_metrics().map(|m| LineMetric {
                position: m.position,
                thickness: m.thickness,
            }),
            strikeout: face.strikeout_metrics().map(|m| LineMetric {
                position: m.position,
                thickness: m.thickness,
            }),
            kerning,
            is_cjk,
            is_core: false,
        })
    }
}

/// Collect horizontal pair adjustments from the legacy `kern` table.
fn kerning_pairs(face: &Face<'_>, glyphs: &[(char, GlyphId)]) -> HashMap<(char, char), i16> {
    let mut pairs = HashMap::new();
    let Some(kern) = face.tables().kern else {
        return pairs;
    };
    for subtable in kern.subtables {
        if !subtable.horizontal || subtable.has_cross_stream {
            continue;
        }
        for &(left, lgid) in glyphs {
            for &(right, rgid) in glyphs {
                if pairs.contains_key(&(left, right)) {
                    continue;
                }
                if let Some(k) = subtable.glyphs_kerning(lgid, rgid) {
                    if k != 0 {
                        pairs.insert((left, right), k);
                    }
                }
            }
        }
    }
    pairs
}
