//! Font metrics for the reference measurer

use serde::{Deserialize, Serialize};

/// Approximate metrics of a proportional text face, in ems.
///
/// Advances are grouped by character class rather than stored per glyph;
/// good enough to paginate deterministically without a shaping engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FontMetrics {
    /// Line height as a multiple of the font size
    pub line_height_em: f64,
    /// Spaces, including non-breaking ones
    pub space_em: f64,
    /// Slim glyphs such as `i`, `l`, punctuation
    pub narrow_em: f64,
    /// Broad glyphs such as `m`, `W`
    pub wide_em: f64,
    pub uppercase_em: f64,
    /// CJK and other full-width characters
    pub full_width_em: f64,
    pub default_em: f64,
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self {
            line_height_em: 1.5,
            space_em: 0.28,
            narrow_em: 0.28,
            wide_em: 0.85,
            uppercase_em: 0.66,
            full_width_em: 1.0,
            default_em: 0.52,
        }
    }
}

impl FontMetrics {
    /// Line height in pixels at `font_size`
    pub fn line_height(&self, font_size: f64) -> f64 {
        self.line_height_em * font_size
    }

    /// Advance of a character in pixels
    pub fn advance(&self, c: char, font_size: f64) -> f64 {
        self.advance_em(c) * font_size
    }

    /// Advance of a grapheme cluster: its first scalar value, combining
    /// marks after it take no space
    pub fn grapheme_advance(&self, grapheme: &str, font_size: f64) -> f64 {
        grapheme
            .chars()
            .next()
            .map(|c| self.advance(c, font_size))
            .unwrap_or(0.0)
    }

    fn advance_em(&self, c: char) -> f64 {
        if c.is_control() {
            return 0.0;
        }
        if c == ' ' || c == '\u{a0}' || c == '\t' {
            return self.space_em;
        }
        if is_full_width(c) {
            return self.full_width_em;
        }
        match c {
            'i' | 'j' | 'l' | 'f' | 't' | 'I' | '.' | ',' | ';' | ':' | '\'' | '!' | '|' | '`'
            | '(' | ')' | '[' | ']' => self.narrow_em,
            'm' | 'w' | 'M' | 'W' | '@' | '%' | '\u{2014}' => self.wide_em,
            _ if c.is_uppercase() => self.uppercase_em,
            _ => self.default_em,
        }
    }
}

fn is_full_width(c: char) -> bool {
    matches!(
        c as u32,
        0x1100..=0x115F
            | 0x2E80..=0xA4CF
            | 0xAC00..=0xD7A3
            | 0xF900..=0xFAFF
            | 0xFE30..=0xFE4F
            | 0xFF00..=0xFF60
            | 0xFFE0..=0xFFE6
    )
}
