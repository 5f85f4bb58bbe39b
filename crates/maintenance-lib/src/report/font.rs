//! Metrics for the two standard PDF fonts used by the report
//!
//! Advance widths come from the Adobe Helvetica and Helvetica-Bold AFM
//! files, in thousandths of the font size, for WinAnsi code points.

use serde::{Deserialize, Serialize};

/// Standard Type1 fonts available without embedding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Font {
    Helvetica,
    HelveticaBold,
}

/// Widths for ASCII 32..=126
#[rustfmt::skip]
const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD_ASCII: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

impl Font {
    /// Base font name as written into the PDF
    pub fn base_name(&self) -> &'static str {
        match self {
            Font::Helvetica => "Helvetica",
            Font::HelveticaBold => "Helvetica-Bold",
        }
    }

    /// Advance width of one character in 1/1000 em
    pub fn char_width(&self, c: char) -> u16 {
        let (ascii, bold) = match self {
            Font::Helvetica => (&HELVETICA_ASCII, false),
            Font::HelveticaBold => (&HELVETICA_BOLD_ASCII, true),
        };
        match c {
            ' '..='~' => ascii[c as usize - 32],
            '\u{2018}' | '\u{2019}' | '\u{201A}' => if bold { 278 } else { 222 },
            '\u{201C}' | '\u{201D}' | '\u{201E}' => if bold { 500 } else { 333 },
            '\u{2022}' => 350,
            '\u{2013}' => 556,
            '\u{2014}' | '\u{2026}' | '\u{2030}' | '\u{2122}' => 1000,
            '\u{00A0}' => 278,
            '\u{00B0}' => 400,
            _ => if bold { 611 } else { 556 },
        }
    }

    /// Total advance of `text` in 1/1000 em
    pub fn units(&self, text: &str) -> u32 {
        text.chars().map(|c| u32::from(self.char_width(c))).sum()
    }

    /// Width in points of a run measuring `units`
    pub fn units_to_points(units: u32, size: f32) -> f32 {
        units as f32 * size / 1000.0
    }

    /// Rendered width of `text` at `size` points
    pub fn string_width(&self, text: &str, size: f32) -> f32 {
        Self::units_to_points(self.units(text), size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_widths() {
        assert_eq!(Font::Helvetica.char_width(' '), 278);
        assert_eq!(Font::Helvetica.char_width('A'), 667);
        assert_eq!(Font::Helvetica.char_width('i'), 222);
        assert_eq!(Font::Helvetica.char_width('~'), 584);
        assert_eq!(Font::HelveticaBold.char_width('A'), 722);
        assert_eq!(Font::HelveticaBold.char_width('m'), 889);
    }

    #[test]
    fn test_string_width_scales_with_size() {
        let w10 = Font::Helvetica.string_width("Steel", 10.0);
        let w20 = Font::Helvetica.string_width("Steel", 20.0);
        assert!((w20 - 2.0 * w10).abs() < 1e-4);
        // S=667 t=278 e=556 e=556 l=222
        assert!((w10 - 22.79).abs() < 1e-3);
    }

    #[test]
    fn test_dash_rule_fits_page() {
        let rule = "-".repeat(90);
        assert!((Font::Helvetica.string_width(&rule, 10.0) - 299.7).abs() < 1e-3);
    }
}
