//! Greedy word-wrap against measured font widths

use super::font::Font;

/// Split `text` into lines no wider than `max_width` points.
///
/// Hard line breaks in `text` always start a new line. Words are packed
/// greedily, separated by single spaces; a word that cannot fit on a line
/// by itself is broken between characters. Blank input yields no lines.
pub fn split_lines(text: &str, font: Font, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    for segment in text.lines() {
        wrap_segment(segment, font, size, max_width, &mut lines);
    }
    lines
}

fn wrap_segment(segment: &str, font: Font, size: f32, max_width: f32, lines: &mut Vec<String>) {
    // Widths are summed in integer font units so the fit check agrees
    // exactly with `Font::string_width` of the finished line.
    let fits = |units: u32| Font::units_to_points(units, size) <= max_width;
    let space = font.units(" ");
    let mut current = String::new();
    let mut current_units = 0u32;

    for word in segment.split_whitespace() {
        let word_units = font.units(word);

        if !current.is_empty() && fits(current_units + space + word_units) {
            current.push(' ');
            current.push_str(word);
            current_units += space + word_units;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }

        if fits(word_units) {
            current.push_str(word);
            current_units = word_units;
        } else {
            let mut pieces = break_word(word, font, &fits);
            let last = pieces.pop().unwrap_or_default();
            lines.extend(pieces);
            current_units = font.units(&last);
            current = last;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
}

/// Break an over-long word into pieces that each fit. Every piece holds
/// at least one character.
fn break_word(word: &str, font: Font, fits: &dyn Fn(u32) -> bool) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    let mut units = 0u32;
    for c in word.chars() {
        let w = u32::from(font.char_width(c));
        if !piece.is_empty() && !fits(units + w) {
            pieces.push(std::mem::take(&mut piece));
            units = 0;
        }
        piece.push(c);
        units += w;
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}
