//! Greedy word wrapping against a measured maximum width.

use super::measure::TextMeasure;

/// Wrap `text` into lines no wider than `max_width` at `font_size`.
///
/// * Explicit newlines start a new line; blank input lines are kept as
///   empty lines.
/// * Runs of whitespace between words collapse to one space.
/// * A word wider than `max_width` is broken between characters; every
///   emitted line holds at least one character so wrapping always
///   terminates.
pub fn wrap_text(
    text: &str,
    max_width: f32,
    font_size: f32,
    measure: &dyn TextMeasure,
) -> Vec<String> {
    let fits = |s: &str| measure.width(s, font_size) <= max_width;
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut any_word = false;

        for word in paragraph.split_whitespace() {
            any_word = true;
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if fits(&candidate) {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if fits(word) {
                current = word.to_string();
            } else {
                let mut pieces = break_word(word, &fits);
                current = pieces.pop().unwrap_or_default();
                lines.extend(pieces);
            }
        }

        if any_word {
            lines.push(current);
        } else {
            lines.push(String::new());
        }
    }

    lines
}

/// Split a single overlong word into pieces that each fit.
fn break_word(word: &str, fits: &dyn Fn(&str) -> bool) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();

    for ch in word.chars() {
        piece.push(ch);
        if !fits(&piece) && piece.chars().count() > 1 {
            piece.pop();
            pieces.push(std::mem::take(&mut piece));
            piece.push(ch);
        }
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}
