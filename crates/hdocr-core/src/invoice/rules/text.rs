//! Character-level folding shared by the table and label rules.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Fold full-width ASCII and exotic spaces to their plain forms.
///
/// Maps U+FF01..=U+FF5E onto ASCII (`｜` → `|`, `１` → `1`), box-drawing
/// verticals onto `|`, and non-breaking or ideographic spaces onto ` `.
/// Vietnamese letters are left exactly as written.
pub fn fold_width(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
            '\u{2502}' | '\u{2503}' | '\u{2223}' => '|',
            '\u{00A0}' | '\u{2007}' | '\u{202F}' | '\u{3000}' => ' ',
            _ => c,
        })
        .collect()
}

/// Lowercase, strip diacritics (`đ` → `d`), and reduce to space-separated words.
///
/// Used for matching header labels; never applied to emitted values.
pub fn fold_label(text: &str) -> String {
    let stripped: String = fold_width(text)
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| match c {
            'đ' => 'd',
            c if c.is_alphanumeric() => c,
            _ => ' ',
        })
        .collect();

    collapse_whitespace(&stripped)
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
