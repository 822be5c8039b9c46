//! Header label recognition for Vietnamese line-item tables.

use crate::models::record::Field;

use super::text::fold_label;

/// Folded label synonyms per field.
///
/// Matching is exact first, then the longest synonym that appears as a
/// contiguous word sequence inside the folded cell.
const LABELS: &[(Field, &[&str])] = &[
    (
        Field::Name,
        &[
            "ten",
            "ten hang",
            "ten hang hoa",
            "ten hang hoa dich vu",
            "ten san pham",
            "ten mat hang",
            "ten sp",
            "san pham",
            "hang hoa",
            "mat hang",
            "dien giai",
            "noi dung",
            "mo ta",
            "product",
            "product name",
            "item",
            "items",
            "name",
            "description",
        ],
    ),
    (
        Field::Quantity,
        &["so luong", "sl", "khoi luong", "qty", "quantity"],
    ),
    (
        Field::UnitPrice,
        &[
            "don gia",
            "dg",
            "gia",
            "gia ban",
            "don gia ban",
            "unit price",
            "price",
        ],
    ),
    (
        Field::Total,
        &[
            "thanh tien",
            "tong tien",
            "tong",
            "thanh toan",
            "so tien",
            "total",
            "amount",
        ],
    ),
];

/// Words that mark tax/discount columns, which must not be read as totals.
const EXCLUDED_WORDS: &[&str] = &["thue", "vat", "tax", "chiet", "discount"];

/// Leading words of code and row-number columns (`Mã hàng hóa`, `STT`).
const CODE_PREFIXES: &[&str] = &["ma", "stt"];

/// Strength of an exact label match; contained synonyms rank by length.
pub const EXACT_MATCH: usize = usize::MAX;

/// A header cell recognized as a field label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelMatch {
    pub field: Field,
    /// [`EXACT_MATCH`], or the length of the synonym found in the cell.
    pub strength: usize,
}

/// Map a header cell to the field it labels, if any.
///
/// A tax or discount word only disqualifies the cell when no synonym
/// appears before it, so `Thành tiền (đã gồm VAT)` is still a total while
/// `Tiền thuế GTGT` is not.
pub fn match_label(cell: &str) -> Option<LabelMatch> {
    let folded = fold_label(cell);
    let words: Vec<&str> = folded.split(' ').filter(|w| !w.is_empty()).collect();
    let first = *words.first()?;
    if CODE_PREFIXES.contains(&first) {
        return None;
    }

    let cutoff = words
        .iter()
        .position(|w| EXCLUDED_WORDS.contains(w))
        .unwrap_or(words.len());
    let labelled = &words[..cutoff];

    let mut best: Option<LabelMatch> = None;
    for (field, synonyms) in LABELS {
        for synonym in *synonyms {
            if folded == *synonym {
                return Some(LabelMatch {
                    field: *field,
                    strength: EXACT_MATCH,
                });
            }

            let synonym_words: Vec<&str> = synonym.split(' ').collect();
            if contains_words(labelled, &synonym_words)
                && best.is_none_or(|b| synonym.len() > b.strength)
            {
                best = Some(LabelMatch {
                    field: *field,
                    strength: synonym.len(),
                });
            }
        }
    }

    best
}

fn contains_words(haystack: &[&str], needle: &[&str]) -> bool {
    !needle.is_empty()
        && haystack.len() >= needle.len()
        && haystack.windows(needle.len()).any(|w| w == needle)
}
