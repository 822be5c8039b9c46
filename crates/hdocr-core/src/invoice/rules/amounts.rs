//! Canonical formatting for quantity and money cells.
//!
//! Values stay strings: currency marks, units, and thousands grouping are
//! dropped, while leading zeros and the decimal character are kept as the
//! model wrote them.

use super::text::fold_width;

/// Canonicalize a quantity or amount cell (`"10.000 đ"` → `"10000"`).
///
/// Returns an empty string when the cell holds no digit.
pub fn canonical_amount(raw: &str) -> String {
    let text = fold_width(raw);
    let chars: Vec<char> = text.chars().collect();

    let Some(start) = chars.iter().position(|c| c.is_ascii_digit()) else {
        return String::new();
    };
    let negative = start > 0 && chars[start - 1] == '-';

    let mut core = String::new();
    let mut i = start;
    while i < chars.len() {
        let c = chars[i];
        let next_is_digit = chars.get(i + 1).is_some_and(|n| n.is_ascii_digit());
        match c {
            '0'..='9' => core.push(c),
            '.' | ',' if next_is_digit => core.push(c),
            ' ' | '\'' if next_is_digit => {}
            _ => break,
        }
        i += 1;
    }

    let resolved = resolve_separators(&core);
    if negative {
        format!("-{}", resolved)
    } else {
        resolved
    }
}

/// Drop grouping separators from a run of digits, `.` and `,`.
fn resolve_separators(core: &str) -> String {
    let has_dot = core.contains('.');
    let has_comma = core.contains(',');

    match (has_dot, has_comma) {
        (false, false) => core.to_string(),
        (true, true) => {
            // The separator written last is the decimal one.
            let decimal = core
                .chars()
                .rev()
                .find(|c| *c == '.' || *c == ',')
                .unwrap_or('.');
            let grouping = if decimal == ',' { '.' } else { ',' };
            let ungrouped: String = core.chars().filter(|c| *c != grouping).collect();
            resolve_single(&ungrouped, decimal)
        }
        (true, false) => resolve_single(core, '.'),
        (false, true) => resolve_single(core, ','),
    }
}

/// Decide whether the only separator kind present is grouping or decimal.
fn resolve_single(core: &str, separator: char) -> String {
    let strip = || core.chars().filter(|c| *c != separator).collect::<String>();

    match core.matches(separator).count() {
        0 => core.to_string(),
        1 => {
            let (integer, fraction) = core.split_once(separator).unwrap_or((core, ""));
            let looks_grouped = fraction.len() == 3
                && (1..=3).contains(&integer.len())
                && !integer.starts_with('0');
            if looks_grouped { strip() } else { core.to_string() }
        }
        _ => strip(),
    }
}
