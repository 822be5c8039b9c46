//! Record normalization: raw table cells to canonical product records.

use crate::models::record::{Field, ProductRecord, TableRow};

use super::rules::{MARKUP, canonical_amount, collapse_whitespace, fold_width};

/// Turns [`TableRow`]s into [`ProductRecord`]s.
///
/// Names keep their diacritics and only lose table/markdown debris; the
/// numeric fields go through [`canonical_amount`]. Rows that end up with
/// all four fields empty are dropped.
#[derive(Debug, Clone, Default)]
pub struct RecordNormalizer;

impl RecordNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalize one row; `None` when nothing is left of it.
    pub fn normalize(&self, row: &TableRow) -> Option<ProductRecord> {
        let record = ProductRecord {
            name: normalize_name(row.get(Field::Name)),
            quantity: canonical_amount(row.get(Field::Quantity)),
            unit_price: canonical_amount(row.get(Field::UnitPrice)),
            total: canonical_amount(row.get(Field::Total)),
        };

        let blank = Field::ALL.iter().all(|f| record.get(*f).is_empty());
        (!blank).then_some(record)
    }

    /// Normalize rows in order, dropping the empty ones.
    pub fn normalize_all(&self, rows: &[TableRow]) -> Vec<ProductRecord> {
        rows.iter().filter_map(|row| self.normalize(row)).collect()
    }
}

/// Normalize rows with the default normalizer.
pub fn normalize_rows(rows: &[TableRow]) -> Vec<ProductRecord> {
    RecordNormalizer::new().normalize_all(rows)
}

/// Strip delimiter leftovers and markdown marks, collapse whitespace.
pub fn normalize_name(raw: &str) -> String {
    let folded = fold_width(raw);
    collapse_whitespace(&MARKUP.replace_all(&folded, " "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(name: &str, quantity: &str, unit_price: &str, total: &str) -> TableRow {
        TableRow {
            name: name.to_string(),
            quantity: quantity.to_string(),
            unit_price: unit_price.to_string(),
            total: total.to_string(),
        }
    }

    #[test]
    fn test_normalize_row() {
        let record = RecordNormalizer::new()
            .normalize(&row("  **Nước   mắm** | ", " 3 chai ", "42.000 đ", "126,000 VND"))
            .unwrap();

        assert_eq!(
            record,
            ProductRecord {
                name: "Nước mắm".into(),
                quantity: "3".into(),
                unit_price: "42000".into(),
                total: "126000".into(),
            }
        );
    }

    #[test]
    fn test_diacritics_preserved() {
        assert_eq!(normalize_name("Bánh mì thịt nướng"), "Bánh mì thịt nướng");
        assert_eq!(normalize_name("`Phở bò`"), "Phở bò");
    }

    #[test]
    fn test_blank_rows_dropped() {
        let rows = vec![
            row("", "", "", ""),
            row(" | ", "-", "đ", "**"),
            row("", "", "", "15.000"),
        ];

        let records = normalize_rows(&rows);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].total, "15000");
        assert_eq!(records[0].name, "");
    }

    #[test]
    fn test_never_contains_delimiter() {
        let record = RecordNormalizer::new()
            .normalize(&row("A | B ¦ C", "1|2", "|", "3"))
            .unwrap();
        for field in Field::ALL {
            assert!(!record.get(field).contains('|'));
        }
        assert_eq!(record.name, "A B C");
    }

    #[test]
    fn test_idempotent() {
        let normalizer = RecordNormalizer::new();
        let rows = vec![
            row("Coca Cola", "2", "10000", "20000"),
            row(" ｜Trà   sữa｜", "1,5", "1.234,50 đ", "2.000.000"),
            row("Đường", "007", "0.500", "-5.000"),
        ];

        for raw in rows {
            let once = normalizer.normalize(&raw).unwrap();
            let twice = normalizer.normalize(&TableRow::from(once.clone())).unwrap();
            assert_eq!(twice, once);
        }
    }
}
