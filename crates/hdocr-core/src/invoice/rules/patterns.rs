//! Common regex patterns for model response parsing.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Markdown / ASCII table rules: |---|:---:|, ---|---, +----+----+, ====
    pub static ref SEPARATOR_LINE: Regex = Regex::new(
        r"^[\s|:+=\-]*(?:-{3,}|={3,})[\s|:+=\-]*$"
    ).unwrap();

    // Column gaps in whitespace-aligned tables: a tab or two+ spaces
    pub static ref ALIGNED_GAP: Regex = Regex::new(
        r"[ ]*\t[ \t]*|[ ]{2,}"
    ).unwrap();

    // Cell delimiters in delimited tables
    pub static ref CELL_DELIMITER: Regex = Regex::new(
        r"[|¦]"
    ).unwrap();

    // Outermost JSON array or object in a response
    pub static ref JSON_BLOCK: Regex = Regex::new(
        r"(?s)\[.*\]|\{.*\}"
    ).unwrap();

    // Markdown emphasis/code marks left around cell values
    pub static ref MARKUP: Regex = Regex::new(
        r"[*`|¦]+"
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separator_line() {
        assert!(SEPARATOR_LINE.is_match("|----------|----------|"));
        assert!(SEPARATOR_LINE.is_match("| :--- | ---: |"));
        assert!(SEPARATOR_LINE.is_match("---|---|---"));
        assert!(SEPARATOR_LINE.is_match("+------+------+"));
        assert!(!SEPARATOR_LINE.is_match("| Coca Cola | 2 |"));
        assert!(!SEPARATOR_LINE.is_match("| - | 2 |"));
    }

    #[test]
    fn test_aligned_gap() {
        let cells: Vec<&str> = ALIGNED_GAP.split("Tên hàng   Số lượng\tĐơn giá").collect();
        assert_eq!(cells, vec!["Tên hàng", "Số lượng", "Đơn giá"]);
    }
}
