//! Line-item table extraction from raw model text.
//!
//! The model answers with something table-shaped: a markdown table, a
//! column-aligned block, or either of those wrapped in prose. Lines are
//! classified one by one and fed through a two-state machine:
//!
//! ```text
//! SeekingHeader --header--> InTable(columns) --header--> InTable(columns')
//!                                 |
//!                              data row -> TableRow
//! ```
//!
//! A header fixes which column holds which field until the next header, so
//! several tables with different column orders can share one response.

use tracing::{debug, trace};

use crate::models::record::{Field, TableRow};

use super::rules::{ALIGNED_GAP, CELL_DELIMITER, SEPARATOR_LINE, fold_width, match_label};
use super::RowExtractor;

/// How cells are separated on a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Cells split by `|` (markdown) or `¦`.
    Delimited,
    /// Cells split by tabs or runs of two or more spaces.
    Aligned,
}

/// Column positions established by a header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    layout: Layout,
    width: usize,
    columns: [Option<usize>; 4],
}

impl ColumnMap {
    /// Column index holding `field`, if the header named it.
    pub fn column(&self, field: Field) -> Option<usize> {
        self.columns[field.index()]
    }

    /// Number of cells on the header line.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Number of fields the header named.
    pub fn mapped_fields(&self) -> usize {
        self.columns.iter().filter(|c| c.is_some()).count()
    }

    /// Whether a data line fits this header.
    fn accepts(&self, layout: Layout, cells: &[String]) -> bool {
        self.layout == layout && cells.len() >= self.width
    }

    fn row_from(&self, cells: &[String]) -> TableRow {
        let mut row = TableRow::default();
        for field in Field::ALL {
            if let Some(cell) = self.column(field).and_then(|idx| cells.get(idx)) {
                row.set(field, cell.as_str());
            }
        }
        row
    }
}

/// Classification of a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    Header(ColumnMap),
    DataRow(Vec<String>),
    Unrecognized,
}

#[derive(Debug)]
enum State {
    SeekingHeader,
    InTable(ColumnMap),
}

/// Extracts line-item rows from header-delimited tables.
#[derive(Debug, Clone)]
pub struct TableExtractor {
    min_header_fields: usize,
}

impl TableExtractor {
    /// Create an extractor requiring the name column plus two others.
    pub fn new() -> Self {
        Self {
            min_header_fields: 3,
        }
    }

    /// Set how many of the four fields a header must name (1..=4).
    pub fn with_min_header_fields(mut self, count: usize) -> Self {
        self.min_header_fields = count.clamp(1, 4);
        self
    }

    /// Classify one line given the header currently in force.
    pub fn classify(&self, line: &str, active: Option<&ColumnMap>) -> LineKind {
        let line = fold_width(line);
        let line = line.trim();
        if line.is_empty() || SEPARATOR_LINE.is_match(line) {
            return LineKind::Unrecognized;
        }

        let (layout, cells) = split_cells(line);

        if let Some(columns) = self.header_columns(layout, &cells) {
            return LineKind::Header(columns);
        }

        match active {
            Some(columns) if columns.accepts(layout, &cells) => LineKind::DataRow(cells),
            _ => LineKind::Unrecognized,
        }
    }

    /// Extract all rows in source order, across every table in `text`.
    pub fn extract(&self, text: &str) -> Vec<TableRow> {
        let mut state = State::SeekingHeader;
        let mut rows = Vec::new();
        let mut tables = 0usize;

        for (line_no, line) in text.lines().enumerate() {
            let active = match &state {
                State::InTable(columns) => Some(columns),
                State::SeekingHeader => None,
            };

            match self.classify(line, active) {
                LineKind::Header(columns) => {
                    trace!(
                        "Header at line {}: {:?} layout, {} of {} columns mapped",
                        line_no + 1,
                        columns.layout(),
                        columns.mapped_fields(),
                        columns.width()
                    );
                    tables += 1;
                    state = State::InTable(columns);
                }
                LineKind::DataRow(cells) => {
                    if let State::InTable(columns) = &state {
                        rows.push(columns.row_from(&cells));
                    }
                }
                LineKind::Unrecognized => {}
            }
        }

        debug!("Extracted {} rows from {} table headers", rows.len(), tables);
        rows
    }

    fn header_columns(&self, layout: Layout, cells: &[String]) -> Option<ColumnMap> {
        if cells.len() < 2 {
            return None;
        }

        // Strongest label per field; ties keep the leftmost column.
        let mut best: [Option<(usize, usize)>; 4] = [None; 4];
        for (idx, cell) in cells.iter().enumerate() {
            if let Some(label) = match_label(cell) {
                let slot = &mut best[label.field.index()];
                if slot.is_none_or(|(_, strength)| label.strength > strength) {
                    *slot = Some((idx, label.strength));
                }
            }
        }

        let columns = best.map(|slot| slot.map(|(idx, _)| idx));
        let mapped = columns.iter().filter(|c| c.is_some()).count();
        if columns[Field::Name.index()].is_none() || mapped < self.min_header_fields {
            return None;
        }

        Some(ColumnMap {
            layout,
            width: cells.len(),
            columns,
        })
    }
}

impl Default for TableExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl RowExtractor for TableExtractor {
    fn extract_rows(&self, text: &str) -> Vec<TableRow> {
        self.extract(text)
    }

    fn name(&self) -> &'static str {
        "table"
    }
}

/// Extract rows with default settings.
pub fn extract_rows(text: &str) -> Vec<TableRow> {
    TableExtractor::new().extract(text)
}

/// Split a trimmed line into cells, choosing the layout from its content.
fn split_cells(line: &str) -> (Layout, Vec<String>) {
    if CELL_DELIMITER.is_match(line) {
        let mut cells: Vec<String> = CELL_DELIMITER
            .split(line)
            .map(|c| c.trim().to_string())
            .collect();

        // "| a | b |" yields empty edge cells that are not columns.
        if line.ends_with(['|', '¦']) && cells.last().is_some_and(|c| c.is_empty()) {
            cells.pop();
        }
        if line.starts_with(['|', '¦']) && cells.first().is_some_and(|c| c.is_empty()) {
            cells.remove(0);
        }

        (Layout::Delimited, cells)
    } else {
        let cells = ALIGNED_GAP
            .split(line)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        (Layout::Aligned, cells)
    }
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
    fn test_markdown_table() {
        let text = "| Ten hang | So luong | Don gia | Thanh tien |\n| Coca Cola | 2 | 10000 | 20000 |";
        assert_eq!(extract_rows(text), vec![row("Coca Cola", "2", "10000", "20000")]);
    }

    #[test]
    fn test_markdown_table_with_separator_and_prose() {
        let text = r#"Dưới đây là các sản phẩm trong hóa đơn:

| Tên hàng | Số lượng | Đơn giá | Thành tiền |
|----------|----------|---------|------------|
| Hành lá | 1 | 35.000 | 35.000 |
| Nước mắm Nam Ngư | 3 | 42.000 | 126.000 |

Tổng cộng: 161.000 đ"#;

        assert_eq!(
            extract_rows(text),
            vec![
                row("Hành lá", "1", "35.000", "35.000"),
                row("Nước mắm Nam Ngư", "3", "42.000", "126.000"),
            ]
        );
    }

    #[test]
    fn test_rows_count_matches_source() {
        let mut text = String::from("| Tên hàng | Số lượng | Đơn giá | Thành tiền |\n|---|---|---|---|\n");
        for i in 0..25 {
            text.push_str(&format!("| Item {} | {} | 1000 | {} |\n", i, i + 1, (i + 1) * 1000));
        }

        let rows = extract_rows(&text);
        assert_eq!(rows.len(), 25);
        assert_eq!(rows[0].name, "Item 0");
        assert_eq!(rows[24].name, "Item 24");
    }

    #[test]
    fn test_column_order_is_taken_from_header() {
        let text = "| STT | Thành tiền | Tên hàng | ĐVT | Đơn giá | Số lượng |\n\
                    | 1 | 50.000 | Bánh mì | cái | 10.000 | 5 |";

        assert_eq!(extract_rows(text), vec![row("Bánh mì", "5", "10.000", "50.000")]);
    }

    #[test]
    fn test_code_column_does_not_take_name() {
        let text = "| Mã hàng hóa | Tên hàng hóa | Số lượng | Đơn giá | Thành tiền |\n\
                    | HH01 | Gạo | 2 | 20.000 | 40.000 |";
        assert_eq!(extract_rows(text), vec![row("Gạo", "2", "20.000", "40.000")]);
    }

    #[test]
    fn test_strongest_label_wins() {
        let text = "| Hàng hóa nhập | Tên hàng hóa | Số lượng | Đơn giá | Tổng cộng | Thành tiền |\n\
                    | Kho A | Muối | 3 | 5.000 | 15.000 | 15.000 |";
        let header = match TableExtractor::new().classify(text.lines().next().unwrap(), None) {
            LineKind::Header(columns) => columns,
            other => panic!("expected header, got {:?}", other),
        };
        assert_eq!(header.column(Field::Name), Some(1));
        assert_eq!(header.column(Field::Total), Some(5));
        assert_eq!(extract_rows(text), vec![row("Muối", "3", "5.000", "15.000")]);
    }

    #[test]
    fn test_headers_qualified_with_tax() {
        let text = "| Tên hàng | Số lượng | Đơn giá | Thành tiền (đã gồm VAT) |\n\
                    | Gạo | 2 | 20.000 | 40.000 |";
        assert_eq!(extract_rows(text), vec![row("Gạo", "2", "20.000", "40.000")]);

        let text = "| Tên hàng | Số lượng | Đơn giá chưa thuế | Thuế suất | Tiền thuế GTGT | Thành tiền |\n\
                    | Gạo | 2 | 20.000 | 10% | 4.000 | 44.000 |";
        assert_eq!(extract_rows(text), vec![row("Gạo", "2", "20.000", "44.000")]);
    }

    #[test]
    fn test_two_tables_each_with_own_order() {
        let text = "Trang 1\n\
                    | Tên hàng | Số lượng | Đơn giá | Thành tiền |\n\
                    | Sữa tươi | 2 | 30000 | 60000 |\n\
                    Hết trang 1, tiếp theo là trang 2.\n\
                    | Thành tiền | Đơn giá | Số lượng | Tên hàng |\n\
                    | 15000 | 15000 | 1 | Bánh quy |\n\
                    | 8000 | 4000 | 2 | Kẹo |";

        assert_eq!(
            extract_rows(text),
            vec![
                row("Sữa tươi", "2", "30000", "60000"),
                row("Bánh quy", "1", "15000", "15000"),
                row("Kẹo", "2", "4000", "8000"),
            ]
        );
    }

    #[test]
    fn test_aligned_columns() {
        let text = "Tên hàng        Số lượng    Đơn giá    Thành tiền\n\
                    Cà phê sữa      2           25.000     50.000\n\
                    Trà đào\t1\t30.000\t30.000";

        assert_eq!(
            extract_rows(text),
            vec![
                row("Cà phê sữa", "2", "25.000", "50.000"),
                row("Trà đào", "1", "30.000", "30.000"),
            ]
        );
    }

    #[test]
    fn test_full_width_delimiters() {
        let text = "｜Tên hàng｜Số lượng｜Đơn giá｜Thành tiền｜\n｜Mì gói｜１０｜３.５００｜３５.０００｜";
        assert_eq!(extract_rows(text), vec![row("Mì gói", "10", "3.500", "35.000")]);
    }

    #[test]
    fn test_short_rows_are_discarded() {
        let text = "| Tên hàng | Số lượng | Đơn giá | Thành tiền |\n\
                    | Chỉ có tên | 2 |\n\
                    | Gạo | 1 | 20000 | 20000 |";

        assert_eq!(extract_rows(text), vec![row("Gạo", "1", "20000", "20000")]);
    }

    #[test]
    fn test_empty_cells_keep_their_position() {
        let text = "| Tên hàng | Số lượng | Đơn giá | Thành tiền |\n| Phí giao hàng | | | 15000 |";
        assert_eq!(extract_rows(text), vec![row("Phí giao hàng", "", "", "15000")]);
    }

    #[test]
    fn test_repeated_header_is_not_a_row() {
        let text = "| Tên hàng | Số lượng | Đơn giá | Thành tiền |\n\
                    | A | 1 | 1 | 1 |\n\
                    | Tên hàng | Số lượng | Đơn giá | Thành tiền |\n\
                    | B | 2 | 2 | 4 |";

        let names: Vec<String> = extract_rows(text).into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_no_header_yields_nothing() {
        assert!(extract_rows("").is_empty());
        assert!(extract_rows("Xin lỗi, tôi không đọc được hóa đơn này.").is_empty());
        assert!(extract_rows("| Coca Cola | 2 | 10000 | 20000 |").is_empty());
        assert!(extract_rows("|||\n|---|\n| | |").is_empty());
    }

    #[test]
    fn test_header_without_rows_yields_nothing() {
        assert!(extract_rows("| Tên hàng | Số lượng | Đơn giá | Thành tiền |\n|---|---|---|---|").is_empty());
    }

    #[test]
    fn test_header_threshold() {
        let text = "| Tên hàng | Số lượng |\n| Gạo | 1 |";
        assert!(extract_rows(text).is_empty());

        let lenient = TableExtractor::new().with_min_header_fields(2);
        assert_eq!(lenient.extract(text), vec![row("Gạo", "1", "", "")]);

        let three = "| Tên hàng | Số lượng | Thành tiền |\n| Gạo | 1 | 20000 |";
        assert_eq!(extract_rows(three), vec![row("Gạo", "1", "", "20000")]);
        assert!(TableExtractor::new().with_min_header_fields(4).extract(three).is_empty());
    }

    #[test]
    fn test_classify() {
        let extractor = TableExtractor::new();
        let header = match extractor.classify("| Tên hàng | SL | Đơn giá | Thành tiền |", None) {
            LineKind::Header(columns) => columns,
            other => panic!("expected header, got {:?}", other),
        };
        assert_eq!(header.column(Field::Quantity), Some(1));
        assert_eq!(header.width(), 4);
        assert_eq!(header.layout(), Layout::Delimited);

        assert_eq!(
            extractor.classify("|---|---|---|---|", Some(&header)),
            LineKind::Unrecognized
        );
        assert_eq!(
            extractor.classify("| A | 1 | 2 | 2 |", Some(&header)),
            LineKind::DataRow(vec!["A".into(), "1".into(), "2".into(), "2".into()])
        );
        assert_eq!(
            extractor.classify("| A | 1 | 2 | 2 |", None),
            LineKind::Unrecognized
        );
        assert_eq!(
            extractor.classify("A    1    2    2", Some(&header)),
            LineKind::Unrecognized
        );
    }

    #[test]
    fn test_garbage_never_panics() {
        let inputs = [
            "||||||||",
            "| ｜ ¦ |",
            "\t\t\t",
            "Tên hàng | | | |",
            "| Tên hàng | Số lượng | Đơn giá | Thành tiền |\n|",
            "\u{FEFF}| Tên hàng |",
        ];
        for input in inputs {
            let _ = extract_rows(input);
        }
    }
}
