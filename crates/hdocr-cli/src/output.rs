//! Rendering results for the terminal and for files.

use std::path::Path;

use serde_json::{Map, Value, json};

use hdocr_core::{BatchReport, Field, ItemResult, ProductRecord};

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output, one line per product
    Csv,
    /// Plain text listing
    Text,
}

/// Which names the product fields get in the output.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum FieldNaming {
    /// name, quantity, unit_price, total
    #[default]
    English,
    /// ten_hang, so_luong, don_gia, thanh_tien
    Vietnamese,
}

/// Output names for every field: (field, english, vietnamese).
pub const FIELD_NAMES: [(Field, &str, &str); 4] = [
    (Field::Name, "name", "ten_hang"),
    (Field::Quantity, "quantity", "so_luong"),
    (Field::UnitPrice, "unit_price", "don_gia"),
    (Field::Total, "total", "thanh_tien"),
];

impl FieldNaming {
    pub fn key(self, field: Field) -> &'static str {
        let (_, english, vietnamese) = FIELD_NAMES[field.index()];
        match self {
            FieldNaming::English => english,
            FieldNaming::Vietnamese => vietnamese,
        }
    }
}

pub fn product_json(product: &ProductRecord, naming: FieldNaming) -> Value {
    let map: Map<String, Value> = Field::ALL
        .iter()
        .map(|f| (naming.key(*f).to_string(), Value::from(product.get(*f))))
        .collect();
    Value::Object(map)
}

pub fn item_json(result: &ItemResult, naming: FieldNaming, include_raw: bool) -> Value {
    match result {
        ItemResult::Success {
            filename,
            raw_text,
            products,
        } => {
            let mut value = json!({
                "success": true,
                "filename": filename,
                "products": products.iter().map(|p| product_json(p, naming)).collect::<Vec<_>>(),
            });
            if include_raw {
                value["raw_text"] = Value::from(raw_text.as_str());
            }
            value
        }
        ItemResult::Failure {
            filename,
            error_kind,
            message,
        } => json!({
            "success": false,
            "filename": filename,
            "error_kind": error_kind.to_string(),
            "error": message,
        }),
    }
}

pub fn report_json(report: &BatchReport, naming: FieldNaming) -> Value {
    let mut value = json!({
        "summary": {
            "total": report.total,
            "successful": report.successful,
            "failed": report.failed,
            "processed_at": chrono::Local::now().to_rfc3339(),
        },
        "results": report
            .results
            .iter()
            .map(|r| item_json(r, naming, false))
            .collect::<Vec<_>>(),
    });
    if let Some(reason) = &report.source_error {
        value["source_error"] = Value::from(reason.as_str());
    }
    value
}

/// One CSV line per product, prefixed with the image file name.
pub fn products_csv<'a>(
    results: impl IntoIterator<Item = &'a ItemResult>,
    naming: FieldNaming,
) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec!["filename"];
    header.extend(Field::ALL.iter().map(|f| naming.key(*f)));
    wtr.write_record(&header)?;

    for result in results {
        for product in result.products() {
            let mut record = vec![result.filename()];
            record.extend(Field::ALL.iter().map(|f| product.get(*f)));
            wtr.write_record(&record)?;
        }
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

pub fn item_text(result: &ItemResult, naming: FieldNaming) -> String {
    let mut output = String::new();

    match result.error() {
        Some((kind, message)) => {
            output.push_str(&format!("{}: FAILED ({})\n", result.filename(), kind));
            output.push_str(&format!("  {}\n", message));
        }
        None => {
            let products = result.products();
            output.push_str(&format!("{}: {} products\n", result.filename(), products.len()));
            for (i, product) in products.iter().enumerate() {
                let fields: Vec<String> = Field::ALL
                    .iter()
                    .filter(|f| **f != Field::Name)
                    .map(|f| format!("{}={}", naming.key(*f), product.get(*f)))
                    .collect();
                output.push_str(&format!("  {}. {}  {}\n", i + 1, product.name, fields.join(" ")));
            }
        }
    }

    output
}

pub fn report_text(report: &BatchReport, naming: FieldNaming) -> String {
    let mut output = String::new();

    for result in &report.results {
        output.push_str(&item_text(result, naming));
    }
    if !report.results.is_empty() {
        output.push('\n');
    }

    output.push_str(&format!(
        "Total: {}  Successful: {}  Failed: {}  Products: {}\n",
        report.total,
        report.successful,
        report.failed,
        report.product_count()
    ));
    if let Some(reason) = &report.source_error {
        output.push_str(&format!("Source unavailable: {}\n", reason));
    }

    output
}

pub fn render_item(
    result: &ItemResult,
    format: OutputFormat,
    naming: FieldNaming,
    include_raw: bool,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&item_json(result, naming, include_raw))?),
        OutputFormat::Csv => products_csv([result], naming),
        OutputFormat::Text => {
            let mut text = item_text(result, naming);
            if include_raw {
                if let Some(raw) = result.raw_text() {
                    text.push_str("\nRaw text:\n");
                    text.push_str(raw);
                    text.push('\n');
                }
            }
            Ok(text)
        }
    }
}

pub fn render_report(
    report: &BatchReport,
    format: OutputFormat,
    naming: FieldNaming,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&report_json(report, naming))?),
        OutputFormat::Csv => products_csv(&report.results, naming),
        OutputFormat::Text => Ok(report_text(report, naming)),
    }
}

/// Per-image summary: filename, status, product count, error.
pub fn write_summary(path: &Path, report: &BatchReport) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record(["filename", "status", "products", "error"])?;

    for result in &report.results {
        let (status, error) = match result.error() {
            Some((kind, message)) => ("error", format!("{}: {}", kind, message)),
            None => ("success", String::new()),
        };
        let count = result.products().len().to_string();
        wtr.write_record([result.filename(), status, count.as_str(), error.as_str()])?;
    }

    wtr.flush()?;
    Ok(())
}
