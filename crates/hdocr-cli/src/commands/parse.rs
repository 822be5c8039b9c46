//! Parse command - run extraction on text the model already produced.

use std::fs;
use std::io::Read;
use std::path::PathBuf;

use clap::Args;
use tracing::info;

use hdocr_core::{ItemResult, ProductExtractor};

use crate::output::{FieldNaming, OutputFormat, render_item};

use super::{load_config, write_output};

/// Arguments for the parse command.
#[derive(Args)]
pub struct ParseArgs {
    /// Text file with the raw model answer, or "-" for stdin
    #[arg(default_value = "-")]
    input: String,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Field names used in the output
    #[arg(long, value_enum, default_value = "english")]
    fields: FieldNaming,
}

pub async fn run(args: ParseArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let (filename, text) = if args.input == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        ("stdin".to_string(), text)
    } else {
        let path = PathBuf::from(&args.input);
        if !path.exists() {
            anyhow::bail!("Input file not found: {}", path.display());
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| args.input.clone());
        (name, fs::read_to_string(&path)?)
    };

    let products = ProductExtractor::from_config(&config.extraction).extract(&text);
    info!("Parsed {} products from {}", products.len(), filename);

    let result = ItemResult::success(filename, text, products);
    let output = render_item(&result, args.format, args.fields, false)?;
    write_output(&output, args.output.as_deref())
}
