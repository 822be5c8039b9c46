//! Process command - extract line items from a single invoice image.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use hdocr_core::{ImageItem, ImageProcessor, ItemResult, create_backend};

use crate::output::{FieldNaming, OutputFormat, render_item};

use super::{load_config, write_output};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input image, or "-" to read image bytes from stdin
    #[arg(required = true)]
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

    /// Include the raw model text in the output
    #[arg(long)]
    raw: bool,

    /// Filename reported for stdin input
    #[arg(long)]
    name: Option<String>,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let item = read_item(&args)?;
    info!("Processing image: {}", item.filename);

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message(format!("Reading {}...", item.filename));
    pb.enable_steady_tick(Duration::from_millis(120));

    // The blocking HTTP client has to live off the async runtime.
    let result = tokio::task::spawn_blocking(move || -> anyhow::Result<ItemResult> {
        let backend = create_backend(&config.inference)?;
        let processor = ImageProcessor::with_config(backend, &config);
        Ok(processor.process(&item))
    })
    .await??;

    pb.finish_and_clear();

    let output = render_item(&result, args.format, args.fields, args.raw)?;
    write_output(&output, args.output.as_deref())?;

    debug!("Total processing time: {:?}", start.elapsed());

    match result.error() {
        Some((kind, message)) => {
            eprintln!("{} {}: {}", style("✗").red(), kind, message);
            anyhow::bail!("Processing {} failed", result.filename())
        }
        None => {
            eprintln!(
                "{} {} products extracted from {}",
                style("✓").green(),
                result.products().len(),
                result.filename()
            );
            Ok(())
        }
    }
}

fn read_item(args: &ProcessArgs) -> anyhow::Result<ImageItem> {
    if args.input == "-" {
        let mut bytes = Vec::new();
        std::io::stdin().read_to_end(&mut bytes)?;
        let name = args.name.clone().unwrap_or_else(|| "stdin".to_string());
        return Ok(ImageItem::from_bytes(name, bytes));
    }

    let path = Path::new(&args.input);
    if !path.exists() {
        anyhow::bail!("Input file not found: {}", path.display());
    }

    let mut item = ImageItem::from_path(path);
    if let Some(name) = &args.name {
        item.filename = name.clone();
    }
    Ok(item)
}
