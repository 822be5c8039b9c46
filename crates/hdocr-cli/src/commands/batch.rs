//! Batch command - extract line items from every image in a folder.

use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use hdocr_core::{
    BatchObserver, BatchProcessor, BatchReport, FolderSource, ImageProcessor, ItemResult,
    create_backend,
};

use crate::output::{FieldNaming, OutputFormat, render_report, write_summary};

use super::{load_config, write_output};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Folder containing invoice images
    #[arg(required = true)]
    folder: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Field names used in the output
    #[arg(long, value_enum, default_value = "english")]
    fields: FieldNaming,

    /// Also write a per-image summary CSV
    #[arg(long)]
    summary: Option<PathBuf>,
}

/// Drives the progress bar from batch callbacks.
struct ProgressObserver {
    pb: ProgressBar,
}

impl BatchObserver for ProgressObserver {
    fn on_start(&mut self, total: usize) {
        self.pb.set_length(total as u64);
    }

    fn on_result(&mut self, _index: usize, result: &ItemResult) {
        self.pb.set_message(result.filename().to_string());
        self.pb.inc(1);
    }
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let source = FolderSource::new(&args.folder)
        .with_extensions(&config.batch.allowed_extensions);

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} images {msg}")?
            .progress_chars("=>-"),
    );

    let observer_pb = pb.clone();
    let report = tokio::task::spawn_blocking(move || -> anyhow::Result<BatchReport> {
        let backend = create_backend(&config.inference)?;
        let batch = BatchProcessor::new(ImageProcessor::with_config(backend, &config));
        let mut observer = ProgressObserver { pb: observer_pb };
        Ok(batch.process_folder_observed(&source, &mut observer))
    })
    .await??;

    pb.finish_and_clear();

    let output = render_report(&report, args.format, args.fields)?;
    write_output(&output, args.output.as_deref())?;

    if let Some(summary_path) = &args.summary {
        write_summary(summary_path, &report)?;
        eprintln!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    if let Some(reason) = &report.source_error {
        eprintln!("{} {}", style("⚠").yellow(), reason);
    }

    eprintln!(
        "{} Processed {} images in {:?}",
        style("✓").green(),
        report.total,
        start.elapsed()
    );
    eprintln!(
        "   {} successful, {} failed, {} products",
        style(report.successful).green(),
        style(report.failed).red(),
        report.product_count()
    );

    if report.failed > 0 {
        eprintln!();
        eprintln!("{}", style("Failed images:").red());
        for result in report.failures() {
            if let Some((kind, message)) = result.error() {
                eprintln!("  - {}: {} ({})", result.filename(), message, kind);
            }
        }
    }

    debug!("Batch command finished in {:?}", start.elapsed());
    Ok(())
}
