//! Subcommands.

pub mod batch;
pub mod config;
pub mod parse;
pub mod process;

use std::fs;
use std::path::{Path, PathBuf};

use console::style;
use tracing::debug;

use hdocr_core::HdocrConfig;

/// `<config_dir>/hdocr/config.json`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hdocr")
        .join("config.json")
}

/// The `--config` path if given, the default path otherwise.
pub fn config_file(config_path: Option<&str>) -> PathBuf {
    config_path
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path)
}

/// Load the configuration used by the processing commands.
///
/// An explicit `--config` must exist; the default file is optional.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<HdocrConfig> {
    let config = match config_path {
        Some(path) => HdocrConfig::from_file(Path::new(path))
            .map_err(|e| anyhow::anyhow!("Cannot load config {}: {}", path, e))?,
        None => {
            let path = default_config_path();
            if path.exists() {
                debug!("Loading config from {}", path.display());
                HdocrConfig::from_file(&path)?
            } else {
                HdocrConfig::default()
            }
        }
    };

    Ok(config.with_env_overrides())
}

/// Write rendered output to `path`, or stdout when there is none.
pub fn write_output(content: &str, path: Option<&Path>) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            fs::write(path, content)?;
            eprintln!(
                "{} Output written to {}",
                style("✓").green(),
                path.display()
            );
        }
        None => println!("{}", content.trim_end()),
    }
    Ok(())
}
