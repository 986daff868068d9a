//! detexport binary
//!
//! Exports a trained detection model into a deployable inference bundle:
//! a pruned graph, its parameter blob, and `infer_cfg.yml`.
//!
//! # Usage
//!
//! ```bash
//! detexport -c configs/yolov3.yml -w save_models/best_model -o TestReader.dataset.use_default_label=true
//! ```

use clap::Parser;
use detexport::config::ExportConfig;
use detexport::export::{ExportOptions, Exporter, ModelBundle};
use std::path::PathBuf;
use tracing::{error, info};

/// Command-line arguments for the export tool.
#[derive(Parser)]
#[command(name = "detexport")]
#[command(about = "Exports a trained detection model into a deployable inference bundle")]
struct Args {
    /// Path to the training configuration file
    #[arg(short, long)]
    config: PathBuf,

    /// Directory for storing the output model files
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,

    /// Checkpoint directory holding the built graph and trained parameters
    #[arg(short, long)]
    weights: PathBuf,

    /// Prune post-processing outputs (e.g. NMS) from the exported graph
    #[arg(long)]
    exclude_postprocess: bool,

    /// Configuration overrides as dotted-path key=value pairs
    #[arg(short = 'o', long = "opt", value_name = "KEY=VALUE")]
    overrides: Vec<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    detexport::utils::init_tracing();

    let args = Args::parse();

    if !args.config.exists() {
        error!("Configuration file not found: {}", args.config.display());
        return Err("Configuration file not found".into());
    }
    if !args.weights.exists() {
        error!("Weights directory not found: {}", args.weights.display());
        return Err("Weights directory not found".into());
    }

    let overrides = parse_overrides(&args.overrides)?;
    let config = ExportConfig::load(&args.config, &overrides)?;
    let bundle = ModelBundle::load(&args.weights)?;

    let exporter = Exporter::new(
        config,
        ExportOptions {
            output_dir: args.output_dir,
            exclude_postprocess: args.exclude_postprocess,
        },
    );
    let artifacts = exporter.run(&bundle)?;

    info!(
        "export complete: {} ({} feed vars, {} targets)",
        artifacts.infer_cfg_path.display(),
        artifacts.feed_names.len(),
        artifacts.target_names.len()
    );
    Ok(())
}

fn parse_overrides(raw: &[String]) -> Result<Vec<(String, String)>, Box<dyn std::error::Error>> {
    raw.iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .ok_or_else(|| format!("override '{}' is not of the form key=value", pair).into())
        })
        .collect()
}
