//! petscan: find pet cards in screenshots, cut out the name for OCR and
//! classify the variant.

mod batch;
mod config;
mod report;

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "petscan", version, about = "Detect pet cards in screenshots and classify their variant")]
struct Cli {
    /// Screenshots to scan.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Artifact root directory (overrides the saved setting).
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Captures processed concurrently (overrides the saved setting).
    #[arg(long)]
    batch_size: Option<usize>,

    /// Write `debug_result.png` with the detected rectangle.
    #[arg(long)]
    debug_overlay: bool,

    /// Skip `report.json`.
    #[arg(long)]
    no_report: bool,

    /// Store the effective settings as the new defaults.
    #[arg(long)]
    save_config: bool,
}

fn main() -> anyhow::Result<()> {
    // Structured logging. Use `RUST_LOG=info` etc.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = config::Config::load_or_default();
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }
    if let Some(n) = cli.batch_size {
        config.batch_size = n.max(1);
    }
    config.write_debug_overlay |= cli.debug_overlay;
    config.write_report &= !cli.no_report;

    if cli.save_config {
        config.save()?;
    }

    let mut detected = 0usize;
    for report in batch::spawn(cli.inputs, config) {
        if report.is_detected() {
            detected += 1;
        }
        println!("{}: {}", report.input.display(), report.status);
    }
    tracing::info!(detected, "done");

    Ok(())
}
