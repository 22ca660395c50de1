//! Archivis: external drive inventory.
//!
//! Thin binary entry point. All logic lives in the `archivis-core`
//! and `archivis-cli` crates.

use archivis_cli::Cli;
use clap::Parser;
use tracing::Level;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so they never interleave with prompts and reports.
    let level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Archivis starting (catalog at {})", cli.home.display());

    archivis_cli::run(&cli)
}
