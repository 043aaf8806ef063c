// Licensed under the Apache-2.0 license

//! Host tool for building, signing and inspecting factory-data TLV blobs.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;

mod args;
mod build;
mod inspect;
mod manifest;

use args::Commands;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Tlvtool {
    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<()> {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .env()
        .init()?;

    match Tlvtool::parse().command {
        Commands::Build {
            manifest,
            output,
            sign,
        } => run_build(&manifest, &output, sign.as_deref()),
        Commands::Inspect { blob, verify } => inspect::inspect(&blob, verify.as_deref()),
        Commands::Keygen { private, public } => build::keygen(&private, &public),
    }
}

fn run_build(manifest_path: &Path, output: &Path, sign: Option<&Path>) -> Result<()> {
    let text = std::fs::read_to_string(manifest_path)
        .with_context(|| format!("reading manifest {}", manifest_path.display()))?;
    let manifest: manifest::Manifest = toml::from_str(&text)
        .with_context(|| format!("parsing manifest {}", manifest_path.display()))?;

    let signer = sign.map(build::load_signing_key).transpose()?;
    let blob = build::build_blob(&manifest, signer.as_ref())?;

    std::fs::write(output, &blob).with_context(|| format!("writing {}", output.display()))?;
    log::info!("wrote {} bytes to {}", blob.len(), output.display());
    Ok(())
}
