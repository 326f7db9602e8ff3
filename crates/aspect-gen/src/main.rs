//! aspect-gen CLI
//!
//! Generates interception wrappers for the traits of one Rust source file.
//! Options come from `aspect-gen.toml` (or `--config`) and are overridden by
//! command-line flags.

use std::path::PathBuf;

use anyhow::{Context, Result};
use aspect_gen::config::DEFAULT_FILE;
use aspect_gen::{Builder, GeneratorConfig};
use clap::Parser;

#[derive(Parser)]
#[command(name = "aspect-gen")]
#[command(about = "Generate interception wrappers for Rust traits", long_about = None)]
struct Cli {
    /// Rust source file declaring the traits
    source: Option<PathBuf>,

    /// Interface or Interface->Wrapper (default wrapper: <Interface>Aspect);
    /// none selects every trait in SOURCE
    selectors: Vec<String>,

    /// Wrap output in `pub mod <MODULE> { use super::*; .. }`
    #[arg(long)]
    module: Option<String>,

    /// Emit `use <SOURCE_PATH>::*;` to reach the source traits
    #[arg(long)]
    source_path: Option<String>,

    /// Path of the runtime crate in generated code
    #[arg(long)]
    runtime: Option<String>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Skip the rustfmt pass
    #[arg(long)]
    no_format: bool,

    /// Config file path (default: aspect-gen.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn overrides(&self) -> GeneratorConfig {
        GeneratorConfig {
            source: self.source.clone(),
            selectors: self.selectors.clone(),
            module: self.module.clone(),
            source_path: self.source_path.clone(),
            runtime: self.runtime.clone(),
            out: self.out.clone(),
            format: self.no_format.then_some(false),
        }
    }
}

fn load_config(cli: &Cli) -> Result<GeneratorConfig> {
    let path = match &cli.config {
        Some(path) => path.clone(),
        None => {
            let default = PathBuf::from(DEFAULT_FILE);
            if !default.exists() {
                return Ok(GeneratorConfig::default());
            }
            default
        }
    };
    GeneratorConfig::load(&path)
        .with_context(|| format!("Failed to load config {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .init();

    let mut config = load_config(&cli)?;
    config.merge_with(&cli.overrides());

    let source = config
        .source
        .clone()
        .context("No source file given (pass SOURCE or set `source` in the config file)")?;

    match Builder::from_config(config)
        .generate()
        .with_context(|| format!("Failed to generate wrappers for {}", source.display()))?
    {
        Some(path) => tracing::info!(out = %path.display(), "wrote wrappers"),
        None => tracing::debug!("wrote wrappers to stdout"),
    }
    Ok(())
}
