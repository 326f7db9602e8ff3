use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

fn main() -> Result<()> {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=src/contracts.rs");

    let out_dir = PathBuf::from(env::var("OUT_DIR").context("OUT_DIR is not set")?);
    aspect_gen::Builder::new()
        .source("src/contracts.rs")
        .select("Store")
        .select("Journal")
        .select("Fetcher->InstrumentedFetcher")
        .select("Bulk")
        .select("Toggle")
        .module("aspects")
        .source_path("crate::contracts")
        .out_file(out_dir.join("contracts_aspect.rs"))
        .generate()
        .context("Failed to generate contract wrappers")?;
    Ok(())
}
