//! Aspect Gen - interception wrapper generator
//!
//! Reads a Rust source file, extracts every selected trait into a flattened
//! [`CapabilityContract`], and synthesizes a wrapper type per contract. Each
//! wrapped method notifies an `aspect_core::ChainComposer` before and after
//! delegating to the real implementation.
//!
//! The pipeline is split so each stage can be used on its own:
//!
//! - [`SourceUnit`] parses the file and indexes top-level items
//! - [`Extractor`] resolves embedded contracts and builds descriptors
//! - [`Synthesizer`] turns descriptors into Rust tokens
//! - [`format`] runs the optional `rustfmt` pass
//! - [`Builder`] wires everything together for `build.rs` and the CLI
//!
//! # Build script usage
//!
//! ```no_run
//! # fn main() -> Result<(), aspect_gen::GenError> {
//! let out_dir = std::path::PathBuf::from(std::env::var("OUT_DIR").unwrap_or_default());
//! aspect_gen::Builder::new()
//!     .source("src/store.rs")
//!     .select("Store")
//!     .select("Cache->TracedCache")
//!     .out_file(out_dir.join("store_aspect.rs"))
//!     .generate()?;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod extract;
pub mod format;
pub mod selector;
pub mod source;
pub mod synth;

pub use builder::Builder;
pub use config::GeneratorConfig;
pub use descriptor::{CapabilityContract, MethodDescriptor, ParamDescriptor, ReceiverKind, ResultDescriptor};
pub use error::{GenError, Result};
pub use extract::Extractor;
pub use selector::Selector;
pub use source::{ItemKind, SourceUnit};
pub use synth::{Synthesizer, UnitLayout};
