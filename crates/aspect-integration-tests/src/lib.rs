//! Contracts and in-memory implementations wrapped by `aspect-gen` at build
//! time. The generated wrappers live in [`aspects`].

pub mod contracts;
pub mod memory;

include!(concat!(env!("OUT_DIR"), "/contracts_aspect.rs"));
