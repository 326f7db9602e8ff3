//! Generator error type

use std::path::PathBuf;

use thiserror::Error;

/// Everything that can abort a generation run
#[derive(Debug, Error)]
pub enum GenError {
    /// The selected name exists but is not a trait
    #[error("'{name}' is a {kind}, not a trait")]
    NotAnInterface {
        /// Selected name
        name: String,
        /// What the name actually refers to
        kind: &'static str,
    },

    /// An explicit selector names a trait absent from the source
    #[error("interface '{name}' not found")]
    InterfaceNotFound {
        /// Selected name
        name: String,
    },

    /// Two different contracts reachable from one wrapper declare the same method
    #[error("method '{method}' of '{contract}' is declared by both '{first}' and '{second}'")]
    AmbiguousMethod {
        /// Contract being wrapped
        contract: String,
        /// Colliding method name
        method: String,
        /// First declaring contract
        first: String,
        /// Second declaring contract
        second: String,
    },

    /// A contract embeds itself, directly or through other contracts
    #[error("contract '{contract}' embeds itself: {}", path.join(" -> "))]
    CyclicEmbedding {
        /// Contract being wrapped
        contract: String,
        /// Embedding chain, ending at the repeated contract
        path: Vec<String>,
    },

    /// Contract shape the wrapper cannot reproduce
    #[error("contract '{contract}' is not supported: {reason}")]
    UnsupportedContract {
        /// Offending contract
        contract: String,
        /// What is unsupported
        reason: String,
    },

    /// Method shape the wrapper cannot reproduce
    #[error("method '{contract}::{method}' is not supported: {reason}")]
    UnsupportedMethod {
        /// Declaring contract
        contract: String,
        /// Offending method
        method: String,
        /// What is unsupported
        reason: String,
    },

    /// `#[results(..)]` does not match the return type
    #[error("#[results] on '{contract}::{method}' names {names} results but the method returns {results}")]
    InvalidResultNames {
        /// Declaring contract
        contract: String,
        /// Annotated method
        method: String,
        /// Number of names given
        names: usize,
        /// Number of results returned
        results: usize,
    },

    /// Malformed `Interface` / `Interface->Wrapper` selector
    #[error("invalid selector '{selector}': {reason}")]
    InvalidSelector {
        /// Selector as written
        selector: String,
        /// Why it was rejected
        reason: String,
    },

    /// Malformed generator option
    #[error("invalid {option} '{value}': {reason}")]
    InvalidOption {
        /// Option name
        option: &'static str,
        /// Value as given
        value: String,
        /// Why it was rejected
        reason: String,
    },

    /// No source file was configured
    #[error("source file is missing")]
    MissingSource,

    /// Source file is not valid Rust
    #[error("failed to parse {}", path.display())]
    Parse {
        /// Source file
        path: PathBuf,
        /// Parser diagnostic
        #[source]
        source: syn::Error,
    },

    /// Reading the source or writing the output failed
    #[error("I/O error on {}", path.display())]
    Io {
        /// File being read or written
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`GeneratorConfig`](crate::GeneratorConfig)
    #[error("invalid config file {}", path.display())]
    Config {
        /// Config file
        path: PathBuf,
        /// TOML diagnostic
        #[source]
        source: toml::de::Error,
    },
}

impl GenError {
    pub(crate) fn unsupported_method(
        contract: &str,
        method: &str,
        reason: impl Into<String>,
    ) -> Self {
        Self::UnsupportedMethod {
            contract: contract.to_string(),
            method: method.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unsupported_contract(contract: &str, reason: impl Into<String>) -> Self {
        Self::UnsupportedContract {
            contract: contract.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Generator result alias
pub type Result<T> = std::result::Result<T, GenError>;
