//! `aspect-gen.toml` configuration
//!
//! ```toml
//! source = "src/store.rs"
//! selectors = ["Store", "Cache->TracedCache"]
//! module = "aspects"
//! source_path = "crate::store"
//! out = "src/store_aspect.rs"
//! format = true
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{GenError, Result};

/// Config file looked up in the working directory when none is given
pub const DEFAULT_FILE: &str = "aspect-gen.toml";

/// Runtime crate path used by generated code unless overridden
pub const DEFAULT_RUNTIME: &str = "::aspect_core";

/// Generator options shared by the config file, the CLI, and [`Builder`](crate::Builder)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Rust source file declaring the traits
    pub source: Option<PathBuf>,
    /// `Interface` or `Interface->Wrapper`; empty selects every trait
    pub selectors: Vec<String>,
    /// Wrap output in `pub mod <module>`
    pub module: Option<String>,
    /// Path the output imports the source traits from
    pub source_path: Option<String>,
    /// Runtime crate path, [`DEFAULT_RUNTIME`] when unset
    pub runtime: Option<String>,
    /// Output file; stdout when unset
    pub out: Option<PathBuf>,
    /// Run `rustfmt` on the output; on when unset
    pub format: Option<bool>,
}

impl GeneratorConfig {
    /// Parse a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| GenError::io(path, source))?;
        let config = Self::from_toml(&content).map_err(|source| GenError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded generator config");
        Ok(config)
    }

    /// Parse config text
    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Overlay every option `other` sets. Selectors are replaced as a
    /// whole when `other` names any.
    pub fn merge_with(&mut self, other: &Self) {
        if other.source.is_some() {
            self.source = other.source.clone();
        }
        if !other.selectors.is_empty() {
            self.selectors = other.selectors.clone();
        }
        if other.module.is_some() {
            self.module = other.module.clone();
        }
        if other.source_path.is_some() {
            self.source_path = other.source_path.clone();
        }
        if other.runtime.is_some() {
            self.runtime = other.runtime.clone();
        }
        if other.out.is_some() {
            self.out = other.out.clone();
        }
        if other.format.is_some() {
            self.format = other.format;
        }
    }

    /// Runtime path with the default applied
    pub fn runtime_or_default(&self) -> &str {
        self.runtime.as_deref().unwrap_or(DEFAULT_RUNTIME)
    }

    /// Whether `rustfmt` runs
    pub fn format_enabled(&self) -> bool {
        self.format.unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn parses_all_keys() {
        let config = GeneratorConfig::from_toml(
            r#"
            source = "src/store.rs"
            selectors = ["Store", "Cache->TracedCache"]
            module = "aspects"
            source_path = "crate::store"
            runtime = "aspect_core"
            out = "out.rs"
            format = false
            "#,
        )
        .unwrap();

        assert_eq!(config.source, Some(PathBuf::from("src/store.rs")));
        assert_eq!(config.selectors, vec!["Store", "Cache->TracedCache"]);
        assert_eq!(config.module.as_deref(), Some("aspects"));
        assert_eq!(config.runtime_or_default(), "aspect_core");
        assert!(!config.format_enabled());
    }

    #[test]
    fn empty_file_is_default() {
        let config = GeneratorConfig::from_toml("").unwrap();
        assert_eq!(config, GeneratorConfig::default());
        assert_eq!(config.runtime_or_default(), DEFAULT_RUNTIME);
        assert!(config.format_enabled());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(GeneratorConfig::from_toml("sources = \"a.rs\"").is_err());
    }

    #[test]
    fn overrides_win() {
        let mut base = GeneratorConfig::from_toml(
            r#"
            source = "a.rs"
            selectors = ["Store"]
            module = "aspects"
            "#,
        )
        .unwrap();
        base.merge_with(&GeneratorConfig {
            source: Some(PathBuf::from("b.rs")),
            format: Some(false),
            ..GeneratorConfig::default()
        });

        assert_eq!(base.source, Some(PathBuf::from("b.rs")));
        assert_eq!(base.selectors, vec!["Store"]);
        assert_eq!(base.module.as_deref(), Some("aspects"));
        assert_eq!(base.format, Some(false));

        base.merge_with(&GeneratorConfig {
            selectors: vec!["Journal".to_string()],
            ..GeneratorConfig::default()
        });
        assert_eq!(base.selectors, vec!["Journal"]);
    }

    #[test]
    fn missing_file_is_io_error() {
        assert_matches!(
            GeneratorConfig::load("/nonexistent/aspect-gen.toml"),
            Err(GenError::Io { .. })
        );
    }
}
