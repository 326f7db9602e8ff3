//! Generator entry point for build scripts and the CLI

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::GeneratorConfig;
use crate::descriptor::CapabilityContract;
use crate::error::{GenError, Result};
use crate::extract::Extractor;
use crate::format;
use crate::selector::{is_ident, Selector};
use crate::source::SourceUnit;
use crate::synth::{wrapper_ident, Synthesizer, UnitLayout};

/// Configures and runs one generation
///
/// ```no_run
/// # fn main() -> Result<(), aspect_gen::GenError> {
/// let text = aspect_gen::Builder::new()
///     .source("src/store.rs")
///     .select("Store")
///     .module("aspects")
///     .format(false)
///     .render()?;
/// # let _ = text;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Builder {
    config: GeneratorConfig,
}

impl Builder {
    /// Builder with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder seeded from a loaded config
    pub fn from_config(config: GeneratorConfig) -> Self {
        Self { config }
    }

    /// Current options
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Source file declaring the traits
    pub fn source(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.source = Some(path.into());
        self
    }

    /// Add an `Interface` or `Interface->Wrapper` selector
    pub fn select(mut self, selector: impl Into<String>) -> Self {
        self.config.selectors.push(selector.into());
        self
    }

    /// Wrap the output in `pub mod <name>`
    pub fn module(mut self, name: impl Into<String>) -> Self {
        self.config.module = Some(name.into());
        self
    }

    /// Import the source traits from `path`
    pub fn source_path(mut self, path: impl Into<String>) -> Self {
        self.config.source_path = Some(path.into());
        self
    }

    /// Path generated code uses for the runtime crate
    pub fn runtime(mut self, path: impl Into<String>) -> Self {
        self.config.runtime = Some(path.into());
        self
    }

    /// Enable or disable the `rustfmt` pass
    pub fn format(mut self, enabled: bool) -> Self {
        self.config.format = Some(enabled);
        self
    }

    /// Write to `path` instead of stdout
    pub fn out_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.out = Some(path.into());
        self
    }

    /// Generate the unit text
    pub fn render(&self) -> Result<String> {
        let source = self.config.source.as_ref().ok_or(GenError::MissingSource)?;
        let layout = self.layout()?;
        let synthesizer = Synthesizer::new(parse_path("runtime", self.config.runtime_or_default())?);

        let unit = SourceUnit::parse_file(source)?;
        let implicit = self.config.selectors.is_empty();
        let selectors = if implicit {
            unit.trait_names().map(Selector::new).collect()
        } else {
            Selector::parse_all(&self.config.selectors)?
        };

        let extractor = Extractor::new(&unit);
        let mut contracts: Vec<(CapabilityContract, _)> = Vec::with_capacity(selectors.len());
        for selector in &selectors {
            match extractor.extract(&selector.interface) {
                Ok(contract) => contracts.push((contract, wrapper_ident(&selector.wrapper))),
                // Implicit selection skips traits that cannot be wrapped.
                Err(
                    err @ (GenError::UnsupportedContract { .. }
                    | GenError::UnsupportedMethod { .. }),
                ) if implicit => {
                    tracing::warn!(
                        interface = %selector.interface,
                        error = %err,
                        "skipping trait that cannot be wrapped"
                    );
                }
                Err(err) => return Err(err),
            }
        }

        tracing::info!(
            source = %source.display(),
            wrappers = contracts.len(),
            "generating interception wrappers"
        );
        let text = synthesizer.render_unit(&layout, &contracts);
        Ok(if self.config.format_enabled() {
            format::format_or_raw(text)
        } else {
            text
        })
    }

    /// Generate and write the unit. Returns the output path, or `None` when
    /// the unit went to stdout. An existing file with identical content is
    /// left untouched.
    pub fn generate(&self) -> Result<Option<PathBuf>> {
        let text = self.render()?;
        match &self.config.out {
            Some(path) => {
                write_if_changed(path, &text)?;
                Ok(Some(path.clone()))
            }
            None => {
                let stdout = std::io::stdout();
                let mut lock = stdout.lock();
                lock.write_all(text.as_bytes())
                    .and_then(|()| lock.flush())
                    .map_err(|source| GenError::io("<stdout>", source))?;
                Ok(None)
            }
        }
    }

    fn layout(&self) -> Result<UnitLayout> {
        let module = match &self.config.module {
            Some(name) if is_ident(name) => Some(wrapper_ident(name)),
            Some(name) => {
                return Err(GenError::InvalidOption {
                    option: "module",
                    value: name.clone(),
                    reason: "not an identifier".to_string(),
                })
            }
            None => None,
        };
        let source_path = match &self.config.source_path {
            Some(path) => Some(parse_path("source_path", path)?),
            None => None,
        };
        Ok(UnitLayout {
            module,
            source_path,
        })
    }
}

fn parse_path(option: &'static str, value: &str) -> Result<syn::Path> {
    syn::parse_str::<syn::Path>(value).map_err(|err| GenError::InvalidOption {
        option,
        value: value.to_string(),
        reason: err.to_string(),
    })
}

fn write_if_changed(path: &Path, text: &str) -> Result<()> {
    if fs::read_to_string(path).map(|old| old == text).unwrap_or(false) {
        tracing::debug!(path = %path.display(), "output unchanged");
        return Ok(());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| GenError::io(parent, source))?;
    }
    fs::write(path, text).map_err(|source| GenError::io(path, source))?;
    tracing::debug!(path = %path.display(), bytes = text.len(), "wrote output");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn source_is_required() {
        assert_matches!(Builder::new().render(), Err(GenError::MissingSource));
    }

    #[test]
    fn rejects_bad_layout_options() {
        let builder = Builder::new().source("unused.rs").module("not a module");
        assert_matches!(
            builder.render(),
            Err(GenError::InvalidOption { option: "module", .. })
        );
        let builder = Builder::new().source("unused.rs").runtime("::");
        assert_matches!(
            builder.render(),
            Err(GenError::InvalidOption { option: "runtime", .. })
        );
    }

    #[test]
    fn builder_accumulates_selectors() {
        let builder = Builder::new().select("Store").select("Journal->Log").format(false);
        assert_eq!(builder.config().selectors, vec!["Store", "Journal->Log"]);
        assert_eq!(builder.config().format, Some(false));
    }
}
