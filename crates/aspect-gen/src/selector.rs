//! `Interface` / `Interface->Wrapper` selectors

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;

use crate::error::{GenError, Result};
use crate::synth::default_wrapper_name;

/// One trait to wrap and the name of its wrapper
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    /// Trait name
    pub interface: String,
    /// Wrapper type name
    pub wrapper: String,
}

impl Selector {
    /// Selector with the default `<Interface>Aspect` wrapper name
    pub fn new(interface: impl Into<String>) -> Self {
        let interface = interface.into();
        let wrapper = default_wrapper_name(&interface);
        Self { interface, wrapper }
    }

    /// Parse `Interface` or `Interface->Wrapper`
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = |reason: &str| GenError::InvalidSelector {
            selector: text.to_string(),
            reason: reason.to_string(),
        };

        let (interface, wrapper) = match text.split_once("->") {
            Some((interface, wrapper)) => (interface.trim(), Some(wrapper.trim())),
            None => (text.trim(), None),
        };
        if interface.is_empty() {
            return Err(invalid("missing interface name"));
        }
        if !is_ident(interface) {
            return Err(invalid("interface is not an identifier"));
        }
        match wrapper {
            None => Ok(Self::new(interface)),
            Some("") => Err(invalid("missing wrapper name after '->'")),
            Some(wrapper) if !is_ident(wrapper) => Err(invalid("wrapper is not an identifier")),
            Some(wrapper) => Ok(Self {
                interface: interface.to_string(),
                wrapper: wrapper.to_string(),
            }),
        }
    }

    /// Parse and normalize a selector list: a repeated interface keeps its
    /// first position and takes the last wrapper name given for it
    pub fn parse_all<S: AsRef<str>>(selectors: &[S]) -> Result<Vec<Self>> {
        let mut by_interface: IndexMap<String, Selector> = IndexMap::new();
        for text in selectors {
            let selector = Self::parse(text.as_ref())?;
            by_interface.insert(selector.interface.clone(), selector);
        }

        let mut wrappers: IndexMap<&str, &str> = IndexMap::new();
        for selector in by_interface.values() {
            if let Some(other) = wrappers.insert(&selector.wrapper, &selector.interface) {
                return Err(GenError::InvalidSelector {
                    selector: format!("{}->{}", selector.interface, selector.wrapper),
                    reason: format!("wrapper name already used for '{other}'"),
                });
            }
        }
        Ok(by_interface.into_values().collect())
    }
}

impl FromStr for Selector {
    type Err = GenError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.interface, self.wrapper)
    }
}

pub(crate) fn is_ident(text: &str) -> bool {
    syn::parse_str::<syn::Ident>(text).is_ok()
}
