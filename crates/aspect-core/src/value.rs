//! Named values reported at call boundaries

use std::fmt;

/// One parameter or result observed at a call boundary.
///
/// The name is the identifier declared on the contract, or empty for
/// results (and destructured parameters) that carry no name. The value is
/// borrowed for the duration of the notification only.
#[derive(Clone, Copy)]
pub struct NamedValue<'a> {
    name: &'static str,
    value: &'a dyn fmt::Debug,
}

impl<'a> NamedValue<'a> {
    /// Create a named value
    pub fn new(name: &'static str, value: &'a dyn fmt::Debug) -> Self {
        Self { name, value }
    }

    /// Declared name, possibly empty
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Borrowed value
    pub fn value(&self) -> &'a dyn fmt::Debug {
        self.value
    }

    /// Whether the contract declared a name for this value
    pub fn is_named(&self) -> bool {
        !self.name.is_empty()
    }
}

impl fmt::Debug for NamedValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedValue")
            .field("name", &self.name)
            .field("value", self.value)
            .finish()
    }
}

impl fmt::Display for NamedValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_named() {
            write!(f, "{}={:?}", self.name, self.value)
        } else {
            write!(f, "{:?}", self.value)
        }
    }
}

/// Render a value list as `a=1, b="x"` for log lines.
pub fn render(values: &[NamedValue<'_>]) -> String {
    let mut out = String::new();
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&value.to_string());
    }
    out
}
