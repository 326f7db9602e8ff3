//! Static descriptors for wrapped contracts
//!
//! The generator introspects a contract once, at build time, and emits these
//! values as `pub static` items next to the wrapper. Interceptor factories
//! receive them instead of any runtime reflection.

/// A wrapped capability contract and its flattened method list
#[derive(Debug, PartialEq, Eq)]
pub struct ContractInfo {
    /// Contract (trait) name
    pub name: &'static str,
    /// Flattened methods: embedded contracts first, then own methods
    pub methods: &'static [&'static MethodInfo],
}

impl ContractInfo {
    /// Look up a method by name
    pub fn method(&self, name: &str) -> Option<&'static MethodInfo> {
        self.methods.iter().copied().find(|m| m.name == name)
    }

    /// Identity comparison; statics are unique per generated wrapper
    pub fn same_as(&self, other: &ContractInfo) -> bool {
        std::ptr::eq(self, other)
    }
}

/// One method of a contract
#[derive(Debug, PartialEq, Eq)]
pub struct MethodInfo {
    /// Method name
    pub name: &'static str,
    /// Contract that declares the method (differs from the wrapped
    /// contract for methods reached through an embedded contract)
    pub owner: &'static str,
    /// Parameters in declaration order, receiver excluded
    pub params: &'static [ParamInfo],
    /// Whether the last parameter is a trailing slice reported as one value
    pub variadic: bool,
    /// Results in declaration order
    pub results: &'static [ResultInfo],
}

impl MethodInfo {
    /// `Owner::method`
    pub fn qualified_name(&self) -> String {
        format!("{}::{}", self.owner, self.name)
    }
}

/// A parameter or result slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParamInfo {
    /// Declared name, empty when unnamed
    pub name: &'static str,
    /// Rendered type, for diagnostics only
    pub type_name: &'static str,
    /// Zero-based position
    pub position: usize,
}

/// Results share the parameter slot layout
pub type ResultInfo = ParamInfo;

#[cfg(test)]
mod tests {
    use super::*;

    static GET: MethodInfo = MethodInfo {
        name: "get",
        owner: "Reader",
        params: &[ParamInfo {
            name: "key",
            type_name: "&str",
            position: 0,
        }],
        variadic: false,
        results: &[ParamInfo {
            name: "",
            type_name: "Option<String>",
            position: 0,
        }],
    };

    static STORE: ContractInfo = ContractInfo {
        name: "Store",
        methods: &[&GET],
    };

    #[test]
    fn method_lookup_by_name() {
        let method = STORE.method("get").unwrap();
        assert_eq!(method.qualified_name(), "Reader::get");
        assert!(STORE.method("set").is_none());
        assert!(STORE.same_as(&STORE));
    }
}
