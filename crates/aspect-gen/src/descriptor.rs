//! Generation-time descriptor model
//!
//! Descriptors are built once from static source information and never
//! mutated afterwards. They keep the original `syn` nodes next to the
//! normalized view so the synthesizer can reproduce signatures exactly.

use syn::{Attribute, ItemTrait, Signature, Type};

/// A flattened capability contract
#[derive(Debug, Clone)]
pub struct CapabilityContract {
    /// Trait name
    pub name: String,
    /// Trait declaration, for attributes, `unsafe`, and associated items
    pub item: ItemTrait,
    /// Directly embedded contracts (supertraits found in the same unit),
    /// each already resolved
    pub embedded: Vec<CapabilityContract>,
    /// Methods of the embedding closure: embedded contracts first, in
    /// supertrait order, then the contract's own methods
    pub methods: Vec<MethodDescriptor>,
}

impl CapabilityContract {
    /// Method by name
    pub fn method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Every contract in the embedding closure, each once, embedded
    /// contracts before the contracts that embed them. The last entry is
    /// `self`.
    pub fn closure(&self) -> Vec<&CapabilityContract> {
        let mut out: Vec<&CapabilityContract> = Vec::new();
        self.collect_closure(&mut out);
        out
    }

    fn collect_closure<'a>(&'a self, out: &mut Vec<&'a CapabilityContract>) {
        for embedded in &self.embedded {
            embedded.collect_closure(out);
        }
        if !out.iter().any(|c| c.name == self.name) {
            out.push(self);
        }
    }

    /// Methods declared by `owner` within this contract's closure
    pub fn methods_of<'a>(&'a self, owner: &'a str) -> impl Iterator<Item = &'a MethodDescriptor> {
        self.methods.iter().filter(move |m| m.owner == owner)
    }
}

/// How the method takes `self`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverKind {
    /// `&self`
    Ref,
    /// `&mut self`
    RefMut,
    /// `self`
    Value,
    /// `self: Box<Self>`
    Boxed,
}

/// One method of a contract
#[derive(Debug, Clone)]
pub struct MethodDescriptor {
    /// Method name
    pub name: String,
    /// Contract that declares the method
    pub owner: String,
    /// Original signature
    pub sig: Signature,
    /// Receiver form
    pub receiver: ReceiverKind,
    /// Parameters after the receiver
    pub params: Vec<ParamDescriptor>,
    /// Last parameter is a slice reported as a single value
    pub variadic: bool,
    /// Results in declaration order
    pub results: Vec<ResultDescriptor>,
    /// Results come from a tuple return type, even a one-element one
    pub tuple_results: bool,
    /// `#[cfg(..)]` gates copied onto every generated item for the method
    pub cfgs: Vec<Attribute>,
}

impl MethodDescriptor {
    /// `async fn`
    pub fn is_async(&self) -> bool {
        self.sig.asyncness.is_some()
    }

    /// `unsafe fn`
    pub fn is_unsafe(&self) -> bool {
        self.sig.unsafety.is_some()
    }
}

/// A parameter or result slot
#[derive(Debug, Clone)]
pub struct ParamDescriptor {
    /// Declared name; empty for unnamed results and destructured parameters
    pub name: String,
    /// Type as written
    pub ty: Type,
    /// Zero-based position
    pub position: usize,
}

/// Results share the parameter layout
pub type ResultDescriptor = ParamDescriptor;
