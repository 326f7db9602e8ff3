//! Capability descriptor extraction
//!
//! Resolution is depth-first over supertraits declared in the same unit.
//! A contract's flattened method list is every embedded contract's list,
//! in supertrait order, followed by its own methods in declaration order.
//! A supertrait reached twice (a diamond) contributes its methods once; two
//! different contracts declaring the same method name is an error.

use proc_macro2::TokenTree;
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::visit::Visit;
use syn::{
    Attribute, FnArg, GenericArgument, ItemTrait, Meta, Pat, PathArguments, Receiver, ReturnType,
    Token, TraitItem, TraitItemFn, Type, TypeParamBound, TypePath,
};

use crate::descriptor::{CapabilityContract, MethodDescriptor, ParamDescriptor, ReceiverKind};
use crate::error::{GenError, Result};
use crate::source::{ItemKind, SourceUnit};

const RESULTS_ATTR: &str = "results";
const CFG_ATTR: &str = "cfg";
const CFG_ATTR_ATTR: &str = "cfg_attr";

/// Builds [`CapabilityContract`]s from a [`SourceUnit`]
#[derive(Debug, Clone, Copy)]
pub struct Extractor<'a> {
    unit: &'a SourceUnit,
}

impl<'a> Extractor<'a> {
    /// Extractor over `unit`
    pub fn new(unit: &'a SourceUnit) -> Self {
        Self { unit }
    }

    /// Extract and flatten the named contract
    pub fn extract(&self, name: &str) -> Result<CapabilityContract> {
        let mut stack = Vec::new();
        let contract = self.resolve(name, &mut stack)?;
        tracing::debug!(
            contract = %contract.name,
            methods = contract.methods.len(),
            embedded = contract.embedded.len(),
            "extracted contract"
        );
        Ok(contract)
    }

    fn lookup(&self, name: &str) -> Result<&'a ItemTrait> {
        match self.unit.kind(name) {
            None => Err(GenError::InterfaceNotFound {
                name: name.to_string(),
            }),
            Some(ItemKind::Trait) => self.unit.get_trait(name).ok_or_else(|| {
                GenError::InterfaceNotFound {
                    name: name.to_string(),
                }
            }),
            Some(kind) => Err(GenError::NotAnInterface {
                name: name.to_string(),
                kind: kind.describe(),
            }),
        }
    }

    fn resolve(&self, name: &str, stack: &mut Vec<String>) -> Result<CapabilityContract> {
        if stack.iter().any(|s| s == name) {
            let mut path = stack.clone();
            path.push(name.to_string());
            return Err(GenError::CyclicEmbedding {
                contract: stack[0].clone(),
                path,
            });
        }
        let item = self.lookup(name)?;
        check_contract_shape(item)?;

        stack.push(name.to_string());
        let mut embedded = Vec::new();
        for supertrait in self.embedded_names(item) {
            embedded.push(self.resolve(&supertrait, stack)?);
        }
        stack.pop();

        let mut methods: Vec<MethodDescriptor> = Vec::new();
        for contract in &embedded {
            for method in &contract.methods {
                push_unique(name, &mut methods, method.clone())?;
            }
        }
        for trait_item in &item.items {
            if let TraitItem::Fn(f) = trait_item {
                push_unique(name, &mut methods, method_descriptor(name, f)?)?;
            }
        }

        Ok(CapabilityContract {
            name: name.to_string(),
            item: item.clone(),
            embedded,
            methods,
        })
    }

    /// Supertraits declared in the unit, in bound order. Anything else
    /// (marker traits, traits from other crates) is skipped.
    fn embedded_names(&self, item: &ItemTrait) -> Vec<String> {
        let mut names = Vec::new();
        for bound in &item.supertraits {
            let TypeParamBound::Trait(bound) = bound else {
                continue;
            };
            let Some(segment) = bound.path.segments.last() else {
                continue;
            };
            let candidate = segment.ident.to_string();
            if self.unit.kind(&candidate) == Some(ItemKind::Trait) {
                if !names.contains(&candidate) {
                    names.push(candidate);
                }
            } else if !is_marker(&candidate) {
                tracing::warn!(
                    contract = %item.ident,
                    supertrait = %candidate,
                    "supertrait not declared in source; its methods are not wrapped"
                );
            }
        }
        names
    }
}

fn is_marker(name: &str) -> bool {
    matches!(name, "Send" | "Sync" | "Sized" | "Unpin")
}

fn push_unique(
    contract: &str,
    methods: &mut Vec<MethodDescriptor>,
    method: MethodDescriptor,
) -> Result<()> {
    match methods.iter().find(|m| m.name == method.name) {
        // Same declaration reached through two embedding paths.
        Some(existing) if existing.owner == method.owner => Ok(()),
        Some(existing) => Err(GenError::AmbiguousMethod {
            contract: contract.to_string(),
            method: method.name,
            first: existing.owner.clone(),
            second: method.owner,
        }),
        None => {
            methods.push(method);
            Ok(())
        }
    }
}

fn check_contract_shape(item: &ItemTrait) -> Result<()> {
    let name = item.ident.to_string();
    if !item.generics.params.is_empty() {
        return Err(GenError::unsupported_contract(&name, "generic contracts"));
    }
    if item.auto_token.is_some() {
        return Err(GenError::unsupported_contract(&name, "auto traits"));
    }
    for trait_item in &item.items {
        match trait_item {
            TraitItem::Type(ty) if !ty.generics.params.is_empty() => {
                return Err(GenError::unsupported_contract(
                    &name,
                    format!("generic associated type '{}'", ty.ident),
                ));
            }
            TraitItem::Macro(_) => {
                return Err(GenError::unsupported_contract(
                    &name,
                    "macro invocations in the trait body",
                ));
            }
            _ => {}
        }
    }
    Ok(())
}

fn method_descriptor(owner: &str, f: &TraitItemFn) -> Result<MethodDescriptor> {
    let sig = &f.sig;
    let name = unraw(&sig.ident);
    let unsupported = |reason: &str| GenError::unsupported_method(owner, &name, reason);

    if sig.variadic.is_some() {
        return Err(unsupported("C variadic parameters"));
    }
    let receiver = match sig.receiver() {
        Some(receiver) => receiver_kind(receiver)
            .ok_or_else(|| unsupported("receiver types other than self, &self, &mut self, Box<Self>"))?,
        None => return Err(unsupported("methods without a receiver")),
    };

    let mut params = Vec::new();
    for input in &sig.inputs {
        let FnArg::Typed(arg) = input else {
            continue;
        };
        if mentions_self(&arg.ty) {
            return Err(unsupported("parameters of type Self"));
        }
        params.push(ParamDescriptor {
            name: pattern_name(&arg.pat),
            ty: (*arg.ty).clone(),
            position: params.len(),
        });
    }
    let variadic = params.last().map(|p| is_slice_ref(&p.ty)).unwrap_or(false);

    let (result_types, tuple_results) = match &sig.output {
        ReturnType::Default => (Vec::new(), false),
        ReturnType::Type(_, ty) => {
            if mentions_self(ty) {
                return Err(unsupported("returning Self"));
            }
            match strip_parens(ty) {
                Type::Tuple(tuple) if tuple.elems.is_empty() => (Vec::new(), false),
                Type::Tuple(tuple) => (tuple.elems.iter().cloned().collect(), true),
                other => (vec![other.clone()], false),
            }
        }
    };

    let cfgs = cfg_gates(owner, &name, f)?;
    let names = result_names(owner, &name, f)?;
    if let Some(names) = &names {
        if names.len() != result_types.len() {
            return Err(GenError::InvalidResultNames {
                contract: owner.to_string(),
                method: name,
                names: names.len(),
                results: result_types.len(),
            });
        }
    }
    let results = result_types
        .into_iter()
        .enumerate()
        .map(|(position, ty)| ParamDescriptor {
            name: names
                .as_ref()
                .and_then(|names| names[position].clone())
                .unwrap_or_default(),
            ty,
            position,
        })
        .collect();

    Ok(MethodDescriptor {
        name,
        owner: owner.to_string(),
        sig: sig.clone(),
        receiver,
        params,
        variadic,
        results,
        tuple_results,
        cfgs,
    })
}

fn receiver_kind(receiver: &Receiver) -> Option<ReceiverKind> {
    if receiver.colon_token.is_none() {
        return Some(match (&receiver.reference, &receiver.mutability) {
            (Some(_), Some(_)) => ReceiverKind::RefMut,
            (Some(_), None) => ReceiverKind::Ref,
            (None, _) => ReceiverKind::Value,
        });
    }
    match strip_parens(&receiver.ty) {
        Type::Reference(r) if is_bare_self(&r.elem) => Some(if r.mutability.is_some() {
            ReceiverKind::RefMut
        } else {
            ReceiverKind::Ref
        }),
        ty if is_bare_self(ty) => Some(ReceiverKind::Value),
        Type::Path(path) if path.qself.is_none() => {
            let segment = path.path.segments.last()?;
            let PathArguments::AngleBracketed(args) = &segment.arguments else {
                return None;
            };
            match (segment.ident == "Box", args.args.first(), args.args.len()) {
                (true, Some(GenericArgument::Type(inner)), 1) if is_bare_self(inner) => {
                    Some(ReceiverKind::Boxed)
                }
                _ => None,
            }
        }
        _ => None,
    }
}

/// One entry of `#[results(..)]`
struct ResultName(Option<String>);

impl Parse for ResultName {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        if input.peek(Token![_]) {
            input.parse::<Token![_]>()?;
            Ok(ResultName(None))
        } else {
            let ident: syn::Ident = input.parse()?;
            Ok(ResultName(Some(unraw(&ident))))
        }
    }
}

fn result_names(owner: &str, method: &str, f: &TraitItemFn) -> Result<Option<Vec<Option<String>>>> {
    let mut found = None;
    for attr in f.attrs.iter().filter(|a| a.path().is_ident(RESULTS_ATTR)) {
        if found.is_some() {
            return Err(GenError::unsupported_method(owner, method, "duplicate #[results]"));
        }
        let names = attr
            .parse_args_with(Punctuated::<ResultName, Token![,]>::parse_terminated)
            .map_err(|err| {
                GenError::unsupported_method(owner, method, format!("malformed #[results]: {err}"))
            })?;
        found = Some(names.into_iter().map(|n| n.0).collect());
    }
    Ok(found)
}

/// `#[cfg(..)]` gates, in order. A gate hidden behind `cfg_attr` cannot be
/// mirrored onto the generated items.
fn cfg_gates(owner: &str, method: &str, f: &TraitItemFn) -> Result<Vec<Attribute>> {
    let mut gates = Vec::new();
    for attr in &f.attrs {
        if attr.path().is_ident(CFG_ATTR) {
            gates.push(attr.clone());
        } else if attr.path().is_ident(CFG_ATTR_ATTR) {
            let gated = match &attr.meta {
                Meta::List(list) => list.tokens.clone().into_iter().any(|tree| {
                    matches!(&tree, TokenTree::Ident(ident) if ident == CFG_ATTR)
                }),
                _ => false,
            };
            if gated {
                return Err(GenError::unsupported_method(
                    owner,
                    method,
                    "#[cfg] applied through #[cfg_attr]",
                ));
            }
        }
    }
    Ok(gates)
}

fn pattern_name(pat: &Pat) -> String {
    match pat {
        Pat::Ident(ident) => unraw(&ident.ident),
        Pat::Type(typed) => pattern_name(&typed.pat),
        Pat::Paren(inner) => pattern_name(&inner.pat),
        _ => String::new(),
    }
}

pub(crate) fn unraw(ident: &syn::Ident) -> String {
    let name = ident.to_string();
    match name.strip_prefix("r#") {
        Some(stripped) => stripped.to_string(),
        None => name,
    }
}

pub(crate) fn strip_parens(ty: &Type) -> &Type {
    match ty {
        Type::Paren(inner) => strip_parens(&inner.elem),
        Type::Group(inner) => strip_parens(&inner.elem),
        other => other,
    }
}

fn is_slice_ref(ty: &Type) -> bool {
    match strip_parens(ty) {
        Type::Reference(r) => matches!(strip_parens(&r.elem), Type::Slice(_)),
        _ => false,
    }
}

fn is_bare_self(ty: &Type) -> bool {
    match strip_parens(ty) {
        Type::Path(path) => is_bare_self_path(path),
        _ => false,
    }
}

fn is_bare_self_path(path: &TypePath) -> bool {
    path.qself.is_none() && path.path.segments.len() == 1 && path.path.segments[0].ident == "Self"
}

/// Detects `Self` used as a type; `Self::Assoc` is fine since the wrapper
/// forwards associated items to the implementation.
fn mentions_self(ty: &Type) -> bool {
    struct SelfFinder {
        found: bool,
    }

    impl<'ast> Visit<'ast> for SelfFinder {
        fn visit_type_path(&mut self, node: &'ast TypePath) {
            if is_bare_self_path(node) {
                self.found = true;
            }
            syn::visit::visit_type_path(self, node);
        }
    }

    let mut finder = SelfFinder { found: false };
    finder.visit_type(ty);
    finder.found
}
