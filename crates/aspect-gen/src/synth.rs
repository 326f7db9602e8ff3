//! Wrapper synthesizer
//!
//! Turns [`CapabilityContract`]s into Rust tokens. For a contract `Store`
//! wrapped as `StoreAspect` the output is:
//!
//! - `STORE_ASPECT_CONTRACT` and one `STORE_ASPECT_METHOD_<NAME>` static per
//!   method, describing the contract to interceptor factories
//! - `pub struct StoreAspect<I> { inner, factory }`
//! - one `impl<I: Store> Trait for StoreAspect<I>` per trait in the
//!   embedding closure, embedded traits first
//!
//! Every method body asks the composer for an aggregate, reports the
//! arguments to `before`, delegates to `I`, reports the results to `after`,
//! and returns the results unchanged.
//!
//! `I` is renamed (`I0`, `I1`, ..) when the contract already uses that
//! identifier, for example as a method generic. Methods gated by `#[cfg]`
//! carry the same gates on their impl, their static and their entry in the
//! contract descriptor.

use std::collections::HashSet;

use proc_macro2::{Span, TokenStream, TokenTree};
use quote::{format_ident, quote, ToTokens};
use syn::{
    FnArg, GenericParam, Ident, Meta, Pat, PatIdent, Path, Signature, TraitItem,
};

use crate::descriptor::{CapabilityContract, MethodDescriptor, ParamDescriptor, ReceiverKind};

/// First line of every generated unit
pub const HEADER: &str = "// Code generated by aspect-gen. DO NOT EDIT.";

/// Where generated items live and how they reach the source traits
#[derive(Debug, Clone, Default)]
pub struct UnitLayout {
    /// Wrap the output in `pub mod <module> { use super::*; .. }`
    pub module: Option<Ident>,
    /// Emit `use <source_path>::*;`
    pub source_path: Option<Path>,
}

/// Token generator for wrappers
#[derive(Debug, Clone)]
pub struct Synthesizer {
    runtime: Path,
}

impl Default for Synthesizer {
    fn default() -> Self {
        Self::new(syn::parse_quote!(::aspect_core))
    }
}

impl Synthesizer {
    /// Synthesizer that refers to the runtime crate through `runtime`
    pub fn new(runtime: Path) -> Self {
        Self { runtime }
    }

    /// Runtime crate path
    pub fn runtime(&self) -> &Path {
        &self.runtime
    }

    /// Source text of one delegating method
    pub fn synthesize(
        &self,
        contract: &CapabilityContract,
        wrapper: &Ident,
        method: &MethodDescriptor,
    ) -> String {
        self.method_tokens(contract, wrapper, method).to_string()
    }

    /// Tokens of one delegating method, as it appears inside the
    /// `impl Owner for Wrapper<I>` block
    pub fn method_tokens(
        &self,
        contract: &CapabilityContract,
        wrapper: &Ident,
        method: &MethodDescriptor,
    ) -> TokenStream {
        self.delegate_tokens(contract, wrapper, method, &impl_param(contract))
    }

    fn delegate_tokens(
        &self,
        contract: &CapabilityContract,
        wrapper: &Ident,
        method: &MethodDescriptor,
        param: &Ident,
    ) -> TokenStream {
        let rt = &self.runtime;
        let owner = contract
            .closure()
            .into_iter()
            .find(|c| c.name == method.owner)
            .map(|c| c.item.ident.clone())
            .unwrap_or_else(|| format_ident!("{}", method.owner));
        let ident = &method.sig.ident;
        let cfgs = &method.cfgs;
        let sig = wrapper_signature(&method.sig);
        let contract_static = contract_static(wrapper);
        let method_static = method_static(wrapper, method);

        let params = method.params.iter().map(|param| {
            let name = param.name.as_str();
            let arg = arg_ident(param.position);
            quote!(#rt::NamedValue::new(#name, &#arg))
        });

        let receiver = match method.receiver {
            ReceiverKind::Ref => quote!(&self.inner),
            ReceiverKind::RefMut => quote!(&mut self.inner),
            ReceiverKind::Value => quote!(self.inner),
            ReceiverKind::Boxed => quote!(::std::boxed::Box::new(self.inner)),
        };
        let args = method.params.iter().map(|p| arg_ident(p.position));
        let turbofish = turbofish(&method.sig);
        let mut call = quote!(<#param as #owner>::#ident #turbofish(#receiver, #(#args),*));
        if method.is_unsafe() {
            call = quote!(unsafe { #call });
        }
        if method.is_async() {
            call = quote!(#call.await);
        }

        let results: Vec<Ident> = method.results.iter().map(|r| res_ident(r.position)).collect();
        let after_values = method.results.iter().map(|result| {
            let name = result.name.as_str();
            let res = res_ident(result.position);
            quote!(#rt::NamedValue::new(#name, &#res))
        });
        let after = quote!(#rt::Interceptor::after(&mut interceptor, &[#(#after_values),*]););

        let tail = match (results.as_slice(), method.tuple_results) {
            ([], _) => quote! {
                #call;
                #after
            },
            ([single], false) => quote! {
                let #single = #call;
                #after
                #single
            },
            (many, _) => quote! {
                let (#(#many,)*) = #call;
                #after
                (#(#many,)*)
            },
        };

        quote! {
            #(#cfgs)*
            #sig {
                let mut interceptor = self.factory.produce(&#contract_static, &#method_static);
                #rt::Interceptor::before(&mut interceptor, &[#(#params),*]);
                #tail
            }
        }
    }

    /// Statics, wrapper type, and trait impls for one contract
    pub fn contract_tokens(&self, contract: &CapabilityContract, wrapper: &Ident) -> TokenStream {
        let rt = &self.runtime;
        let contract_name = contract.name.as_str();
        let contract_static = contract_static(wrapper);
        let param = impl_param(contract);

        let method_statics: Vec<Ident> = contract
            .methods
            .iter()
            .map(|m| method_static(wrapper, m))
            .collect();
        let method_entries = contract.methods.iter().zip(&method_statics).map(|(method, ident)| {
            let cfgs = &method.cfgs;
            quote!(#(#cfgs)* &#ident)
        });
        let method_infos = contract.methods.iter().zip(&method_statics).map(|(method, ident)| {
            let name = method.name.as_str();
            let owner = method.owner.as_str();
            let variadic = method.variadic;
            let params = method.params.iter().map(|p| slot_tokens(rt, p));
            let results = method.results.iter().map(|r| slot_tokens(rt, r));
            let cfgs = &method.cfgs;
            let doc = format!(" Descriptor of `{owner}::{name}` as wrapped by [`{wrapper}`]");
            quote! {
                #(#cfgs)*
                #[doc = #doc]
                pub static #ident: #rt::MethodInfo = #rt::MethodInfo {
                    name: #name,
                    owner: #owner,
                    params: &[#(#params),*],
                    variadic: #variadic,
                    results: &[#(#results),*],
                };
            }
        });

        let contract_doc = format!(" Descriptor of the `{contract_name}` contract as wrapped by [`{wrapper}`]");
        let struct_doc = format!(" Interception wrapper for `{contract_name}` implementations");
        let impls = contract
            .closure()
            .into_iter()
            .map(|owner| self.impl_tokens(contract, owner, wrapper, &param));

        quote! {
            #(#method_infos)*

            #[doc = #contract_doc]
            pub static #contract_static: #rt::ContractInfo = #rt::ContractInfo {
                name: #contract_name,
                methods: &[#(#method_entries),*],
            };

            #[doc = #struct_doc]
            #[derive(Clone, Debug)]
            pub struct #wrapper<#param> {
                /// Wrapped implementation
                pub inner: #param,
                /// Composer asked for an interceptor on every call
                pub factory: ::std::sync::Arc<#rt::ChainComposer>,
            }

            impl<#param> #wrapper<#param> {
                /// Wrap `inner`, intercepting every call through `factory`
                pub fn new(inner: #param, factory: ::std::sync::Arc<#rt::ChainComposer>) -> Self {
                    Self { inner, factory }
                }

                /// Unwrap the implementation. An associated function so it
                /// never shadows a contract method of the same name.
                pub fn into_inner(this: Self) -> #param {
                    this.inner
                }

                /// Descriptor of the wrapped contract
                pub fn contract() -> &'static #rt::ContractInfo {
                    &#contract_static
                }
            }

            #(#impls)*
        }
    }

    fn impl_tokens(
        &self,
        contract: &CapabilityContract,
        owner: &CapabilityContract,
        wrapper: &Ident,
        param: &Ident,
    ) -> TokenStream {
        let outer = &contract.item.ident;
        let trait_ident = &owner.item.ident;
        let unsafety = &owner.item.unsafety;
        let attrs = forwarded_attributes(owner);
        let allow_unsafe = if owner.item.unsafety.is_some()
            || contract.methods_of(&owner.name).any(MethodDescriptor::is_unsafe)
        {
            quote!(#[allow(unsafe_code)])
        } else {
            TokenStream::new()
        };

        let assoc = owner.item.items.iter().filter_map(|item| match item {
            TraitItem::Type(ty) => {
                let ident = &ty.ident;
                Some(quote!(type #ident = <#param as #trait_ident>::#ident;))
            }
            TraitItem::Const(c) => {
                let ident = &c.ident;
                let ty = &c.ty;
                Some(quote!(const #ident: #ty = <#param as #trait_ident>::#ident;))
            }
            _ => None,
        });
        let methods = contract
            .methods_of(&owner.name)
            .map(|method| self.delegate_tokens(contract, wrapper, method, param));

        quote! {
            #(#attrs)*
            #allow_unsafe
            #unsafety impl<#param: #outer> #trait_ident for #wrapper<#param> {
                #(#assoc)*
                #(#methods)*
            }
        }
    }

    /// Complete unit: header, imports, and every contract in order
    pub fn render_unit(
        &self,
        layout: &UnitLayout,
        contracts: &[(CapabilityContract, Ident)],
    ) -> String {
        let body = contracts
            .iter()
            .map(|(contract, wrapper)| self.contract_tokens(contract, wrapper));
        let import = layout.source_path.as_ref().map(|path| {
            quote! {
                #[allow(unused_imports)]
                use #path::*;
            }
        });
        let tokens = match &layout.module {
            Some(module) => {
                let doc = " Interception wrappers generated by aspect-gen";
                quote! {
                    #[doc = #doc]
                    pub mod #module {
                        #[allow(unused_imports)]
                        use super::*;
                        #import
                        #(#body)*
                    }
                }
            }
            None => quote! {
                #import
                #(#body)*
            },
        };

        let mut out = String::from(HEADER);
        out.push_str("\n\n");
        let text = tokens.to_string();
        if !text.is_empty() {
            out.push_str(&text);
            out.push('\n');
        }
        out
    }
}

/// `StoreAspect` -> `STORE_ASPECT`, `get_all` -> `GET_ALL`
pub fn shouty_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).map(|n| n.is_lowercase()).unwrap_or(false);
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_lower) {
                out.push('_');
            }
        }
        out.extend(c.to_uppercase());
    }
    out
}

/// Type parameter of the wrapper: `I`, or the first of `I0`, `I1`, .. that
/// no trait in the closure mentions
fn impl_param(contract: &CapabilityContract) -> Ident {
    let mut taken = HashSet::new();
    for owner in contract.closure() {
        collect_idents(owner.item.to_token_stream(), &mut taken);
    }
    let mut name = "I".to_string();
    let mut suffix = 0;
    while taken.contains(&name) {
        name = format!("I{suffix}");
        suffix += 1;
    }
    Ident::new(&name, Span::call_site())
}

fn collect_idents(tokens: TokenStream, taken: &mut HashSet<String>) {
    for tree in tokens {
        match tree {
            TokenTree::Ident(ident) => {
                taken.insert(ident.to_string());
            }
            TokenTree::Group(group) => collect_idents(group.stream(), taken),
            TokenTree::Punct(_) | TokenTree::Literal(_) => {}
        }
    }
}

fn contract_static(wrapper: &Ident) -> Ident {
    format_ident!("{}_CONTRACT", shouty_case(&wrapper.to_string()))
}

fn method_static(wrapper: &Ident, method: &MethodDescriptor) -> Ident {
    format_ident!(
        "{}_METHOD_{}",
        shouty_case(&wrapper.to_string()),
        shouty_case(&method.name)
    )
}

fn arg_ident(position: usize) -> Ident {
    format_ident!("arg{}", position)
}

fn res_ident(position: usize) -> Ident {
    format_ident!("res{}", position)
}

fn slot_tokens(rt: &Path, slot: &ParamDescriptor) -> TokenStream {
    let name = slot.name.as_str();
    let type_name = type_text(&slot.ty);
    let position = slot.position;
    quote! {
        #rt::ParamInfo {
            name: #name,
            type_name: #type_name,
            position: #position,
        }
    }
}

/// Signature with typed arguments renamed to `arg0..` and their attributes
/// dropped
fn wrapper_signature(sig: &Signature) -> Signature {
    let mut sig = sig.clone();
    let mut position = 0;
    for input in sig.inputs.iter_mut() {
        match input {
            FnArg::Receiver(receiver) => receiver.attrs.clear(),
            FnArg::Typed(arg) => {
                arg.attrs.clear();
                *arg.pat = Pat::Ident(PatIdent {
                    attrs: Vec::new(),
                    by_ref: None,
                    mutability: None,
                    ident: arg_ident(position),
                    subpat: None,
                });
                position += 1;
            }
        }
    }
    sig
}

/// `::<T, N>` for methods with type or const parameters; lifetimes are
/// left to inference
fn turbofish(sig: &Signature) -> TokenStream {
    let args: Vec<&Ident> = sig
        .generics
        .params
        .iter()
        .filter_map(|param| match param {
            GenericParam::Type(ty) => Some(&ty.ident),
            GenericParam::Const(c) => Some(&c.ident),
            GenericParam::Lifetime(_) => None,
        })
        .collect();
    if args.is_empty() {
        TokenStream::new()
    } else {
        quote!(::<#(#args),*>)
    }
}

/// `#[async_trait]` on the contract has to be repeated on the impl
fn forwarded_attributes(contract: &CapabilityContract) -> Vec<TokenStream> {
    contract
        .item
        .attrs
        .iter()
        .filter(|attr| {
            attr.path()
                .segments
                .last()
                .map(|s| s.ident == "async_trait")
                .unwrap_or(false)
        })
        .map(|attr| match &attr.meta {
            Meta::List(list) => {
                let tokens = &list.tokens;
                quote!(#[::async_trait::async_trait(#tokens)])
            }
            _ => quote!(#[::async_trait::async_trait]),
        })
        .collect()
}

/// Compact rendering of a type for diagnostics: `& 'a [u8]` -> `&'a [u8]`
pub fn type_text(ty: &syn::Type) -> String {
    let raw = ty.to_token_stream().to_string();
    let chars: Vec<char> = raw.chars().collect();
    let word = |c: Option<&char>| c.map(|c| c.is_alphanumeric() || *c == '_').unwrap_or(false);
    let mut out = String::with_capacity(raw.len());
    for (i, &c) in chars.iter().enumerate() {
        if c == ' ' {
            let prev = i.checked_sub(1).and_then(|p| chars.get(p));
            if !(word(prev) && word(chars.get(i + 1))) && prev != Some(&',') {
                continue;
            }
        }
        out.push(c);
    }
    out
}

/// Wrapper name used when a selector gives none
pub fn default_wrapper_name(contract: &str) -> String {
    format!("{contract}Aspect")
}

/// Identifier for a wrapper, in the call-site span
pub fn wrapper_ident(name: &str) -> Ident {
    Ident::new(name, Span::call_site())
}
