//! `#[contract]` expansion

use proc_macro2::TokenStream;
use quote::ToTokens;
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::{Attribute, Error, ItemTrait, Result, ReturnType, Token, TraitItem, Type};

const RESULTS_ATTR: &str = "results";

/// One entry of `#[results(..)]`: an identifier or `_`
enum ResultName {
    Named,
    Unnamed,
}

impl Parse for ResultName {
    fn parse(input: ParseStream) -> Result<Self> {
        if input.peek(Token![_]) {
            input.parse::<Token![_]>()?;
            Ok(ResultName::Unnamed)
        } else {
            input.parse::<syn::Ident>()?;
            Ok(ResultName::Named)
        }
    }
}

pub fn expand(attr: TokenStream, item: TokenStream) -> Result<TokenStream> {
    if !attr.is_empty() {
        return Err(Error::new_spanned(attr, "#[contract] takes no arguments"));
    }
    let mut item: ItemTrait = syn::parse2(item).map_err(|err| {
        Error::new(err.span(), "#[contract] can only be applied to trait definitions")
    })?;

    for trait_item in &mut item.items {
        if let TraitItem::Fn(method) = trait_item {
            check_results(&method.attrs, &method.sig.output)?;
            method.attrs.retain(|attr| !attr.path().is_ident(RESULTS_ATTR));
        }
    }

    Ok(item.into_token_stream())
}

fn check_results(attrs: &[Attribute], output: &ReturnType) -> Result<()> {
    let mut seen: Option<&Attribute> = None;
    for attr in attrs.iter().filter(|a| a.path().is_ident(RESULTS_ATTR)) {
        if seen.is_some() {
            return Err(Error::new_spanned(attr, "duplicate #[results] attribute"));
        }
        seen = Some(attr);

        let names = attr.parse_args_with(Punctuated::<ResultName, Token![,]>::parse_terminated)?;
        let expected = result_count(output);
        if names.len() != expected {
            return Err(Error::new_spanned(
                attr,
                format!(
                    "#[results] declares {} result names but the method returns {}",
                    names.len(),
                    expected
                ),
            ));
        }
        let named = names
            .iter()
            .filter(|name| matches!(name, ResultName::Named))
            .count();
        if named == 0 && expected > 0 {
            return Err(Error::new_spanned(
                attr,
                "#[results] names nothing; remove it to leave results unnamed",
            ));
        }
    }
    Ok(())
}

fn result_count(output: &ReturnType) -> usize {
    match output {
        ReturnType::Default => 0,
        ReturnType::Type(_, ty) => match strip_parens(ty) {
            Type::Tuple(tuple) => tuple.elems.len(),
            _ => 1,
        },
    }
}

fn strip_parens(ty: &Type) -> &Type {
    match ty {
        Type::Paren(inner) => strip_parens(&inner.elem),
        Type::Group(inner) => strip_parens(&inner.elem),
        other => other,
    }
}
