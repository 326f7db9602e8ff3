//! Aspect contract macro
//!
//! Rust return types carry no names, so `aspect-gen` reads result names
//! from a `#[results(..)]` helper attribute on trait methods. The
//! `#[contract]` attribute checks that helper against the method signature
//! and strips it, leaving a plain trait for the compiler.
//!
//! # Example
//!
//! ```ignore
//! use aspect_macros::contract;
//!
//! #[contract]
//! pub trait Store: Send + Sync {
//!     #[results(value)]
//!     fn get(&self, ctx: &Context, key: &str) -> Option<Vec<u8>>;
//!
//!     #[results(value, err)]
//!     fn take(&mut self, key: &str) -> (Option<Vec<u8>>, Option<StoreError>);
//! }
//! ```

use proc_macro::TokenStream;

mod contract;

/// Mark a trait as a capability contract.
///
/// Accepts `#[results(a, b, _)]` on methods, one entry per result; `_`
/// leaves a result unnamed. A tuple return type has one result per
/// element, `()` has none, anything else has one.
#[proc_macro_attribute]
pub fn contract(attr: TokenStream, item: TokenStream) -> TokenStream {
    match contract::expand(attr.into(), item.into()) {
        Ok(output) => output.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
