//! Interceptor traits
//!
//! An [`Interceptor`] observes one call. It has no return channel: it can
//! neither fail the call nor change its arguments or results. Anything it
//! wants to report goes through its own path (usually `tracing`).

use std::fmt;
use std::sync::Arc;

use crate::contract::{ContractInfo, MethodInfo};
use crate::value::NamedValue;

/// Before/after notification target for a single call
pub trait Interceptor: Send {
    /// Called with one value per parameter, in declaration order
    fn before(&mut self, values: &[NamedValue<'_>]);

    /// Called with one value per result, in declaration order
    fn after(&mut self, values: &[NamedValue<'_>]);
}

impl<T: Interceptor + ?Sized> Interceptor for Box<T> {
    fn before(&mut self, values: &[NamedValue<'_>]) {
        (**self).before(values);
    }

    fn after(&mut self, values: &[NamedValue<'_>]) {
        (**self).after(values);
    }
}

/// Interceptor that ignores every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopInterceptor;

impl Interceptor for NoopInterceptor {
    fn before(&mut self, _values: &[NamedValue<'_>]) {}

    fn after(&mut self, _values: &[NamedValue<'_>]) {}
}

/// Produces an interceptor for a (contract, method) pair
///
/// Factories are registered once at startup and shared by every caller, so
/// they must be `Send + Sync`.
pub trait InterceptorFactory: Send + Sync {
    /// Build the interceptor for one call of `method` on `contract`
    fn interceptor(
        &self,
        contract: &'static ContractInfo,
        method: &'static MethodInfo,
    ) -> Box<dyn Interceptor>;
}

impl<T: InterceptorFactory + ?Sized> InterceptorFactory for Arc<T> {
    fn interceptor(
        &self,
        contract: &'static ContractInfo,
        method: &'static MethodInfo,
    ) -> Box<dyn Interceptor> {
        (**self).interceptor(contract, method)
    }
}

/// Factory backed by a closure, see [`factory_fn`]
pub struct FnFactory<F> {
    f: F,
}

impl<F> fmt::Debug for FnFactory<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnFactory").finish_non_exhaustive()
    }
}

impl<F> InterceptorFactory for FnFactory<F>
where
    F: Fn(&'static ContractInfo, &'static MethodInfo) -> Box<dyn Interceptor> + Send + Sync,
{
    fn interceptor(
        &self,
        contract: &'static ContractInfo,
        method: &'static MethodInfo,
    ) -> Box<dyn Interceptor> {
        (self.f)(contract, method)
    }
}

/// Wrap a closure as an [`InterceptorFactory`]
pub fn factory_fn<F>(f: F) -> FnFactory<F>
where
    F: Fn(&'static ContractInfo, &'static MethodInfo) -> Box<dyn Interceptor> + Send + Sync,
{
    FnFactory { f }
}
