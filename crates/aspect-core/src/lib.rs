//! Aspect Core - runtime side of generated interception wrappers
//!
//! Wrappers emitted by `aspect-gen` hold an implementation and an
//! `Arc<ChainComposer>`. Every wrapped call asks the composer for an
//! [`AggregateInterceptor`] keyed by static contract metadata, notifies it
//! before and after delegating, and returns the implementation's results
//! untouched.
//!
//! # Ordering
//!
//! Factories fan out in registration order for both `before` and `after`.
//! The after pass is not reversed.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use aspect_core::{ChainComposer, InstancePool, TracingInterceptorFactory};
//!
//! let mut composer = ChainComposer::with_pool(Arc::new(InstancePool::new()));
//! composer.register(TracingInterceptorFactory::default());
//! let composer = Arc::new(composer);
//! # let _ = composer;
//! ```

#![forbid(unsafe_code)]

/// Static contract metadata emitted by the generator
pub mod contract;

/// Interceptor and factory traits
pub mod interceptor;

/// Name/value pairs carried across call boundaries
pub mod value;

/// Chain composer and aggregate interceptor
pub mod composer;

/// Reuse pool for aggregate child buffers
pub mod pool;

/// Interceptor that reports call boundaries through `tracing`
pub mod logging;

pub use composer::{AggregateInterceptor, ChainComposer};
pub use contract::{ContractInfo, MethodInfo, ParamInfo, ResultInfo};
pub use interceptor::{factory_fn, FnFactory, Interceptor, InterceptorFactory, NoopInterceptor};
pub use logging::TracingInterceptorFactory;
pub use pool::{InstancePool, PoolStats};
pub use value::NamedValue;
