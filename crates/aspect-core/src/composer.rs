//! Chain composer
//!
//! The composer is the entry point referenced by every generated wrapper.
//! It keeps an append-only list of [`InterceptorFactory`] registrations and,
//! for each call, materializes an [`AggregateInterceptor`] holding one child
//! per factory in registration order.

use std::fmt;
use std::sync::Arc;

use crate::contract::{ContractInfo, MethodInfo};
use crate::interceptor::{Interceptor, InterceptorFactory};
use crate::pool::{InstancePool, Shell};
use crate::value::NamedValue;

/// Registry of interceptor factories
///
/// Registration takes `&mut self` and is expected to finish before the
/// composer is wrapped in an `Arc` and handed to wrappers; after that the
/// factory list is read-only and `produce` may be called from any thread.
#[derive(Default)]
pub struct ChainComposer {
    factories: Vec<Box<dyn InterceptorFactory>>,
    pool: Option<Arc<InstancePool>>,
}

impl ChainComposer {
    /// Create a composer that allocates a fresh aggregate per call
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a composer that recycles aggregate buffers through `pool`
    pub fn with_pool(pool: Arc<InstancePool>) -> Self {
        Self {
            factories: Vec::new(),
            pool: Some(pool),
        }
    }

    /// Append a factory. Order of registration is the fan-out order.
    pub fn register<F>(&mut self, factory: F)
    where
        F: InterceptorFactory + 'static,
    {
        self.factories.push(Box::new(factory));
    }

    /// Builder-style [`register`](Self::register)
    pub fn with_factory<F>(mut self, factory: F) -> Self
    where
        F: InterceptorFactory + 'static,
    {
        self.register(factory);
        self
    }

    /// Number of registered factories
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether no factory is registered
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Pool backing this composer, if any
    pub fn pool(&self) -> Option<&Arc<InstancePool>> {
        self.pool.as_ref()
    }

    /// Build the aggregate interceptor for one call
    pub fn produce(
        &self,
        contract: &'static ContractInfo,
        method: &'static MethodInfo,
    ) -> AggregateInterceptor {
        let mut aggregate = match &self.pool {
            Some(pool) => AggregateInterceptor {
                children: pool.acquire(self.factories.len()),
                pool: Some(Arc::clone(pool)),
            },
            None => AggregateInterceptor::with_capacity(self.factories.len()),
        };
        for factory in &self.factories {
            aggregate.push(factory.interceptor(contract, method));
        }
        tracing::trace!(
            contract = contract.name,
            method = method.name,
            interceptors = aggregate.len(),
            "produced aggregate interceptor"
        );
        aggregate
    }
}

impl fmt::Debug for ChainComposer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainComposer")
            .field("factories", &self.factories.len())
            .field("pool", &self.pool)
            .finish()
    }
}

/// Composers nest: a composer registered inside another contributes its
/// whole chain as a single child.
impl InterceptorFactory for ChainComposer {
    fn interceptor(
        &self,
        contract: &'static ContractInfo,
        method: &'static MethodInfo,
    ) -> Box<dyn Interceptor> {
        Box::new(self.produce(contract, method))
    }
}

/// Ordered fan-out over child interceptors, scoped to one call
///
/// When produced by a pooled composer, dropping the aggregate clears its
/// children and returns the buffer to the pool. Generated wrappers drop it
/// right after `after`.
pub struct AggregateInterceptor {
    children: Shell,
    pool: Option<Arc<InstancePool>>,
}

impl AggregateInterceptor {
    /// Create an unpooled, empty aggregate
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    fn with_capacity(capacity: usize) -> Self {
        Self {
            children: Vec::with_capacity(capacity),
            pool: None,
        }
    }

    /// Append a child
    pub fn push(&mut self, child: Box<dyn Interceptor>) {
        self.children.push(child);
    }

    /// Number of children
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Whether there are no children
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Whether the buffer goes back to a pool on drop
    pub fn is_pooled(&self) -> bool {
        self.pool.is_some()
    }
}

impl Default for AggregateInterceptor {
    fn default() -> Self {
        Self::new()
    }
}

impl Interceptor for AggregateInterceptor {
    fn before(&mut self, values: &[NamedValue<'_>]) {
        for child in &mut self.children {
            child.before(values);
        }
    }

    // Same order as `before`; not reversed.
    fn after(&mut self, values: &[NamedValue<'_>]) {
        for child in &mut self.children {
            child.after(values);
        }
    }
}

impl Drop for AggregateInterceptor {
    fn drop(&mut self) {
        if let Some(pool) = self.pool.take() {
            pool.release(std::mem::take(&mut self.children));
        }
    }
}

impl fmt::Debug for AggregateInterceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregateInterceptor")
            .field("children", &self.children.len())
            .field("pooled", &self.pool.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::ParamInfo;
    use crate::interceptor::{factory_fn, NoopInterceptor};
    use parking_lot::Mutex;

    static PING: MethodInfo = MethodInfo {
        name: "ping",
        owner: "Pinger",
        params: &[],
        variadic: false,
        results: &[],
    };

    static ECHO: MethodInfo = MethodInfo {
        name: "echo",
        owner: "Pinger",
        params: &[ParamInfo {
            name: "msg",
            type_name: "&str",
            position: 0,
        }],
        variadic: false,
        results: &[],
    };

    static PINGER: ContractInfo = ContractInfo {
        name: "Pinger",
        methods: &[&PING, &ECHO],
    };

    struct Tagged {
        tag: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Interceptor for Tagged {
        fn before(&mut self, values: &[NamedValue<'_>]) {
            self.log
                .lock()
                .push(format!("before:{}:{}", self.tag, values.len()));
        }

        fn after(&mut self, values: &[NamedValue<'_>]) {
            self.log
                .lock()
                .push(format!("after:{}:{}", self.tag, values.len()));
        }
    }

    fn tagged(tag: &'static str, log: &Arc<Mutex<Vec<String>>>) -> impl InterceptorFactory {
        let log = Arc::clone(log);
        factory_fn(move |_, _| {
            Box::new(Tagged {
                tag,
                log: Arc::clone(&log),
            })
        })
    }

    #[test]
    fn after_is_not_reversed() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let composer = ChainComposer::new()
            .with_factory(tagged("a", &log))
            .with_factory(tagged("b", &log))
            .with_factory(tagged("c", &log));

        let mut aggregate = composer.produce(&PINGER, &PING);
        aggregate.before(&[]);
        aggregate.after(&[]);

        assert_eq!(
            *log.lock(),
            vec![
                "before:a:0",
                "before:b:0",
                "before:c:0",
                "after:a:0",
                "after:b:0",
                "after:c:0",
            ]
        );
    }

    #[test]
    fn factories_see_contract_and_method() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut composer = ChainComposer::new();
        composer.register(factory_fn(move |contract, method| {
            sink.lock().push(format!("{}.{}", contract.name, method.name));
            Box::new(NoopInterceptor)
        }));

        drop(composer.produce(&PINGER, &ECHO));
        drop(composer.produce(&PINGER, &PING));
        assert_eq!(*seen.lock(), vec!["Pinger.echo", "Pinger.ping"]);
    }

    #[test]
    fn empty_composer_produces_empty_aggregate() {
        let composer = ChainComposer::new();
        let mut aggregate = composer.produce(&PINGER, &PING);
        aggregate.before(&[]);
        aggregate.after(&[]);
        assert!(aggregate.is_empty());
        assert!(!aggregate.is_pooled());
    }

    #[test]
    fn pooled_aggregate_is_reset_between_calls() {
        let pool = Arc::new(InstancePool::new());
        let composer = ChainComposer::with_pool(Arc::clone(&pool))
            .with_factory(factory_fn(|_, _| Box::new(NoopInterceptor)))
            .with_factory(factory_fn(|_, _| Box::new(NoopInterceptor)));

        for _ in 0..5 {
            let mut aggregate = composer.produce(&PINGER, &PING);
            assert_eq!(aggregate.len(), 2);
            assert!(aggregate.is_pooled());
            aggregate.before(&[]);
            aggregate.after(&[]);
        }
        assert_eq!(pool.idle(), 1);
        assert_eq!(pool.stats().reused, 4);
    }

    #[test]
    fn nested_composer_counts_as_one_child() {
        let inner = ChainComposer::new()
            .with_factory(factory_fn(|_, _| Box::new(NoopInterceptor)))
            .with_factory(factory_fn(|_, _| Box::new(NoopInterceptor)));
        let outer = ChainComposer::new().with_factory(inner);
        assert_eq!(outer.produce(&PINGER, &PING).len(), 1);
    }
}
