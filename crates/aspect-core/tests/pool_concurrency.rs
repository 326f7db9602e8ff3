//! Pooled composer under concurrent callers

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use aspect_core::{
    factory_fn, ChainComposer, ContractInfo, InstancePool, Interceptor, MethodInfo, NamedValue,
};

static TICK: MethodInfo = MethodInfo {
    name: "tick",
    owner: "Counter",
    params: &[],
    variadic: false,
    results: &[],
};

static COUNTER: ContractInfo = ContractInfo {
    name: "Counter",
    methods: &[&TICK],
};

struct Counting {
    before: Arc<AtomicUsize>,
    after: Arc<AtomicUsize>,
}

impl Interceptor for Counting {
    fn before(&mut self, _values: &[NamedValue<'_>]) {
        self.before.fetch_add(1, Ordering::SeqCst);
    }

    fn after(&mut self, _values: &[NamedValue<'_>]) {
        self.after.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn concurrent_produce_never_sees_stale_children() {
    const THREADS: usize = 8;
    const CALLS: usize = 500;
    const FACTORIES: usize = 3;

    let before = Arc::new(AtomicUsize::new(0));
    let after = Arc::new(AtomicUsize::new(0));
    let pool = Arc::new(InstancePool::with_max_idle(4));

    let mut composer = ChainComposer::with_pool(Arc::clone(&pool));
    for _ in 0..FACTORIES {
        let before = Arc::clone(&before);
        let after = Arc::clone(&after);
        composer.register(factory_fn(move |_, _| {
            Box::new(Counting {
                before: Arc::clone(&before),
                after: Arc::clone(&after),
            })
        }));
    }
    let composer = Arc::new(composer);

    thread::scope(|scope| {
        for _ in 0..THREADS {
            let composer = Arc::clone(&composer);
            scope.spawn(move || {
                for _ in 0..CALLS {
                    let mut aggregate = composer.produce(&COUNTER, &TICK);
                    assert_eq!(aggregate.len(), FACTORIES);
                    aggregate.before(&[]);
                    aggregate.after(&[]);
                }
            });
        }
    });

    let total = THREADS * CALLS * FACTORIES;
    assert_eq!(before.load(Ordering::SeqCst), total);
    assert_eq!(after.load(Ordering::SeqCst), total);

    let stats = pool.stats();
    assert_eq!(stats.acquired, (THREADS * CALLS) as u64);
    assert_eq!(stats.released + stats.discarded, (THREADS * CALLS) as u64);
    assert!(pool.idle() <= 4);
}
