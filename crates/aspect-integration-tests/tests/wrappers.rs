//! Generated wrappers report every call to the composed interceptors

use std::sync::Arc;

use aspect_core::{
    factory_fn, ChainComposer, ContractInfo, InstancePool, Interceptor, MethodInfo, NamedValue,
    TracingInterceptorFactory,
};
use aspect_integration_tests::aspects::{
    BulkAspect, InstrumentedFetcher, JournalAspect, StoreAspect, ToggleAspect,
    BULK_ASPECT_METHOD_PUT_ALL, INSTRUMENTED_FETCHER_CONTRACT, JOURNAL_ASPECT_CONTRACT,
    JOURNAL_ASPECT_METHOD_LOG, STORE_ASPECT_CONTRACT, TOGGLE_ASPECT_CONTRACT,
};
use aspect_integration_tests::contracts::{
    Bulk, Context, Fetcher, Journal, Reader, Store, StoreError, Toggle, Writer,
};
use aspect_integration_tests::memory::{
    MemoryBulk, MemoryJournal, MemoryStore, MemoryToggle, StaticFetcher,
};
use parking_lot::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    Before,
    After,
}

#[derive(Debug, Clone)]
struct Event {
    phase: Phase,
    contract: &'static str,
    owner: &'static str,
    method: &'static str,
    values: Vec<(&'static str, String)>,
}

impl Event {
    fn names(&self) -> Vec<&'static str> {
        self.values.iter().map(|(name, _)| *name).collect()
    }
}

type Log = Arc<Mutex<Vec<Event>>>;

struct Recorder {
    contract: &'static ContractInfo,
    method: &'static MethodInfo,
    log: Log,
}

impl Recorder {
    fn record(&self, phase: Phase, values: &[NamedValue<'_>]) {
        self.log.lock().push(Event {
            phase,
            contract: self.contract.name,
            owner: self.method.owner,
            method: self.method.name,
            values: values
                .iter()
                .map(|v| (v.name(), format!("{:?}", v.value())))
                .collect(),
        });
    }
}

impl Interceptor for Recorder {
    fn before(&mut self, values: &[NamedValue<'_>]) {
        self.record(Phase::Before, values);
    }

    fn after(&mut self, values: &[NamedValue<'_>]) {
        self.record(Phase::After, values);
    }
}

fn recording_composer(pool: Option<Arc<InstancePool>>) -> (Arc<ChainComposer>, Log) {
    let log: Log = Arc::default();
    let mut composer = match pool {
        Some(pool) => ChainComposer::with_pool(pool),
        None => ChainComposer::new(),
    };
    let sink = Arc::clone(&log);
    composer.register(factory_fn(move |contract, method| {
        Box::new(Recorder {
            contract,
            method,
            log: Arc::clone(&sink),
        }) as Box<dyn Interceptor>
    }));
    composer.register(TracingInterceptorFactory::default());
    (Arc::new(composer), log)
}

#[test]
fn store_calls_are_reported_in_program_order() {
    let (composer, log) = recording_composer(None);
    let store = StoreAspect::new(MemoryStore::default(), composer);
    let ctx = Context { request_id: 7 };

    store.set(&ctx, "k", b"v".to_vec()).unwrap();
    assert_eq!(store.get(&ctx, "k").unwrap(), b"v".to_vec());
    store.delete(&ctx, "k").unwrap();

    let events = log.lock();
    let sequence: Vec<_> = events.iter().map(|e| (e.phase.clone(), e.method)).collect();
    assert_eq!(
        sequence,
        vec![
            (Phase::Before, "set"),
            (Phase::After, "set"),
            (Phase::Before, "get"),
            (Phase::After, "get"),
            (Phase::Before, "delete"),
            (Phase::After, "delete"),
        ]
    );
    assert!(events.iter().all(|e| e.contract == "Store" && e.owner == "Store"));

    assert_eq!(events[0].names(), vec!["ctx", "key", "value"]);
    assert_eq!(events[0].values[1].1, "\"k\"");
    assert_eq!(events[0].values[2].1, "[118]");
    assert_eq!(events[1].names(), vec!["err"]);
    assert_eq!(events[1].values[0].1, "Ok(())");
    assert_eq!(events[2].names(), vec!["ctx", "key"]);
    assert_eq!(events[3].values, vec![("value", "Ok([118])".to_string())]);
    assert_eq!(events[5].names(), vec!["err"]);
}

#[test]
fn results_are_returned_unchanged() {
    let (composer, log) = recording_composer(None);
    let store = StoreAspect::new(MemoryStore::default(), composer);
    let ctx = Context { request_id: 1 };

    assert_eq!(store.get(&ctx, "missing"), Err(StoreError::NotFound("missing".into())));
    assert_eq!(store.set(&ctx, "", Vec::new()), Err(StoreError::InvalidKey));

    let events = log.lock();
    assert_eq!(events[1].values[0].1, "Err(NotFound(\"missing\"))");
    assert_eq!(events[3].values[0].1, "Err(InvalidKey)");
}

#[test]
fn embedded_contracts_are_wrapped() {
    let (composer, log) = recording_composer(None);
    let mut journal = JournalAspect::new(MemoryJournal::default(), composer);

    journal.write("owner", "ops".to_string());
    assert_eq!(journal.read("owner").as_deref(), Some("ops"));
    journal.log(2, &["disk full".to_string(), "disk full".to_string()]);
    assert_eq!(journal.compact(), (1, true));
    journal.flush();

    let events = log.lock();
    let methods: Vec<_> = events
        .iter()
        .filter(|e| e.phase == Phase::Before)
        .map(|e| (e.owner, e.method))
        .collect();
    assert_eq!(
        methods,
        vec![
            ("Writer", "write"),
            ("Reader", "read"),
            ("Journal", "log"),
            ("Journal", "compact"),
            ("Journal", "flush"),
        ]
    );
    assert!(events.iter().all(|e| e.contract == "Journal"));

    // The trailing slice is one value.
    let log_before = &events[4];
    assert_eq!(log_before.names(), vec!["level", "lines"]);
    assert_eq!(log_before.values[1].1, "[\"disk full\", \"disk full\"]");

    let compact_after = &events[7];
    assert_eq!(compact_after.values, vec![
        ("count", "1".to_string()),
        ("truncated", "true".to_string()),
    ]);

    let flush: Vec<_> = events.iter().filter(|e| e.method == "flush").collect();
    assert_eq!(flush.len(), 2);
    assert!(flush.iter().all(|e| e.values.is_empty()));

    drop(events);
    let inner = JournalAspect::into_inner(journal);
    assert_eq!(inner.lines(), ["[2] disk full"]);
    assert_eq!(inner.flushes(), 1);
}

#[test]
fn method_generics_named_like_the_wrapper_param() {
    let (composer, log) = recording_composer(None);
    let bulk = BulkAspect::new(MemoryBulk::default(), composer);

    assert_eq!(bulk.put_all(vec![1u8, 2, 3]), 3);
    assert_eq!(bulk.put_all(4..6u8), 2);
    assert_eq!(BULK_ASPECT_METHOD_PUT_ALL.params[0].type_name, "I");

    // The contract's own `into_inner` is intercepted like any other method.
    assert_eq!(bulk.into_inner(), vec![1, 2, 3, 4, 5]);

    let events = log.lock();
    let calls: Vec<_> = events
        .iter()
        .map(|e| (e.phase.clone(), e.method, e.values.clone()))
        .collect();
    assert_eq!(
        calls,
        vec![
            (Phase::Before, "put_all", vec![("items", "[1, 2, 3]".to_string())]),
            (Phase::After, "put_all", vec![("added", "3".to_string())]),
            (Phase::Before, "put_all", vec![("items", "4..6".to_string())]),
            (Phase::After, "put_all", vec![("added", "2".to_string())]),
            (Phase::Before, "into_inner", vec![]),
            (Phase::After, "into_inner", vec![("bytes", "[1, 2, 3, 4, 5]".to_string())]),
        ]
    );
}

#[test]
fn unwrapping_skips_interception() {
    let (composer, log) = recording_composer(None);
    let bulk = BulkAspect::new(MemoryBulk::default(), composer);
    bulk.put_all([9u8]);

    let inner = BulkAspect::into_inner(bulk);
    assert_eq!(log.lock().len(), 2);
    assert_eq!(inner.into_inner(), vec![9]);
    assert_eq!(log.lock().len(), 2);
}

#[test]
fn compiled_out_methods_are_not_wrapped() {
    let names: Vec<_> = TOGGLE_ASPECT_CONTRACT.methods.iter().map(|m| m.name).collect();
    assert_eq!(names, vec!["flip"]);

    let (composer, log) = recording_composer(None);
    let toggle = ToggleAspect::new(MemoryToggle::default(), composer);
    assert!(toggle.flip());
    assert!(!toggle.flip());

    let events = log.lock();
    assert_eq!(events.len(), 4);
    assert_eq!(events[3].values, vec![("on", "false".to_string())]);
}

#[test]
fn async_methods_are_awaited() {
    let (composer, log) = recording_composer(None);
    let fetcher = InstrumentedFetcher::new(
        StaticFetcher::default().with_body("mem://readme", "hello"),
        composer,
    );

    let body = futures::executor::block_on(fetcher.fetch("mem://readme"));
    assert_eq!(body.as_deref(), Ok("hello"));

    let events = log.lock();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].values, vec![("url", "\"mem://readme\"".to_string())]);
    assert_eq!(events[1].values, vec![("body", "Ok(\"hello\")".to_string())]);
}

#[test]
fn generated_descriptors() {
    let names: Vec<_> = STORE_ASPECT_CONTRACT.methods.iter().map(|m| m.name).collect();
    assert_eq!(names, vec!["get", "set", "delete"]);
    assert!(StoreAspect::<MemoryStore>::contract().same_as(&STORE_ASPECT_CONTRACT));

    let set = STORE_ASPECT_CONTRACT.method("set").unwrap();
    let params: Vec<_> = set.params.iter().map(|p| (p.name, p.position)).collect();
    assert_eq!(params, vec![("ctx", 0), ("key", 1), ("value", 2)]);
    assert_eq!(set.params[2].type_name, "Vec<u8>");
    assert_eq!(set.results[0].name, "err");

    let journal: Vec<_> = JOURNAL_ASPECT_CONTRACT
        .methods
        .iter()
        .map(|m| m.qualified_name())
        .collect();
    assert_eq!(
        journal,
        vec![
            "Reader::read",
            "Writer::write",
            "Journal::log",
            "Journal::compact",
            "Journal::flush",
        ]
    );
    assert!(JOURNAL_ASPECT_METHOD_LOG.variadic);
    assert_eq!(JOURNAL_ASPECT_METHOD_LOG.params[1].type_name, "&[String]");

    assert_eq!(INSTRUMENTED_FETCHER_CONTRACT.name, "Fetcher");
}

#[test]
fn pooled_composer_recycles_buffers() {
    let pool = Arc::new(InstancePool::new());
    let (composer, log) = recording_composer(Some(Arc::clone(&pool)));
    let store = StoreAspect::new(MemoryStore::default(), composer);
    let ctx = Context { request_id: 3 };

    for i in 0..5u8 {
        store.set(&ctx, "k", vec![i]).unwrap();
    }

    assert_eq!(log.lock().len(), 10);
    let stats = pool.stats();
    assert_eq!(stats.acquired, 5);
    assert_eq!(stats.reused, 4);
    assert_eq!(pool.idle(), 1);
}
