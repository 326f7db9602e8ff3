//! Interceptor that reports call boundaries as `tracing` events
//!
//! Each call emits a `before` event carrying the parameters and an `after`
//! event carrying the results and the elapsed time, both at the level the
//! factory was built with.

use std::time::Instant;

use tracing::Level;

use crate::contract::{ContractInfo, MethodInfo};
use crate::interceptor::{Interceptor, InterceptorFactory};
use crate::value::{render, NamedValue};

/// Factory for interceptors that log every call boundary through `tracing`
#[derive(Debug, Clone, Copy)]
pub struct TracingInterceptorFactory {
    level: Level,
}

impl TracingInterceptorFactory {
    /// Log at `level`
    pub fn new(level: Level) -> Self {
        Self { level }
    }
}

impl Default for TracingInterceptorFactory {
    fn default() -> Self {
        Self::new(Level::DEBUG)
    }
}

impl InterceptorFactory for TracingInterceptorFactory {
    fn interceptor(
        &self,
        contract: &'static ContractInfo,
        method: &'static MethodInfo,
    ) -> Box<dyn Interceptor> {
        Box::new(TracingInterceptor {
            contract,
            method,
            level: self.level,
            started: None,
        })
    }
}

struct TracingInterceptor {
    contract: &'static ContractInfo,
    method: &'static MethodInfo,
    level: Level,
    started: Option<Instant>,
}

macro_rules! event_at {
    ($level:expr, $($arg:tt)+) => {{
        let level = $level;
        if level == Level::TRACE {
            tracing::trace!($($arg)+)
        } else if level == Level::DEBUG {
            tracing::debug!($($arg)+)
        } else if level == Level::INFO {
            tracing::info!($($arg)+)
        } else if level == Level::WARN {
            tracing::warn!($($arg)+)
        } else {
            tracing::error!($($arg)+)
        }
    }};
}

impl Interceptor for TracingInterceptor {
    fn before(&mut self, values: &[NamedValue<'_>]) {
        self.started = Some(Instant::now());
        event_at!(
            self.level,
            contract = self.contract.name,
            method = self.method.name,
            params = %render(values),
            "before"
        );
    }

    fn after(&mut self, values: &[NamedValue<'_>]) {
        let elapsed_us = self
            .started
            .map(|started| started.elapsed().as_micros() as u64)
            .unwrap_or_default();
        event_at!(
            self.level,
            contract = self.contract.name,
            method = self.method.name,
            results = %render(values),
            elapsed_us,
            "after"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;
    use crate::composer::ChainComposer;

    static NOW: MethodInfo = MethodInfo {
        name: "now",
        owner: "Clock",
        params: &[],
        variadic: false,
        results: &[],
    };

    static CLOCK: ContractInfo = ContractInfo {
        name: "Clock",
        methods: &[&NOW],
    };

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Capture {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }
    }

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture(max_level: Level) -> (Capture, tracing::subscriber::DefaultGuard) {
        let capture = Capture::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(max_level)
            .finish();
        (capture, tracing::subscriber::set_default(subscriber))
    }

    #[test]
    fn before_and_after_events_carry_call_fields() {
        let (capture, _guard) = capture(Level::TRACE);

        let composer = ChainComposer::new().with_factory(TracingInterceptorFactory::default());
        let mut aggregate = composer.produce(&CLOCK, &NOW);
        let ticks = 3u64;
        let at = 7u64;
        aggregate.before(&[NamedValue::new("ticks", &ticks)]);
        aggregate.after(&[NamedValue::new("at", &at)]);

        let text = capture.text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2, "{text}");

        let before = lines[0];
        assert!(before.contains("DEBUG"), "{before}");
        assert!(before.contains("before"), "{before}");
        assert!(before.contains("contract=\"Clock\""), "{before}");
        assert!(before.contains("method=\"now\""), "{before}");
        assert!(before.contains("params=ticks=3"), "{before}");

        let after = lines[1];
        assert!(after.contains("after"), "{after}");
        assert!(after.contains("contract=\"Clock\""), "{after}");
        assert!(after.contains("method=\"now\""), "{after}");
        assert!(after.contains("results=at=7"), "{after}");
        assert!(after.contains("elapsed_us="), "{after}");
    }

    #[test]
    fn events_respect_the_configured_level() {
        let (capture, _guard) = capture(Level::INFO);

        let quiet = ChainComposer::new().with_factory(TracingInterceptorFactory::new(Level::TRACE));
        let mut aggregate = quiet.produce(&CLOCK, &NOW);
        aggregate.before(&[]);
        aggregate.after(&[]);
        assert!(capture.text().is_empty());

        let loud = ChainComposer::new().with_factory(TracingInterceptorFactory::new(Level::WARN));
        let mut aggregate = loud.produce(&CLOCK, &NOW);
        aggregate.before(&[]);
        aggregate.after(&[]);
        let text = capture.text();
        assert_eq!(text.lines().count(), 2, "{text}");
        assert!(text.lines().all(|line| line.contains("WARN")), "{text}");
    }

    #[test]
    fn logs_without_subscriber() {
        let composer = ChainComposer::new().with_factory(TracingInterceptorFactory::new(Level::INFO));
        let mut aggregate = composer.produce(&CLOCK, &NOW);
        let tick = 7u64;
        aggregate.before(&[]);
        aggregate.after(&[NamedValue::new("", &tick)]);
        assert_eq!(aggregate.len(), 1);
    }
}
