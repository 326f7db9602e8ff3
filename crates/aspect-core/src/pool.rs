//! Reuse pool for aggregate interceptor child buffers
//!
//! An [`AggregateInterceptor`](crate::AggregateInterceptor) is a stack value,
//! so the per-call allocation worth recycling is its child buffer. The pool
//! keeps a free list of those buffers keyed only by capacity. A buffer is
//! truncated to zero length before `acquire` returns it, so no caller can
//! observe children left over from an earlier call.
//!
//! The pool is an explicit object: whoever builds the
//! [`ChainComposer`](crate::ChainComposer) owns it and decides its lifetime.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::interceptor::Interceptor;

/// Child buffer recycled by the pool
pub type Shell = Vec<Box<dyn Interceptor>>;

/// Shared free list of child buffers
pub struct InstancePool {
    free: Mutex<Vec<Shell>>,
    max_idle: usize,
    acquired: AtomicU64,
    reused: AtomicU64,
    released: AtomicU64,
    discarded: AtomicU64,
}

/// Snapshot of pool counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Buffers handed out
    pub acquired: u64,
    /// Handouts served from the free list
    pub reused: u64,
    /// Buffers returned to the free list
    pub released: u64,
    /// Buffers dropped because the free list was full
    pub discarded: u64,
}

impl InstancePool {
    /// Idle buffers kept by [`InstancePool::new`]
    pub const DEFAULT_MAX_IDLE: usize = 64;

    /// Capacity of freshly allocated buffers
    pub const DEFAULT_CAPACITY: usize = 10;

    /// Create a pool that keeps up to [`Self::DEFAULT_MAX_IDLE`] idle buffers
    pub fn new() -> Self {
        Self::with_max_idle(Self::DEFAULT_MAX_IDLE)
    }

    /// Create a pool with an explicit idle bound
    pub fn with_max_idle(max_idle: usize) -> Self {
        Self {
            free: Mutex::new(Vec::with_capacity(max_idle.min(Self::DEFAULT_MAX_IDLE))),
            max_idle,
            acquired: AtomicU64::new(0),
            reused: AtomicU64::new(0),
            released: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
        }
    }

    /// Take an empty buffer with room for at least `min_capacity` children
    pub fn acquire(&self, min_capacity: usize) -> Shell {
        let recycled = self.free.lock().pop();
        self.acquired.fetch_add(1, Ordering::Relaxed);
        match recycled {
            Some(mut shell) => {
                self.reused.fetch_add(1, Ordering::Relaxed);
                shell.clear();
                shell.reserve(min_capacity);
                shell
            }
            None => Vec::with_capacity(min_capacity.max(Self::DEFAULT_CAPACITY)),
        }
    }

    /// Return a buffer; its children are dropped before it is stored
    pub fn release(&self, mut shell: Shell) {
        shell.clear();
        let mut free = self.free.lock();
        if free.len() < self.max_idle {
            free.push(shell);
            drop(free);
            self.released.fetch_add(1, Ordering::Relaxed);
        } else {
            drop(free);
            self.discarded.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(max_idle = self.max_idle, "interceptor pool full, dropping shell");
        }
    }

    /// Number of idle buffers
    pub fn idle(&self) -> usize {
        self.free.lock().len()
    }

    /// Counter snapshot
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            acquired: self.acquired.load(Ordering::Relaxed),
            reused: self.reused.load(Ordering::Relaxed),
            released: self.released.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
        }
    }
}

impl Default for InstancePool {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for InstancePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstancePool")
            .field("idle", &self.idle())
            .field("max_idle", &self.max_idle)
            .field("stats", &self.stats())
            .finish()
    }
}
