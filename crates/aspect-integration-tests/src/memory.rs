//! In-memory contract implementations

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::contracts::{
    Bulk, Context, Fetcher, Journal, Reader, Store, StoreError, Toggle, Writer,
};

/// Mutex-guarded map
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl Store for MemoryStore {
    fn get(&self, _ctx: &Context, key: &str) -> Result<Vec<u8>, StoreError> {
        self.entries
            .lock()
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    fn set(&self, _ctx: &Context, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        if key.is_empty() {
            return Err(StoreError::InvalidKey);
        }
        self.entries.lock().insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&self, _ctx: &Context, key: &str) -> Result<(), StoreError> {
        self.entries
            .lock()
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }
}

/// Journal kept entirely in memory
#[derive(Debug, Default)]
pub struct MemoryJournal {
    entries: HashMap<String, String>,
    lines: Vec<String>,
    flushes: usize,
}

impl MemoryJournal {
    /// Log lines currently held
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Number of `flush` calls seen
    pub fn flushes(&self) -> usize {
        self.flushes
    }
}

impl Reader for MemoryJournal {
    fn read(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }
}

impl Writer for MemoryJournal {
    fn write(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }
}

impl Journal for MemoryJournal {
    fn log(&mut self, level: u8, lines: &[String]) {
        self.lines
            .extend(lines.iter().map(|line| format!("[{level}] {line}")));
    }

    fn compact(&mut self) -> (usize, bool) {
        let before = self.lines.len();
        self.lines.dedup();
        (self.lines.len(), self.lines.len() != before)
    }

    fn flush(&mut self) {
        self.flushes += 1;
    }
}

/// Serves canned bodies by URL
#[derive(Debug, Default)]
pub struct StaticFetcher {
    bodies: HashMap<String, String>,
}

impl StaticFetcher {
    /// Serve `body` for `url`
    pub fn with_body(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.bodies.insert(url.into(), body.into());
        self
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<String, StoreError> {
        self.bodies
            .get(url)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(url.to_string()))
    }
}

/// Bytes appended in call order
#[derive(Debug, Default)]
pub struct MemoryBulk {
    bytes: Mutex<Vec<u8>>,
}

impl Bulk for MemoryBulk {
    fn put_all<I: IntoIterator<Item = u8> + std::fmt::Debug>(&self, items: I) -> usize {
        let mut bytes = self.bytes.lock();
        let before = bytes.len();
        bytes.extend(items);
        bytes.len() - before
    }

    fn into_inner(self) -> Vec<u8> {
        self.bytes.into_inner()
    }
}

/// Switch guarded by a mutex
#[derive(Debug, Default)]
pub struct MemoryToggle {
    on: Mutex<bool>,
}

impl Toggle for MemoryToggle {
    fn flip(&self) -> bool {
        let mut on = self.on.lock();
        *on = !*on;
        *on
    }
}
