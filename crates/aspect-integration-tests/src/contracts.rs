//! Capability contracts

use aspect_macros::contract;
use async_trait::async_trait;

/// Per-request context passed to store operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    /// Caller-chosen request id
    pub request_id: u64,
}

/// Store failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Key is absent
    NotFound(String),
    /// Key is empty
    InvalidKey,
}

/// Key-value storage
#[contract]
pub trait Store: Send + Sync {
    /// Value stored under `key`
    #[results(value)]
    fn get(&self, ctx: &Context, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Store `value` under `key`
    #[results(err)]
    fn set(&self, ctx: &Context, key: &str, value: Vec<u8>) -> Result<(), StoreError>;

    /// Remove `key`
    #[results(err)]
    fn delete(&self, ctx: &Context, key: &str) -> Result<(), StoreError>;
}

/// Read side of a journal
#[contract]
pub trait Reader {
    /// Latest entry for `key`
    fn read(&self, key: &str) -> Option<String>;
}

/// Write side of a journal
#[contract]
pub trait Writer {
    /// Record an entry
    fn write(&mut self, key: &str, value: String);
}

/// Append-only journal with free-form log lines
#[contract]
pub trait Journal: Reader + Writer + Send {
    /// Append log lines at `level`
    fn log(&mut self, level: u8, lines: &[String]);

    /// Drop repeated lines, returning the remaining count and whether
    /// anything was removed
    #[results(count, truncated)]
    fn compact(&mut self) -> (usize, bool);

    /// Flush pending writes
    fn flush(&mut self);
}

/// Remote resource access
#[contract]
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Body of the resource at `url`
    #[results(body)]
    async fn fetch(&self, url: &str) -> Result<String, StoreError>;
}

/// Byte sink fed from any iterator
#[contract]
pub trait Bulk {
    /// Append every byte of `items`, returning how many were added
    #[results(added)]
    fn put_all<I: IntoIterator<Item = u8> + std::fmt::Debug>(&self, items: I) -> usize;

    /// Consume the sink, returning its bytes
    #[results(bytes)]
    fn into_inner(self) -> Vec<u8>;
}

/// Two-state switch with a method compiled out of this build
#[contract]
pub trait Toggle {
    /// Invert the state, returning the new one
    #[results(on)]
    fn flip(&self) -> bool;

    /// Never compiled
    #[cfg(any())]
    fn hidden(&self);
}
