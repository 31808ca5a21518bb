// src/store/mod.rs

//! Pluggable schedule store.
//!
//! The runtime loads and saves each group's `{tasks, links}` collections
//! through a [`ScheduleStore`] instead of touching files directly. This
//! keeps the group workers testable with an in-memory or failing store.
//!
//! - [`FileStore`] keeps one JSON document per group under a directory.
//! - [`MemoryStore`] keeps documents in memory (tests, `mode = "memory"`).

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use crate::config::ConfigFile;
use crate::errors::Result;
use crate::model::GanttDocument;
use crate::types::StoreMode;

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Boxed future returned by store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Per-group persistence of the schedule collections.
pub trait ScheduleStore: Send + Sync {
    /// Fetch the raw payload of `group`.
    ///
    /// A group that was never saved yields an empty document. The payload is
    /// not validated here; callers normalize it with
    /// [`crate::model::wire::normalize`].
    fn load<'a>(&'a self, group: &'a str) -> StoreFuture<'a, Value>;

    /// Replace the stored collections of `group`.
    fn save<'a>(&'a self, group: &'a str, document: &'a GanttDocument) -> StoreFuture<'a, ()>;
}

/// Build the store selected by `[store]`.
pub fn build_store(cfg: &ConfigFile) -> Arc<dyn ScheduleStore> {
    match cfg.store.mode {
        StoreMode::File => Arc::new(FileStore::new(&cfg.store.dir)),
        StoreMode::Memory => Arc::new(MemoryStore::new()),
    }
}

/// Empty `{tasks, links}` payload.
pub(crate) fn empty_payload() -> Value {
    serde_json::json!({ "tasks": [], "links": [] })
}
