// src/store/memory.rs

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::errors::{GanttError, Result};
use crate::model::{GanttDocument, GroupId};

use super::{ScheduleStore, StoreFuture, empty_payload};

/// Keeps raw payloads per group in memory. Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    groups: Arc<Mutex<HashMap<GroupId, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a raw payload in place, as if an earlier session had saved it.
    pub fn seed(&self, group: impl Into<GroupId>, payload: Value) {
        if let Ok(mut groups) = self.groups.lock() {
            groups.insert(group.into(), payload);
        }
    }

    /// Current payload of `group`, if anything was stored.
    pub fn snapshot(&self, group: &str) -> Option<Value> {
        self.groups.lock().ok()?.get(group).cloned()
    }

    fn lock_err() -> GanttError {
        GanttError::Other(anyhow::anyhow!("memory store lock poisoned"))
    }
}

impl ScheduleStore for MemoryStore {
    fn load<'a>(&'a self, group: &'a str) -> StoreFuture<'a, Value> {
        Box::pin(async move {
            let groups = self.groups.lock().map_err(|_| Self::lock_err())?;
            Ok(groups.get(group).cloned().unwrap_or_else(empty_payload))
        })
    }

    fn save<'a>(&'a self, group: &'a str, document: &'a GanttDocument) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let value = document.to_value()?;
            let mut groups = self.groups.lock().map_err(|_| Self::lock_err())?;
            groups.insert(group.to_string(), value);
            Ok(())
        })
    }
}
