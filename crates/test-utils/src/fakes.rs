use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ganttline::chart::ChartSink;
use ganttline::engine::RenderFrame;
use ganttline::errors::{GanttError, Result};
use ganttline::model::GanttDocument;
use ganttline::store::{MemoryStore, ScheduleStore, StoreFuture};
use serde_json::Value;

/// A chart that records every render and rejection.
#[derive(Default)]
pub struct RecordingChart {
    frames: Mutex<Vec<(String, RenderFrame)>>,
    rejections: Mutex<Vec<(String, String, String)>>,
    persist_failures: Mutex<Vec<(String, String)>>,
}

impl RecordingChart {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// `(group, frame)` in render order.
    pub fn frames(&self) -> Vec<(String, RenderFrame)> {
        self.frames.lock().unwrap().clone()
    }

    pub fn frames_for(&self, group: &str) -> Vec<RenderFrame> {
        self.frames()
            .into_iter()
            .filter(|(g, _)| g == group)
            .map(|(_, f)| f)
            .collect()
    }

    /// `(group, task, error message)` in order.
    pub fn rejections(&self) -> Vec<(String, String, String)> {
        self.rejections.lock().unwrap().clone()
    }

    /// `(group, error message)` in order.
    pub fn persist_failures(&self) -> Vec<(String, String)> {
        self.persist_failures.lock().unwrap().clone()
    }
}

impl ChartSink for RecordingChart {
    fn render(&self, group: &str, frame: &RenderFrame) {
        self.frames
            .lock()
            .unwrap()
            .push((group.to_string(), frame.clone()));
    }

    fn rejected(&self, group: &str, task: &str, error: &GanttError) {
        self.rejections
            .lock()
            .unwrap()
            .push((group.to_string(), task.to_string(), error.to_string()));
    }

    fn persist_failed(&self, group: &str, error: &GanttError) {
        self.persist_failures
            .lock()
            .unwrap()
            .push((group.to_string(), error.to_string()));
    }
}

/// A store wrapping `MemoryStore` that:
/// - records every save attempt (group + document) in order
/// - can be told to fail saves
/// - can delay saves to expose ordering problems.
#[derive(Default)]
pub struct RecordingStore {
    inner: MemoryStore,
    saves: Mutex<Vec<(String, GanttDocument)>>,
    fail_saves: AtomicBool,
    failures: AtomicUsize,
    delay_ms: AtomicUsize,
}

impl RecordingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.inner
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_saves.store(failing, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms.store(delay.as_millis() as usize, Ordering::SeqCst);
    }

    /// Every attempted save, in order, including failed ones.
    pub fn saves(&self) -> Vec<(String, GanttDocument)> {
        self.saves.lock().unwrap().clone()
    }

    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::SeqCst)
    }
}

impl ScheduleStore for RecordingStore {
    fn load<'a>(&'a self, group: &'a str) -> StoreFuture<'a, Value> {
        self.inner.load(group)
    }

    fn save<'a>(&'a self, group: &'a str, document: &'a GanttDocument) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let delay = self.delay_ms.load(Ordering::SeqCst);
            if delay > 0 {
                tokio::time::sleep(Duration::from_millis(delay as u64)).await;
            }

            self.saves
                .lock()
                .unwrap()
                .push((group.to_string(), document.clone()));

            if self.fail_saves.load(Ordering::SeqCst) {
                self.failures.fetch_add(1, Ordering::SeqCst);
                return Err(GanttError::StorePersistFailure {
                    group: group.to_string(),
                    reason: "store offline".to_string(),
                });
            }

            let result: Result<()> = self.inner.save(group, document).await;
            result
        })
    }
}
