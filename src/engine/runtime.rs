// src/engine/runtime.rs

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::chart::ChartSink;
use crate::errors::Result;
use crate::model::GroupId;
use crate::schedule::ScheduleGraph;
use crate::store::ScheduleStore;

use super::router::GroupRouter;
use super::{RuntimeEvent, RuntimeOptions};

/// Reads `RuntimeEvent`s and routes group edits to per-group workers.
///
/// All edit semantics live in [`super::core::GroupCore`]; this struct only
/// moves events between channels, the store and the chart.
pub struct Runtime {
    router: GroupRouter,
    event_rx: mpsc::Receiver<RuntimeEvent>,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("router", &self.router)
            .finish_non_exhaustive()
    }
}

impl Runtime {
    pub fn new(
        event_rx: mpsc::Receiver<RuntimeEvent>,
        store: Arc<dyn ScheduleStore>,
        chart: Arc<dyn ChartSink>,
        options: RuntimeOptions,
    ) -> Self {
        Self {
            router: GroupRouter::new(store, chart, options),
            event_rx,
        }
    }

    /// Main event loop.
    ///
    /// Runs until `ShutdownRequested` arrives or every sender is dropped,
    /// then drains all group queues and returns each group's final graph.
    pub async fn run(mut self) -> Result<HashMap<GroupId, ScheduleGraph>> {
        info!("ganttline runtime started");

        loop {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("runtime event channel closed; exiting");
                    break;
                }
            };

            match event {
                RuntimeEvent::Group { group, event } => {
                    debug!(group = %group, kind = event.kind(), "runtime received event");
                    self.router.dispatch(group, event).await;
                }
                RuntimeEvent::ShutdownRequested => {
                    info!("shutdown requested; draining group queues");
                    break;
                }
            }
        }

        let graphs = self.router.shutdown().await;
        info!(groups = graphs.len(), "runtime exiting");
        Ok(graphs)
    }
}
