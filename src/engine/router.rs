// src/engine/router.rs

//! Per-group edit serialization.
//!
//! Every group gets one worker task that owns its [`GroupCore`] and reads
//! edits from a bounded, ordered queue. Edit N+1 is only taken once edit N
//! has been applied (and, in strict mode, persisted). Different groups run
//! concurrently and never share state.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::chart::ChartSink;
use crate::errors::{GanttError, Result};
use crate::model::wire::normalize;
use crate::model::{GanttDocument, GroupId};
use crate::schedule::ScheduleGraph;
use crate::store::ScheduleStore;
use crate::types::PersistMode;

use super::core::GroupCore;
use super::{CoreCommand, GroupEvent, RuntimeOptions};

struct GroupHandle {
    tx: mpsc::Sender<GroupEvent>,
    join: JoinHandle<Result<ScheduleGraph>>,
}

/// Routes group events to their workers, spawning workers on first use.
pub struct GroupRouter {
    store: Arc<dyn ScheduleStore>,
    chart: Arc<dyn ChartSink>,
    options: RuntimeOptions,
    workers: HashMap<GroupId, GroupHandle>,
}

impl fmt::Debug for GroupRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupRouter")
            .field("options", &self.options)
            .field("groups", &self.workers.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl GroupRouter {
    pub fn new(store: Arc<dyn ScheduleStore>, chart: Arc<dyn ChartSink>, options: RuntimeOptions) -> Self {
        Self {
            store,
            chart,
            options,
            workers: HashMap::new(),
        }
    }

    /// Groups that currently have a worker, sorted.
    pub fn active_groups(&self) -> Vec<&str> {
        let mut groups: Vec<&str> = self.workers.keys().map(String::as_str).collect();
        groups.sort_unstable();
        groups
    }

    /// Queue `event` behind the group's earlier edits.
    ///
    /// Waits while the group's queue is full.
    pub async fn dispatch(&mut self, group: GroupId, event: GroupEvent) {
        let handle = self.workers.entry(group.clone()).or_insert_with(|| {
            spawn_group_worker(group.clone(), self.store.clone(), self.chart.clone(), self.options)
        });

        if handle.tx.send(event).await.is_err() {
            warn!(group = %group, "group worker has stopped; dropping edit");
        }
    }

    /// Close every queue, let the workers drain them, and collect the final
    /// graph of each group that loaded successfully.
    pub async fn shutdown(self) -> HashMap<GroupId, ScheduleGraph> {
        let joins: Vec<(GroupId, JoinHandle<Result<ScheduleGraph>>)> = self
            .workers
            .into_iter()
            .map(|(group, handle)| {
                drop(handle.tx);
                (group, handle.join)
            })
            .collect();

        let mut graphs = HashMap::new();
        for (group, join) in joins {
            match join.await {
                Ok(Ok(graph)) => {
                    graphs.insert(group, graph);
                }
                Ok(Err(e)) => warn!(group = %group, error = %e, "group worker failed"),
                Err(e) => warn!(group = %group, error = %e, "group worker panicked or was cancelled"),
            }
        }
        graphs
    }
}

fn spawn_group_worker(
    group: GroupId,
    store: Arc<dyn ScheduleStore>,
    chart: Arc<dyn ChartSink>,
    options: RuntimeOptions,
) -> GroupHandle {
    let (tx, rx) = mpsc::channel(options.edit_queue_length.max(1));
    debug!(group = %group, queue = options.edit_queue_length, "spawning group worker");
    let join = tokio::spawn(run_group_worker(group, rx, store, chart, options));
    GroupHandle { tx, join }
}

/// Load the group, then apply its edits one at a time until the queue closes.
pub async fn run_group_worker(
    group: GroupId,
    mut rx: mpsc::Receiver<GroupEvent>,
    store: Arc<dyn ScheduleStore>,
    chart: Arc<dyn ChartSink>,
    options: RuntimeOptions,
) -> Result<ScheduleGraph> {
    let raw = store.load(&group).await?;
    let mut core = GroupCore::from_ingress(group.clone(), normalize(&raw), options.echo_window);

    let writer = match options.persist_mode {
        PersistMode::Strict => None,
        PersistMode::Optimistic => Some(spawn_writer(group.clone(), store.clone(), chart.clone())),
    };

    while let Some(event) = rx.recv().await {
        debug!(group = %group, kind = event.kind(), "group worker received event");
        let step = core.step(event);

        for command in step.commands {
            match command {
                CoreCommand::Persist(document) => match &writer {
                    Some(writer) => {
                        if writer.tx.send(document).is_err() {
                            warn!(group = %group, "writer has stopped; schedule kept in memory only");
                        }
                    }
                    None => {
                        if let Err(e) = persist(store.as_ref(), &group, &document).await {
                            chart.persist_failed(&group, &e);
                        }
                    }
                },
                CoreCommand::Render(frame) => chart.render(&group, &frame),
                CoreCommand::Reject { task, error } => chart.rejected(&group, &task, &error),
            }
        }
    }

    if let Some(writer) = writer {
        drop(writer.tx);
        if let Err(e) = writer.join.await {
            warn!(group = %group, error = %e, "writer task failed");
        }
    }

    info!(group = %group, "group worker stopped");
    Ok(core.into_graph())
}

/// Ordered background writer used in optimistic mode.
struct Writer {
    tx: mpsc::UnboundedSender<GanttDocument>,
    join: JoinHandle<()>,
}

fn spawn_writer(group: GroupId, store: Arc<dyn ScheduleStore>, chart: Arc<dyn ChartSink>) -> Writer {
    let (tx, mut rx) = mpsc::unbounded_channel::<GanttDocument>();
    let join = tokio::spawn(async move {
        while let Some(document) = rx.recv().await {
            if let Err(e) = persist(store.as_ref(), &group, &document).await {
                chart.persist_failed(&group, &e);
            }
        }
    });
    Writer { tx, join }
}

/// Save, logging a failure as [`GanttError::StorePersistFailure`]. The
/// in-memory schedule stays authoritative either way.
async fn persist(store: &dyn ScheduleStore, group: &str, document: &GanttDocument) -> Result<()> {
    match store.save(group, document).await {
        Ok(()) => Ok(()),
        Err(e) => {
            let failure = match e {
                GanttError::StorePersistFailure { .. } => e,
                other => GanttError::StorePersistFailure {
                    group: group.to_string(),
                    reason: other.to_string(),
                },
            };
            warn!(error = %failure, "keeping schedule in memory");
            Err(failure)
        }
    }
}
