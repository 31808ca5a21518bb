// src/engine/core.rs

//! Pure per-group edit core.
//!
//! [`GroupCore`] consumes [`GroupEvent`]s and produces:
//! - an updated schedule graph
//! - a list of commands describing what the IO shell should do next
//!
//! It has no channels, no Tokio types and performs no IO, so the full edit
//! semantics can be tested synchronously.

use tracing::{debug, info, warn};

use crate::engine::echo::EchoFilter;
use crate::engine::event_handlers::{
    CoreCommand, CoreStep, EditOutcome, RenderFrame, handle_dependent_selected, handle_links_changed,
    handle_task_added, handle_task_changed, handle_task_deleted,
};
use crate::engine::{CorrelationId, EditOrigin, GroupEvent};
use crate::model::{GanttDocument, GroupId, Ingress};
use crate::schedule::ScheduleGraph;

/// Edit state of one group.
///
/// Edits are applied strictly one after another, each to the graph left by
/// the previous one.
#[derive(Debug)]
pub struct GroupCore {
    group: GroupId,
    graph: ScheduleGraph,
    echoes: EchoFilter,
    last_correlation: CorrelationId,
}

impl GroupCore {
    pub fn new(group: impl Into<GroupId>, graph: ScheduleGraph, echo_window: usize) -> Self {
        Self {
            group: group.into(),
            graph,
            echoes: EchoFilter::new(echo_window),
            last_correlation: 0,
        }
    }

    /// Build from a freshly normalized store payload, logging what ingress
    /// dropped and any dependency loops already present.
    pub fn from_ingress(group: impl Into<GroupId>, ingress: Ingress, echo_window: usize) -> Self {
        let core = Self::new(group, ingress.graph, echo_window);

        if !ingress.rejected.is_empty() {
            warn!(
                group = %core.group,
                rejected = ingress.rejected.len(),
                "stored schedule contained malformed entries"
            );
        }
        for link in core.graph.dangling_links() {
            warn!(group = %core.group, link = %link.id, "stored link references a missing task");
        }
        for cycle in core.graph.dependency_cycles() {
            warn!(group = %core.group, tasks = ?cycle, "stored links form a dependency cycle");
        }

        info!(
            group = %core.group,
            tasks = core.graph.len(),
            links = core.graph.links().len(),
            "loaded group schedule"
        );
        core
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn graph(&self) -> &ScheduleGraph {
        &self.graph
    }

    pub fn into_graph(self) -> ScheduleGraph {
        self.graph
    }

    /// Correlation id of the most recent render, if any.
    pub fn last_correlation(&self) -> Option<CorrelationId> {
        (self.last_correlation > 0).then_some(self.last_correlation)
    }

    /// Whether an event with this origin is one the core must not act on:
    /// propagation-induced events, and chart echoes of our own renders.
    pub fn is_echo(&self, origin: EditOrigin) -> bool {
        match origin {
            EditOrigin::Propagation => true,
            EditOrigin::Chart { echo_of: Some(id) } => self.echoes.is_echo(id),
            EditOrigin::Chart { echo_of: None } | EditOrigin::Form => false,
        }
    }

    /// Handle a single event, updating the graph and returning the commands
    /// for the IO shell.
    pub fn step(&mut self, event: GroupEvent) -> CoreStep {
        let origin = event.origin();
        if self.is_echo(origin) {
            debug!(group = %self.group, kind = event.kind(), ?origin, "ignoring echoed event");
            return CoreStep::default();
        }

        let outcome = match event {
            GroupEvent::TaskChanged { task, origin } => handle_task_changed(&self.graph, task, origin),
            GroupEvent::TaskAdded {
                task,
                dependent,
                origin,
            } => handle_task_added(&self.graph, task, dependent, origin),
            GroupEvent::TaskDeleted { id, origin } => handle_task_deleted(&self.graph, id, origin),
            GroupEvent::DependentSelected {
                source,
                target,
                link_id,
                origin,
            } => handle_dependent_selected(&self.graph, source, target, link_id, origin),
            GroupEvent::LinksChanged { links, origin } => handle_links_changed(&self.graph, links, origin),
        };

        self.apply(outcome)
    }

    fn apply(&mut self, outcome: EditOutcome) -> CoreStep {
        match outcome {
            EditOutcome::Ignored => CoreStep::default(),
            EditOutcome::Rejected { task, error } => CoreStep {
                commands: vec![CoreCommand::Reject { task, error }],
                report: None,
            },
            EditOutcome::Applied {
                graph,
                changes,
                report,
            } => {
                self.graph = graph;
                let correlation = self.next_correlation();
                let document = GanttDocument::from_graph(&self.graph);
                CoreStep {
                    commands: vec![
                        CoreCommand::Persist(document.clone()),
                        CoreCommand::Render(RenderFrame {
                            correlation,
                            document,
                            changes,
                        }),
                    ],
                    report,
                }
            }
        }
    }

    fn next_correlation(&mut self) -> CorrelationId {
        self.last_correlation += 1;
        self.echoes.remember(self.last_correlation);
        self.last_correlation
    }
}
