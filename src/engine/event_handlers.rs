// src/engine/event_handlers.rs

//! Event handling logic for the group core.
//!
//! Every handler is a pure function from the current graph and one edit to
//! an [`EditOutcome`]. Handlers never mutate the graph they are given; the
//! core swaps in the new graph only when the whole edit succeeded.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::errors::GanttError;
use crate::model::{GanttDocument, Link, LinkId, LinkType, Task, TaskId};
use crate::schedule::{PropagationReport, ScheduleGraph, apply_edit};

use super::{CorrelationId, EditOrigin};

/// A task touched by an applied edit, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub task: TaskId,
    pub origin: EditOrigin,
}

/// Everything the chart needs to redraw a group.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    pub correlation: CorrelationId,
    pub document: GanttDocument,
    /// The edited task first, then every task moved by propagation.
    pub changes: Vec<Change>,
}

/// Command produced by the core, to be executed by the async shell.
#[derive(Debug)]
pub enum CoreCommand {
    /// Write the full collections back to the store.
    Persist(GanttDocument),
    /// Redraw the chart.
    Render(RenderFrame),
    /// Tell the editing surface the edit was refused; the graph is unchanged.
    Reject { task: TaskId, error: GanttError },
}

/// Decision returned by the core after handling a single event.
#[derive(Debug, Default)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    /// Set when the event went through propagation.
    pub report: Option<PropagationReport>,
}

impl CoreStep {
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// What a handler decided.
#[derive(Debug)]
pub enum EditOutcome {
    Applied {
        graph: ScheduleGraph,
        changes: Vec<Change>,
        report: Option<PropagationReport>,
    },
    Rejected {
        task: TaskId,
        error: GanttError,
    },
    /// Nothing to do (no-op edit).
    Ignored,
}

impl EditOutcome {
    fn rejected(task: impl Into<TaskId>, error: GanttError) -> Self {
        let task = task.into();
        warn!(task = %task, error = %error, "edit rejected");
        EditOutcome::Rejected { task, error }
    }
}

/// Handle an edited task: compare with the stored version and propagate.
pub fn handle_task_changed(graph: &ScheduleGraph, task: Task, origin: EditOrigin) -> EditOutcome {
    let Some(stored) = graph.get_task(&task.id) else {
        let id = task.id.clone();
        return EditOutcome::rejected(id.clone(), GanttError::TaskNotFound(id));
    };

    if *stored == task {
        debug!(task = %task.id, "edit matches stored task; ignoring");
        return EditOutcome::Ignored;
    }

    let id = task.id.clone();
    match apply_edit(graph, task) {
        Ok(outcome) => {
            let mut changes = vec![Change {
                task: id.clone(),
                origin,
            }];
            changes.extend(outcome.report.rescheduled.iter().map(|moved| Change {
                task: moved.task.clone(),
                origin: EditOrigin::Propagation,
            }));
            info!(
                task = %id,
                ?origin,
                rescheduled = outcome.report.rescheduled.len(),
                "applied task edit"
            );
            EditOutcome::Applied {
                graph: outcome.graph,
                changes,
                report: Some(outcome.report),
            }
        }
        Err(error) => EditOutcome::rejected(id, error),
    }
}

/// Handle a new task, optionally linked FS to the dependent picked in the form.
///
/// The new link's gap is captured immediately from both schedules, so adding
/// a task never moves anything.
pub fn handle_task_added(
    graph: &ScheduleGraph,
    task: Task,
    dependent: Option<(LinkId, TaskId)>,
    origin: EditOrigin,
) -> EditOutcome {
    let id = task.id.clone();
    if let Err(error) = task.schedule.ensure_valid(&id) {
        return EditOutcome::rejected(id, error);
    }

    let mut next = graph.clone();
    if let Err(error) = next.insert_task(task) {
        return EditOutcome::rejected(id, error);
    }

    if let Some((link_id, target)) = dependent {
        if let Err(error) = next.link_tasks(link_id, &id, &target, LinkType::FinishToStart) {
            return EditOutcome::rejected(id, error);
        }
    }

    info!(task = %id, ?origin, "added task");
    EditOutcome::Applied {
        graph: next,
        changes: vec![Change { task: id, origin }],
        report: None,
    }
}

/// Handle a task deletion; incident links go with it.
pub fn handle_task_deleted(graph: &ScheduleGraph, id: TaskId, origin: EditOrigin) -> EditOutcome {
    let mut next = graph.clone();
    match next.remove_task(&id) {
        Ok((_, links)) => {
            info!(task = %id, ?origin, removed_links = links.len(), "deleted task");
            EditOutcome::Applied {
                graph: next,
                changes: vec![Change { task: id, origin }],
                report: None,
            }
        }
        Err(error) => EditOutcome::rejected(id, error),
    }
}

/// Handle the form's single-dependent selection.
pub fn handle_dependent_selected(
    graph: &ScheduleGraph,
    source: TaskId,
    target: Option<TaskId>,
    link_id: LinkId,
    origin: EditOrigin,
) -> EditOutcome {
    let current: Vec<&str> = graph
        .direct_dependents(&source)
        .iter()
        .map(|l| l.target.as_str())
        .collect();
    if current == target.as_deref().into_iter().collect::<Vec<_>>() {
        debug!(source = %source, "dependent selection unchanged; ignoring");
        return EditOutcome::Ignored;
    }

    let mut next = graph.clone();
    match next.set_dependent(&source, target.as_deref(), link_id) {
        Ok(link) => {
            info!(source = %source, target = ?target, link = ?link, ?origin, "updated dependent");
            EditOutcome::Applied {
                graph: next,
                changes: vec![Change {
                    task: source,
                    origin,
                }],
                report: None,
            }
        }
        Err(error) => EditOutcome::rejected(source, error),
    }
}

/// Handle the chart's full link collection.
///
/// Links are matched to the stored ones by id:
/// - same id and same edge: the stored link is kept, gap included;
/// - same id with another source, target or type: the link is recreated and
///   its gap recaptured from the current schedules;
/// - unknown id: a new link, keeping a gap it already carries or capturing
///   one now;
/// - stored links missing from the collection are removed.
///
/// New links that point at missing tasks or at their own source are dropped
/// with a warning.
pub fn handle_links_changed(graph: &ScheduleGraph, links: Vec<Link>, origin: EditOrigin) -> EditOutcome {
    let mut seen: HashSet<LinkId> = HashSet::new();
    let mut kept: Vec<Link> = Vec::new();
    let mut fresh: Vec<Link> = Vec::new();

    for link in links {
        if !seen.insert(link.id.clone()) {
            warn!(link = %link.id, "duplicate link id in chart update; keeping the first");
            continue;
        }

        match graph.get_link(&link.id) {
            Some(stored) if stored.same_edge(&link) => kept.push(stored.clone()),
            stored => {
                if link.source == link.target {
                    warn!(link = %link.id, task = %link.source, "dropping self-dependency");
                    continue;
                }
                if !graph.contains_task(&link.source) || !graph.contains_task(&link.target) {
                    warn!(
                        link = %link.id,
                        source = %link.source,
                        target = %link.target,
                        "dropping link to missing task"
                    );
                    continue;
                }
                let retargeted = stored.is_some();
                fresh.push(if retargeted {
                    Link::new(link.id, link.source, link.target, link.kind)
                } else {
                    link
                });
            }
        }
    }

    // Unchanged links keep their creation order; new and recreated ones go last.
    let kept_ids: HashSet<&str> = kept.iter().map(|l| l.id.as_str()).collect();
    let ordered: Vec<Link> = graph
        .links()
        .iter()
        .filter(|l| kept_ids.contains(l.id.as_str()))
        .cloned()
        .collect();

    let mut next = ScheduleGraph::from_parts(graph.tasks().cloned(), ordered);
    for link in fresh {
        let (id, source, target, kind) = (link.id.clone(), link.source.clone(), link.target.clone(), link.kind);
        if link.gap().is_some() {
            next.upsert_link(link);
        } else if let Err(error) = next.link_tasks(id, &source, &target, kind) {
            return EditOutcome::rejected(source, error);
        }
    }

    if next.links() == graph.links() {
        debug!("link collection unchanged; ignoring");
        return EditOutcome::Ignored;
    }

    let removed = graph
        .links()
        .iter()
        .filter(|l| next.get_link(&l.id).is_none())
        .count();
    info!(links = next.links().len(), removed, ?origin, "applied link changes");

    EditOutcome::Applied {
        graph: next,
        changes: Vec::new(),
        report: None,
    }
}
