// src/schedule/propagation.rs

//! Dependency propagation.
//!
//! Given a task whose schedule moved from `old` to `new`, every task
//! reachable from it over dependency links is placed again from its
//! predecessor's new schedule and the link's captured gap, keeping its own
//! duration.
//!
//! The walk has three phases:
//! 1. discovery: breadth-first over outgoing links with a visited set;
//! 2. gap capture: links crossed for the first time get their gap measured
//!    from the *pre-edit* schedules;
//! 3. resolution: dependents are placed in dependency order, each one once.
//!
//! A dependent with several predecessors applies the links whose source
//! actually moved, in link creation order; the last one wins. Links that
//! lead back into the edited task, or that close a loop among dependents,
//! are cut and reported as [`PropagationWarning::CyclicDependency`].

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;
use tracing::{debug, info, warn};

use crate::errors::{GanttError, Result};
use crate::model::{Link, Schedule, Task};
use crate::schedule::graph::ScheduleGraph;
use crate::schedule::report::{PropagationReport, PropagationWarning, Rescheduled};

/// Outcome of a successful propagation: the updated graph and what changed.
#[derive(Debug, Clone)]
pub struct Propagation {
    pub graph: ScheduleGraph,
    pub report: PropagationReport,
}

/// Apply an edited task (all fields) and propagate its schedule change.
///
/// The stored version of the task supplies the old schedule. On error the
/// input graph is untouched and nothing is returned.
pub fn apply_edit(graph: &ScheduleGraph, edited: Task) -> Result<Propagation> {
    let old = graph.schedule_of(&edited.id)?;
    let mut outcome = propagate(graph, &edited.id, old, edited.schedule)?;
    outcome.graph.replace_task(edited)?;
    Ok(outcome)
}

/// Move `task` from `old` to `new` and reschedule everything that depends
/// on it, directly or transitively.
///
/// Fails with [`GanttError::InvalidSchedule`] if `new` does not end after
/// it starts, and with [`GanttError::TaskNotFound`] for an unknown task.
/// Either way the input graph is not modified.
pub fn propagate(graph: &ScheduleGraph, task: &str, old: Schedule, new: Schedule) -> Result<Propagation> {
    new.ensure_valid(task)?;
    if !graph.contains_task(task) {
        return Err(GanttError::TaskNotFound(task.to_string()));
    }

    let mut next = graph.clone();
    next.set_schedule(task, new);
    let mut report = PropagationReport::new(task);

    if old == new {
        debug!(task, "schedule unchanged; nothing to propagate");
        return Ok(Propagation { graph: next, report });
    }

    let links = graph.links();
    let discovery = discover(graph, task, &mut report);

    capture_gaps(graph, &mut next, task, old, &discovery.edges, &mut report)?;

    let gapped = next.links();
    let mut incoming: HashMap<&str, Vec<usize>> = HashMap::new();
    let mut outgoing: HashMap<&str, Vec<usize>> = HashMap::new();
    for &i in &discovery.edges {
        incoming.entry(links[i].target.as_str()).or_default().push(i);
        outgoing.entry(links[i].source.as_str()).or_default().push(i);
    }
    for list in incoming.values_mut() {
        list.sort_unstable();
    }

    let mut waiting: HashMap<&str, usize> =
        incoming.iter().map(|(id, list)| (*id, list.len())).collect();
    let mut state = Resolution::default();
    state.resolved.insert(task, new);
    state.changed.insert(task);

    let mut ready: VecDeque<&str> = VecDeque::from([task]);

    loop {
        while let Some(current) = ready.pop_front() {
            for &i in outgoing.get(current).map(Vec::as_slice).unwrap_or(&[]) {
                let target = links[i].target.as_str();
                if state.resolved.contains_key(target) {
                    // Edge cut while breaking a cycle.
                    continue;
                }
                if let Some(count) = waiting.get_mut(target) {
                    *count -= 1;
                    if *count == 0 {
                        let preds = incoming.get(target).map(Vec::as_slice).unwrap_or(&[]);
                        resolve_dependent(graph, gapped, target, preds, &mut state, &mut report)?;
                        ready.push_back(target);
                    }
                }
            }
        }

        let unresolved: Vec<&str> = discovery
            .order
            .iter()
            .copied()
            .filter(|id| !state.resolved.contains_key(id))
            .collect();
        if unresolved.is_empty() {
            break;
        }

        let Some(entry) = cycle_entry(&discovery.order, &unresolved, links, &discovery.edges) else {
            warn!(task, stuck = ?unresolved, "propagation could not order remaining dependents; leaving them as-is");
            break;
        };

        let preds = incoming.get(entry).map(Vec::as_slice).unwrap_or(&[]);
        for &i in preds {
            if !state.resolved.contains_key(links[i].source.as_str()) {
                let warning = PropagationWarning::CyclicDependency {
                    link: links[i].id.clone(),
                    task: entry.to_string(),
                };
                warn!(%warning, "truncating cyclic branch");
                report.warnings.push(warning);
            }
        }
        resolve_dependent(graph, gapped, entry, preds, &mut state, &mut report)?;
        ready.push_back(entry);
    }

    for moved in &report.rescheduled {
        next.set_schedule(&moved.task, moved.after);
    }

    info!(
        task,
        rescheduled = report.rescheduled.len(),
        captured_gaps = report.captured_gaps.len(),
        warnings = report.warnings.len(),
        "propagated schedule change"
    );

    Ok(Propagation { graph: next, report })
}

/// Tasks reachable from the edited one, and the link positions crossed.
struct Discovery<'g> {
    /// Reachable tasks in breadth-first order, starting with the edited task.
    order: Vec<&'g str>,
    /// Positions (in creation order) of links between reachable tasks,
    /// excluding links back into the edited task.
    edges: Vec<usize>,
}

fn discover<'g>(graph: &'g ScheduleGraph, root: &'g str, report: &mut PropagationReport) -> Discovery<'g> {
    let links = graph.links();
    let mut by_source: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, link) in links.iter().enumerate() {
        by_source.entry(link.source.as_str()).or_default().push(i);
    }

    let mut order = vec![root];
    let mut visited: HashSet<&str> = HashSet::from([root]);
    let mut edges = Vec::new();
    let mut queue: VecDeque<&str> = VecDeque::from([root]);

    while let Some(current) = queue.pop_front() {
        for &i in by_source.get(current).map(Vec::as_slice).unwrap_or(&[]) {
            let link = &links[i];
            let target = link.target.as_str();

            if !graph.contains_task(target) {
                let warning = PropagationWarning::DanglingLink {
                    link: link.id.clone(),
                    task: link.target.clone(),
                };
                warn!(%warning, "skipping dangling link");
                report.warnings.push(warning);
                continue;
            }

            if target == root {
                let warning = PropagationWarning::CyclicDependency {
                    link: link.id.clone(),
                    task: link.target.clone(),
                };
                warn!(%warning, "link leads back to the edited task");
                report.warnings.push(warning);
                continue;
            }

            edges.push(i);
            if visited.insert(target) {
                debug!(from = current, to = target, link = %link.id, "discovered dependent");
                order.push(target);
                queue.push_back(target);
            }
        }
    }

    Discovery { order, edges }
}

/// Capture the gap of every crossed link that has none, from the schedules
/// as they were before this edit.
fn capture_gaps(
    graph: &ScheduleGraph,
    next: &mut ScheduleGraph,
    root: &str,
    old: Schedule,
    edges: &[usize],
    report: &mut PropagationReport,
) -> Result<()> {
    let links = graph.links();
    for &i in edges {
        let link = &links[i];
        if link.gap().is_some() {
            continue;
        }

        let predecessor = if link.source == root {
            old
        } else {
            graph.schedule_of(&link.source)?
        };
        let dependent = graph.schedule_of(&link.target)?;

        if let Some(stored) = next.link_at_mut(i) {
            let (gap, captured) = stored.capture_gap(&predecessor, &dependent);
            if captured {
                debug!(
                    link = %stored.id,
                    kind = %stored.kind,
                    gap_ms = gap.num_milliseconds(),
                    "captured gap on first propagation"
                );
                report.captured_gaps.push(stored.id.clone());
            }
        }
    }
    Ok(())
}

#[derive(Default)]
struct Resolution<'g> {
    /// Final schedule of every resolved task.
    resolved: HashMap<&'g str, Schedule>,
    /// Resolved tasks whose schedule differs from before the edit.
    changed: HashSet<&'g str>,
}

/// Place `id` from those of its predecessor links whose source moved.
fn resolve_dependent<'g>(
    graph: &ScheduleGraph,
    links: &[Link],
    id: &'g str,
    preds: &[usize],
    state: &mut Resolution<'g>,
    report: &mut PropagationReport,
) -> Result<()> {
    let before = graph.schedule_of(id)?;
    let duration = before.duration();
    let mut after = before;

    for &i in preds {
        let link = &links[i];
        if !state.changed.contains(link.source.as_str()) {
            continue;
        }
        let Some(source_after) = state.resolved.get(link.source.as_str()) else {
            continue;
        };
        after = link
            .place_dependent(source_after, duration)
            .ok_or_else(|| GanttError::TimeOverflow(id.to_string()))?;
        debug!(task = id, link = %link.id, kind = %link.kind, "placed dependent from predecessor");
    }

    state.resolved.insert(id, after);
    if after != before {
        state.changed.insert(id);
        report.rescheduled.push(Rescheduled {
            task: id.to_string(),
            before,
            after,
        });
    }
    Ok(())
}

/// Pick where to cut when every unresolved task waits on another one.
///
/// Among the loops of unresolved tasks that nothing else unresolved feeds
/// into, take the one entered earliest in discovery order and return its
/// earliest-discovered member. That member always has a resolved
/// predecessor: the task it was discovered from.
fn cycle_entry<'g>(
    order: &[&'g str],
    unresolved: &[&'g str],
    links: &'g [Link],
    edges: &[usize],
) -> Option<&'g str> {
    let rank: HashMap<&str, usize> = order.iter().enumerate().map(|(i, id)| (*id, i)).collect();
    let pending: HashSet<&str> = unresolved.iter().copied().collect();

    let mut sub: DiGraphMap<&str, ()> = DiGraphMap::new();
    for &id in unresolved {
        sub.add_node(id);
    }
    for &i in edges {
        let (source, target) = (links[i].source.as_str(), links[i].target.as_str());
        if pending.contains(source) && pending.contains(target) {
            sub.add_edge(source, target, ());
        }
    }

    tarjan_scc(&sub)
        .into_iter()
        .filter(|component| {
            let members: HashSet<&str> = component.iter().copied().collect();
            component.iter().all(|&node| {
                sub.neighbors_directed(node, Direction::Incoming)
                    .all(|from| members.contains(&from))
            })
        })
        .filter_map(|component| component.into_iter().min_by_key(|id| rank.get(id).copied()))
        .min_by_key(|id| rank.get(id).copied())
}
