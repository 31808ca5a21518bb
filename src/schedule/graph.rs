// src/schedule/graph.rs

use std::collections::HashMap;

use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;
use tracing::{debug, warn};

use crate::errors::{GanttError, Result};
use crate::model::{Link, LinkId, LinkType, Schedule, Task, TaskId};

/// In-memory task/link collection of one group.
///
/// Tasks keep their insertion order; links keep creation order, which is
/// the tie-break when several predecessors govern one task. Replacing a
/// link (same id) counts as deleting and recreating it, so it moves to the
/// end.
///
/// Links may reference tasks that do not exist (data loaded from outside);
/// see [`ScheduleGraph::dangling_links`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduleGraph {
    tasks: Vec<Task>,
    index: HashMap<TaskId, usize>,
    links: Vec<Link>,
}

impl ScheduleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from parts; later duplicates of a task id replace earlier ones.
    /// Tasks with an invalid schedule are skipped.
    pub fn from_parts(tasks: impl IntoIterator<Item = Task>, links: impl IntoIterator<Item = Link>) -> Self {
        let mut graph = Self::new();
        for task in tasks {
            let result = if graph.contains_task(&task.id) {
                graph.replace_task(task).map(|_| ())
            } else {
                graph.insert_task(task)
            };
            if let Err(e) = result {
                warn!(error = %e, "skipping task");
            }
        }
        for link in links {
            graph.upsert_link(link);
        }
        graph
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty() && self.links.is_empty()
    }

    pub fn contains_task(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn get_task(&self, id: &str) -> Option<&Task> {
        self.index.get(id).map(|&i| &self.tasks[i])
    }

    pub fn get_link(&self, id: &str) -> Option<&Link> {
        self.links.iter().find(|l| l.id == id)
    }

    /// Links where `task` is the predecessor, in creation order.
    pub fn direct_dependents(&self, task: &str) -> Vec<&Link> {
        self.links.iter().filter(|l| l.source == task).collect()
    }

    /// Links where `task` is the dependent, in creation order.
    pub fn predecessor_links(&self, task: &str) -> Vec<&Link> {
        self.links.iter().filter(|l| l.target == task).collect()
    }

    /// The governing predecessor link of `task`: the most recently created
    /// link targeting it, matching the last-write-wins rule of propagation.
    pub fn direct_predecessor_link(&self, task: &str) -> Option<&Link> {
        self.links.iter().rev().find(|l| l.target == task)
    }

    /// Add a new task. Fails if the id is taken or the schedule does not
    /// end after it starts.
    pub fn insert_task(&mut self, task: Task) -> Result<()> {
        task.schedule.ensure_valid(&task.id)?;
        if self.contains_task(&task.id) {
            return Err(GanttError::DuplicateTask(task.id));
        }
        self.index.insert(task.id.clone(), self.tasks.len());
        self.tasks.push(task);
        Ok(())
    }

    /// Replace an existing task (matched by id), returning the old version.
    /// A schedule that does not end after it starts is refused.
    pub fn replace_task(&mut self, task: Task) -> Result<Task> {
        task.schedule.ensure_valid(&task.id)?;
        let i = *self
            .index
            .get(&task.id)
            .ok_or_else(|| GanttError::TaskNotFound(task.id.clone()))?;
        Ok(std::mem::replace(&mut self.tasks[i], task))
    }

    /// Remove a task and every link where it is source or target.
    pub fn remove_task(&mut self, id: &str) -> Result<(Task, Vec<Link>)> {
        let i = self
            .index
            .remove(id)
            .ok_or_else(|| GanttError::TaskNotFound(id.to_string()))?;
        let task = self.tasks.remove(i);
        self.reindex();

        let (removed, kept): (Vec<Link>, Vec<Link>) =
            std::mem::take(&mut self.links).into_iter().partition(|l| l.touches(id));
        self.links = kept;

        debug!(task = %id, removed_links = removed.len(), "removed task and incident links");
        Ok((task, removed))
    }

    /// Insert a link, or replace the link with the same id.
    ///
    /// A replacement is a recreate: the new link goes to the end of the
    /// creation order and carries only its own gap. Returns the old link.
    pub fn upsert_link(&mut self, link: Link) -> Option<Link> {
        let previous = self
            .links
            .iter()
            .position(|l| l.id == link.id)
            .map(|i| self.links.remove(i));
        self.links.push(link);
        previous
    }

    pub fn remove_link(&mut self, id: &str) -> Result<Link> {
        let i = self
            .links
            .iter()
            .position(|l| l.id == id)
            .ok_or_else(|| GanttError::LinkNotFound(id.to_string()))?;
        Ok(self.links.remove(i))
    }

    /// Create (or recreate) link `id` from `source` to `target`, capturing
    /// its gap from the current schedules of both tasks.
    pub fn link_tasks(
        &mut self,
        id: impl Into<LinkId>,
        source: &str,
        target: &str,
        kind: LinkType,
    ) -> Result<&Link> {
        if source == target {
            return Err(GanttError::SelfDependency(source.to_string()));
        }
        let predecessor = self.schedule_of(source)?;
        let dependent = self.schedule_of(target)?;

        let mut link = Link::new(id, source, target, kind);
        let (gap, _) = link.capture_gap(&predecessor, &dependent);
        debug!(
            link = %link.id,
            source,
            target,
            kind = %kind,
            gap_ms = gap.num_milliseconds(),
            "captured gap at link creation"
        );
        self.upsert_link(link);
        Ok(&self.links[self.links.len() - 1])
    }

    /// Single-dependent selection as the edit form offers it.
    ///
    /// With `Some(target)`, every outgoing link of `source` is replaced by one
    /// link to `target`: it reuses the id and type of the first existing
    /// outgoing link (or `new_link_id` / FS if there is none) and recaptures
    /// the gap. With `None`, all outgoing links of `source` are removed.
    ///
    /// Returns the id of the link now in place, if any.
    pub fn set_dependent(
        &mut self,
        source: &str,
        target: Option<&str>,
        new_link_id: impl Into<LinkId>,
    ) -> Result<Option<LinkId>> {
        if !self.contains_task(source) {
            return Err(GanttError::TaskNotFound(source.to_string()));
        }

        let existing = self
            .links
            .iter()
            .find(|l| l.source == source)
            .map(|l| (l.id.clone(), l.kind));

        let Some(target) = target else {
            let before = self.links.len();
            self.links.retain(|l| l.source != source);
            debug!(source, removed = before - self.links.len(), "cleared dependents");
            return Ok(None);
        };

        if target == source {
            return Err(GanttError::SelfDependency(source.to_string()));
        }
        if !self.contains_task(target) {
            return Err(GanttError::TaskNotFound(target.to_string()));
        }

        let (id, kind) = existing.unwrap_or_else(|| (new_link_id.into(), LinkType::default()));
        self.links.retain(|l| l.source != source);
        let id = self.link_tasks(id, source, target, kind)?.id.clone();
        Ok(Some(id))
    }

    /// Links whose source or target is not a known task.
    pub fn dangling_links(&self) -> Vec<&Link> {
        self.links
            .iter()
            .filter(|l| !self.contains_task(&l.source) || !self.contains_task(&l.target))
            .collect()
    }

    /// Groups of tasks that depend on each other in a loop.
    ///
    /// Each group is sorted; groups are sorted by their first member. Self
    /// links count as a loop of one.
    pub fn dependency_cycles(&self) -> Vec<Vec<TaskId>> {
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for task in &self.tasks {
            graph.add_node(task.id.as_str());
        }
        for link in &self.links {
            if self.contains_task(&link.source) && self.contains_task(&link.target) {
                graph.add_edge(link.source.as_str(), link.target.as_str(), ());
            }
        }

        let mut cycles: Vec<Vec<TaskId>> = tarjan_scc(&graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || component
                        .first()
                        .is_some_and(|&node| graph.contains_edge(node, node))
            })
            .map(|component| {
                let mut ids: Vec<TaskId> = component.into_iter().map(str::to_string).collect();
                ids.sort();
                ids
            })
            .collect();
        cycles.sort();
        cycles
    }

    pub(crate) fn schedule_of(&self, id: &str) -> Result<Schedule> {
        self.get_task(id)
            .map(|t| t.schedule)
            .ok_or_else(|| GanttError::TaskNotFound(id.to_string()))
    }

    pub(crate) fn set_schedule(&mut self, id: &str, schedule: Schedule) {
        if let Some(&i) = self.index.get(id) {
            self.tasks[i].schedule = schedule;
        }
    }

    pub(crate) fn link_at_mut(&mut self, position: usize) -> Option<&mut Link> {
        self.links.get_mut(position)
    }

    fn reindex(&mut self) {
        self.index = self
            .tasks
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id.clone(), i))
            .collect();
    }
}
