#![allow(dead_code)]

use chrono::{NaiveDateTime, TimeDelta};
use ganttline::config::{ConfigFile, RawConfigFile};
use ganttline::model::wire::parse_timestamp;
use ganttline::model::{Link, LinkType, Schedule, Task};
use ganttline::schedule::ScheduleGraph;
use ganttline::types::{PersistMode, StoreMode};

/// Parse a test timestamp such as `"2025-01-01T08:00"`.
pub fn at(raw: &str) -> NaiveDateTime {
    parse_timestamp(raw).unwrap_or_else(|| panic!("bad test timestamp {raw:?}"))
}

/// `Schedule` from two test timestamps.
pub fn sched(start: &str, end: &str) -> Schedule {
    Schedule::new(at(start), at(end))
}

pub fn hours(n: i64) -> TimeDelta {
    TimeDelta::hours(n)
}

/// Builder for `Task`.
pub struct TaskBuilder {
    task: Task,
}

impl TaskBuilder {
    pub fn new(id: &str, start: &str, end: &str) -> Self {
        Self {
            task: Task::new(id, format!("Task {id}"), sched(start, end)),
        }
    }

    pub fn text(mut self, text: &str) -> Self {
        self.task.text = text.to_string();
        self
    }

    pub fn specialty(mut self, tag: &str) -> Self {
        self.task.add_specialty(tag);
        self
    }

    pub fn progress(mut self, progress: f64) -> Self {
        self.task.set_progress(progress);
        self
    }

    pub fn build(self) -> Task {
        self.task
    }
}

/// Builder for `ScheduleGraph`.
///
/// `link` captures the gap from the schedules present at that point, like a
/// dependency picked in the form; `link_unset` leaves it for the first
/// propagation to capture.
#[derive(Default)]
pub struct GraphBuilder {
    graph: ScheduleGraph,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn task(self, id: &str, start: &str, end: &str) -> Self {
        self.with_task(TaskBuilder::new(id, start, end).build())
    }

    pub fn with_task(mut self, task: Task) -> Self {
        self.graph.insert_task(task).expect("duplicate task in test graph");
        self
    }

    pub fn link(mut self, id: &str, source: &str, target: &str, kind: LinkType) -> Self {
        self.graph
            .link_tasks(id, source, target, kind)
            .expect("failed to link test tasks");
        self
    }

    pub fn fs(self, id: &str, source: &str, target: &str) -> Self {
        self.link(id, source, target, LinkType::FinishToStart)
    }

    pub fn link_unset(mut self, id: &str, source: &str, target: &str, kind: LinkType) -> Self {
        self.graph.upsert_link(Link::new(id, source, target, kind));
        self
    }

    pub fn link_with_gap(mut self, id: &str, source: &str, target: &str, kind: LinkType, gap: TimeDelta) -> Self {
        self.graph
            .upsert_link(Link::new(id, source, target, kind).with_gap(gap));
        self
    }

    pub fn build(self) -> ScheduleGraph {
        self.graph
    }
}

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn edit_queue_length(mut self, n: usize) -> Self {
        self.config.config.edit_queue_length = n;
        self
    }

    pub fn echo_window(mut self, n: usize) -> Self {
        self.config.config.echo_window = n;
        self
    }

    pub fn persist_mode(mut self, mode: PersistMode) -> Self {
        self.config.config.persist_mode = mode;
        self
    }

    pub fn memory_store(mut self) -> Self {
        self.config.store.mode = StoreMode::Memory;
        self
    }

    pub fn store_dir(mut self, dir: impl Into<std::path::PathBuf>) -> Self {
        self.config.store.mode = StoreMode::File;
        self.config.store.dir = dir.into();
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
