#![allow(dead_code)]

pub use ganttline_test_utils::builders::{at, hours, sched, ConfigFileBuilder, GraphBuilder, TaskBuilder};
pub use ganttline_test_utils::fakes::{RecordingChart, RecordingStore};
pub use ganttline_test_utils::{init_tracing, with_timeout};

use ganttline::model::Schedule;
use ganttline::schedule::ScheduleGraph;

/// Schedule of `id`, panicking if the task is missing.
pub fn schedule(graph: &ScheduleGraph, id: &str) -> Schedule {
    graph
        .get_task(id)
        .unwrap_or_else(|| panic!("task {id} missing"))
        .schedule
}
