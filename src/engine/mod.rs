// src/engine/mod.rs

//! Edit orchestration for ganttline.
//!
//! This module ties together:
//! - the per-group edit core that turns form/chart events into propagated
//!   schedules
//! - the echo filter that recognises chart events caused by our own renders
//! - the async runtime that serializes edits per group and talks to the
//!   store and the chart
//!
//! The pure state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`] and [`router`].

use crate::model::{GroupId, Link, LinkId, Task, TaskId};
use crate::types::PersistMode;

/// Identifies one render issued by a group core.
///
/// Chart events that merely echo back a render carry its id in
/// [`EditOrigin::Chart::echo_of`] and are ignored by the core.
pub type CorrelationId = u64;

/// Where an edit came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOrigin {
    /// Submitted through the task form (or the CLI).
    Form,
    /// Emitted by the chart surface. `echo_of` is set when the chart emits
    /// the event while applying one of our renders.
    Chart { echo_of: Option<CorrelationId> },
    /// Produced by propagation inside the core.
    Propagation,
}

impl EditOrigin {
    /// A chart edit made directly by the user.
    pub fn chart() -> Self {
        EditOrigin::Chart { echo_of: None }
    }
}

/// One edit against a group's schedule.
#[derive(Debug, Clone)]
pub enum GroupEvent {
    /// A task was edited (form submit, chart drag or resize). The stored
    /// version of the task supplies the old schedule.
    TaskChanged { task: Task, origin: EditOrigin },
    /// A task was created, optionally with the dependent chosen in the form
    /// as `(link id, dependent task id)`.
    TaskAdded {
        task: Task,
        dependent: Option<(LinkId, TaskId)>,
        origin: EditOrigin,
    },
    /// A task was deleted together with its links.
    TaskDeleted { id: TaskId, origin: EditOrigin },
    /// The form's single-dependent selection for `source`. `None` clears it;
    /// `link_id` is used when no outgoing link exists yet.
    DependentSelected {
        source: TaskId,
        target: Option<TaskId>,
        link_id: LinkId,
        origin: EditOrigin,
    },
    /// The chart's full link collection after an add, remove or retarget.
    LinksChanged { links: Vec<Link>, origin: EditOrigin },
}

impl GroupEvent {
    pub fn origin(&self) -> EditOrigin {
        match self {
            GroupEvent::TaskChanged { origin, .. }
            | GroupEvent::TaskAdded { origin, .. }
            | GroupEvent::TaskDeleted { origin, .. }
            | GroupEvent::DependentSelected { origin, .. }
            | GroupEvent::LinksChanged { origin, .. } => *origin,
        }
    }

    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            GroupEvent::TaskChanged { .. } => "task_changed",
            GroupEvent::TaskAdded { .. } => "task_added",
            GroupEvent::TaskDeleted { .. } => "task_deleted",
            GroupEvent::DependentSelected { .. } => "dependent_selected",
            GroupEvent::LinksChanged { .. } => "links_changed",
        }
    }
}

/// Runtime options shared by the router and the group workers.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeOptions {
    pub persist_mode: PersistMode,
    /// Capacity of each group's ordered edit queue.
    pub edit_queue_length: usize,
    /// How many recent render correlations each group remembers.
    pub echo_window: usize,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            persist_mode: PersistMode::default(),
            edit_queue_length: 64,
            echo_window: 16,
        }
    }
}

/// Events flowing into the runtime.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// An edit for one group.
    Group { group: GroupId, event: GroupEvent },
    /// Graceful shutdown: drain every group's queue, then stop.
    ShutdownRequested,
}

pub mod core;
pub mod echo;
pub mod event_handlers;
pub mod router;
pub mod runtime;

pub use core::GroupCore;
pub use echo::EchoFilter;
pub use event_handlers::{Change, CoreCommand, CoreStep, EditOutcome, RenderFrame};
pub use router::GroupRouter;
pub use runtime::Runtime;
