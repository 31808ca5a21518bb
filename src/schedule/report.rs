// src/schedule/report.rs

//! Result types of a single propagation call.

use thiserror::Error;

use crate::errors::GanttError;
use crate::model::{LinkId, Schedule, TaskId};

/// Non-fatal condition met while walking the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PropagationWarning {
    /// The link's target does not exist; it was skipped.
    #[error("link {link} points at missing task {task}; skipped")]
    DanglingLink { link: LinkId, task: TaskId },

    /// Following the link would revisit a task already scheduled in this
    /// call; the branch was truncated there.
    #[error("link {link} closes a dependency cycle at task {task}; branch truncated")]
    CyclicDependency { link: LinkId, task: TaskId },
}

impl From<PropagationWarning> for GanttError {
    fn from(warning: PropagationWarning) -> Self {
        match warning {
            PropagationWarning::DanglingLink { link, task } => GanttError::DanglingLink { link, task },
            PropagationWarning::CyclicDependency { link, task } => {
                GanttError::CyclicDependency { link, task }
            }
        }
    }
}

/// One task moved by propagation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rescheduled {
    pub task: TaskId,
    pub before: Schedule,
    pub after: Schedule,
}

/// What a propagation call did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropagationReport {
    /// The edited task.
    pub root: TaskId,
    /// Dependents whose schedule changed, in resolution order. The root is
    /// not listed.
    pub rescheduled: Vec<Rescheduled>,
    /// Links whose gap was captured during this call.
    pub captured_gaps: Vec<LinkId>,
    pub warnings: Vec<PropagationWarning>,
}

impl PropagationReport {
    pub fn new(root: impl Into<TaskId>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Whether no dependent moved and no gap was captured.
    pub fn is_noop(&self) -> bool {
        self.rescheduled.is_empty() && self.captured_gaps.is_empty()
    }

    pub fn rescheduled_ids(&self) -> Vec<&str> {
        self.rescheduled.iter().map(|r| r.task.as_str()).collect()
    }

    pub fn has_cycles(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, PropagationWarning::CyclicDependency { .. }))
    }
}
