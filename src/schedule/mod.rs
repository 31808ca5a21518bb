// src/schedule/mod.rs

pub mod graph;
pub mod propagation;
pub mod report;

pub use graph::ScheduleGraph;
pub use propagation::{Propagation, apply_edit, propagate};
pub use report::{PropagationReport, PropagationWarning, Rescheduled};
