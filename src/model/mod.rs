// src/model/mod.rs

//! Typed schedule model.
//!
//! - [`task`] holds tasks and their `{start, end}` schedule.
//! - [`link`] holds dependency links, link types and the captured gap.
//! - [`wire`] converts between the loosely typed `{tasks, links}` JSON the
//!   collaborators exchange and the typed model.

pub mod link;
pub mod task;
pub mod wire;

/// Canonical task identifier type.
pub type TaskId = String;

/// Canonical link identifier type.
pub type LinkId = String;

/// Identifier of the user group that owns a schedule.
pub type GroupId = String;

pub use link::{Link, LinkType};
pub use task::{Anchor, Schedule, Task};
pub use wire::{GanttDocument, Ingress, WireLink, WireTask};
