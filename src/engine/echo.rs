// src/engine/echo.rs

use std::collections::VecDeque;

use super::CorrelationId;

/// Remembers the correlation ids of the most recent renders of one group.
///
/// The chart re-emits change events while it applies a render; those events
/// carry the render's correlation id and must not be treated as new edits.
/// Only the last `window` ids are kept.
#[derive(Debug, Clone)]
pub struct EchoFilter {
    window: usize,
    issued: VecDeque<CorrelationId>,
}

impl EchoFilter {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            issued: VecDeque::with_capacity(window),
        }
    }

    pub fn remember(&mut self, id: CorrelationId) {
        if self.issued.len() == self.window {
            self.issued.pop_front();
        }
        self.issued.push_back(id);
    }

    /// Whether `id` belongs to a render this group issued recently.
    pub fn is_echo(&self, id: CorrelationId) -> bool {
        self.issued.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.issued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issued.is_empty()
    }
}
