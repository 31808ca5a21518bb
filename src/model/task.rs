// src/model/task.rs

use chrono::{NaiveDateTime, TimeDelta};

use crate::errors::{GanttError, Result};
use crate::model::TaskId;
use crate::model::wire::format_timestamp;

/// Which endpoint of a schedule a link refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Anchor {
    Start,
    End,
}

/// The `{start, end}` pair of a task.
///
/// A valid schedule has `end > start`. The type does not enforce it on
/// construction because edits arrive from outside and must be checked (and
/// rejected) explicitly; see [`Schedule::ensure_valid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Schedule {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Schedule {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Derived duration, `end - start`.
    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    pub fn is_valid(&self) -> bool {
        self.end > self.start
    }

    /// Fail with [`GanttError::InvalidSchedule`] unless `end > start`.
    pub fn ensure_valid(&self, task: &str) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(GanttError::InvalidSchedule {
                task: task.to_string(),
                start: format_timestamp(self.start),
                end: format_timestamp(self.end),
            })
        }
    }

    /// The instant this schedule has at `anchor`.
    pub fn instant(&self, anchor: Anchor) -> NaiveDateTime {
        match anchor {
            Anchor::Start => self.start,
            Anchor::End => self.end,
        }
    }

    /// Build a schedule of the given `duration` whose `anchor` endpoint sits
    /// at `instant`. Returns `None` if the arithmetic leaves chrono's range.
    pub fn anchored_at(anchor: Anchor, instant: NaiveDateTime, duration: TimeDelta) -> Option<Self> {
        match anchor {
            Anchor::Start => {
                let end = instant.checked_add_signed(duration)?;
                Some(Self { start: instant, end })
            }
            Anchor::End => {
                let start = instant.checked_sub_signed(duration)?;
                Some(Self { start, end: instant })
            }
        }
    }

    /// Same duration, moved by `delta`.
    pub fn shifted(&self, delta: TimeDelta) -> Option<Self> {
        Some(Self {
            start: self.start.checked_add_signed(delta)?,
            end: self.end.checked_add_signed(delta)?,
        })
    }
}

/// A scheduled unit of work.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    /// Category tags, insertion-ordered and de-duplicated.
    pub specialty: Vec<String>,
    pub schedule: Schedule,
    /// Completion fraction in `[0, 1]`.
    pub progress: f64,
    /// UI expand/collapse flag; not used for scheduling.
    pub open: bool,
}

impl Task {
    pub fn new(id: impl Into<TaskId>, text: impl Into<String>, schedule: Schedule) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            specialty: Vec::new(),
            schedule,
            progress: 0.0,
            open: true,
        }
    }

    pub fn with_specialty<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.specialty.clear();
        for tag in tags {
            self.add_specialty(tag);
        }
        self
    }

    pub fn with_progress(mut self, progress: f64) -> Self {
        self.set_progress(progress);
        self
    }

    /// Add a tag unless it is already present.
    pub fn add_specialty(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !self.specialty.contains(&tag) {
            self.specialty.push(tag);
        }
    }

    /// Set progress, clamping into `[0, 1]`. NaN becomes 0.
    pub fn set_progress(&mut self, progress: f64) {
        self.progress = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0)
        };
    }

    pub fn start(&self) -> NaiveDateTime {
        self.schedule.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.schedule.end
    }

    pub fn duration(&self) -> TimeDelta {
        self.schedule.duration()
    }

    /// Duration in fractional hours, as the chart displays it.
    pub fn duration_hours(&self) -> f64 {
        self.duration().num_milliseconds() as f64 / 3_600_000.0
    }
}
