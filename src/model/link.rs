// src/model/link.rs

use std::fmt;
use std::str::FromStr;

use chrono::TimeDelta;

use crate::model::task::{Anchor, Schedule};
use crate::model::{LinkId, TaskId};

/// Precedence kind of a dependency link.
///
/// | type | predecessor | dependent |
/// |------|-------------|-----------|
/// | FS   | end         | start     |
/// | SS   | start       | start     |
/// | FF   | end         | end       |
/// | SF   | start       | end       |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkType {
    FinishToStart,
    StartToStart,
    FinishToFinish,
    StartToFinish,
}

impl LinkType {
    pub const ALL: [LinkType; 4] = [
        LinkType::FinishToStart,
        LinkType::StartToStart,
        LinkType::FinishToFinish,
        LinkType::StartToFinish,
    ];

    /// Endpoint of the predecessor this link measures from.
    pub fn predecessor_anchor(self) -> Anchor {
        match self {
            LinkType::FinishToStart | LinkType::FinishToFinish => Anchor::End,
            LinkType::StartToStart | LinkType::StartToFinish => Anchor::Start,
        }
    }

    /// Endpoint of the dependent this link places.
    pub fn dependent_anchor(self) -> Anchor {
        match self {
            LinkType::FinishToStart | LinkType::StartToStart => Anchor::Start,
            LinkType::FinishToFinish | LinkType::StartToFinish => Anchor::End,
        }
    }

    /// Numeric code used by the chart widget ("0".."3").
    pub fn code(self) -> &'static str {
        match self {
            LinkType::FinishToStart => "0",
            LinkType::StartToStart => "1",
            LinkType::FinishToFinish => "2",
            LinkType::StartToFinish => "3",
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            LinkType::FinishToStart => "FS",
            LinkType::StartToStart => "SS",
            LinkType::FinishToFinish => "FF",
            LinkType::StartToFinish => "SF",
        }
    }
}

impl Default for LinkType {
    fn default() -> Self {
        LinkType::FinishToStart
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

impl FromStr for LinkType {
    type Err = String;

    /// Accepts the chart codes ("0".."3") and the mnemonics, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "0" | "FS" => Ok(LinkType::FinishToStart),
            "1" | "SS" => Ok(LinkType::StartToStart),
            "2" | "FF" => Ok(LinkType::FinishToFinish),
            "3" | "SF" => Ok(LinkType::StartToFinish),
            other => Err(format!(
                "invalid link type: {other} (expected 0-3 or FS/SS/FF/SF)"
            )),
        }
    }
}

/// A dependency edge from `source` (predecessor) to `target` (dependent).
///
/// `gap` is the signed offset between the predecessor's and the dependent's
/// reference instants. It is set once, either when the link is created from
/// known schedules or the first time propagation crosses it, and never
/// changes afterwards. Retargeting a link means building a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub id: LinkId,
    pub source: TaskId,
    pub target: TaskId,
    pub kind: LinkType,
    gap: Option<TimeDelta>,
}

impl Link {
    pub fn new(
        id: impl Into<LinkId>,
        source: impl Into<TaskId>,
        target: impl Into<TaskId>,
        kind: LinkType,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            kind,
            gap: None,
        }
    }

    /// Restore a link whose gap was captured earlier (e.g. loaded from the store).
    pub fn with_gap(mut self, gap: TimeDelta) -> Self {
        self.gap = Some(gap);
        self
    }

    pub fn gap(&self) -> Option<TimeDelta> {
        self.gap
    }

    /// Offset between the two reference instants of `predecessor` and
    /// `dependent` under `kind`.
    pub fn measure_gap(kind: LinkType, predecessor: &Schedule, dependent: &Schedule) -> TimeDelta {
        dependent.instant(kind.dependent_anchor()) - predecessor.instant(kind.predecessor_anchor())
    }

    /// Capture the gap from the given schedules if it is not set yet.
    ///
    /// Returns the gap in force afterwards and whether it was captured now.
    pub fn capture_gap(&mut self, predecessor: &Schedule, dependent: &Schedule) -> (TimeDelta, bool) {
        match self.gap {
            Some(gap) => (gap, false),
            None => {
                let gap = Self::measure_gap(self.kind, predecessor, dependent);
                self.gap = Some(gap);
                (gap, true)
            }
        }
    }

    /// Where the dependent goes when the predecessor sits at `predecessor`.
    ///
    /// The dependent keeps `duration`; its reference endpoint lands `gap`
    /// after the predecessor's. `None` if the gap is unset or the result is
    /// out of range.
    pub fn place_dependent(&self, predecessor: &Schedule, duration: TimeDelta) -> Option<Schedule> {
        let gap = self.gap?;
        let reference = predecessor
            .instant(self.kind.predecessor_anchor())
            .checked_add_signed(gap)?;
        Schedule::anchored_at(self.kind.dependent_anchor(), reference, duration)
    }

    /// Whether `other` describes the same edge (endpoints and type).
    pub fn same_edge(&self, other: &Link) -> bool {
        self.source == other.source && self.target == other.target && self.kind == other.kind
    }

    pub fn touches(&self, task: &str) -> bool {
        self.source == task || self.target == task
    }
}
