// src/chart/mod.rs

//! Chart surface abstraction.
//!
//! The group workers hand every applied edit to a [`ChartSink`] as a
//! [`RenderFrame`] and report refused edits through
//! [`ChartSink::rejected`] and failed saves through
//! [`ChartSink::persist_failed`]. The CLI uses [`ConsoleChart`], which prints a
//! task table; tests record frames instead.

use std::fmt::Write as _;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::engine::{EditOrigin, RenderFrame};
use crate::errors::GanttError;
use crate::model::{GanttDocument, LinkType};

pub trait ChartSink: Send + Sync {
    /// Redraw `group` from the frame's collections.
    fn render(&self, group: &str, frame: &RenderFrame);

    /// An edit of `task` was refused; the chart should revert it.
    fn rejected(&self, group: &str, task: &str, error: &GanttError);

    /// A save of `group` failed; the edit stays applied in memory only.
    fn persist_failed(&self, group: &str, error: &GanttError);
}

/// Prints each render to stdout as a table and rejections to stderr.
#[derive(Debug, Default)]
pub struct ConsoleChart {
    rejections: AtomicUsize,
    persist_failures: AtomicUsize,
}

impl ConsoleChart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of edits rejected so far.
    pub fn rejections(&self) -> usize {
        self.rejections.load(Ordering::Relaxed)
    }

    /// Number of saves that failed so far.
    pub fn persist_failures(&self) -> usize {
        self.persist_failures.load(Ordering::Relaxed)
    }
}

impl ChartSink for ConsoleChart {
    fn render(&self, group: &str, frame: &RenderFrame) {
        let mut out = String::new();
        for change in &frame.changes {
            let why = match change.origin {
                EditOrigin::Form => "edited",
                EditOrigin::Chart { .. } => "edited on chart",
                EditOrigin::Propagation => "rescheduled",
            };
            let _ = writeln!(out, "* {} {}", change.task, why);
        }
        out.push_str(&render_table(group, &frame.document));
        print!("{out}");
    }

    fn rejected(&self, group: &str, task: &str, error: &GanttError) {
        self.rejections.fetch_add(1, Ordering::Relaxed);
        eprintln!("[{group}] edit of task {task} rejected: {error}");
    }

    fn persist_failed(&self, group: &str, error: &GanttError) {
        self.persist_failures.fetch_add(1, Ordering::Relaxed);
        eprintln!("[{group}] {error}");
    }
}

/// Plain-text table of a group's tasks followed by its links.
pub fn render_table(group: &str, document: &GanttDocument) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "group {group}: {} tasks, {} links", document.tasks.len(), document.links.len());

    if !document.tasks.is_empty() {
        let id_width = document.tasks.iter().map(|t| t.id.len()).max().unwrap_or(2).max(2);
        let _ = writeln!(
            out,
            "  {:<id_width$}  {:<19}  {:<19}  {:>7}  {:>5}  {:<6}  text",
            "id", "start", "end", "hours", "done", "band"
        );
        for task in &document.tasks {
            let mut text = task.text.clone();
            if !task.specialty.is_empty() {
                let _ = write!(text, " [{}]", task.specialty.join(", "));
            }
            let _ = writeln!(
                out,
                "  {:<id_width$}  {:<19}  {:<19}  {:>7.2}  {:>4.0}%  {:<6}  {}",
                task.id,
                task.start_date,
                task.end_date,
                task.duration,
                task.progress * 100.0,
                progress_band(task.progress),
                text
            );
        }
    }

    for link in &document.links {
        let kind = link
            .kind
            .parse::<LinkType>()
            .map(|k| k.mnemonic().to_string())
            .unwrap_or_else(|_| link.kind.clone());
        let gap = match link.initial_gap {
            Some(ms) => format!("gap {}", format_gap(ms)),
            None => "gap unset".to_string(),
        };
        let _ = writeln!(out, "  {} -> {}  {kind}  {gap}  ({})", link.source, link.target, link.id);
    }

    out
}

/// Colour band of a task bar for a progress fraction.
pub fn progress_band(progress: f64) -> &'static str {
    let percent = progress * 100.0;
    if percent < 26.0 {
        "red"
    } else if percent < 51.0 {
        "orange"
    } else if percent < 75.0 {
        "yellow"
    } else {
        "green"
    }
}

/// Milliseconds as a signed `1h30m`-style string.
fn format_gap(ms: i64) -> String {
    let sign = if ms < 0 { "-" } else { "+" };
    let total_minutes = ms.unsigned_abs() / 60_000;
    let (days, hours, minutes) = (total_minutes / 1440, total_minutes / 60 % 24, total_minutes % 60);

    let mut out = sign.to_string();
    if days > 0 {
        let _ = write!(out, "{days}d");
    }
    if hours > 0 {
        let _ = write!(out, "{hours}h");
    }
    if minutes > 0 || (days == 0 && hours == 0) {
        let _ = write!(out, "{minutes}m");
    }
    out
}
