// src/model/wire.rs

//! The `{tasks, links}` JSON exchanged with the store and the chart.
//!
//! Ingress ([`normalize`]) accepts whatever the collaborators hand over,
//! keeps every entry it can type, and reports the rest. Egress
//! ([`GanttDocument::from_graph`]) always produces the canonical shape:
//!
//! ```json
//! {
//!   "tasks": [{"id": "a", "text": "Design", "specialty": ["UI/UX"],
//!              "start_date": "2025-01-01T08:00:00", "end_date": "2025-01-01T10:00:00",
//!              "duration": 2.0, "progress": 0.5, "open": true}],
//!   "links": [{"id": "l1", "source": "a", "target": "b", "type": "0", "initialGap": 3600000}]
//! }
//! ```

use chrono::{DateTime, NaiveDateTime, TimeDelta, Timelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::warn;

use crate::errors::{GanttError, Result};
use crate::model::link::{Link, LinkType};
use crate::model::task::{Schedule, Task};
use crate::schedule::ScheduleGraph;

/// Canonical timestamp format on the wire.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Formats accepted on input besides RFC 3339.
const INPUT_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

pub fn format_timestamp(t: NaiveDateTime) -> String {
    t.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a wire timestamp. Zoned RFC 3339 values are converted to UTC wall time.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    for format in INPUT_FORMATS {
        if let Ok(t) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(t);
        }
    }
    DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.naive_utc())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireTask {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub specialty: Vec<String>,
    pub start_date: String,
    pub end_date: String,
    /// Derived, in hours. Ignored on ingress.
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub progress: f64,
    /// Collapsed state in the chart; absent means expanded.
    #[serde(default = "default_open")]
    pub open: bool,
}

fn default_open() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireLink {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Captured gap in milliseconds.
    #[serde(rename = "initialGap", default, skip_serializing_if = "Option::is_none")]
    pub initial_gap: Option<i64>,
}

impl From<&Task> for WireTask {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            text: task.text.clone(),
            specialty: task.specialty.clone(),
            start_date: format_timestamp(task.start()),
            end_date: format_timestamp(task.end()),
            duration: task.duration_hours(),
            progress: task.progress,
            open: task.open,
        }
    }
}

impl From<&Link> for WireLink {
    fn from(link: &Link) -> Self {
        Self {
            id: link.id.clone(),
            source: link.source.clone(),
            target: link.target.clone(),
            kind: link.kind.code().to_string(),
            initial_gap: link.gap().map(|gap| gap.num_milliseconds()),
        }
    }
}

/// Full schedule of one group as persisted and rendered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GanttDocument {
    #[serde(default)]
    pub tasks: Vec<WireTask>,
    #[serde(default)]
    pub links: Vec<WireLink>,
}

impl GanttDocument {
    pub fn from_graph(graph: &ScheduleGraph) -> Self {
        Self {
            tasks: graph.tasks().map(WireTask::from).collect(),
            links: graph.links().iter().map(WireLink::from).collect(),
        }
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Re-type this document through the same validation as any other payload.
    pub fn to_graph(&self) -> Result<Ingress> {
        Ok(normalize(&self.to_value()?))
    }
}

/// An entry dropped at ingress.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejected {
    /// `"tasks"`, `"links"` or `"cards"`.
    pub collection: &'static str,
    pub index: usize,
    pub reason: String,
}

/// Result of typing a raw payload.
#[derive(Debug, Clone, Default)]
pub struct Ingress {
    pub graph: ScheduleGraph,
    pub rejected: Vec<Rejected>,
}

impl Ingress {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Type a raw `{tasks, links}` payload.
///
/// Missing or non-array collections become empty. Entries that cannot be
/// typed (missing id, unparsable dates, `end <= start`, duplicate ids) are
/// dropped and listed in [`Ingress::rejected`]. Links pointing at unknown
/// tasks are kept; propagation skips them.
pub fn normalize(value: &Value) -> Ingress {
    let mut ingress = Ingress::default();

    for (index, raw) in array_field(value, "tasks").iter().enumerate() {
        let result = task_from_value(raw).and_then(|task| ingress.graph.insert_task(task));
        if let Err(e) = result {
            reject(&mut ingress, "tasks", index, e);
        }
    }

    for (index, raw) in array_field(value, "links").iter().enumerate() {
        match link_from_value(raw) {
            Ok(link) if ingress.graph.get_link(&link.id).is_some() => {
                let reason = GanttError::InvalidPayload(format!("duplicate link id {}", link.id));
                reject(&mut ingress, "links", index, reason);
            }
            Ok(link) => {
                ingress.graph.upsert_link(link);
            }
            Err(e) => reject(&mut ingress, "links", index, e),
        }
    }

    ingress
}

/// Type a Trello board's card list (`GET /1/boards/{id}/cards`) as new tasks.
///
/// Every card with an `id` and a `name` becomes a task that starts now and
/// lasts whole days until its `due` date. Cards with no due date, or already
/// overdue, last one day. The result carries no links.
pub fn tasks_from_trello_cards(cards: &Value) -> Ingress {
    tasks_from_trello_cards_at(cards, Utc::now().naive_utc())
}

/// [`tasks_from_trello_cards`] with an explicit "now" (UTC wall time).
pub fn tasks_from_trello_cards_at(cards: &Value, now: NaiveDateTime) -> Ingress {
    let mut ingress = Ingress::default();

    let cards: &[Value] = match cards {
        Value::Array(items) => items,
        other => {
            warn!(kind = value_kind(other), "card list is not an array; importing nothing");
            &[]
        }
    };

    for (index, card) in cards.iter().enumerate() {
        let result = task_from_card(card, now).and_then(|task| ingress.graph.insert_task(task));
        if let Err(e) = result {
            reject(&mut ingress, "cards", index, e);
        }
    }

    ingress
}

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

fn task_from_card(card: &Value, now: NaiveDateTime) -> Result<Task> {
    if !card.is_object() {
        return Err(GanttError::InvalidPayload(format!(
            "card is a {}, expected an object",
            value_kind(card)
        )));
    }

    let id = id_field(card, "id")?;
    let name = card
        .get("name")
        .and_then(Value::as_str)
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| GanttError::InvalidPayload("missing or empty `name`".into()))?;

    let days = card
        .get("due")
        .and_then(Value::as_str)
        .and_then(parse_timestamp)
        .map(|due| {
            let ms = (due - now).num_milliseconds();
            if ms <= 0 { 1 } else { (ms - 1) / DAY_MS + 1 }
        })
        .unwrap_or(1);

    let start = now.with_second(0).and_then(|t| t.with_nanosecond(0)).unwrap_or(now);
    let end = start
        .checked_add_signed(TimeDelta::days(days))
        .ok_or_else(|| GanttError::TimeOverflow(id.clone()))?;

    task_from_value(&json!({
        "id": id,
        "text": name,
        "start_date": format_timestamp(start),
        "end_date": format_timestamp(end),
        "progress": 0,
        "open": true,
    }))
}

fn reject(ingress: &mut Ingress, collection: &'static str, index: usize, error: GanttError) {
    warn!(collection, index, error = %error, "dropping malformed entry at ingress");
    ingress.rejected.push(Rejected {
        collection,
        index,
        reason: error.to_string(),
    });
}

fn array_field<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    match value.get(key) {
        Some(Value::Array(items)) => items.as_slice(),
        Some(Value::Null) | None => &[],
        Some(other) => {
            warn!(key, kind = value_kind(other), "collection is not an array; treating as empty");
            &[]
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Ids may arrive as strings or as numbers (the chart generates numeric ids).
fn id_field(raw: &Value, key: &str) -> Result<String> {
    match raw.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(GanttError::InvalidPayload(format!("missing or empty `{key}`"))),
    }
}

fn timestamp_field(raw: &Value, key: &str) -> Result<NaiveDateTime> {
    let text = raw
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| GanttError::InvalidPayload(format!("missing `{key}`")))?;
    parse_timestamp(text)
        .ok_or_else(|| GanttError::InvalidPayload(format!("unparsable `{key}`: {text:?}")))
}

/// Type a single task entry.
pub fn task_from_value(raw: &Value) -> Result<Task> {
    if !raw.is_object() {
        return Err(GanttError::InvalidPayload(format!(
            "task entry is a {}, expected an object",
            value_kind(raw)
        )));
    }

    let id = id_field(raw, "id")?;
    let schedule = Schedule::new(
        timestamp_field(raw, "start_date")?,
        timestamp_field(raw, "end_date")?,
    );
    schedule.ensure_valid(&id)?;

    let text = raw
        .get("text")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let mut task = Task::new(id, text, schedule);

    match raw.get("specialty") {
        Some(Value::Array(items)) => {
            for tag in items.iter().filter_map(Value::as_str) {
                task.add_specialty(tag);
            }
        }
        Some(Value::String(tag)) if !tag.is_empty() => task.add_specialty(tag.as_str()),
        _ => {}
    }

    if let Some(progress) = raw.get("progress").and_then(Value::as_f64) {
        // The edit form once stored percentages.
        let progress = if progress > 1.0 && progress <= 100.0 {
            progress / 100.0
        } else {
            progress
        };
        task.set_progress(progress);
    }

    task.open = raw.get("open").and_then(Value::as_bool).unwrap_or(true);

    Ok(task)
}

/// Type a single link entry.
pub fn link_from_value(raw: &Value) -> Result<Link> {
    if !raw.is_object() {
        return Err(GanttError::InvalidPayload(format!(
            "link entry is a {}, expected an object",
            value_kind(raw)
        )));
    }

    let id = id_field(raw, "id")?;
    let source = id_field(raw, "source")?;
    let target = id_field(raw, "target")?;

    let kind = match raw.get("type") {
        None | Some(Value::Null) => LinkType::default(),
        Some(Value::String(s)) => s.parse::<LinkType>().map_err(GanttError::InvalidPayload)?,
        Some(Value::Number(n)) => n
            .to_string()
            .parse::<LinkType>()
            .map_err(GanttError::InvalidPayload)?,
        Some(other) => {
            return Err(GanttError::InvalidPayload(format!(
                "link type is a {}",
                value_kind(other)
            )));
        }
    };

    let mut link = Link::new(id, source, target, kind);

    match raw.get("initialGap") {
        None | Some(Value::Null) => {}
        Some(Value::Number(n)) => {
            let millis = n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f.round() as i64))
                .ok_or_else(|| GanttError::InvalidPayload(format!("bad initialGap {n}")))?;
            let gap = TimeDelta::try_milliseconds(millis)
                .ok_or_else(|| GanttError::InvalidPayload(format!("initialGap {millis} out of range")))?;
            link = link.with_gap(gap);
        }
        Some(other) => {
            return Err(GanttError::InvalidPayload(format!(
                "initialGap is a {}",
                value_kind(other)
            )));
        }
    }

    Ok(link)
}
