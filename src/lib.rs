// src/lib.rs

pub mod chart;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod model;
pub mod schedule;
pub mod store;
pub mod types;

use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use chrono::{NaiveDateTime, TimeDelta};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use ulid::Ulid;

use crate::chart::{ConsoleChart, render_table};
use crate::cli::{CliArgs, Command};
use crate::config::{ConfigFile, default_config_path, load_and_validate, load_or_default};
use crate::engine::{CoreCommand, CoreStep, EditOrigin, GroupCore, GroupEvent, Runtime, RuntimeEvent};
use crate::errors::GanttError;
use crate::model::wire::{normalize, parse_timestamp, tasks_from_trello_cards};
use crate::model::{GanttDocument, Link, LinkType, Schedule, Task};
use crate::schedule::ScheduleGraph;
use crate::store::build_store;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the group's stored schedule
/// - the runtime with the console chart
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_config(&args)?;
    let store = build_store(&cfg);

    let raw = store.load(&args.group).await?;
    let ingress = normalize(&raw);
    for rejected in &ingress.rejected {
        warn!(
            collection = rejected.collection,
            index = rejected.index,
            reason = %rejected.reason,
            "ignored malformed stored entry"
        );
    }

    if let Command::Show = args.command {
        print!("{}", render_table(&args.group, &GanttDocument::from_graph(&ingress.graph)));
        for cycle in ingress.graph.dependency_cycles() {
            println!("  cycle: {}", cycle.join(" -> "));
        }
        return Ok(());
    }

    let events = match &args.command {
        Command::Import { file } => {
            let contents = tokio::fs::read_to_string(file)
                .await
                .with_context(|| format!("reading cards from {file}"))?;
            let cards: Value =
                serde_json::from_str(&contents).with_context(|| format!("parsing cards in {file}"))?;
            import_events(&cards, &ingress.graph)
        }
        command => vec![build_event(command, &ingress.graph)?],
    };
    if events.is_empty() {
        info!(group = %args.group, "nothing to import");
        return Ok(());
    }

    if args.dry_run {
        let mut core = GroupCore::new(args.group.clone(), ingress.graph, cfg.config.echo_window);
        for event in events {
            let step = core.step(event);
            print_dry_run(&args.group, step)?;
        }
        return Ok(());
    }

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let chart = Arc::new(ConsoleChart::new());
    let runtime = Runtime::new(rt_rx, store, chart.clone(), cfg.runtime_options());

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    // The runtime is only polled below, so feed it from its own task; a
    // large import would otherwise fill the channel first.
    let feeder = {
        let group = args.group.clone();
        tokio::spawn(async move {
            for event in events {
                if rt_tx
                    .send(RuntimeEvent::Group {
                        group: group.clone(),
                        event,
                    })
                    .await
                    .is_err()
                {
                    return;
                }
            }
            let _ = rt_tx.send(RuntimeEvent::ShutdownRequested).await;
        })
    };

    let graphs = runtime.run().await?;
    if let Err(e) = feeder.await {
        warn!(error = %e, "edit feeder task failed");
    }
    if !graphs.contains_key(&args.group) {
        bail!("group {} could not be loaded", args.group);
    }
    if chart.rejections() > 0 {
        bail!("edit rejected");
    }
    if chart.persist_failures() > 0 {
        bail!("edit applied but not saved");
    }

    info!(group = %args.group, "edit saved");
    Ok(())
}

fn load_config(args: &CliArgs) -> Result<ConfigFile> {
    let cfg = match &args.config {
        Some(path) => load_and_validate(path).with_context(|| format!("loading config {path}"))?,
        None => load_or_default(default_config_path())?,
    };
    debug!(?cfg, "configuration loaded");
    Ok(cfg)
}

/// Turn a mutating subcommand into the edit event it stands for.
pub fn build_event(command: &Command, graph: &ScheduleGraph) -> Result<GroupEvent> {
    let origin = EditOrigin::Form;

    let event = match command {
        Command::Show => bail!("`show` does not edit the schedule"),
        Command::Import { .. } => bail!("`import` creates several tasks; use `import_events`"),

        Command::Add {
            id,
            text,
            start,
            end,
            specialty,
            progress,
            dependent,
        } => {
            let id = id.clone().unwrap_or_else(new_id);
            let schedule = Schedule::new(parse_time(start)?, parse_time(end)?);
            let mut task = Task::new(id, text.as_str(), schedule).with_specialty(specialty.iter().cloned());
            if let Some(progress) = progress {
                task.set_progress(*progress);
            }
            GroupEvent::TaskAdded {
                task,
                dependent: dependent.clone().map(|target| (new_id(), target)),
                origin,
            }
        }

        Command::Edit {
            id,
            text,
            start,
            end,
            progress,
            specialty,
        } => {
            let mut task = stored_task(graph, id)?;
            if let Some(text) = text {
                task.text = text.clone();
            }
            if let Some(start) = start {
                task.schedule.start = parse_time(start)?;
            }
            if let Some(end) = end {
                task.schedule.end = parse_time(end)?;
            }
            if let Some(progress) = progress {
                task.set_progress(*progress);
            }
            if !specialty.is_empty() {
                task = task.with_specialty(specialty.iter().cloned());
            }
            GroupEvent::TaskChanged { task, origin }
        }

        Command::Move { id, by } => {
            let mut task = stored_task(graph, id)?;
            let delta = parse_shift(by)?;
            task.schedule = task
                .schedule
                .shifted(delta)
                .ok_or_else(|| GanttError::TimeOverflow(id.clone()))?;
            GroupEvent::TaskChanged { task, origin }
        }

        Command::Delete { id } => GroupEvent::TaskDeleted {
            id: id.clone(),
            origin,
        },

        Command::Link {
            source,
            target,
            kind,
            id,
        } => {
            let kind: LinkType = kind.parse().map_err(|e: String| anyhow!(e))?;
            let mut links = graph.links().to_vec();
            links.push(Link::new(id.clone().unwrap_or_else(new_id), source.as_str(), target.as_str(), kind));
            GroupEvent::LinksChanged { links, origin }
        }

        Command::Unlink { id } => {
            if graph.get_link(id).is_none() {
                return Err(GanttError::LinkNotFound(id.clone()).into());
            }
            let links = graph.links().iter().filter(|l| l.id != *id).cloned().collect();
            GroupEvent::LinksChanged { links, origin }
        }

        Command::Depend { source, target } => GroupEvent::DependentSelected {
            source: source.clone(),
            target: target.clone(),
            link_id: new_id(),
            origin,
        },
    };

    Ok(event)
}

/// One task-added edit per Trello card that is not already a task of `graph`.
pub fn import_events(cards: &Value, graph: &ScheduleGraph) -> Vec<GroupEvent> {
    let imported = tasks_from_trello_cards(cards);
    imported
        .graph
        .tasks()
        .filter(|task| {
            let known = graph.contains_task(&task.id);
            if known {
                warn!(task = %task.id, "task already exists; card skipped");
            }
            !known
        })
        .map(|task| GroupEvent::TaskAdded {
            task: task.clone(),
            dependent: None,
            origin: EditOrigin::Form,
        })
        .collect()
}

fn new_id() -> String {
    Ulid::new().to_string()
}

fn stored_task(graph: &ScheduleGraph, id: &str) -> Result<Task> {
    graph
        .get_task(id)
        .cloned()
        .ok_or_else(|| GanttError::TaskNotFound(id.to_string()).into())
}

fn parse_time(raw: &str) -> Result<NaiveDateTime> {
    parse_timestamp(raw).ok_or_else(|| anyhow!("invalid timestamp {raw:?} (expected e.g. 2025-01-01T08:00)"))
}

/// Parse a signed shift such as `2h`, `-30m`, `1d6h` or `+45s`.
pub fn parse_shift(raw: &str) -> Result<TimeDelta> {
    let trimmed = raw.trim();
    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    if body.is_empty() {
        bail!("empty shift {raw:?}");
    }

    let mut total = TimeDelta::zero();
    let mut digits = String::new();
    for c in body.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let amount: i64 = digits
            .parse()
            .with_context(|| format!("missing number before '{c}' in shift {raw:?}"))?;
        digits.clear();
        let part = match c {
            'd' => TimeDelta::try_days(amount),
            'h' => TimeDelta::try_hours(amount),
            'm' => TimeDelta::try_minutes(amount),
            's' => TimeDelta::try_seconds(amount),
            other => bail!("unknown unit '{other}' in shift {raw:?} (use d, h, m or s)"),
        }
        .ok_or_else(|| anyhow!("shift {raw:?} is out of range"))?;
        total = total
            .checked_add(&part)
            .ok_or_else(|| anyhow!("shift {raw:?} is out of range"))?;
    }
    if !digits.is_empty() {
        bail!("shift {raw:?} is missing a unit after {digits}");
    }

    Ok(if negative { -total } else { total })
}

/// Print what an edit would do, without touching the store.
fn print_dry_run(group: &str, step: CoreStep) -> Result<()> {
    println!("ganttline dry-run (nothing saved)");

    if let Some(report) = &step.report {
        for moved in &report.rescheduled {
            println!(
                "  {}: {} .. {}  ->  {} .. {}",
                moved.task, moved.before.start, moved.before.end, moved.after.start, moved.after.end
            );
        }
        for warning in &report.warnings {
            println!("  warning: {warning}");
        }
    }

    let mut rejected = false;
    for command in step.commands {
        match command {
            CoreCommand::Render(frame) => print!("{}", render_table(group, &frame.document)),
            CoreCommand::Reject { task, error } => {
                rejected = true;
                println!("  rejected edit of {task}: {error}");
            }
            CoreCommand::Persist(_) => {}
        }
    }

    if rejected {
        bail!("edit rejected");
    }
    debug!("dry-run complete (nothing persisted)");
    Ok(())
}
