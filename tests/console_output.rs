// tests/console_output.rs

mod common;
use crate::common::{GraphBuilder, TaskBuilder};

use ganttline::chart::{ChartSink, ConsoleChart, progress_band, render_table};
use ganttline::engine::EchoFilter;
use ganttline::errors::GanttError;
use ganttline::logging::{filter_from_env_value, parse_level_str};
use ganttline::model::{GanttDocument, LinkType};

#[test]
fn table_lists_tasks_and_links() {
    let graph = GraphBuilder::new()
        .with_task(
            TaskBuilder::new("a", "2025-01-01T08:00", "2025-01-01T09:30")
                .text("Design")
                .specialty("UI/UX")
                .progress(0.5)
                .build(),
        )
        .task("b", "2025-01-01T08:00", "2025-01-01T09:00")
        .link("ab", "a", "b", LinkType::StartToStart)
        .link_unset("ba", "b", "a", LinkType::FinishToFinish)
        .build();

    let table = render_table("team", &GanttDocument::from_graph(&graph));
    let lines: Vec<&str> = table.lines().collect();

    assert_eq!(lines[0], "group team: 2 tasks, 2 links");
    assert!(lines[2].contains("2025-01-01T08:00:00"));
    assert!(lines[2].contains("1.50"));
    assert!(lines[1].contains("band"));
    assert!(lines[2].contains("50%  orange"));
    assert!(lines[3].contains("0%  red"));
    assert!(lines[2].ends_with("Design [UI/UX]"));
    assert_eq!(lines[4], "  a -> b  SS  gap +0m  (ab)");
    assert_eq!(lines[5], "  b -> a  FF  gap unset  (ba)");
}

#[test]
fn progress_maps_to_colour_bands() {
    let bands: Vec<&str> = [0.0, 0.25, 0.3, 0.5, 0.6, 0.74, 0.75, 1.0]
        .into_iter()
        .map(progress_band)
        .collect();
    assert_eq!(
        bands,
        vec!["red", "red", "orange", "orange", "yellow", "yellow", "green", "green"]
    );
}

#[test]
fn empty_group_prints_only_the_header() {
    let table = render_table("empty", &GanttDocument::default());
    assert_eq!(table, "group empty: 0 tasks, 0 links\n");
}

#[test]
fn console_chart_counts_rejections() {
    let chart = ConsoleChart::new();
    assert_eq!(chart.rejections(), 0);

    chart.rejected("team", "a", &GanttError::TaskNotFound("a".into()));
    chart.rejected("team", "b", &GanttError::SelfDependency("b".into()));
    assert_eq!(chart.rejections(), 2);
}

#[test]
fn echo_filter_keeps_a_bounded_window() {
    let mut filter = EchoFilter::new(0);
    assert!(filter.is_empty());

    filter.remember(1);
    filter.remember(2);
    assert_eq!(filter.len(), 1);
    assert!(filter.is_echo(2));
    assert!(!filter.is_echo(1));

    let mut filter = EchoFilter::new(3);
    for id in 1..=5 {
        filter.remember(id);
    }
    let kept: Vec<bool> = (1..=5).map(|id| filter.is_echo(id)).collect();
    assert_eq!(kept, vec![false, false, true, true, true]);
}

#[test]
fn log_levels_parse_leniently() {
    assert_eq!(parse_level_str(" Warning "), Some(tracing::Level::WARN));
    assert_eq!(parse_level_str("TRACE"), Some(tracing::Level::TRACE));
    assert_eq!(parse_level_str("loud"), None);

    assert!(filter_from_env_value("debug").is_ok());
    assert!(filter_from_env_value("ganttline::schedule=trace,info").is_ok());
    assert!(filter_from_env_value("ganttline=loud").is_err());
}
