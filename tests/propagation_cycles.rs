// tests/propagation_cycles.rs

mod common;
use crate::common::{GraphBuilder, init_tracing, sched, schedule};

use ganttline::model::LinkType;
use ganttline::schedule::{PropagationWarning, propagate};

fn cyclic(link: &str, task: &str) -> PropagationWarning {
    PropagationWarning::CyclicDependency {
        link: link.to_string(),
        task: task.to_string(),
    }
}

#[test]
fn link_back_into_edited_task_is_truncated() {
    init_tracing();

    let graph = GraphBuilder::new()
        .task("A", "2025-01-01T08:00", "2025-01-01T10:00")
        .task("B", "2025-01-01T11:00", "2025-01-01T13:00")
        .fs("ab", "A", "B")
        .fs("ba", "B", "A")
        .build();

    let out = propagate(
        &graph,
        "A",
        sched("2025-01-01T08:00", "2025-01-01T10:00"),
        sched("2025-01-01T08:00", "2025-01-01T12:00"),
    )
    .unwrap();

    // A keeps exactly the edited schedule; B follows once.
    assert_eq!(schedule(&out.graph, "A"), sched("2025-01-01T08:00", "2025-01-01T12:00"));
    assert_eq!(schedule(&out.graph, "B"), sched("2025-01-01T13:00", "2025-01-01T15:00"));
    assert_eq!(out.report.warnings, vec![cyclic("ba", "A")]);
    assert!(out.report.has_cycles());
}

#[test]
fn cycle_among_dependents_is_cut_at_its_entry() {
    init_tracing();

    // R -> X -> Y -> X
    let graph = GraphBuilder::new()
        .task("R", "2025-01-01T08:00", "2025-01-01T09:00")
        .task("X", "2025-01-01T10:00", "2025-01-01T11:00")
        .task("Y", "2025-01-01T12:00", "2025-01-01T13:00")
        .fs("rx", "R", "X")
        .fs("xy", "X", "Y")
        .fs("yx", "Y", "X")
        .build();

    let out = propagate(
        &graph,
        "R",
        sched("2025-01-01T08:00", "2025-01-01T09:00"),
        sched("2025-01-01T08:00", "2025-01-01T10:00"),
    )
    .unwrap();

    assert_eq!(schedule(&out.graph, "X"), sched("2025-01-01T11:00", "2025-01-01T12:00"));
    assert_eq!(schedule(&out.graph, "Y"), sched("2025-01-01T13:00", "2025-01-01T14:00"));
    assert_eq!(out.report.warnings, vec![cyclic("yx", "X")]);
    assert_eq!(out.report.rescheduled_ids(), vec!["X", "Y"]);
}

#[test]
fn self_link_on_a_dependent_is_ignored() {
    init_tracing();

    let graph = GraphBuilder::new()
        .task("R", "2025-01-01T08:00", "2025-01-01T09:00")
        .task("X", "2025-01-01T10:00", "2025-01-01T11:00")
        .fs("rx", "R", "X")
        .link_unset("xx", "X", "X", LinkType::StartToStart)
        .build();

    let out = propagate(
        &graph,
        "R",
        sched("2025-01-01T08:00", "2025-01-01T09:00"),
        sched("2025-01-01T09:00", "2025-01-01T10:00"),
    )
    .unwrap();

    assert_eq!(schedule(&out.graph, "X"), sched("2025-01-01T11:00", "2025-01-01T12:00"));
    assert_eq!(out.report.warnings, vec![cyclic("xx", "X")]);
}

#[test]
fn task_downstream_of_a_cycle_still_waits_for_it() {
    init_tracing();

    // R -> D, R -> C, C -> E, E -> C, E -> D.
    // D is not on the loop; its link from E must be honoured, not cut.
    let graph = GraphBuilder::new()
        .task("R", "2025-01-01T08:00", "2025-01-01T09:00")
        .task("D", "2025-01-01T20:00", "2025-01-01T21:00")
        .task("C", "2025-01-01T10:00", "2025-01-01T11:00")
        .task("E", "2025-01-01T12:00", "2025-01-01T13:00")
        .fs("rd", "R", "D")
        .fs("rc", "R", "C")
        .fs("ce", "C", "E")
        .fs("ec", "E", "C")
        .link("ed", "E", "D", LinkType::StartToStart)
        .build();

    let out = propagate(
        &graph,
        "R",
        sched("2025-01-01T08:00", "2025-01-01T09:00"),
        sched("2025-01-01T08:00", "2025-01-01T10:00"),
    )
    .unwrap();

    assert_eq!(schedule(&out.graph, "C"), sched("2025-01-01T11:00", "2025-01-01T12:00"));
    assert_eq!(schedule(&out.graph, "E"), sched("2025-01-01T13:00", "2025-01-01T14:00"));
    // ed (SS, gap 8h) was created after rd, so E's start decides: 13:00 + 8h.
    assert_eq!(schedule(&out.graph, "D"), sched("2025-01-01T21:00", "2025-01-01T22:00"));
    assert_eq!(out.report.warnings, vec![cyclic("ec", "C")]);
}

#[test]
fn fully_cyclic_ring_terminates() {
    init_tracing();

    let mut builder = GraphBuilder::new();
    let n = 12;
    for i in 0..n {
        builder = builder.task(
            &format!("t{i}"),
            &format!("2025-01-{:02}T08:00", i + 1),
            &format!("2025-01-{:02}T10:00", i + 1),
        );
    }
    for i in 0..n {
        builder = builder.fs(&format!("l{i}"), &format!("t{i}"), &format!("t{}", (i + 1) % n));
    }
    let graph = builder.build();
    assert_eq!(graph.dependency_cycles().len(), 1);

    let out = propagate(
        &graph,
        "t3",
        sched("2025-01-04T08:00", "2025-01-04T10:00"),
        sched("2025-01-04T09:00", "2025-01-04T11:00"),
    )
    .unwrap();

    // Everyone else moved by one hour, once; the link back into t3 was cut.
    assert_eq!(out.report.rescheduled.len(), n - 1);
    for moved in &out.report.rescheduled {
        assert_eq!(moved.after.start - moved.before.start, chrono::TimeDelta::hours(1));
    }
    assert_eq!(out.report.warnings, vec![cyclic("l2", "t3")]);
}
