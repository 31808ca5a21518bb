// tests/propagation_rules.rs

mod common;
use crate::common::{GraphBuilder, hours, init_tracing, sched, schedule};

use ganttline::errors::GanttError;
use ganttline::model::LinkType;
use ganttline::schedule::{PropagationWarning, ScheduleGraph, apply_edit, propagate};

#[test]
fn finish_to_start_follows_predecessor_end() {
    init_tracing();

    // A 08:00-10:00, B 11:00-13:00, FS with a 1h gap.
    let graph = GraphBuilder::new()
        .task("A", "2025-01-01T08:00", "2025-01-01T10:00")
        .task("B", "2025-01-01T11:00", "2025-01-01T13:00")
        .fs("l1", "A", "B")
        .build();

    let out = propagate(
        &graph,
        "A",
        sched("2025-01-01T08:00", "2025-01-01T10:00"),
        sched("2025-01-01T08:00", "2025-01-01T12:00"),
    )
    .unwrap();

    assert_eq!(schedule(&out.graph, "A"), sched("2025-01-01T08:00", "2025-01-01T12:00"));
    assert_eq!(schedule(&out.graph, "B"), sched("2025-01-01T13:00", "2025-01-01T15:00"));
    assert_eq!(out.report.rescheduled_ids(), vec!["B"]);
    assert!(out.report.warnings.is_empty());

    // The input graph is untouched.
    assert_eq!(schedule(&graph, "B"), sched("2025-01-01T11:00", "2025-01-01T13:00"));
}

#[test]
fn first_propagation_captures_gap_from_pre_edit_schedules() {
    init_tracing();

    let graph = GraphBuilder::new()
        .task("A", "2025-01-01T08:00", "2025-01-01T10:00")
        .task("B", "2025-01-01T11:00", "2025-01-01T13:00")
        .link_unset("l1", "A", "B", LinkType::FinishToStart)
        .build();
    assert_eq!(graph.get_link("l1").unwrap().gap(), None);

    let out = propagate(
        &graph,
        "A",
        sched("2025-01-01T08:00", "2025-01-01T10:00"),
        sched("2025-01-01T08:00", "2025-01-01T12:00"),
    )
    .unwrap();

    assert_eq!(out.report.captured_gaps, vec!["l1".to_string()]);
    assert_eq!(out.graph.get_link("l1").unwrap().gap(), Some(hours(1)));
    assert_eq!(schedule(&out.graph, "B"), sched("2025-01-01T13:00", "2025-01-01T15:00"));
}

#[test]
fn each_link_type_uses_its_reference_instants_and_keeps_duration() {
    init_tracing();

    // Resize A by moving only its end: 08:00-10:00 -> 08:00-12:00.
    // Start-anchored links see no change in their predecessor instant.
    let cases = [
        (LinkType::FinishToStart, Some(("2025-01-01T13:00", "2025-01-01T15:00"))),
        (LinkType::StartToStart, None),
        (LinkType::FinishToFinish, Some(("2025-01-01T13:00", "2025-01-01T15:00"))),
        (LinkType::StartToFinish, None),
    ];

    for (kind, expected) in cases {
        let graph = GraphBuilder::new()
            .task("A", "2025-01-01T08:00", "2025-01-01T10:00")
            .task("B", "2025-01-01T11:00", "2025-01-01T13:00")
            .link("l1", "A", "B", kind)
            .build();

        let out = propagate(
            &graph,
            "A",
            sched("2025-01-01T08:00", "2025-01-01T10:00"),
            sched("2025-01-01T08:00", "2025-01-01T12:00"),
        )
        .unwrap();

        let b = schedule(&out.graph, "B");
        assert_eq!(b.duration(), hours(2), "{kind} changed B's duration");
        match expected {
            Some((start, end)) => {
                assert_eq!(b, sched(start, end), "{kind}");
                assert_eq!(out.report.rescheduled_ids(), vec!["B"], "{kind}");
            }
            None => {
                assert_eq!(b, sched("2025-01-01T11:00", "2025-01-01T13:00"), "{kind}");
                assert!(out.report.rescheduled.is_empty(), "{kind}");
            }
        }
    }
}

#[test]
fn every_link_type_follows_a_shift() {
    init_tracing();

    for kind in LinkType::ALL {
        let graph = GraphBuilder::new()
            .task("A", "2025-01-01T08:00", "2025-01-01T10:00")
            .task("B", "2025-01-01T11:00", "2025-01-01T13:00")
            .link("l1", "A", "B", kind)
            .build();

        let out = propagate(
            &graph,
            "A",
            sched("2025-01-01T08:00", "2025-01-01T10:00"),
            sched("2025-01-01T11:00", "2025-01-01T13:00"),
        )
        .unwrap();

        assert_eq!(
            schedule(&out.graph, "B"),
            sched("2025-01-01T14:00", "2025-01-01T16:00"),
            "{kind}"
        );
    }
}

#[test]
fn negative_gap_is_preserved() {
    init_tracing();

    // B starts an hour before A finishes.
    let graph = GraphBuilder::new()
        .task("A", "2025-01-01T08:00", "2025-01-01T10:00")
        .task("B", "2025-01-01T09:00", "2025-01-01T11:00")
        .fs("l1", "A", "B")
        .build();
    assert_eq!(graph.get_link("l1").unwrap().gap(), Some(hours(-1)));

    let out = propagate(
        &graph,
        "A",
        sched("2025-01-01T08:00", "2025-01-01T10:00"),
        sched("2025-01-01T08:00", "2025-01-01T12:00"),
    )
    .unwrap();

    assert_eq!(schedule(&out.graph, "B"), sched("2025-01-01T11:00", "2025-01-01T13:00"));
}

#[test]
fn propagation_is_transitive() {
    init_tracing();

    let graph = GraphBuilder::new()
        .task("A", "2025-01-01T08:00", "2025-01-01T10:00")
        .task("B", "2025-01-01T11:00", "2025-01-01T13:00")
        .task("C", "2025-01-01T14:00", "2025-01-01T16:00")
        .fs("l1", "A", "B")
        .fs("l2", "B", "C")
        .build();

    let out = propagate(
        &graph,
        "A",
        sched("2025-01-01T08:00", "2025-01-01T10:00"),
        sched("2025-01-01T08:00", "2025-01-01T12:00"),
    )
    .unwrap();

    assert_eq!(schedule(&out.graph, "B"), sched("2025-01-01T13:00", "2025-01-01T15:00"));
    assert_eq!(schedule(&out.graph, "C"), sched("2025-01-01T16:00", "2025-01-01T18:00"));
    assert_eq!(out.report.rescheduled_ids(), vec!["B", "C"]);

    let moved_b = &out.report.rescheduled[0];
    assert_eq!(moved_b.before, sched("2025-01-01T11:00", "2025-01-01T13:00"));
    assert_eq!(moved_b.after, sched("2025-01-01T13:00", "2025-01-01T15:00"));
}

#[test]
fn unchanged_schedule_is_a_noop() {
    init_tracing();

    let graph = GraphBuilder::new()
        .task("A", "2025-01-01T08:00", "2025-01-01T10:00")
        .task("B", "2025-01-01T11:00", "2025-01-01T13:00")
        .link_unset("l1", "A", "B", LinkType::FinishToStart)
        .build();

    let same = sched("2025-01-01T08:00", "2025-01-01T10:00");
    let out = propagate(&graph, "A", same, same).unwrap();

    assert!(out.report.is_noop());
    assert_eq!(out.graph, graph);
    // No traversal happened, so the gap is still unset.
    assert_eq!(out.graph.get_link("l1").unwrap().gap(), None);
}

#[test]
fn gap_is_not_recomputed_after_manual_moves() {
    init_tracing();

    let graph = GraphBuilder::new()
        .task("A", "2025-01-01T08:00", "2025-01-01T10:00")
        .task("B", "2025-01-01T11:00", "2025-01-01T13:00")
        .link_unset("l1", "A", "B", LinkType::FinishToStart)
        .build();

    // First edit captures the 1h gap.
    let out = propagate(
        &graph,
        "A",
        sched("2025-01-01T08:00", "2025-01-01T10:00"),
        sched("2025-01-01T08:00", "2025-01-01T12:00"),
    )
    .unwrap();
    assert_eq!(schedule(&out.graph, "B"), sched("2025-01-01T13:00", "2025-01-01T15:00"));

    // The user drags B far away; B has no dependents, so nothing else moves.
    let mut moved_b = out.graph.get_task("B").unwrap().clone();
    moved_b.schedule = sched("2025-01-01T17:00", "2025-01-01T19:00");
    let out = apply_edit(&out.graph, moved_b).unwrap();

    // Editing A again uses the captured 1h gap, not the 5h distance now on screen.
    let out = propagate(
        &out.graph,
        "A",
        sched("2025-01-01T08:00", "2025-01-01T12:00"),
        sched("2025-01-01T08:00", "2025-01-01T13:00"),
    )
    .unwrap();
    assert_eq!(schedule(&out.graph, "B"), sched("2025-01-01T14:00", "2025-01-01T16:00"));
    assert!(out.report.captured_gaps.is_empty());
}

#[test]
fn repeated_edits_do_not_drift() {
    init_tracing();

    let mut graph = GraphBuilder::new()
        .task("A", "2025-01-01T08:00", "2025-01-01T10:00")
        .task("B", "2025-01-01T11:00", "2025-01-01T13:00")
        .task("C", "2025-01-01T13:30", "2025-01-01T14:00")
        .link_unset("l1", "A", "B", LinkType::FinishToStart)
        .link_unset("l2", "B", "C", LinkType::StartToStart)
        .build();
    let original = graph.clone();

    let mut current = sched("2025-01-01T08:00", "2025-01-01T10:00");
    for end in ["2025-01-01T11:00", "2025-01-01T09:00", "2025-01-02T10:00", "2025-01-01T10:00"] {
        let next = sched("2025-01-01T08:00", end);
        graph = propagate(&graph, "A", current, next).unwrap().graph;
        current = next;
    }

    // Back where we started: every schedule matches the original.
    for id in ["A", "B", "C"] {
        assert_eq!(schedule(&graph, id), schedule(&original, id), "{id} drifted");
    }
}

#[test]
fn last_created_changed_predecessor_wins() {
    init_tracing();

    // A -> B (FF), A -> C (SS), B -> C (FS). Resizing A's end moves B but
    // leaves A's start alone, so the two links into C disagree.
    let build = |reverse: bool| {
        let base = GraphBuilder::new()
            .task("A", "2025-01-01T08:00", "2025-01-01T10:00")
            .task("B", "2025-01-01T10:00", "2025-01-01T11:00")
            .task("C", "2025-01-01T12:00", "2025-01-01T13:00")
            .link("ab", "A", "B", LinkType::FinishToFinish);
        if reverse {
            base.link("bc", "B", "C", LinkType::FinishToStart)
                .link("ac", "A", "C", LinkType::StartToStart)
                .build()
        } else {
            base.link("ac", "A", "C", LinkType::StartToStart)
                .link("bc", "B", "C", LinkType::FinishToStart)
                .build()
        }
    };

    let edit = |graph: &ScheduleGraph| {
        propagate(
            graph,
            "A",
            sched("2025-01-01T08:00", "2025-01-01T10:00"),
            sched("2025-01-01T08:00", "2025-01-01T12:00"),
        )
        .unwrap()
    };

    // bc created last: C follows B (B ends 13:00, +1h).
    let out = edit(&build(false));
    assert_eq!(schedule(&out.graph, "B"), sched("2025-01-01T12:00", "2025-01-01T13:00"));
    assert_eq!(schedule(&out.graph, "C"), sched("2025-01-01T14:00", "2025-01-01T15:00"));

    // ac created last: C follows A's unchanged start (+4h), i.e. stays put.
    let out = edit(&build(true));
    assert_eq!(schedule(&out.graph, "C"), sched("2025-01-01T12:00", "2025-01-01T13:00"));
}

#[test]
fn unchanged_predecessor_does_not_move_dependent() {
    init_tracing();

    // C depends on both A and B. Only A moves, so only A's link applies.
    let graph = GraphBuilder::new()
        .task("A", "2025-01-01T08:00", "2025-01-01T10:00")
        .task("B", "2025-01-01T08:00", "2025-01-01T09:00")
        .task("C", "2025-01-01T12:00", "2025-01-01T14:00")
        .fs("ac", "A", "C")
        .fs("bc", "B", "C")
        .build();

    let out = propagate(
        &graph,
        "A",
        sched("2025-01-01T08:00", "2025-01-01T10:00"),
        sched("2025-01-01T08:00", "2025-01-01T11:00"),
    )
    .unwrap();

    assert_eq!(schedule(&out.graph, "C"), sched("2025-01-01T13:00", "2025-01-01T15:00"));
    assert_eq!(schedule(&out.graph, "B"), schedule(&graph, "B"));
}

#[test]
fn diamond_dependent_is_rescheduled_once() {
    init_tracing();

    let graph = GraphBuilder::new()
        .task("A", "2025-01-01T08:00", "2025-01-01T10:00")
        .task("B", "2025-01-01T11:00", "2025-01-01T12:00")
        .task("C", "2025-01-01T11:00", "2025-01-01T13:00")
        .task("D", "2025-01-01T14:00", "2025-01-01T15:00")
        .fs("ab", "A", "B")
        .fs("ac", "A", "C")
        .fs("bd", "B", "D")
        .fs("cd", "C", "D")
        .build();

    let out = propagate(
        &graph,
        "A",
        sched("2025-01-01T08:00", "2025-01-01T10:00"),
        sched("2025-01-01T09:00", "2025-01-01T11:00"),
    )
    .unwrap();

    assert_eq!(schedule(&out.graph, "D"), sched("2025-01-01T15:00", "2025-01-01T16:00"));
    let d_moves = out.report.rescheduled.iter().filter(|r| r.task == "D").count();
    assert_eq!(d_moves, 1);
}

#[test]
fn dangling_links_are_skipped_with_a_warning() {
    init_tracing();

    let graph = GraphBuilder::new()
        .task("A", "2025-01-01T08:00", "2025-01-01T10:00")
        .task("B", "2025-01-01T11:00", "2025-01-01T13:00")
        .link_unset("ghost", "A", "missing", LinkType::FinishToStart)
        .fs("l1", "A", "B")
        .build();

    let out = propagate(
        &graph,
        "A",
        sched("2025-01-01T08:00", "2025-01-01T10:00"),
        sched("2025-01-01T08:00", "2025-01-01T12:00"),
    )
    .unwrap();

    assert_eq!(schedule(&out.graph, "B"), sched("2025-01-01T13:00", "2025-01-01T15:00"));
    assert_eq!(
        out.report.warnings,
        vec![PropagationWarning::DanglingLink {
            link: "ghost".to_string(),
            task: "missing".to_string(),
        }]
    );
    // The dangling link is left in place.
    assert!(out.graph.get_link("ghost").is_some());
}

#[test]
fn invalid_new_schedule_is_rejected() {
    init_tracing();

    let graph = GraphBuilder::new()
        .task("A", "2025-01-01T08:00", "2025-01-01T10:00")
        .task("B", "2025-01-01T11:00", "2025-01-01T13:00")
        .fs("l1", "A", "B")
        .build();

    for end in ["2025-01-01T08:00", "2025-01-01T07:00"] {
        let err = propagate(
            &graph,
            "A",
            sched("2025-01-01T08:00", "2025-01-01T10:00"),
            sched("2025-01-01T08:00", end),
        )
        .unwrap_err();
        assert!(matches!(err, GanttError::InvalidSchedule { ref task, .. } if task == "A"), "{err}");
    }
}

#[test]
fn unknown_task_is_rejected() {
    init_tracing();

    let graph = GraphBuilder::new()
        .task("A", "2025-01-01T08:00", "2025-01-01T10:00")
        .build();

    let err = propagate(
        &graph,
        "nope",
        sched("2025-01-01T08:00", "2025-01-01T10:00"),
        sched("2025-01-01T08:00", "2025-01-01T12:00"),
    )
    .unwrap_err();
    assert!(matches!(err, GanttError::TaskNotFound(ref id) if id == "nope"));
}

#[test]
fn apply_edit_keeps_other_fields_and_propagates() {
    init_tracing();

    let graph = GraphBuilder::new()
        .task("A", "2025-01-01T08:00", "2025-01-01T10:00")
        .task("B", "2025-01-01T11:00", "2025-01-01T13:00")
        .fs("l1", "A", "B")
        .build();

    let mut edited = graph.get_task("A").unwrap().clone();
    edited.text = "Design review".to_string();
    edited.set_progress(0.5);
    edited.schedule = sched("2025-01-01T09:00", "2025-01-01T11:00");

    let out = apply_edit(&graph, edited).unwrap();

    let a = out.graph.get_task("A").unwrap();
    assert_eq!(a.text, "Design review");
    assert_eq!(a.progress, 0.5);
    assert_eq!(schedule(&out.graph, "B"), sched("2025-01-01T12:00", "2025-01-01T14:00"));
}
