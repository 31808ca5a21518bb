// tests/file_store.rs

mod common;
use crate::common::{GraphBuilder, init_tracing, sched, schedule};

use std::fs;

use ganttline::errors::GanttError;
use ganttline::model::GanttDocument;
use ganttline::model::wire::normalize;
use ganttline::store::{FileStore, ScheduleStore};
use serde_json::json;
use tempfile::tempdir;

fn sample() -> GanttDocument {
    let graph = GraphBuilder::new()
        .task("a", "2025-01-01T08:00", "2025-01-01T10:00")
        .task("b", "2025-01-01T11:00", "2025-01-01T12:00")
        .fs("l1", "a", "b")
        .build();
    GanttDocument::from_graph(&graph)
}

#[tokio::test]
async fn missing_group_loads_as_empty() {
    init_tracing();

    let dir = tempdir().unwrap();
    let store = FileStore::new(dir.path().join("not-yet-created"));

    let value = store.load("team").await.unwrap();
    assert_eq!(value, json!({"tasks": [], "links": []}));
}

#[tokio::test]
async fn saved_document_loads_back() {
    init_tracing();

    let dir = tempdir().unwrap();
    let store = FileStore::new(dir.path().join("nested").join("store"));

    store.save("team", &sample()).await.unwrap();

    let path = store.path_for("team");
    assert!(path.exists());
    assert!(!path.with_extension("json.tmp").exists());

    let graph = normalize(&store.load("team").await.unwrap()).graph;
    assert_eq!(schedule(&graph, "b"), sched("2025-01-01T11:00", "2025-01-01T12:00"));
    assert_eq!(graph.get_link("l1").unwrap().gap(), Some(chrono::TimeDelta::hours(1)));

    // A second save replaces the first.
    store.save("team", &GanttDocument::default()).await.unwrap();
    let graph = normalize(&store.load("team").await.unwrap()).graph;
    assert!(graph.is_empty());
}

#[test]
fn group_names_are_escaped_into_file_names() {
    let store = FileStore::new("/data");

    assert_eq!(store.path_for("team-a1"), std::path::PathBuf::from("/data/team-a1.json"));
    assert_eq!(store.path_for("team_1"), std::path::PathBuf::from("/data/team_5f1.json"));
    assert_eq!(store.path_for("team.1"), std::path::PathBuf::from("/data/team_2e1.json"));
    assert_eq!(
        store.path_for("../etc/passwd"),
        std::path::PathBuf::from("/data/_2e_2e_2fetc_2fpasswd.json")
    );
    assert_eq!(store.path_for("é"), std::path::PathBuf::from("/data/_c3_a9.json"));
    assert_eq!(store.path_for(""), std::path::PathBuf::from("/data/_.json"));
    assert_eq!(store.dir(), std::path::Path::new("/data"));
}

#[test]
fn similar_group_names_get_distinct_files() {
    let store = FileStore::new("/data");
    let groups = ["team.1", "team_1", "team_2e1", "a/b", "a_b", "a_2fb", "", "_"];

    let paths: std::collections::HashSet<std::path::PathBuf> =
        groups.iter().map(|g| store.path_for(g)).collect();
    assert_eq!(paths.len(), groups.len());
}

#[tokio::test]
async fn groups_with_similar_names_do_not_share_a_schedule() {
    init_tracing();

    let dir = tempdir().unwrap();
    let store = FileStore::new(dir.path());

    store.save("team.1", &sample()).await.unwrap();
    assert!(normalize(&store.load("team_1").await.unwrap()).graph.is_empty());

    store.save("team_1", &GanttDocument::default()).await.unwrap();
    store.save("a/b", &sample()).await.unwrap();

    let dotted = normalize(&store.load("team.1").await.unwrap()).graph;
    assert_eq!(dotted.len(), 2);
    assert!(normalize(&store.load("team_1").await.unwrap()).graph.is_empty());
    assert!(normalize(&store.load("a_b").await.unwrap()).graph.is_empty());
    assert_eq!(normalize(&store.load("a/b").await.unwrap()).graph.len(), 2);
}

#[tokio::test]
async fn corrupt_file_is_treated_as_empty() {
    init_tracing();

    let dir = tempdir().unwrap();
    let store = FileStore::new(dir.path());
    fs::write(store.path_for("team"), "{ not json").unwrap();

    let value = store.load("team").await.unwrap();
    assert!(normalize(&value).graph.is_empty());
}

#[tokio::test]
async fn unwritable_directory_reports_a_persist_failure() {
    init_tracing();

    let dir = tempdir().unwrap();
    // A regular file where the store directory should be.
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "").unwrap();
    let store = FileStore::new(&blocker);

    let err = store.save("team", &sample()).await.unwrap_err();
    assert!(matches!(err, GanttError::StorePersistFailure { ref group, .. } if group == "team"));
}
