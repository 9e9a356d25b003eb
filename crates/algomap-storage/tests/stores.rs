//! Backend behavior shared by the JSONL and SQLite stores.

use std::collections::BTreeSet;
use std::fs::OpenOptions;
use std::io::Write;

use algomap_core::{Concept, Meta, QueueKind, Step, Translation};
use algomap_storage::{
    ActionCache, AdaptiveMemory, JsonlStore, MatchKind, MemoryRecord, MemoryStore, SqliteStore,
};

fn translation(desc: &str) -> Translation {
    let kind = Concept::Queue(QueueKind::Circular);
    Translation::new(vec![Step::new("enqueue", desc)], Meta::new(kind))
}

fn actions(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

// ---------------------------------------------------------------------------
// JSONL
// ---------------------------------------------------------------------------

#[test]
fn jsonl_appends_one_line_per_record() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonlStore::open(dir.path()).unwrap();
    let kind = Concept::Queue(QueueKind::Circular);
    let memory = AdaptiveMemory::new(&store);
    memory.store(&kind, "q.enqueue(1)", &translation("a"), 4).unwrap();
    memory.store(&kind, "q.enqueue(2)", &translation("b"), 5).unwrap();

    let text = std::fs::read_to_string(dir.path().join("queue-circular.jsonl")).unwrap();
    assert_eq!(text.lines().count(), 2);
    assert_eq!(store.records("queue-circular").unwrap().len(), 2);
}

#[test]
fn jsonl_skips_corrupt_lines() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonlStore::open(dir.path()).unwrap();
    let record = MemoryRecord::new(&Concept::Stack, "s.push(1)", &translation("ok"), 5);
    store.append(&record).unwrap();

    let mut file = OpenOptions::new()
        .append(true)
        .open(store.log_path("stack"))
        .unwrap();
    writeln!(file, "{{not json").unwrap();
    writeln!(file).unwrap();

    store.append(&record).unwrap();
    assert_eq!(store.records("stack").unwrap().len(), 2);
}

#[test]
fn jsonl_exact_lookup_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonlStore::open(dir.path()).unwrap();
    let memory = AdaptiveMemory::new(&store);
    let code = "q = CircularQueue(3)\nq.enqueue(1)";
    let kind = Concept::Queue(QueueKind::Circular);
    memory.store(&kind, code, &translation("cached"), 5).unwrap();

    let reopened = JsonlStore::open(dir.path()).unwrap();
    let hit = AdaptiveMemory::new(&reopened)
        .lookup(&kind, code)
        .unwrap()
        .unwrap();
    assert_eq!(hit.kind, MatchKind::Exact);
    assert_eq!(hit.record.translation(), translation("cached"));
}

#[test]
fn jsonl_action_cache_persists() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = JsonlStore::open(dir.path()).unwrap();
        let added = store.learn("stack", &actions(&["push", "pop_empty"])).unwrap();
        assert_eq!(added.len(), 2);
    }
    let store = JsonlStore::open(dir.path()).unwrap();
    assert_eq!(store.learned("stack").unwrap(), actions(&["pop_empty", "push"]));
    assert!(store.learned("queue-linear").unwrap().is_empty());
    let raw = std::fs::read_to_string(dir.path().join("ir_actions.json")).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed["stack"], serde_json::json!(["pop_empty", "push"]));
}

#[test]
fn missing_files_read_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonlStore::open(dir.path().join("nested")).unwrap();
    assert!(store.records("tree-bst").unwrap().is_empty());
    assert!(store.learned("tree-bst").unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// SQLite
// ---------------------------------------------------------------------------

#[test]
fn sqlite_file_database_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memory.db");
    let path = path.to_str().unwrap();
    let kind = Concept::Stack;
    {
        let store = SqliteStore::new(path).unwrap();
        AdaptiveMemory::new(&store)
            .store(&kind, "s.push(9)", &translation("persisted"), 5)
            .unwrap();
    }
    let store = SqliteStore::new(path).unwrap();
    let hit = AdaptiveMemory::new(&store)
        .lookup_exact(&kind, "s.push(9)")
        .unwrap()
        .unwrap();
    assert_eq!(hit.record.steps[0].description, "persisted");
}

#[test]
fn sqlite_fuzzy_lookup_uses_rating_threshold() {
    let store = SqliteStore::in_memory().unwrap();
    let memory = AdaptiveMemory::new(&store).with_min_rating(4);
    memory.store(&Concept::Stack, "s.push(1)", &translation("three"), 3).unwrap();
    assert!(memory.lookup(&Concept::Stack, "s.push(2)").unwrap().is_none());
    memory.store(&Concept::Stack, "s.push(1)", &translation("four"), 4).unwrap();
    let hit = memory.lookup(&Concept::Stack, "s.push(2)").unwrap().unwrap();
    assert_eq!(hit.record.steps[0].description, "four");
}
