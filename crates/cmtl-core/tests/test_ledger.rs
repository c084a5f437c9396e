//! Integration tests for the result ledger.

use cmtl_core::{ExecutionRecord, RecordKind, ResultLedger};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

#[test]
fn test_ledger_round_trips_records() {
    let temp_dir = TempDir::new().unwrap();
    let ledger = ResultLedger::open(temp_dir.path().join("results.json"));

    let record = ExecutionRecord::new(RecordKind::Tool, "Nmap")
        .with_success(true)
        .with_exit_code(Some(0))
        .with_command("nmap -sV 10.0.0.1")
        .with_target("10.0.0.1")
        .with_output("Nmap done");
    ledger.append(record.clone()).unwrap();

    let reopened = ResultLedger::open(temp_dir.path().join("results.json"));
    assert_eq!(reopened.load_all(), vec![record]);
}

#[test]
fn test_ledger_heals_after_corruption() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("results.json");
    fs::write(&path, "[{\"tool\": \"half").unwrap();

    let ledger = ResultLedger::open(&path);
    ledger
        .append(ExecutionRecord::new(RecordKind::Tool, "after"))
        .unwrap();

    let records = ledger.load_all();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].tool, "after");

    let backups = fs::read_dir(temp_dir.path())
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(".bak"))
        .count();
    assert_eq!(backups, 1);
}

#[test]
fn test_ledger_keeps_valid_records_next_to_a_bad_one() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("results.json");
    let seeded = serde_json::json!([
        {"kind": "tool", "tool": "a", "success": true},
        {"kind": "tool", "tool": "b", "success": false},
        {"kind": "tool", "tool": "c", "exit_code": "zero"}
    ]);
    fs::write(&path, seeded.to_string()).unwrap();

    let ledger = ResultLedger::open(&path);
    ledger
        .append(ExecutionRecord::new(RecordKind::Tool, "new"))
        .unwrap();

    let names: Vec<String> = ledger.load_all().into_iter().map(|r| r.tool).collect();
    assert_eq!(names, vec!["a", "b", "new"]);

    let backups: Vec<_> = fs::read_dir(temp_dir.path())
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(".bak"))
        .collect();
    assert_eq!(backups.len(), 1);
    let saved = fs::read_to_string(backups[0].path()).unwrap();
    assert!(saved.contains("\"zero\""));
}

#[tokio::test]
async fn test_ledger_shared_across_tasks() {
    let temp_dir = TempDir::new().unwrap();
    let ledger = Arc::new(ResultLedger::open(temp_dir.path().join("results.json")));

    let tasks: Vec<_> = (0..4)
        .map(|i| {
            let ledger = Arc::clone(&ledger);
            tokio::task::spawn_blocking(move || {
                for j in 0..10 {
                    ledger
                        .append(ExecutionRecord::new(RecordKind::Tool, format!("{i}-{j}")))
                        .unwrap();
                }
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    let raw = fs::read_to_string(ledger.path()).unwrap();
    let parsed: Vec<serde_json::Value> = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed.len(), 40);
}
