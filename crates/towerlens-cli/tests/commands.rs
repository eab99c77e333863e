//! End-to-end runs of the report commands against a temporary store

mod common;

use common::{code, stderr, stdout, Workspace};
use serde_json::Value;

const NORTH: &str = "North/Structure Work Tracker (12-05-2025).xlsx";

#[test]
fn files_lists_store_contents() {
    let ws = Workspace::new();
    ws.put(NORTH, &common::north_tracker());
    ws.put("North/readme.txt", b"ignored");

    let output = ws.run(&["files"]);
    assert_eq!(code(&output), 0);
    let out = stdout(&output);
    assert!(out.starts_with("Tracker Files\n"));
    assert!(out.contains("North/Structure Work Tracker (12-05-2025).xlsx  North"));
    assert!(out.contains("structure tracker"));
    assert!(!out.contains("readme"));
}

#[test]
fn upload_then_list() {
    let ws = Workspace::new();
    std::fs::write(ws.path("tracker.xlsx"), common::north_tracker()).unwrap();

    let output = ws.run(&[
        "upload",
        "tracker.xlsx",
        "--folder",
        "North",
        "--name",
        "Structure Work Tracker (12-05-2025).xlsx",
    ]);
    assert_eq!(code(&output), 0, "{}", stderr(&output));
    assert!(ws.bucket().join(NORTH).is_file());

    let output = ws.run(&["files", "--prefix", "North", "--month", "05-2025"]);
    assert!(stdout(&output).contains(NORTH));
}

#[test]
fn upload_rejects_bad_names() {
    let ws = Workspace::new();
    std::fs::write(ws.path("tracker.xlsx"), b"PK").unwrap();
    let output = ws.run(&["upload", "tracker.xlsx", "--folder", "North"]);
    assert_eq!(code(&output), 1);
    assert!(stderr(&output).contains("error[E003]"));
    assert!(!ws.bucket().join("North").exists());
}

#[test]
fn structure_text_report() {
    let ws = Workspace::new();
    ws.put(NORTH, &common::north_tracker());
    let output = ws.run(&["structure", "--project", "north"]);
    let out = stdout(&output);
    assert!(out.starts_with("NORTH Structure (2025-06-20)\n"));
    assert!(out.contains("TOWER A"));
    assert!(out.contains("75%"));
}

#[test]
fn structure_json_document() {
    let ws = Workspace::new();
    ws.put(NORTH, &common::north_tracker());
    let output = ws.run(&["structure", "--format", "json"]);
    assert_eq!(code(&output), 0);

    let doc: Value = serde_json::from_str(&stdout(&output)).unwrap();
    let table = &doc["report"]["sheets"][0]["tables"][0];
    assert_eq!(table["title"], "NORTH Structure (2025-06-20)");
    assert_eq!(table["columns"][4], "Structure");
    assert_eq!(table["rows"][0][0]["Text"], "TOWER A");

    let codes: Vec<&str> = doc["diagnostics"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["code"].as_str().unwrap())
        .collect();
    assert_eq!(codes, ["W001", "W001", "I001"]);
    assert!(stderr(&output).is_empty());
}

#[test]
fn written_reports_combine() {
    let ws = Workspace::new();
    ws.put(NORTH, &common::north_tracker());

    let output = ws.run(&["structure", "--project", "NORTH", "-o", "structure.xlsx"]);
    assert_eq!(code(&output), 0, "{}", stderr(&output));
    assert!(stderr(&output).contains("info[I003]: wrote structure.xlsx"));
    assert!(ws.path("structure.xlsx").is_file());

    let output = ws.run(&[
        "combine",
        "Towers=structure.xlsx",
        "structure.xlsx",
        "-o",
        "combined.xlsx",
    ]);
    assert_eq!(code(&output), 0, "{}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("== Towers =="));
    assert!(out.contains("== Structure =="));
    assert!(out.contains("NORTH Structure (2025-06-20)"));
    assert!(common::exists(&ws.path("combined.xlsx")));
}

#[test]
fn combine_reports_unreadable_inputs() {
    let ws = Workspace::new();
    let output = ws.run(&["combine", "missing.xlsx"]);
    assert_eq!(code(&output), 1);
    assert!(stderr(&output).contains("error[E002]"));
}

#[test]
fn output_failure_is_an_error() {
    let ws = Workspace::new();
    ws.put(NORTH, &common::north_tracker());
    let output = ws.run(&["structure", "--project", "NORTH", "-o", "no/such/dir/out.xlsx"]);
    assert_eq!(code(&output), 1);
    assert!(stderr(&output).contains("error[E005]"));
}

#[test]
fn schedule_rejects_nested_store_back_folder() {
    let ws = Workspace::new();
    let output = ws.run(&["schedule", "--year", "2025", "--store-back", "Schedule/2025"]);
    assert_eq!(code(&output), 1);
    assert!(stderr(&output).contains("error[E006]"));
    assert!(!ws.bucket().join("Schedule").exists());
}
