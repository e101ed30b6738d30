use std::fs;

use nl2sql_eval::interaction_log::{InteractionLog, InteractionRecord};
use tempfile::tempdir;

const HEADER: &str = "timestamp,user_input,predicted_sql,sql_valid,source,notes";

#[test]
fn test_open_creates_header() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("logs").join("interaction_log.csv");

    let log = InteractionLog::open(&path).unwrap();

    assert_eq!(log.path(), path.as_path());
    assert_eq!(fs::read_to_string(&path).unwrap(), format!("{}\n", HEADER));
}

#[test]
fn test_header_written_once_across_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("interaction_log.csv");

    let log = InteractionLog::open(&path).unwrap();
    log.append(&InteractionRecord::new("первый", "SELECT 1"))
        .unwrap();
    let log = InteractionLog::open(&path).unwrap();
    log.append(&InteractionRecord::new("второй", "SELECT 2"))
        .unwrap();

    let content = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines.iter().filter(|l| **l == HEADER).count(), 1);
    assert!(lines[1].contains(",первый,SELECT 1,,inference,"));
    assert!(lines[2].contains(",второй,SELECT 2,,inference,"));
}

#[test]
fn test_open_existing_empty_file_writes_header() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("interaction_log.csv");
    fs::write(&path, "").unwrap();

    InteractionLog::open(&path).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), format!("{}\n", HEADER));
}

#[test]
fn test_append_quotes_commas_and_marks_validity() {
    let dir = tempdir().unwrap();
    let log = InteractionLog::open(dir.path().join("log.csv")).unwrap();
    let record = InteractionRecord::new("ФИО, должность", "SELECT ФИО, должность FROM Сотрудники;")
        .with_validity(true)
        .with_source("interactive");

    log.append(&record).unwrap();

    let mut reader = csv::Reader::from_path(log.path()).unwrap();
    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(&rows[0][1], "ФИО, должность");
    assert_eq!(&rows[0][2], "SELECT ФИО, должность FROM Сотрудники;");
    assert_eq!(&rows[0][3], "True");
    assert_eq!(&rows[0][4], "interactive");
    assert_eq!(rows[0][0].len(), "2025-01-01 00:00:00".len());
}
