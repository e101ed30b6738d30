//! Append-only CSV log of model interactions.
//!
//! Each question answered by the model becomes one row:
//!
//! ```text
//! timestamp,user_input,predicted_sql,sql_valid,source,notes
//! 2025-06-01 12:30:00,Показать всех сотрудников,SELECT * FROM Сотрудники;,True,interactive,
//! ```
//!
//! The header is written only when the file is new or empty, so the same log
//! accumulates rows across runs. Rows are never rewritten.

use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf}
};

use chrono::Local;
use serde::Serialize;

use crate::error::{AppResult, dataset_error, file_write_error};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const HEADER: [&str; 6] = [
    "timestamp",
    "user_input",
    "predicted_sql",
    "sql_valid",
    "source",
    "notes"
];

/// One logged interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionRecord {
    pub user_input:    String,
    pub predicted_sql: String,
    /// `None` when the statement was not checked
    pub sql_valid:     Option<bool>,
    /// Where the request came from: "inference", "interactive", "batch_eval", ...
    pub source:        String,
    pub notes:         String
}

impl InteractionRecord {
    pub fn new(user_input: impl Into<String>, predicted_sql: impl Into<String>) -> Self {
        Self {
            user_input:    user_input.into(),
            predicted_sql: predicted_sql.into(),
            sql_valid:     None,
            source:        String::from("inference"),
            notes:         String::new()
        }
    }

    pub fn with_validity(mut self, valid: bool) -> Self {
        self.sql_valid = Some(valid);
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }
}

#[derive(Serialize)]
struct LogRow<'a> {
    timestamp:     String,
    user_input:    &'a str,
    predicted_sql: &'a str,
    sql_valid:     &'static str,
    source:        &'a str,
    notes:         &'a str
}

impl<'a> LogRow<'a> {
    fn new(record: &'a InteractionRecord, timestamp: String) -> Self {
        Self {
            timestamp,
            user_input: record.user_input.trim(),
            predicted_sql: record.predicted_sql.trim(),
            sql_valid: match record.sql_valid {
                Some(true) => "True",
                Some(false) => "False",
                None => ""
            },
            source: &record.source,
            notes: &record.notes
        }
    }
}

/// Handle to an interaction log file.
#[derive(Debug, Clone)]
pub struct InteractionLog {
    path: PathBuf
}

impl InteractionLog {
    /// Open the log, creating it with a header row when missing or empty.
    pub fn open(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        let name = path.display().to_string();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| file_write_error(&name, e))?;
        }
        let is_empty = fs::metadata(&path).map(|m| m.len() == 0).unwrap_or(true);
        if is_empty {
            let mut writer = csv::Writer::from_path(&path).map_err(|e| dataset_error(&name, e))?;
            writer
                .write_record(HEADER)
                .map_err(|e| dataset_error(&name, e))?;
            writer.flush().map_err(|e| file_write_error(&name, e))?;
            tracing::debug!("Created interaction log: '{}'", name);
        }
        Ok(Self {
            path
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record stamped with the current local time.
    pub fn append(&self, record: &InteractionRecord) -> AppResult<()> {
        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        self.append_at(record, timestamp)
    }

    fn append_at(&self, record: &InteractionRecord, timestamp: String) -> AppResult<()> {
        let name = self.path.display().to_string();
        let file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| file_write_error(&name, e))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer
            .serialize(LogRow::new(record, timestamp))
            .map_err(|e| dataset_error(&name, e))?;
        writer.flush().map_err(|e| file_write_error(&name, e))?;
        tracing::debug!("Logged interaction from '{}'", record.source);
        Ok(())
    }
}
