//! CSV datasets consumed and produced by the evaluation commands.
//!
//! Two tables are involved:
//!
//! | Table | Columns |
//! |-------|---------|
//! | Training dataset | `text`, `sql` |
//! | Evaluation results | `Input`, `Expected SQL`, `Predicted SQL` |
//!
//! The training dataset may carry extra columns; they are ignored. Rows with
//! a blank question or statement are dropped on load.

use std::{fs::File, io, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::{AppResult, dataset_error, file_read_error, file_write_error};

/// One row of the evaluation results table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationRow {
    #[serde(rename = "Input")]
    pub input:         String,
    #[serde(rename = "Expected SQL")]
    pub expected_sql:  String,
    #[serde(rename = "Predicted SQL")]
    pub predicted_sql: String
}

impl EvaluationRow {
    pub fn new(
        input: impl Into<String>,
        expected_sql: impl Into<String>,
        predicted_sql: impl Into<String>
    ) -> Self {
        Self {
            input:         input.into(),
            expected_sql:  expected_sql.into(),
            predicted_sql: predicted_sql.into()
        }
    }
}

/// One question with its reference statement.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrainingExample {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub sql:  String
}

/// Read an evaluation results table from a file.
pub fn read_evaluation_rows(path: &Path) -> AppResult<Vec<EvaluationRow>> {
    let name = path.display().to_string();
    let file = File::open(path).map_err(|e| file_read_error(&name, e))?;
    read_evaluation_rows_from_reader(file, &name)
}

/// Read an evaluation results table; `name` labels errors.
pub fn read_evaluation_rows_from_reader<R: io::Read>(
    reader: R,
    name: &str
) -> AppResult<Vec<EvaluationRow>> {
    csv::Reader::from_reader(reader)
        .deserialize::<EvaluationRow>()
        .map(|record| record.map_err(|e| dataset_error(name, e)))
        .collect()
}

/// Write an evaluation results table, replacing the file.
pub fn write_evaluation_rows(path: &Path, rows: &[EvaluationRow]) -> AppResult<()> {
    let name = path.display().to_string();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| file_write_error(&name, e))?;
    }
    let file = File::create(path).map_err(|e| file_write_error(&name, e))?;
    write_evaluation_rows_to_writer(file, rows, &name)
}

/// Write an evaluation results table with its header row.
pub fn write_evaluation_rows_to_writer<W: io::Write>(
    writer: W,
    rows: &[EvaluationRow],
    name: &str
) -> AppResult<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for row in rows {
        writer.serialize(row).map_err(|e| dataset_error(name, e))?;
    }
    writer
        .flush()
        .map_err(|e| file_write_error(name, e))
}

/// Read a training dataset from a file.
pub fn read_training_examples(path: &Path) -> AppResult<Vec<TrainingExample>> {
    let name = path.display().to_string();
    let file = File::open(path).map_err(|e| file_read_error(&name, e))?;
    read_training_examples_from_reader(file, &name)
}

/// Read a training dataset, dropping rows with a blank question or statement.
pub fn read_training_examples_from_reader<R: io::Read>(
    reader: R,
    name: &str
) -> AppResult<Vec<TrainingExample>> {
    let mut examples = Vec::new();
    for record in csv::Reader::from_reader(reader).deserialize::<TrainingExample>() {
        let example: TrainingExample = record.map_err(|e| dataset_error(name, e))?;
        if example.text.trim().is_empty() || example.sql.trim().is_empty() {
            tracing::debug!("Skipping incomplete example in '{}'", name);
            continue;
        }
        examples.push(example);
    }
    Ok(examples)
}
