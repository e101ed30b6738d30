use std::{collections::HashMap, fs};

use indicatif::ProgressBar;
use nl2sql_eval::{
    app::{CommandOutput, ask_question, create_output_options, generate_results, run_compare},
    cli::Format,
    dataset::TrainingExample,
    error::{AppResult, llm_api_error},
    interaction_log::InteractionLog,
    llm::SqlGenerator,
    syntax::SqlDialect
};
use tempfile::tempdir;

/// Answers from a fixed table; unknown questions fail.
struct StubGenerator {
    answers: HashMap<&'static str, &'static str>
}

impl StubGenerator {
    fn new(answers: &[(&'static str, &'static str)]) -> Self {
        Self {
            answers: answers.iter().copied().collect()
        }
    }
}

impl SqlGenerator for StubGenerator {
    async fn generate(&self, input: &str) -> AppResult<String> {
        self.answers
            .get(input)
            .map(|sql| sql.to_string())
            .ok_or_else(|| llm_api_error(format!("no answer for '{}'", input)))
    }
}

fn example(text: &str, sql: &str) -> TrainingExample {
    TrainingExample {
        text: text.to_string(),
        sql:  sql.to_string()
    }
}

fn compare(expected: &str, predicted: &str) -> CommandOutput {
    run_compare(expected, predicted, &create_output_options(Format::Text, true, false))
}

#[test]
fn test_compare_exit_codes() {
    assert_eq!(compare("SELECT a, b FROM t;", "select b, a from t").exit_code, 0);
    assert_eq!(compare("SELECT * FROM t", "SELECT * FROM s").exit_code, 1);
}

#[test]
fn test_compare_json_output() {
    let result = run_compare(
        "SELECT * FROM t WHERE x = 1 AND y = 2",
        "SELECT * FROM t WHERE y = 2 AND x = 1",
        &create_output_options(Format::Json, true, false)
    );
    let value: serde_json::Value = serde_json::from_str(&result.output).unwrap();
    assert_eq!(value["kind"], "where_reordered");
    assert_eq!(value["expected_canonical"], value["predicted_canonical"]);
}

#[tokio::test]
async fn test_generate_results_records_failures() {
    let generator = StubGenerator::new(&[("Показать всех", "SELECT * FROM Сотрудники;")]);
    let examples = vec![
        example("Показать всех", "SELECT * FROM Сотрудники;"),
        example("Неизвестный вопрос", "SELECT 1;")
    ];
    let progress = ProgressBar::hidden();

    let (rows, failed) = generate_results(&generator, &examples, &progress).await;

    assert_eq!(failed, 1);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].predicted_sql, "SELECT * FROM Сотрудники;");
    assert_eq!(rows[1].input, "Неизвестный вопрос");
    assert_eq!(rows[1].expected_sql, "SELECT 1;");
    assert!(rows[1].predicted_sql.is_empty());
    assert_eq!(progress.position(), 2);
}

#[tokio::test]
async fn test_ask_question_logs_valid_sql() {
    let dir = tempdir().unwrap();
    let log = InteractionLog::open(dir.path().join("log.csv")).unwrap();
    let generator = StubGenerator::new(&[("Все сотрудники", "SELECT * FROM Сотрудники;")]);

    let result = ask_question(&generator, "Все сотрудники", SqlDialect::Generic, Some(&log))
        .await
        .unwrap();

    assert!(result.is_valid());
    assert_eq!(result.sql, "SELECT * FROM Сотрудники;");
    let content = fs::read_to_string(log.path()).unwrap();
    let last = content.lines().last().unwrap();
    assert!(last.ends_with(",Все сотрудники,SELECT * FROM Сотрудники;,True,interactive,"));
}

#[tokio::test]
async fn test_ask_question_logs_parse_error() {
    let dir = tempdir().unwrap();
    let log = InteractionLog::open(dir.path().join("log.csv")).unwrap();
    let generator = StubGenerator::new(&[("Сломанный", "SELEC * FROM t")]);

    let result = ask_question(&generator, "Сломанный", SqlDialect::Generic, Some(&log))
        .await
        .unwrap();

    assert!(!result.is_valid());
    assert!(!result.error.as_deref().unwrap_or_default().is_empty());
    let mut reader = csv::Reader::from_path(log.path()).unwrap();
    let row = reader.records().next().unwrap().unwrap();
    assert_eq!(&row[3], "False");
    assert_eq!(&row[5], result.error.as_deref().unwrap());
}

#[tokio::test]
async fn test_ask_question_without_log() {
    let generator = StubGenerator::new(&[("q", "SELECT 1")]);
    let result = ask_question(&generator, "q", SqlDialect::Generic, None)
        .await
        .unwrap();
    assert!(result.is_valid());
}

#[tokio::test]
async fn test_ask_question_generation_error() {
    let dir = tempdir().unwrap();
    let log = InteractionLog::open(dir.path().join("log.csv")).unwrap();
    let generator = StubGenerator::new(&[]);

    assert!(
        ask_question(&generator, "q", SqlDialect::Generic, Some(&log))
            .await
            .is_err()
    );
    let content = fs::read_to_string(log.path()).unwrap();
    assert_eq!(content.lines().count(), 1);
}
