use nl2sql_eval::{
    dataset::EvaluationRow,
    evaluation::{HISTOGRAM_BINS, evaluate, score_row},
    matcher::MatchKind,
    syntax::SqlDialect
};

fn sample_rows() -> Vec<EvaluationRow> {
    vec![
        EvaluationRow::new(
            "Показать всех сотрудников",
            "SELECT * FROM Сотрудники;",
            "select * from сотрудники;"
        ),
        EvaluationRow::new(
            "ФИО и должность",
            "SELECT ФИО, должность FROM Сотрудники;",
            "SELECT должность, ФИО FROM Сотрудники;"
        ),
        EvaluationRow::new(
            "Сотрудники отдела 5 с окладом 100",
            "SELECT * FROM Сотрудники WHERE отдел = 5 AND оклад = 100;",
            "SELECT * FROM Сотрудники WHERE оклад = 100 AND отдел = 5;"
        ),
        EvaluationRow::new(
            "Количество",
            "SELECT COUNT(*) FROM Сотрудники;",
            "SELEC COUNT(*) FROM"
        )
    ]
}

#[test]
fn test_evaluate_counts_each_kind() {
    let report = evaluate(&sample_rows(), SqlDialect::Generic);

    assert_eq!(report.total, 4);
    assert_eq!(report.count(MatchKind::Exact), 1);
    assert_eq!(report.count(MatchKind::SelectReordered), 1);
    assert_eq!(report.count(MatchKind::WhereReordered), 1);
    assert_eq!(report.count(MatchKind::Mismatch), 1);
    assert_eq!(report.soft_matches(), 3);
}

#[test]
fn test_evaluate_accuracies() {
    let report = evaluate(&sample_rows(), SqlDialect::Generic);

    assert_eq!(report.exact_accuracy(), 25.0);
    assert_eq!(report.soft_accuracy(), 75.0);
    assert_eq!(report.strict_matches, 1);
    assert_eq!(report.strict_accuracy(), 25.0);
}

#[test]
fn test_evaluate_validity() {
    let report = evaluate(&sample_rows(), SqlDialect::Generic);

    assert_eq!(report.valid_sql, 3);
    assert_eq!(report.validity_rate(), 75.0);
    assert!(!report.rows[3].valid_sql);
}

#[test]
fn test_rows_keep_input_order() {
    let report = evaluate(&sample_rows(), SqlDialect::Generic);
    let indices: Vec<usize> = report.rows.iter().map(|r| r.index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3]);
    assert_eq!(report.rows[1].input, "ФИО и должность");
}

#[test]
fn test_mismatches() {
    let report = evaluate(&sample_rows(), SqlDialect::Generic);
    let mismatches: Vec<usize> = report.mismatches().map(|r| r.index).collect();
    assert_eq!(mismatches, vec![3]);
}

#[test]
fn test_histogram_counts_every_row() {
    let report = evaluate(&sample_rows(), SqlDialect::Generic);
    assert_eq!(report.bleu_histogram.len(), HISTOGRAM_BINS);
    assert_eq!(report.bleu_histogram.iter().sum::<usize>(), 4);
    assert!(report.bleu_histogram[HISTOGRAM_BINS - 1] >= 1);
}

#[test]
fn test_passes_threshold() {
    let report = evaluate(&sample_rows(), SqlDialect::Generic);
    assert!(report.passes(75.0));
    assert!(!report.passes(75.1));
}

#[test]
fn test_empty_table() {
    let report = evaluate(&[], SqlDialect::Generic);
    assert_eq!(report.total, 0);
    assert_eq!(report.soft_accuracy(), 0.0);
    assert_eq!(report.average_bleu(), 0.0);
    assert!(report.passes(0.0));
}

#[test]
fn test_score_row_empty_prediction() {
    let row = EvaluationRow::new("q", "SELECT * FROM t", "");
    let result = score_row(7, &row, SqlDialect::Generic);

    assert_eq!(result.index, 7);
    assert_eq!(result.kind, MatchKind::Mismatch);
    assert!(!result.strict);
    assert_eq!(result.bleu, 0.0);
    assert!(!result.valid_sql);
}

#[test]
fn test_report_serializes_kinds_in_order() {
    let report = evaluate(&sample_rows(), SqlDialect::Generic);
    let json = serde_json::to_value(&report).unwrap();
    let kinds = json["kinds"].as_object().unwrap();
    assert_eq!(kinds["exact"], 1);
    assert_eq!(kinds["mismatch"], 1);
    assert_eq!(json["rows"][1]["kind"], "select_reordered");
}
