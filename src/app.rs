//! Application logic for the nl2sql-eval CLI.
//!
//! This module contains the command handlers separated from the main entry
//! point to enable testing. Handlers return the rendered output together with
//! the process exit code; only `main` prints.

use std::{
    fs::read_to_string,
    io::{self, Read},
    path::{Path, PathBuf},
    time::Duration
};

use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    cli::{Dialect, Format, LlmArgs, Provider},
    config::Config,
    dataset::{
        EvaluationRow, TrainingExample, read_evaluation_rows, read_evaluation_rows_from_reader,
        read_training_examples, write_evaluation_rows
    },
    diff::collect_mismatches,
    error::{AppResult, config_error, file_read_error},
    evaluation::evaluate,
    interaction_log::{InteractionLog, InteractionRecord},
    llm::{LlmClient, LlmProvider, SqlGenerator},
    matcher::{canonicalize, classify},
    metrics::bleu,
    output::{
        ComparisonResult, GenerationSummary, OutputFormat, OutputOptions, format_comparison,
        format_diffs, format_generation_summary, format_report
    },
    syntax::{SqlDialect, check_syntax}
};

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Rendered command output and the exit code to report
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub output:    String
}

/// Parameters for the evaluate command
#[derive(Debug, Clone)]
pub struct EvaluateParams {
    pub results:       Option<PathBuf>,
    pub dialect:       Dialect,
    pub fail_under:    Option<f64>,
    pub output_format: Format,
    pub verbose:       bool,
    pub no_color:      bool
}

/// Parameters for the diff command
#[derive(Debug, Clone)]
pub struct DiffParams {
    pub results:       Option<PathBuf>,
    pub limit:         usize,
    pub output_format: Format,
    pub no_color:      bool
}

/// Parameters for the generate command
#[derive(Debug, Clone)]
pub struct GenerateParams {
    pub dataset: Option<PathBuf>,
    pub output:  Option<PathBuf>,
    pub limit:   Option<usize>,
    pub llm:     LlmArgs
}

/// Parameters for the ask command
#[derive(Debug, Clone)]
pub struct AskParams {
    pub question: String,
    pub log:      Option<PathBuf>,
    pub no_log:   bool,
    pub dialect:  Dialect,
    pub llm:      LlmArgs
}

/// Outcome of a single question
#[derive(Debug, Clone)]
pub struct AskResult {
    pub sql:   String,
    /// Parser message when the statement does not parse
    pub error: Option<String>
}

impl AskResult {
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }
}

/// Convert CLI dialect to internal SqlDialect
pub fn convert_dialect(dialect: Dialect) -> SqlDialect {
    match dialect {
        Dialect::Generic => SqlDialect::Generic,
        Dialect::Mysql => SqlDialect::MySQL,
        Dialect::Postgresql => SqlDialect::PostgreSQL,
        Dialect::Sqlite => SqlDialect::SQLite,
        Dialect::Clickhouse => SqlDialect::ClickHouse
    }
}

/// Convert CLI format to internal OutputFormat
pub fn convert_format(format: Format) -> OutputFormat {
    match format {
        Format::Text => OutputFormat::Text,
        Format::Json => OutputFormat::Json,
        Format::Yaml => OutputFormat::Yaml,
        Format::Html => OutputFormat::Html
    }
}

/// Create output options from parameters
pub fn create_output_options(format: Format, no_color: bool, verbose: bool) -> OutputOptions {
    OutputOptions {
        format: convert_format(format),
        colored: !no_color,
        verbose
    }
}

/// Read a results table from file or stdin ("-")
pub fn read_results_input(path: &Path) -> AppResult<Vec<EvaluationRow>> {
    if path.to_str() == Some("-") {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| file_read_error("stdin", e))?;
        read_evaluation_rows_from_reader(buffer.as_bytes(), "stdin")
    } else {
        read_evaluation_rows(path)
    }
}

/// Compare one statement pair; exit code 1 when they do not match
pub fn run_compare(expected: &str, predicted: &str, opts: &OutputOptions) -> CommandOutput {
    let kind = classify(predicted, expected);
    let result = ComparisonResult {
        expected:            expected.to_string(),
        predicted:           predicted.to_string(),
        kind,
        matched:             kind.is_match(),
        expected_canonical:  canonicalize(expected),
        predicted_canonical: canonicalize(predicted),
        bleu:                bleu(expected, predicted)
    };
    CommandOutput {
        exit_code: if result.matched { 0 } else { 1 },
        output:    format_comparison(&result, opts)
    }
}

/// Run the evaluate command
pub fn run_evaluate(params: EvaluateParams, config: &Config) -> AppResult<CommandOutput> {
    let path = params.results.unwrap_or_else(|| config.paths.results.clone());
    let rows = read_results_input(&path)?;
    tracing::info!("Evaluating {} rows from '{}'", rows.len(), path.display());
    let report = evaluate(&rows, convert_dialect(params.dialect));
    let opts = create_output_options(params.output_format, params.no_color, params.verbose);
    let exit_code = match params.fail_under {
        Some(min) if !report.passes(min) => {
            tracing::warn!(
                "Soft accuracy {:.1}% is below the required {:.1}%",
                report.soft_accuracy(),
                min
            );
            1
        }
        _ => 0
    };
    Ok(CommandOutput {
        exit_code,
        output: format_report(&report, &opts)
    })
}

/// Run the diff command
pub fn run_diff(params: DiffParams, config: &Config) -> AppResult<CommandOutput> {
    let path = params.results.unwrap_or_else(|| config.paths.results.clone());
    let rows = read_results_input(&path)?;
    let diffs = collect_mismatches(&rows, params.limit);
    let opts = create_output_options(params.output_format, params.no_color, false);
    Ok(CommandOutput {
        exit_code: 0,
        output:    format_diffs(&diffs, &opts)
    })
}

/// Resolve the provider from CLI flag, then config, then Ollama
pub fn resolve_provider(cli_provider: Option<Provider>, config: &Config) -> AppResult<Provider> {
    if let Some(provider) = cli_provider {
        return Ok(provider);
    }
    match config.llm.provider.as_deref() {
        Some(name) => Provider::from_name(name)
            .ok_or_else(|| config_error(format!("Unknown LLM provider '{}'", name))),
        None => Ok(Provider::Ollama)
    }
}

/// Get effective model name
pub fn get_effective_model(
    model: Option<String>,
    config_model: Option<String>,
    provider: &Provider
) -> String {
    model
        .or(config_model)
        .unwrap_or_else(|| provider.default_model().to_string())
}

/// Get effective Ollama URL
pub fn get_effective_ollama_url(url: String, config_url: Option<String>) -> String {
    if url == DEFAULT_OLLAMA_URL {
        config_url.unwrap_or(url)
    } else {
        url
    }
}

/// Build LLM provider from parameters
pub fn build_llm_provider(
    provider: Provider,
    api_key: Option<String>,
    model: String,
    ollama_url: String
) -> AppResult<LlmProvider> {
    match provider {
        Provider::OpenAI => {
            let key = api_key.ok_or_else(|| {
                config_error("API key required for OpenAI (use --api-key or LLM_API_KEY)")
            })?;
            Ok(LlmProvider::OpenAI {
                api_key: key,
                model
            })
        }
        Provider::Anthropic => {
            let key = api_key.ok_or_else(|| {
                config_error("API key required for Anthropic (use --api-key or LLM_API_KEY)")
            })?;
            Ok(LlmProvider::Anthropic {
                api_key: key,
                model
            })
        }
        Provider::Ollama => Ok(LlmProvider::Ollama {
            base_url: ollama_url,
            model
        })
    }
}

/// Build the text-to-SQL client from CLI arguments and configuration
pub fn build_client(args: LlmArgs, config: &Config) -> AppResult<LlmClient> {
    let provider = resolve_provider(args.provider, config)?;
    let model = get_effective_model(args.model, config.llm.model.clone(), &provider);
    let ollama_url = get_effective_ollama_url(args.ollama_url, config.llm.ollama_url.clone());
    let api_key = args.api_key.or(config.llm.api_key.clone());
    let llm_provider = build_llm_provider(provider, api_key, model, ollama_url)?;
    let mut client = LlmClient::with_retry_config(llm_provider, config.retry.clone());
    if let Some(schema_path) = args.schema.or(config.llm.schema.clone()) {
        let name = schema_path.display().to_string();
        let schema = read_to_string(&schema_path).map_err(|e| file_read_error(&name, e))?;
        client = client.with_schema_hint(schema);
    }
    Ok(client)
}

/// Generate a prediction for every example.
///
/// A failed generation is logged and recorded as an empty prediction so one
/// bad request does not discard the rest of the batch. Returns the rows and
/// the number of failures.
pub async fn generate_results<G: SqlGenerator>(
    generator: &G,
    examples: &[TrainingExample],
    progress: &ProgressBar
) -> (Vec<EvaluationRow>, usize) {
    let mut rows = Vec::with_capacity(examples.len());
    let mut failed = 0;
    for (index, example) in examples.iter().enumerate() {
        let predicted = match generator.generate(&example.text).await {
            Ok(sql) => sql,
            Err(e) => {
                tracing::warn!("Generation failed for example {}: {}", index + 1, e);
                failed += 1;
                String::new()
            }
        };
        rows.push(EvaluationRow::new(
            example.text.clone(),
            example.sql.clone(),
            predicted
        ));
        progress.inc(1);
    }
    (rows, failed)
}

/// Run the generate command
pub async fn run_generate(params: GenerateParams, config: &Config) -> AppResult<CommandOutput> {
    let dataset = params
        .dataset
        .unwrap_or_else(|| config.paths.dataset.clone());
    let output = params
        .output
        .unwrap_or_else(|| config.paths.results.clone());
    let mut examples = read_training_examples(&dataset)?;
    if let Some(limit) = params.limit {
        examples.truncate(limit);
    }
    tracing::info!(
        "Generating SQL for {} examples from '{}'",
        examples.len(),
        dataset.display()
    );
    let client = build_client(params.llm, config)?;

    let pb = ProgressBar::new(examples.len() as u64);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}");
    if let Ok(style) = style {
        pb.set_style(style);
    }
    pb.set_message("Generating SQL...");
    pb.enable_steady_tick(Duration::from_millis(100));
    let (rows, failed) = generate_results(&client, &examples, &pb).await;
    pb.finish_and_clear();

    write_evaluation_rows(&output, &rows)?;
    let summary = GenerationSummary {
        total: rows.len(),
        failed,
        output: output.display().to_string()
    };
    Ok(CommandOutput {
        exit_code: if failed == 0 { 0 } else { 1 },
        output:    format_generation_summary(&summary, &OutputOptions::default())
    })
}

/// Translate one question, check its syntax and log the interaction
pub async fn ask_question<G: SqlGenerator>(
    generator: &G,
    question: &str,
    dialect: SqlDialect,
    log: Option<&InteractionLog>
) -> AppResult<AskResult> {
    let sql = generator.generate(question).await?;
    let error = check_syntax(&sql, dialect).err().map(|e| e.to_string());
    if let Some(log) = log {
        let record = InteractionRecord::new(question, sql.as_str())
            .with_validity(error.is_none())
            .with_source("interactive")
            .with_notes(error.clone().unwrap_or_default());
        log.append(&record)?;
    }
    Ok(AskResult {
        sql,
        error
    })
}

/// Run the ask command
pub async fn run_ask(params: AskParams, config: &Config) -> AppResult<CommandOutput> {
    let client = build_client(params.llm, config)?;
    let log = if params.no_log {
        None
    } else {
        let path = params
            .log
            .unwrap_or_else(|| config.paths.interaction_log.clone());
        Some(InteractionLog::open(path)?)
    };
    let result = ask_question(
        &client,
        &params.question,
        convert_dialect(params.dialect),
        log.as_ref()
    )
    .await?;
    let output = match &result.error {
        None => result.sql.clone(),
        Some(error) => format!("{}\n-- invalid SQL: {}", result.sql, error)
    };
    Ok(CommandOutput {
        exit_code: if result.is_valid() { 0 } else { 1 },
        output
    })
}
