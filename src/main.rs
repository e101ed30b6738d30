//! # nl2sql-eval
//!
//! Evaluation toolkit for natural-language-to-SQL models.
//!
//! A text-to-SQL model turns a Russian-language question into an SQL
//! statement. Generated statements rarely match their references byte for
//! byte, so `nl2sql-eval` scores them with a soft comparison that ignores
//! case, whitespace, the trailing `;`, the order of SELECT fields and the
//! order of AND-joined WHERE predicates. ORDER BY is never reordered.
//!
//! # Quick Start
//!
//! ```bash
//! # Compare one pair (exit code 1 on mismatch)
//! nl2sql-eval compare "SELECT a, b FROM t;" "select b, a from t"
//!
//! # Generate predictions for a dataset with `text` and `sql` columns
//! nl2sql-eval generate -d data/training_data.csv -o data/evaluation_results.csv
//!
//! # Score the results table, fail CI below 80% soft accuracy
//! nl2sql-eval evaluate -r data/evaluation_results.csv --fail-under 80
//!
//! # Inspect mismatches as HTML
//! nl2sql-eval diff -r data/evaluation_results.csv --limit 10 -f html > diff.html
//!
//! # Ask a single question and log it
//! nl2sql-eval ask "Показать всех сотрудников" --provider ollama
//! ```
//!
//! # Match Kinds
//!
//! | Kind | Meaning |
//! |------|---------|
//! | `exact` | Equal after lower-casing, collapsing whitespace, dropping `;` |
//! | `select-reordered` | Equal once SELECT fields are sorted |
//! | `where-reordered` | Equal once WHERE predicates are sorted as well |
//! | `mismatch` | Not equivalent |
//!
//! # Configuration
//!
//! Configuration is loaded from (in order of precedence):
//!
//! 1. Command-line arguments
//! 2. Environment variables (`LLM_API_KEY`, `LLM_PROVIDER`, etc.)
//! 3. `.nl2sql-eval.toml` in current directory
//! 4. `~/.config/nl2sql-eval/config.toml`
//!
//! Log verbosity follows `RUST_LOG` (default `nl2sql_eval=info`); logs go to
//! stderr, results to stdout.
//!
//! # Exit Codes
//!
//! - `0` - Success
//! - `1` - Mismatch (`compare`), accuracy below `--fail-under` (`evaluate`),
//!   failed generations (`generate`), invalid SQL (`ask`), or an error

use std::process;

use clap::Parser;
use nl2sql_eval::{
    app::{
        AskParams, CommandOutput, DiffParams, EvaluateParams, GenerateParams,
        create_output_options, run_ask, run_compare, run_diff, run_evaluate, run_generate
    },
    cli::{Cli, Commands},
    config::Config,
    error::AppResult
};
use tokio::main;
use tracing_subscriber::EnvFilter;

#[main]
async fn main() {
    init_tracing();
    match run().await {
        Ok(result) => {
            println!("{}", result.output);
            process::exit(result.exit_code);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("nl2sql_eval=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run() -> AppResult<CommandOutput> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Compare {
            expected,
            predicted,
            output_format,
            no_color
        } => {
            let opts = create_output_options(output_format, no_color, false);
            Ok(run_compare(&expected, &predicted, &opts))
        }
        Commands::Evaluate {
            results,
            dialect,
            fail_under,
            output_format,
            verbose,
            no_color
        } => run_evaluate(
            EvaluateParams {
                results,
                dialect,
                fail_under,
                output_format,
                verbose,
                no_color
            },
            &Config::load()?
        ),
        Commands::Diff {
            results,
            limit,
            output_format,
            no_color
        } => run_diff(
            DiffParams {
                results,
                limit,
                output_format,
                no_color
            },
            &Config::load()?
        ),
        Commands::Generate {
            dataset,
            output,
            limit,
            llm
        } => {
            run_generate(
                GenerateParams {
                    dataset,
                    output,
                    limit,
                    llm
                },
                &Config::load()?
            )
            .await
        }
        Commands::Ask {
            question,
            log,
            no_log,
            dialect,
            llm
        } => {
            run_ask(
                AskParams {
                    question,
                    log,
                    no_log,
                    dialect,
                    llm
                },
                &Config::load()?
            )
            .await
        }
    }
}
