use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// nl2sql-eval - Score natural-language-to-SQL models against reference SQL
#[derive(Parser, Debug)]
#[command(name = "nl2sql-eval")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compare one predicted statement with its reference
    Compare {
        /// Reference SQL
        expected: String,

        /// Generated SQL
        predicted: String,

        /// Output format
        #[arg(short = 'f', long, value_enum, default_value = "text")]
        output_format: Format,

        /// Disable colored output
        #[arg(long)]
        no_color: bool
    },

    /// Score a results table (Input, Expected SQL, Predicted SQL)
    Evaluate {
        /// Path to results CSV (use - for stdin)
        #[arg(short, long)]
        results: Option<PathBuf>,

        /// SQL dialect for the syntax check
        #[arg(long, value_enum, default_value = "generic")]
        dialect: Dialect,

        /// Exit with code 1 when soft accuracy (percent) is below this value
        #[arg(long)]
        fail_under: Option<f64>,

        /// Output format
        #[arg(short = 'f', long, value_enum, default_value = "text")]
        output_format: Format,

        /// List every row, not only the totals
        #[arg(short, long)]
        verbose: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool
    },

    /// Show token differences for mismatching rows
    Diff {
        /// Path to results CSV (use - for stdin)
        #[arg(short, long)]
        results: Option<PathBuf>,

        /// Number of mismatching rows to show
        #[arg(short, long, default_value_t = 5)]
        limit: usize,

        /// Output format
        #[arg(short = 'f', long, value_enum, default_value = "text")]
        output_format: Format,

        /// Disable colored output
        #[arg(long)]
        no_color: bool
    },

    /// Generate SQL for a dataset (text, sql) and write a results table
    Generate {
        /// Path to dataset CSV with `text` and `sql` columns
        #[arg(short, long)]
        dataset: Option<PathBuf>,

        /// Where to write the results CSV
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only use the first N examples
        #[arg(long)]
        limit: Option<usize>,

        #[command(flatten)]
        llm: LlmArgs
    },

    /// Translate a single question, check it and log the interaction
    Ask {
        /// Question in natural language
        question: String,

        /// Interaction log path
        #[arg(long)]
        log: Option<PathBuf>,

        /// Do not write to the interaction log
        #[arg(long)]
        no_log: bool,

        /// SQL dialect for the syntax check
        #[arg(long, value_enum, default_value = "generic")]
        dialect: Dialect,

        #[command(flatten)]
        llm: LlmArgs
    }
}

/// Model selection shared by commands that call the LLM
#[derive(Args, Debug, Clone)]
pub struct LlmArgs {
    /// LLM provider to use
    #[arg(short, long, value_enum)]
    pub provider: Option<Provider>,

    /// API key for OpenAI or Anthropic
    #[arg(short, long, env = "LLM_API_KEY")]
    pub api_key: Option<String>,

    /// Model name
    #[arg(short, long)]
    pub model: Option<String>,

    /// Ollama base URL
    #[arg(long, default_value = "http://localhost:11434")]
    pub ollama_url: String,

    /// SQL file with the database schema, sent with every question
    #[arg(short, long)]
    pub schema: Option<PathBuf>
}

#[derive(Debug, Clone, ValueEnum)]
pub enum Provider {
    OpenAI,
    Anthropic,
    Ollama
}

impl Provider {
    /// Get default model for provider
    pub fn default_model(&self) -> &str {
        match self {
            Self::OpenAI => "gpt-4",
            Self::Anthropic => "claude-sonnet-4-20250514",
            Self::Ollama => "llama3.2"
        }
    }

    /// Parse a provider name from configuration
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "openai" | "open-ai" => Some(Self::OpenAI),
            "anthropic" => Some(Self::Anthropic),
            "ollama" => Some(Self::Ollama),
            _ => None
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
pub enum Dialect {
    Generic,
    Mysql,
    Postgresql,
    Sqlite,
    Clickhouse
}

#[derive(Debug, Clone, ValueEnum)]
pub enum Format {
    Text,
    Json,
    Yaml,
    Html
}
