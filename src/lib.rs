//! # nl2sql-eval Library
//!
//! Evaluation toolkit for natural-language-to-SQL models.
//!
//! The core is [`matcher`], which decides whether a generated SQL statement
//! is equivalent to its reference up to case, whitespace, the trailing
//! terminator, SELECT-field order and WHERE-predicate order. Around it sit
//! BLEU scoring ([`metrics`]), batch evaluation ([`evaluation`]), token
//! diffs ([`diff`]), LLM-backed generation ([`llm`]) and an append-only
//! interaction log ([`interaction_log`]).

pub mod app;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod diff;
pub mod error;
pub mod evaluation;
pub mod interaction_log;
pub mod llm;
pub mod matcher;
pub mod metrics;
pub mod output;
pub mod syntax;
pub use masterror::{AppError, AppResult};
