//! Text similarity metrics for generated SQL.
//!
//! [`sentence_bleu`] is BLEU-4 with uniform weights, clipped n-gram
//! precision, brevity penalty and "method1" smoothing (a zero-count
//! precision is replaced by `0.1 / denominator`). Statements are compared
//! as whitespace tokens of their trimmed, lower-cased text.

use std::collections::HashMap;

const MAX_ORDER: usize = 4;
const SMOOTHING_EPSILON: f64 = 0.1;

/// Trim + lower-case equality, without collapsing inner whitespace.
pub fn strict_match(expected: &str, predicted: &str) -> bool {
    expected.trim().to_lowercase() == predicted.trim().to_lowercase()
}

/// Whitespace tokens of the trimmed, lower-cased statement.
pub fn tokenize(sql: &str) -> Vec<String> {
    sql.trim()
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// BLEU score of `predicted` against `expected`.
pub fn bleu(expected: &str, predicted: &str) -> f64 {
    sentence_bleu(&tokenize(expected), &tokenize(predicted))
}

/// Sentence-level BLEU-4 of a hypothesis against a single reference.
///
/// Returns `0.0` when no unigram of the hypothesis occurs in the reference.
pub fn sentence_bleu<S: AsRef<str>>(reference: &[S], hypothesis: &[S]) -> f64 {
    let reference: Vec<&str> = reference.iter().map(AsRef::as_ref).collect();
    let hypothesis: Vec<&str> = hypothesis.iter().map(AsRef::as_ref).collect();

    let precisions: Vec<(usize, usize)> = (1..=MAX_ORDER)
        .map(|n| modified_precision(&reference, &hypothesis, n))
        .collect();
    if precisions[0].0 == 0 {
        return 0.0;
    }

    let weight = 1.0 / MAX_ORDER as f64;
    let log_sum: f64 = precisions
        .iter()
        .map(|&(numerator, denominator)| {
            let p = if numerator == 0 {
                SMOOTHING_EPSILON / denominator as f64
            } else {
                numerator as f64 / denominator as f64
            };
            weight * p.ln()
        })
        .sum();

    brevity_penalty(reference.len(), hypothesis.len()) * log_sum.exp()
}

/// Clipped n-gram matches and the hypothesis n-gram count (at least 1).
fn modified_precision(reference: &[&str], hypothesis: &[&str], n: usize) -> (usize, usize) {
    let hyp_counts = ngram_counts(hypothesis, n);
    let ref_counts = ngram_counts(reference, n);
    let numerator = hyp_counts
        .iter()
        .map(|(gram, &count)| count.min(ref_counts.get(gram).copied().unwrap_or(0)))
        .sum();
    let denominator = hyp_counts.values().sum::<usize>().max(1);
    (numerator, denominator)
}

fn ngram_counts<'a>(tokens: &'a [&'a str], n: usize) -> HashMap<&'a [&'a str], usize> {
    let mut counts = HashMap::new();
    if tokens.len() >= n {
        for gram in tokens.windows(n) {
            *counts.entry(gram).or_insert(0) += 1;
        }
    }
    counts
}

fn brevity_penalty(reference_len: usize, hypothesis_len: usize) -> f64 {
    if hypothesis_len > reference_len {
        1.0
    } else if hypothesis_len == 0 {
        0.0
    } else {
        (1.0 - reference_len as f64 / hypothesis_len as f64).exp()
    }
}
