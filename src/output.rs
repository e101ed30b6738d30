use std::fmt::Write;

use colored::Colorize;
use serde::Serialize;

use crate::{
    diff::{DiffToken, RowDiff},
    evaluation::{EvaluationReport, HISTOGRAM_BINS, RowResult},
    matcher::MatchKind
};

const HISTOGRAM_WIDTH: usize = 40;

/// Output format for results
#[derive(Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
    Html
}

/// Output options
#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub format:  OutputFormat,
    pub colored: bool,
    pub verbose: bool
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            format:  OutputFormat::Text,
            colored: true,
            verbose: false
        }
    }
}

/// Comparison of a single statement pair, for serialization
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonResult {
    pub expected:            String,
    pub predicted:           String,
    pub kind:                MatchKind,
    pub matched:             bool,
    pub expected_canonical:  String,
    pub predicted_canonical: String,
    pub bleu:                f64
}

/// Summary of a batch generation run, for serialization
#[derive(Debug, Clone, Serialize)]
pub struct GenerationSummary {
    pub total:  usize,
    pub failed: usize,
    pub output: String
}

/// Format the comparison of one statement pair
pub fn format_comparison(result: &ComparisonResult, opts: &OutputOptions) -> String {
    match opts.format {
        OutputFormat::Json => serde_json::to_string_pretty(result).unwrap_or_default(),
        OutputFormat::Yaml => serde_yaml::to_string(result).unwrap_or_default(),
        OutputFormat::Html => format!(
            "<p><b>Expected:</b> {}<br><b>Predicted:</b> {}<br><b>Match:</b> {}</p>",
            escape_html(&result.expected),
            escape_html(&result.predicted),
            result.kind
        ),
        OutputFormat::Text => {
            let mut output = String::new();
            let verdict = if result.matched { "MATCH" } else { "NO MATCH" };
            let verdict = paint(verdict, result.kind, opts.colored);
            let _ = writeln!(output, "{} ({})", verdict, result.kind);
            let _ = writeln!(output, "Expected:  {}", result.expected_canonical);
            let _ = writeln!(output, "Predicted: {}", result.predicted_canonical);
            let _ = write!(output, "BLEU:      {:.4}", result.bleu);
            output
        }
    }
}

/// Format an evaluation report
pub fn format_report(report: &EvaluationReport, opts: &OutputOptions) -> String {
    match opts.format {
        OutputFormat::Json => serde_json::to_string_pretty(report).unwrap_or_default(),
        OutputFormat::Yaml => serde_yaml::to_string(report).unwrap_or_default(),
        OutputFormat::Html => format_report_html(report, opts),
        OutputFormat::Text => format_report_text(report, opts)
    }
}

fn format_report_text(report: &EvaluationReport, opts: &OutputOptions) -> String {
    let mut output = String::new();
    let title = "=== Evaluation Report ===";
    if opts.colored {
        let _ = writeln!(output, "{}\n", title.bold());
    } else {
        let _ = writeln!(output, "{}\n", title);
    }

    let total = report.total;
    let _ = writeln!(output, "Rows:           {}", total);
    let _ = writeln!(
        output,
        "Exact matches:  {} ({:.1}%)",
        report.count(MatchKind::Exact),
        report.exact_accuracy()
    );
    let _ = writeln!(
        output,
        "Soft matches:   {} ({:.1}%)",
        report.soft_matches(),
        report.soft_accuracy()
    );
    for kind in [MatchKind::SelectReordered, MatchKind::WhereReordered] {
        let _ = writeln!(output, "  {:<18}{}", format!("{}:", kind), report.count(kind));
    }
    let _ = writeln!(
        output,
        "Strict matches: {} ({:.1}%)",
        report.strict_matches,
        report.strict_accuracy()
    );
    let _ = writeln!(
        output,
        "Valid SQL:      {} ({:.1}%)",
        report.valid_sql,
        report.validity_rate()
    );
    let _ = writeln!(output, "Average BLEU:   {:.4}", report.average_bleu());

    output.push_str("\nBLEU distribution:\n");
    let peak = report.bleu_histogram.iter().copied().max().unwrap_or(0);
    for (bin, &count) in report.bleu_histogram.iter().enumerate() {
        let low = bin as f64 / HISTOGRAM_BINS as f64;
        let high = (bin + 1) as f64 / HISTOGRAM_BINS as f64;
        let width = if peak == 0 { 0 } else { count * HISTOGRAM_WIDTH / peak };
        let bar = "#".repeat(width);
        let bar = if opts.colored { bar.cyan().to_string() } else { bar };
        let _ = writeln!(output, "  {:.1}-{:.1} | {} {}", low, high, bar, count);
    }

    if opts.verbose && !report.rows.is_empty() {
        output.push_str("\nRows:\n");
        for row in &report.rows {
            output.push_str(&format_row_line(row, opts));
            output.push('\n');
        }
    }
    output
}

fn format_row_line(row: &RowResult, opts: &OutputOptions) -> String {
    let kind = paint(&format!("[{}]", row.kind), row.kind, opts.colored);
    let validity = if row.valid_sql { "" } else { " (invalid SQL)" };
    format!(
        "  #{:<4} {} bleu={:.2}{} {}",
        row.index + 1,
        kind,
        row.bleu,
        validity,
        row.input
    )
}

fn format_report_html(report: &EvaluationReport, opts: &OutputOptions) -> String {
    let mut output = String::from("<h3>Evaluation report</h3>\n<table>\n");
    let rows = [
        ("Rows", report.total.to_string()),
        (
            "Exact matches",
            format!("{} ({:.1}%)", report.count(MatchKind::Exact), report.exact_accuracy())
        ),
        (
            "Soft matches",
            format!("{} ({:.1}%)", report.soft_matches(), report.soft_accuracy())
        ),
        (
            "Strict matches",
            format!("{} ({:.1}%)", report.strict_matches, report.strict_accuracy())
        ),
        (
            "Valid SQL",
            format!("{} ({:.1}%)", report.valid_sql, report.validity_rate())
        ),
        ("Average BLEU", format!("{:.4}", report.average_bleu()))
    ];
    for (label, value) in rows {
        let _ = writeln!(output, "<tr><th>{}</th><td>{}</td></tr>", label, value);
    }
    output.push_str("</table>\n");
    if opts.verbose {
        output.push_str("<table>\n<tr><th>#</th><th>Input</th><th>Match</th><th>BLEU</th></tr>\n");
        for row in &report.rows {
            let _ = writeln!(
                output,
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{:.2}</td></tr>",
                row.index + 1,
                escape_html(&row.input),
                row.kind,
                row.bleu
            );
        }
        output.push_str("</table>\n");
    }
    output
}

/// Format token differences of mismatching rows
pub fn format_diffs(diffs: &[RowDiff], opts: &OutputOptions) -> String {
    match opts.format {
        OutputFormat::Json => serde_json::to_string_pretty(diffs).unwrap_or_default(),
        OutputFormat::Yaml => serde_yaml::to_string(diffs).unwrap_or_default(),
        OutputFormat::Html => format_diffs_html(diffs),
        OutputFormat::Text => format_diffs_text(diffs, opts)
    }
}

fn format_diffs_text(diffs: &[RowDiff], opts: &OutputOptions) -> String {
    if diffs.is_empty() {
        return String::from("No differences: every prediction matches its reference.");
    }
    let mut output = String::new();
    for diff in diffs {
        let header = format!("Row #{}: {}", diff.index + 1, diff.input);
        if opts.colored {
            let _ = writeln!(output, "{}", header.cyan().bold());
        } else {
            let _ = writeln!(output, "{}", header);
        }
        let tokens: Vec<String> = diff
            .tokens
            .iter()
            .map(|token| render_text_token(token, opts.colored))
            .collect();
        let _ = writeln!(output, "  {}\n", tokens.join(" "));
    }
    output.trim_end().to_string()
}

fn render_text_token(token: &DiffToken, colored: bool) -> String {
    let text = token.text();
    match token {
        DiffToken::Same(_) => text.to_string(),
        DiffToken::Removed(_) => {
            let marked = format!("[- {}]", text);
            if colored { marked.red().to_string() } else { marked }
        }
        DiffToken::Added(_) => {
            let marked = format!("[+ {}]", text);
            if colored { marked.green().to_string() } else { marked }
        }
    }
}

fn format_diffs_html(diffs: &[RowDiff]) -> String {
    let mut output = String::from("<h3>Mismatching predictions</h3>\n");
    for diff in diffs {
        let tokens: Vec<String> = diff.tokens.iter().map(render_html_token).collect();
        let _ = writeln!(
            output,
            "<b>Input:</b><br>{}<br><br>\n<b>Differences:</b><br>{}<br><br>\n<hr>",
            escape_html(&diff.input),
            tokens.join(" ")
        );
    }
    output
}

fn render_html_token(token: &DiffToken) -> String {
    let text = escape_html(token.text());
    match token {
        DiffToken::Same(_) => text,
        DiffToken::Removed(_) => format!(
            "<span style=\"background-color:#fdd; color:#900\">[- {}]</span>",
            text
        ),
        DiffToken::Added(_) => format!(
            "<span style=\"background-color:#dfd; color:#090\">[+ {}]</span>",
            text
        )
    }
}

/// Format the summary of a generation run
pub fn format_generation_summary(summary: &GenerationSummary, opts: &OutputOptions) -> String {
    match opts.format {
        OutputFormat::Json => serde_json::to_string_pretty(summary).unwrap_or_default(),
        OutputFormat::Yaml => serde_yaml::to_string(summary).unwrap_or_default(),
        OutputFormat::Text | OutputFormat::Html => format!(
            "Generated {} statements ({} failed), results written to {}",
            summary.total, summary.failed, summary.output
        )
    }
}

fn paint(text: &str, kind: MatchKind, colored: bool) -> String {
    if !colored {
        return text.to_string();
    }
    match kind {
        MatchKind::Exact => text.green().to_string(),
        MatchKind::SelectReordered | MatchKind::WhereReordered => text.yellow().to_string(),
        MatchKind::Mismatch => text.red().to_string()
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c)
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
    }

    #[test]
    fn test_render_text_token_plain() {
        assert_eq!(render_text_token(&DiffToken::Removed("t".into()), false), "[- t]");
        assert_eq!(render_text_token(&DiffToken::Added("s".into()), false), "[+ s]");
        assert_eq!(render_text_token(&DiffToken::Same("FROM".into()), false), "FROM");
    }

    #[test]
    fn test_render_html_token_escapes_text() {
        assert_eq!(render_html_token(&DiffToken::Same("a<b".into())), "a&lt;b");
        assert!(render_html_token(&DiffToken::Added("x>1".into())).contains("[+ x&gt;1]"));
    }

    #[test]
    fn test_paint_without_color() {
        assert_eq!(paint("MATCH", MatchKind::Exact, false), "MATCH");
    }
}
