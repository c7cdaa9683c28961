//! Subcommand implementations

pub mod analyze;
pub mod config;
pub mod generate;
pub mod score;

use clap::ValueEnum;
use docsmith_shared::{ScoreBreakdown, Severity, Suggestion};
use serde::Serialize;
use std::fmt::Write as _;

/// How results are written to stdout
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Score table followed by the suggestion list
pub fn render_report(breakdown: &ScoreBreakdown, suggestions: &[Suggestion]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} score: {}/100 (grade {})",
        breakdown.doc_type(),
        breakdown.total(),
        breakdown.grade()
    );

    let width = breakdown
        .criteria()
        .iter()
        .map(|entry| entry.label.len())
        .max()
        .unwrap_or(0);
    for entry in breakdown.criteria() {
        let mark = if entry.passed { "ok" } else { "--" };
        let _ = writeln!(
            out,
            "  [{mark}] {:<width$}  {:>2}/{:<2}  {}",
            entry.label, entry.score, entry.max_score, entry.details
        );
    }

    let warnings: Vec<&Suggestion> = suggestions
        .iter()
        .filter(|s| s.severity == Severity::Warn)
        .collect();
    if !warnings.is_empty() {
        let _ = writeln!(out, "\nSuggestions:");
        for suggestion in warnings {
            let _ = writeln!(out, "  - {}", suggestion.message);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsmith_core::{score, suggestions};
    use docsmith_shared::DocType;

    #[test]
    fn test_render_report_lists_warnings_only() {
        let breakdown = score(
            "# Tool\n\n## Installation\n\n```sh\nnpm install tool\n```\n",
            DocType::Readme,
            None,
        );
        let report = render_report(&breakdown, &suggestions(&breakdown));

        assert!(report.starts_with("README score: "));
        assert!(report.contains("[ok] Installation"));
        assert!(report.contains("Suggestions:"));
        assert!(!report.contains("looks good"));
    }
}
