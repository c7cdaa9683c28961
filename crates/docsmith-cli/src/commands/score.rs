use super::{OutputFormat, print_json, render_report};
use anyhow::Context;
use clap::Args;
use docsmith_core::{CodeAnalyzer, QualityScorer, suggestions};
use docsmith_shared::{DocType, DocsmithConfig, ScoreBreakdown, Suggestion};
use serde::Serialize;
use std::path::PathBuf;
use tracing::warn;

#[derive(Args, Debug)]
pub struct ScoreArgs {
    /// Markdown document to score
    pub doc: PathBuf,

    /// Source file the document describes; enables symbol coverage
    #[arg(long)]
    pub source: Option<PathBuf>,

    #[arg(long, default_value = "readme")]
    pub doc_type: DocType,

    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,
}

#[derive(Serialize)]
struct ScoreReport {
    breakdown: ScoreBreakdown,
    suggestions: Vec<Suggestion>,
}

pub async fn run(args: ScoreArgs, config: &DocsmithConfig) -> anyhow::Result<()> {
    let doc = tokio::fs::read_to_string(&args.doc)
        .await
        .with_context(|| format!("failed to read {}", args.doc.display()))?;

    let analysis = match &args.source {
        Some(path) => {
            let analyzer = CodeAnalyzer::new(config.analysis.clone());
            let analysis = analyzer
                .analyze_file(path)
                .await
                .with_context(|| format!("failed to analyze {}", path.display()))?;
            if !analysis.is_usable() {
                warn!("{} could not be parsed; falling back to structural API checks", path.display());
            }
            Some(analysis)
        }
        None => None,
    };

    let scorer = QualityScorer::new(config.scoring.clone());
    let breakdown = scorer.score(&doc, args.doc_type, analysis.as_ref());
    let suggestions = suggestions(&breakdown);

    match args.format {
        OutputFormat::Json => print_json(&ScoreReport {
            breakdown,
            suggestions,
        })?,
        OutputFormat::Text => print!("{}", render_report(&breakdown, &suggestions)),
    }
    Ok(())
}
