//! Documentation Quality Scoring
//!
//! Scores a markdown document against a fixed 100-point rubric:
//! - Overview/Description (20)
//! - Installation Instructions (15)
//! - Usage Examples (20)
//! - API coverage (25), measured against a `CodeAnalysis` when one is given
//! - Structure/Formatting (20)
//!
//! Scoring is pure: the same input always yields the same breakdown.

pub mod criteria;
pub mod document;
pub mod suggestions;

pub use criteria::{CriterionInput, mentions};
pub use document::{Block, BlockKind, DocumentOutline, Heading};
pub use suggestions::suggestions;

use docsmith_shared::{
    CodeAnalysis, Criterion, CriterionScore, DocType, Finding, ScoreBreakdown, ScoringConfig,
};
use tracing::{debug, instrument};

/// Quality scorer
#[derive(Debug, Clone, Default)]
pub struct QualityScorer {
    config: ScoringConfig,
}

impl QualityScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score a document. A blank document scores 0 on every criterion.
    #[instrument(skip(self, doc, analysis), fields(bytes = doc.len(), with_analysis = analysis.is_some()))]
    pub fn score(
        &self,
        doc: &str,
        doc_type: DocType,
        analysis: Option<&CodeAnalysis>,
    ) -> ScoreBreakdown {
        let pass_percent = self.config.pass_percent;

        if doc.trim().is_empty() {
            let criteria = Criterion::ALL
                .iter()
                .map(|&criterion| {
                    CriterionScore::new(criterion, doc_type, 0, Finding::EmptyDocument, pass_percent)
                })
                .collect();
            return ScoreBreakdown::new(doc_type, criteria);
        }

        let outline = DocumentOutline::parse(doc);
        let input = CriterionInput {
            outline: &outline,
            text: doc,
            analysis,
            config: &self.config,
        };

        let criteria = Criterion::ALL
            .iter()
            .map(|&criterion| {
                let (score, finding) = match criterion {
                    Criterion::Overview => criteria::overview(&input),
                    Criterion::Installation => criteria::installation(&input),
                    Criterion::UsageExamples => criteria::usage_examples(&input),
                    Criterion::ApiCoverage => criteria::api_coverage(&input),
                    Criterion::Structure => criteria::structure(&input),
                };
                CriterionScore::new(criterion, doc_type, score, finding, pass_percent)
            })
            .collect();

        let breakdown = ScoreBreakdown::new(doc_type, criteria);
        debug!(total = breakdown.total(), grade = %breakdown.grade(), "Document scored");
        breakdown
    }
}

/// Score a document with the default configuration
pub fn score(doc: &str, doc_type: DocType, analysis: Option<&CodeAnalysis>) -> ScoreBreakdown {
    QualityScorer::default().score(doc, doc_type, analysis)
}
