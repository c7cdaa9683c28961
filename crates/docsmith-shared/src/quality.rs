//! Documentation quality model: criteria, findings, grades and suggestions.

use crate::types::DocType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The five rubric dimensions, in breakdown order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Criterion {
    Overview,
    Installation,
    UsageExamples,
    ApiCoverage,
    Structure,
}

impl Criterion {
    pub const ALL: [Criterion; 5] = [
        Criterion::Overview,
        Criterion::Installation,
        Criterion::UsageExamples,
        Criterion::ApiCoverage,
        Criterion::Structure,
    ];

    /// Weight of the criterion; the maxima add up to 100
    pub fn max_score(self) -> u32 {
        match self {
            Criterion::Overview => 20,
            Criterion::Installation => 15,
            Criterion::UsageExamples => 20,
            Criterion::ApiCoverage => 25,
            Criterion::Structure => 20,
        }
    }

    /// Display label; only ApiCoverage depends on the doc type
    pub fn label(self, doc_type: DocType) -> &'static str {
        match self {
            Criterion::Overview => "Overview/Description",
            Criterion::Installation => "Installation Instructions",
            Criterion::UsageExamples => "Usage Examples",
            Criterion::ApiCoverage => doc_type.api_coverage_label(),
            Criterion::Structure => "Structure/Formatting",
        }
    }
}

/// What a criterion function observed in the document.
///
/// Findings carry enough detail to explain a score and to phrase a
/// targeted suggestion without re-reading the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Finding {
    EmptyDocument,

    NoOverview,
    TitleEcho,
    #[serde(rename_all = "camelCase")]
    ShortOverview { words: usize, wanted: usize },
    #[serde(rename_all = "camelCase")]
    OverviewPresent { words: usize },

    NoInstallation,
    InstallHeadingOnly,
    InstallCommandOnly,
    InstallationComplete,

    NoUsageExamples,
    #[serde(rename_all = "camelCase")]
    UnlabelledExamples { blocks: usize },
    #[serde(rename_all = "camelCase")]
    FewUsageExamples { examples: usize, wanted: usize },
    #[serde(rename_all = "camelCase")]
    UsageExamplesComplete { examples: usize },

    #[serde(rename_all = "camelCase")]
    SymbolCoverage {
        documented: usize,
        total: usize,
        missing: Vec<String>,
    },
    NoApiSection,
    ApiSectionSparse,
    ApiSectionPresent,

    #[serde(rename_all = "camelCase")]
    Layout {
        headings: usize,
        hierarchy_ok: bool,
        body_structure: bool,
        words: usize,
        target_words: usize,
    },
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::EmptyDocument => write!(f, "Document is empty"),
            Finding::NoOverview => write!(f, "No introductory overview found"),
            Finding::TitleEcho => write!(f, "Overview only repeats the title"),
            Finding::ShortOverview { words, wanted } => {
                write!(f, "Overview has {} words ({} expected)", words, wanted)
            }
            Finding::OverviewPresent { words } => write!(f, "Overview present ({} words)", words),
            Finding::NoInstallation => write!(f, "No installation section or install command"),
            Finding::InstallHeadingOnly => {
                write!(f, "Installation section has no install command")
            }
            Finding::InstallCommandOnly => {
                write!(f, "Install command found outside an installation section")
            }
            Finding::InstallationComplete => {
                write!(f, "Installation section with install command")
            }
            Finding::NoUsageExamples => write!(f, "No code examples found"),
            Finding::UnlabelledExamples { blocks } => {
                write!(f, "{} code block(s) outside a usage section", blocks)
            }
            Finding::FewUsageExamples { examples, wanted } => {
                write!(f, "{} usage example(s) ({} expected)", examples, wanted)
            }
            Finding::UsageExamplesComplete { examples } => {
                write!(f, "{} usage examples", examples)
            }
            Finding::SymbolCoverage {
                documented, total, ..
            } => write!(f, "{}/{} public symbols documented", documented, total),
            Finding::NoApiSection => write!(f, "No API section found"),
            Finding::ApiSectionSparse => write!(f, "API section present but sparse"),
            Finding::ApiSectionPresent => write!(f, "API section present"),
            Finding::Layout {
                headings,
                hierarchy_ok,
                words,
                target_words,
                ..
            } => write!(
                f,
                "{} heading(s), hierarchy {}, {}/{} words",
                headings,
                if *hierarchy_ok { "ok" } else { "broken" },
                words,
                target_words
            ),
        }
    }
}

/// Score for one criterion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriterionScore {
    pub criterion: Criterion,
    pub label: String,
    pub score: u32,
    pub max_score: u32,
    pub passed: bool,
    pub details: String,
    pub finding: Finding,
}

impl CriterionScore {
    /// Build a score, clamping to the criterion maximum.
    ///
    /// `passed` holds when the score reaches `pass_percent` of the maximum.
    pub fn new(
        criterion: Criterion,
        doc_type: DocType,
        score: u32,
        finding: Finding,
        pass_percent: u32,
    ) -> Self {
        let max_score = criterion.max_score();
        let score = score.min(max_score);

        Self {
            criterion,
            label: criterion.label(doc_type).to_string(),
            score,
            max_score,
            passed: score * 100 >= pass_percent * max_score,
            details: finding.to_string(),
            finding,
        }
    }
}

/// Letter grade derived from a total score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// Bands are inclusive on their lower bound
    pub fn from_total(total: u32) -> Self {
        match total {
            t if t >= 90 => Grade::A,
            t if t >= 80 => Grade::B,
            t if t >= 70 => Grade::C,
            t if t >= 60 => Grade::D,
            _ => Grade::F,
        }
    }

    /// Get color for UI display
    pub fn color(self) -> &'static str {
        match self {
            Grade::A => "green",
            Grade::B => "lime",
            Grade::C => "yellow",
            Grade::D => "orange",
            Grade::F => "red",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        };
        f.write_str(letter)
    }
}

/// Per-criterion scores of one document.
///
/// `total` is computed once at construction; `grade` is never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ScoreBreakdownRepr", into = "ScoreBreakdownRepr")]
pub struct ScoreBreakdown {
    doc_type: DocType,
    criteria: Vec<CriterionScore>,
    total: u32,
}

impl ScoreBreakdown {
    pub fn new(doc_type: DocType, criteria: Vec<CriterionScore>) -> Self {
        let total = criteria.iter().map(|c| c.score).sum::<u32>().min(100);
        Self {
            doc_type,
            criteria,
            total,
        }
    }

    pub fn doc_type(&self) -> DocType {
        self.doc_type
    }

    pub fn criteria(&self) -> &[CriterionScore] {
        &self.criteria
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn grade(&self) -> Grade {
        Grade::from_total(self.total)
    }

    pub fn get(&self, criterion: Criterion) -> Option<&CriterionScore> {
        self.criteria.iter().find(|c| c.criterion == criterion)
    }

    /// Score of a single criterion, 0 when absent
    pub fn score_of(&self, criterion: Criterion) -> u32 {
        self.get(criterion).map(|c| c.score).unwrap_or(0)
    }
}

/// Wire form of `ScoreBreakdown`; `total` and `grade` are recomputed on read
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScoreBreakdownRepr {
    doc_type: DocType,
    criteria: Vec<CriterionScore>,
    #[serde(default)]
    total: u32,
    #[serde(default, skip_deserializing)]
    grade: Option<Grade>,
}

impl From<ScoreBreakdownRepr> for ScoreBreakdown {
    fn from(repr: ScoreBreakdownRepr) -> Self {
        ScoreBreakdown::new(repr.doc_type, repr.criteria)
    }
}

impl From<ScoreBreakdown> for ScoreBreakdownRepr {
    fn from(breakdown: ScoreBreakdown) -> Self {
        let grade = Some(breakdown.grade());
        Self {
            doc_type: breakdown.doc_type,
            criteria: breakdown.criteria,
            total: breakdown.total,
            grade,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Pass,
    Warn,
}

/// One checklist entry for the UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub criterion: Criterion,
    pub severity: Severity,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breakdown_with(scores: [u32; 5]) -> ScoreBreakdown {
        let criteria = Criterion::ALL
            .iter()
            .zip(scores)
            .map(|(c, s)| CriterionScore::new(*c, DocType::Readme, s, Finding::EmptyDocument, 70))
            .collect();
        ScoreBreakdown::new(DocType::Readme, criteria)
    }

    #[test]
    fn test_max_scores_sum_to_100() {
        let sum: u32 = Criterion::ALL.iter().map(|c| c.max_score()).sum();
        assert_eq!(sum, 100);
    }

    #[test]
    fn test_grade_boundaries() {
        assert_eq!(Grade::from_total(100), Grade::A);
        assert_eq!(Grade::from_total(90), Grade::A);
        assert_eq!(Grade::from_total(89), Grade::B);
        assert_eq!(Grade::from_total(80), Grade::B);
        assert_eq!(Grade::from_total(79), Grade::C);
        assert_eq!(Grade::from_total(70), Grade::C);
        assert_eq!(Grade::from_total(69), Grade::D);
        assert_eq!(Grade::from_total(60), Grade::D);
        assert_eq!(Grade::from_total(59), Grade::F);
        assert_eq!(Grade::from_total(0), Grade::F);
    }

    #[test]
    fn test_breakdown_grade_from_total() {
        let breakdown = breakdown_with([20, 15, 20, 25, 10]);
        assert_eq!(breakdown.total(), 90);
        assert_eq!(breakdown.grade(), Grade::A);

        let breakdown = breakdown_with([20, 15, 20, 25, 9]);
        assert_eq!(breakdown.total(), 89);
        assert_eq!(breakdown.grade(), Grade::B);

        let breakdown = breakdown_with([20, 15, 10, 10, 5]);
        assert_eq!(breakdown.total(), 60);
        assert_eq!(breakdown.grade(), Grade::D);

        let breakdown = breakdown_with([20, 15, 10, 10, 4]);
        assert_eq!(breakdown.total(), 59);
        assert_eq!(breakdown.grade(), Grade::F);
    }

    #[test]
    fn test_criterion_score_clamps_and_passes() {
        let score = CriterionScore::new(
            Criterion::Installation,
            DocType::Readme,
            40,
            Finding::InstallationComplete,
            70,
        );
        assert_eq!(score.score, 15);
        assert!(score.passed);

        // 10/15 is below 70%, 11/15 is above
        let below = CriterionScore::new(Criterion::Installation, DocType::Readme, 10, Finding::InstallCommandOnly, 70);
        assert!(!below.passed);
        let above = CriterionScore::new(Criterion::Installation, DocType::Readme, 11, Finding::InstallCommandOnly, 70);
        assert!(above.passed);

        // 14/20 is exactly 70%
        let exact = CriterionScore::new(Criterion::Overview, DocType::Readme, 14, Finding::NoOverview, 70);
        assert!(exact.passed);
    }

    #[test]
    fn test_api_label_follows_doc_type() {
        let score = CriterionScore::new(
            Criterion::ApiCoverage,
            DocType::Api,
            0,
            Finding::NoApiSection,
            70,
        );
        assert_eq!(score.label, "API Endpoints");
        assert_eq!(score.max_score, 25);
    }

    #[test]
    fn test_serialization_recomputes_total_and_grade() {
        let breakdown = breakdown_with([20, 15, 20, 25, 20]);
        let mut json = serde_json::to_value(&breakdown).unwrap();
        assert_eq!(json["total"], 100);
        assert_eq!(json["grade"], "A");
        assert_eq!(json["docType"], "README");

        // A tampered total is ignored on the way back in
        json["total"] = serde_json::json!(3);
        json["grade"] = serde_json::json!("F");
        let restored: ScoreBreakdown = serde_json::from_value(json).unwrap();
        assert_eq!(restored.total(), 100);
        assert_eq!(restored, breakdown);
    }
}
