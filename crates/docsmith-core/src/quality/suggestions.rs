//! Per-criterion checklist derived from a score breakdown.

use docsmith_shared::{CriterionScore, Finding, ScoreBreakdown, Severity, Suggestion};

/// Names listed before the remainder is summarised
const MAX_LISTED_SYMBOLS: usize = 5;

/// One suggestion per criterion, in breakdown order.
///
/// Passing criteria get a `pass` entry; failing ones get a `warn` entry
/// naming what is missing.
pub fn suggestions(breakdown: &ScoreBreakdown) -> Vec<Suggestion> {
    breakdown
        .criteria()
        .iter()
        .map(|score| {
            if score.passed {
                Suggestion {
                    criterion: score.criterion,
                    severity: Severity::Pass,
                    message: format!("{} looks good", score.label),
                }
            } else {
                Suggestion {
                    criterion: score.criterion,
                    severity: Severity::Warn,
                    message: warning(score),
                }
            }
        })
        .collect()
}

fn warning(score: &CriterionScore) -> String {
    match &score.finding {
        Finding::EmptyDocument => format!("Document is empty: add {}", score.label.to_lowercase()),

        Finding::NoOverview => "Add an introductory paragraph describing what the project does".to_string(),
        Finding::TitleEcho => "The overview only repeats the title; describe what the project does".to_string(),
        Finding::ShortOverview { words, wanted } => format!(
            "Expand the overview ({} words, aim for at least {})",
            words, wanted
        ),

        Finding::NoInstallation => "No installation instructions detected".to_string(),
        Finding::InstallHeadingOnly => {
            "Add the install command (e.g. npm install) to the installation section".to_string()
        }
        Finding::InstallCommandOnly => {
            "Move the install command under an Installation heading".to_string()
        }

        Finding::NoUsageExamples => "No usage examples detected; add a code example".to_string(),
        Finding::UnlabelledExamples { blocks } => format!(
            "Place the {} code block(s) under a Usage or Examples heading",
            blocks
        ),
        Finding::FewUsageExamples { examples, wanted } => format!(
            "Add more usage examples ({} found, {} recommended)",
            examples, wanted
        ),

        Finding::SymbolCoverage { missing, .. } if !missing.is_empty() => {
            let listed = missing
                .iter()
                .take(MAX_LISTED_SYMBOLS)
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            let rest = missing.len().saturating_sub(MAX_LISTED_SYMBOLS);
            let suffix = if rest > 0 {
                format!(" and {} more", rest)
            } else {
                String::new()
            };
            format!(
                "Document {} undocumented public symbol{}: {}{}",
                missing.len(),
                if missing.len() == 1 { "" } else { "s" },
                listed,
                suffix
            )
        }
        Finding::NoApiSection => format!("Add a section covering {}", score.label.to_lowercase()),
        Finding::ApiSectionSparse => {
            "Expand the API section with signatures, sub-headings or examples".to_string()
        }

        Finding::Layout {
            headings,
            hierarchy_ok,
            body_structure,
            words,
            target_words,
        } => {
            let mut fixes = Vec::new();
            if *headings < 3 {
                fixes.push("add section headings".to_string());
            }
            if !hierarchy_ok {
                fixes.push("start at H1 or H2 without skipping heading levels".to_string());
            }
            if !body_structure {
                fixes.push("use several paragraphs plus lists or code blocks".to_string());
            }
            if words < target_words {
                fixes.push(format!("expand the content ({}/{} words)", words, target_words));
            }
            if fixes.is_empty() {
                "Improve the document structure".to_string()
            } else {
                let mut message = fixes.join("; ");
                message[..1].make_ascii_uppercase();
                message
            }
        }

        // Findings that only occur on passing scores under the default threshold
        Finding::OverviewPresent { .. }
        | Finding::InstallationComplete
        | Finding::UsageExamplesComplete { .. }
        | Finding::SymbolCoverage { .. }
        | Finding::ApiSectionPresent => format!("Improve {}", score.label.to_lowercase()),
    }
}
