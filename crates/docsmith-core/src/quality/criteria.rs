//! The five scoring criteria.
//!
//! Each criterion is a pure function of the outline, the raw text, the
//! optional code analysis and the scoring configuration.

use super::document::{Block, BlockKind, DocumentOutline, count_words};
use docsmith_shared::{CodeAnalysis, Finding, ScoringConfig};
use regex::Regex;
use std::sync::OnceLock;

/// Everything a criterion may look at
#[derive(Debug, Clone, Copy)]
pub struct CriterionInput<'a> {
    pub outline: &'a DocumentOutline,
    pub text: &'a str,
    pub analysis: Option<&'a CodeAnalysis>,
    pub config: &'a ScoringConfig,
}

impl<'a> CriterionInput<'a> {
    /// Public symbols of a usable analysis
    fn symbols(&self) -> Vec<&'a str> {
        match self.analysis {
            Some(analysis) if analysis.is_usable() => analysis.public_symbols(),
            _ => Vec::new(),
        }
    }
}

fn regex_overview_heading() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(overview|about|description|introduction|what is)\b").unwrap()
    })
}

fn regex_install_heading() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(install|installation|installing|setup|set up|getting started|quick ?start|requirements|prerequisites)\b")
            .unwrap()
    })
}

fn regex_install_command() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?m)^\s*(?:\$\s*)?(?:sudo\s+)?(?:npm\s+(?:install|i|add|ci)|yarn(?:\s+(?:add|install|global\s+add))?|pnpm\s+(?:add|install|i)|bun\s+(?:add|install|i)|pipx?\s+install|pip3\s+install|poetry\s+(?:add|install)|cargo\s+(?:add|install)|go\s+(?:get|install)|gem\s+install|composer\s+(?:require|install)|brew\s+install|apt(?:-get)?\s+install|dotnet\s+add|git\s+clone)\b",
        )
        .unwrap()
    })
}

fn regex_usage_heading() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(usage|examples?|how to use|quick ?start|tutorial|demo)\b").unwrap()
    })
}

fn regex_api_heading() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(api|reference|methods|functions|endpoints|classes|interfaces?|jsdoc|parameters|props)\b")
            .unwrap()
    })
}

fn is_install_heading(text: &str) -> bool {
    regex_install_heading().is_match(text)
}

fn is_usage_heading(text: &str) -> bool {
    regex_usage_heading().is_match(text)
}

fn has_install_command(text: &str) -> bool {
    regex_install_command().is_match(text)
}

/// A block made only of install commands is setup, not an example
fn is_install_block(block: &Block) -> bool {
    let mut lines = block.text.lines().filter(|line| !line.trim().is_empty()).peekable();
    lines.peek().is_some() && lines.all(has_install_command)
}

fn normalized_words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Whether `name` occurs in `text` delimited by non-identifier characters
pub fn mentions(text: &str, name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    let is_ident = |c: char| c.is_ascii_alphanumeric() || c == '_' || c == '$';

    text.match_indices(name).any(|(start, _)| {
        let before = text[..start].chars().next_back();
        let after = text[start + name.len()..].chars().next();
        !before.is_some_and(is_ident) && !after.is_some_and(is_ident)
    })
}

/// Overview/Description, max 20
pub fn overview(input: &CriterionInput<'_>) -> (u32, Finding) {
    let outline = input.outline;

    // Prose after an optional leading H1 and before the next heading
    let leading_title = outline
        .headings
        .first()
        .filter(|heading| heading.level == 1)
        .filter(|_| outline.blocks.first().is_none_or(|block| block.section.is_some()));
    let intro_section = leading_title.map(|_| 0);
    let intro: Vec<&str> = outline
        .paragraphs()
        .filter(|block| block.section == intro_section)
        .map(|block| block.text.as_str())
        .collect();
    let intro_text = intro.join(" ");

    let section_text = outline
        .headings
        .iter()
        .enumerate()
        .filter(|(_, heading)| regex_overview_heading().is_match(&heading.text))
        .map(|(index, _)| {
            outline
                .section_blocks(index)
                .filter(|block| !block.is_code())
                .map(|block| block.text.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .max_by_key(|text| count_words(text))
        .unwrap_or_default();

    let text = if count_words(&section_text) > count_words(&intro_text) {
        section_text
    } else {
        intro_text
    };
    let words = count_words(&text);

    if words == 0 {
        return (0, Finding::NoOverview);
    }
    if let Some(title) = outline.headings.first()
        && normalized_words(&text) == normalized_words(&title.text)
    {
        return (0, Finding::TitleEcho);
    }

    let config = input.config;
    if words < config.overview_partial_words {
        (
            6,
            Finding::ShortOverview {
                words,
                wanted: config.overview_full_words,
            },
        )
    } else if words < config.overview_full_words {
        (
            12,
            Finding::ShortOverview {
                words,
                wanted: config.overview_full_words,
            },
        )
    } else {
        (20, Finding::OverviewPresent { words })
    }
}

/// Installation Instructions, max 15
pub fn installation(input: &CriterionInput<'_>) -> (u32, Finding) {
    let outline = input.outline;

    let heading = outline.headings.iter().any(|h| is_install_heading(&h.text));
    let command_blocks: Vec<&Block> = outline
        .blocks
        .iter()
        .filter(|block| {
            if block.is_code() {
                has_install_command(&block.text)
            } else {
                block.inline_code.iter().any(|code| has_install_command(code))
            }
        })
        .collect();
    let command_in_section = command_blocks
        .iter()
        .any(|block| outline.under(block.section, is_install_heading));

    match (heading, !command_blocks.is_empty()) {
        _ if command_in_section => (15, Finding::InstallationComplete),
        (_, true) => (10, Finding::InstallCommandOnly),
        (true, false) => (7, Finding::InstallHeadingOnly),
        (false, false) => (0, Finding::NoInstallation),
    }
}

/// Usage Examples, max 20
pub fn usage_examples(input: &CriterionInput<'_>) -> (u32, Finding) {
    let outline = input.outline;

    let candidates: Vec<&Block> = outline
        .code_blocks()
        .filter(|block| !block.text.trim().is_empty() && !is_install_block(block))
        .collect();
    let examples = candidates
        .iter()
        .filter(|block| outline.under(block.section, is_usage_heading))
        .count();

    let wanted = input.config.usage_full_examples;
    match examples {
        0 => {
            let blocks = candidates.len();
            if blocks == 0 {
                (0, Finding::NoUsageExamples)
            } else {
                ((4 * blocks).min(8) as u32, Finding::UnlabelledExamples { blocks })
            }
        }
        n if n >= wanted => (20, Finding::UsageExamplesComplete { examples: n }),
        1 => (10, Finding::FewUsageExamples { examples: 1, wanted }),
        n => (15, Finding::FewUsageExamples { examples: n, wanted }),
    }
}

/// API coverage, max 25
///
/// Measured against the public symbols of the analysed source when there
/// are any, otherwise estimated from the document's API section.
pub fn api_coverage(input: &CriterionInput<'_>) -> (u32, Finding) {
    let symbols = input.symbols();
    if !symbols.is_empty() {
        let (documented, missing): (Vec<&str>, Vec<&str>) = symbols
            .iter()
            .copied()
            .partition(|symbol| mentions(input.text, symbol));

        let total = symbols.len();
        let score = (25 * documented.len() / total) as u32;
        return (
            score,
            Finding::SymbolCoverage {
                documented: documented.len(),
                total,
                missing: missing.into_iter().map(str::to_string).collect(),
            },
        );
    }

    let outline = input.outline;
    let sections: Vec<usize> = outline
        .headings
        .iter()
        .enumerate()
        .filter(|(_, heading)| regex_api_heading().is_match(&heading.text))
        .map(|(index, _)| index)
        .collect();
    if sections.is_empty() {
        return (0, Finding::NoApiSection);
    }

    let detailed = sections.iter().any(|&index| {
        let blocks: Vec<&Block> = outline.section_blocks(index).collect();
        let entries: usize = blocks
            .iter()
            .map(|block| {
                usize::from(block.kind == BlockKind::ListItem)
                    + block.inline_code.len()
            })
            .sum();
        outline.has_subheadings(index) || blocks.iter().any(|block| block.is_code()) || entries >= 3
    });

    if detailed {
        (25, Finding::ApiSectionPresent)
    } else {
        (15, Finding::ApiSectionSparse)
    }
}

/// Structure/Formatting, max 20
pub fn structure(input: &CriterionInput<'_>) -> (u32, Finding) {
    let outline = input.outline;
    let config = input.config;

    let headings = outline.headings.len();
    let heading_points: u32 = match headings {
        0 => 0,
        1 | 2 => 4,
        _ => 8,
    };

    let hierarchy_ok = outline.headings.first().is_some_and(|first| first.level <= 2)
        && outline
            .headings
            .windows(2)
            .all(|pair| pair[1].level <= pair[0].level + 1);
    let hierarchy_points = if hierarchy_ok { 6 } else { 0 };

    let paragraphs = outline.paragraphs().count();
    let has_lists_or_code = outline
        .blocks
        .iter()
        .any(|block| block.is_code() || block.kind == BlockKind::ListItem);
    let body_points = u32::from(paragraphs >= 2) * 3 + u32::from(has_lists_or_code) * 3;
    let body_structure = paragraphs >= 2 && has_lists_or_code;

    let raw = heading_points + hierarchy_points + body_points;

    let target_words = (config.structure_base_words
        + config.structure_words_per_symbol * input.symbols().len())
    .min(config.structure_max_words)
    .max(1);
    let words = outline.word_count();
    let score = (raw as usize * words.min(target_words) / target_words) as u32;

    (
        score,
        Finding::Layout {
            headings,
            hierarchy_ok,
            body_structure,
            words,
            target_words,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsmith_shared::{FunctionSignature, Language, ParseError};

    fn run(
        criterion: fn(&CriterionInput<'_>) -> (u32, Finding),
        text: &str,
        analysis: Option<&CodeAnalysis>,
    ) -> (u32, Finding) {
        let outline = DocumentOutline::parse(text);
        let config = ScoringConfig::default();
        criterion(&CriterionInput {
            outline: &outline,
            text,
            analysis,
            config: &config,
        })
    }

    fn analysis_with(names: &[&str]) -> CodeAnalysis {
        let mut analysis = CodeAnalysis::empty(Language::JavaScript);
        analysis.functions = names
            .iter()
            .map(|name| FunctionSignature {
                name: Some(name.to_string()),
                parameters: Vec::new(),
                is_async: false,
                is_generator: false,
                start_line: 1,
                end_line: 1,
                complexity: 1,
            })
            .collect();
        analysis
    }

    #[test]
    fn test_mentions_respects_identifier_boundaries() {
        assert!(mentions("Call `parse(input)` first", "parse"));
        assert!(mentions("parse", "parse"));
        assert!(!mentions("use parser instead", "parse"));
        assert!(!mentions("reparse it", "parse"));
        assert!(!mentions("$parse", "parse"));
        assert!(mentions("obj.$get()", "$get"));
    }

    #[test]
    fn test_overview_tiers() {
        let long = format!("# Tool\n\n{}\n", "word ".repeat(30));
        assert_eq!(run(overview, &long, None).0, 20);

        let medium = format!("# Tool\n\n{}\n", "word ".repeat(15));
        assert_eq!(run(overview, &medium, None).0, 12);

        assert_eq!(run(overview, "# Tool\n\nA tiny tool.\n", None).0, 6);
        assert_eq!(run(overview, "# Tool\n\n## Usage\n", None), (0, Finding::NoOverview));
        assert_eq!(run(overview, "# My Tool\n\nMy tool\n", None), (0, Finding::TitleEcho));
    }

    #[test]
    fn test_overview_section_beats_short_intro() {
        let text = format!(
            "# Tool\n\nShort.\n\n## Overview\n\n{}\n",
            "detail ".repeat(26)
        );
        assert_eq!(run(overview, &text, None).0, 20);
    }

    #[test]
    fn test_installation_tiers() {
        let full = "## Installation\n\n```bash\nnpm install x\n```\n";
        assert_eq!(run(installation, full, None), (15, Finding::InstallationComplete));

        let command_only = "## Notes\n\n```sh\npip install thing\n```\n";
        assert_eq!(run(installation, command_only, None).0, 10);

        let heading_only = "## Installation\n\nDownload the binary.\n";
        assert_eq!(run(installation, heading_only, None).0, 7);

        assert_eq!(run(installation, "# Nothing here\n", None).0, 0);
    }

    #[test]
    fn test_usage_tiers() {
        let block = "```js\nrun();\n```\n\n";
        let one = format!("## Usage\n\n{block}");
        assert_eq!(run(usage_examples, &one, None).0, 10);

        let two = format!("## Usage\n\n{block}{block}");
        assert_eq!(run(usage_examples, &two, None).0, 15);

        let three = format!("## Examples\n\n{block}{block}{block}");
        assert_eq!(run(usage_examples, &three, None).0, 20);

        let unlabelled = format!("## Notes\n\n{block}{block}{block}");
        assert_eq!(
            run(usage_examples, &unlabelled, None),
            (8, Finding::UnlabelledExamples { blocks: 3 })
        );

        let install_only = "## Quick start\n\n```sh\nnpm install x\n```\n";
        assert_eq!(run(usage_examples, install_only, None).0, 0);
    }

    #[test]
    fn test_api_coverage_floor_rounding() {
        let analysis = analysis_with(&["alpha", "beta", "gamma", "delta"]);
        let doc = "# Lib\n\nUse `alpha` and `beta`.\n";

        let (score, finding) = run(api_coverage, doc, Some(&analysis));
        assert_eq!(score, 12);
        assert_eq!(
            finding,
            Finding::SymbolCoverage {
                documented: 2,
                total: 4,
                missing: vec!["delta".to_string(), "gamma".to_string()],
            }
        );
    }

    #[test]
    fn test_api_coverage_proxy() {
        let sparse = "## API\n\nSee the source.\n";
        assert_eq!(run(api_coverage, sparse, None), (15, Finding::ApiSectionSparse));

        let detailed = "## API\n\n### render(el)\n\nRenders.\n";
        assert_eq!(run(api_coverage, detailed, None).0, 25);

        assert_eq!(run(api_coverage, "# Lib\n", None).0, 0);

        // An unusable analysis falls back to the proxy
        let failed = CodeAnalysis::failed(Language::JavaScript, ParseError::fatal("empty source", 0));
        assert_eq!(run(api_coverage, sparse, Some(&failed)).0, 15);
    }

    #[test]
    fn test_structure_scaling() {
        let words = "lorem ipsum ".repeat(70);
        let full = format!(
            "# Title\n\n{words}\n\n## Part\n\n{words}\n\n### Detail\n\n- item\n"
        );
        let (score, finding) = run(structure, &full, None);
        assert_eq!(score, 20);
        assert!(matches!(finding, Finding::Layout { hierarchy_ok: true, .. }));

        // Skipped level and too few words
        let (score, _) = run(structure, "## A\n\n#### B\n\nshort text\n", None);
        assert!(score < 4);
    }
}
