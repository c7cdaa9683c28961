//! # Docsmith Core
//!
//! Core engine for Docsmith - documentation generation and quality scoring
//!
//! This crate provides the building blocks of the Docsmith pipeline:
//! - JavaScript and TypeScript source analysis
//! - Markdown documentation scoring and improvement suggestions
//! - Prompt construction and LLM provider management
//! - Configuration discovery

pub mod ai;
pub mod analysis;
pub mod config;
pub mod engine;
pub mod quality;
pub mod template;

// Re-export commonly used types
pub use docsmith_shared::*;

pub use ai::{LlmProvider, ProviderFactory};
pub use analysis::{CodeAnalyzer, parse};
pub use config::ConfigManager;
pub use engine::{DocumentationService, GeneratedDocumentation};
pub use quality::{QualityScorer, score, suggestions};
pub use template::PromptBuilder;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Main facade for Docsmith
///
/// Bundles the analyzer and scorer built from one configuration. Generation
/// needs an LLM provider and is created on demand, so analysing and scoring
/// work offline.
pub struct Docsmith {
    config: DocsmithConfig,
    analyzer: CodeAnalyzer,
    scorer: QualityScorer,
}

impl Docsmith {
    /// Create a new instance with default configuration
    pub fn new() -> Self {
        Self::build(DocsmithConfig::default())
    }

    /// Create a new instance with custom configuration
    pub fn with_config(config: DocsmithConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: DocsmithConfig) -> Self {
        Self {
            analyzer: CodeAnalyzer::new(config.analysis.clone()),
            scorer: QualityScorer::new(config.scoring.clone()),
            config,
        }
    }

    /// Get current configuration
    pub fn config(&self) -> &DocsmithConfig {
        &self.config
    }

    pub fn analyzer(&self) -> &CodeAnalyzer {
        &self.analyzer
    }

    /// Analyze a source text
    pub fn analyze(&self, source: &str, language: Language) -> CodeAnalysis {
        self.analyzer.analyze_source(source, language)
    }

    /// Score a document, optionally against the analysis of its source
    pub fn score(
        &self,
        doc: &str,
        doc_type: DocType,
        analysis: Option<&CodeAnalysis>,
    ) -> ScoreBreakdown {
        self.scorer.score(doc, doc_type, analysis)
    }

    /// Score a document and derive its suggestions in one go
    pub fn review(
        &self,
        doc: &str,
        doc_type: DocType,
        analysis: Option<&CodeAnalysis>,
    ) -> (ScoreBreakdown, Vec<Suggestion>) {
        let breakdown = self.score(doc, doc_type, analysis);
        let suggestions = suggestions(&breakdown);
        (breakdown, suggestions)
    }

    /// Documentation service using the configured provider
    pub fn documentation_service(&self) -> Result<DocumentationService> {
        DocumentationService::from_config(&self.config)
    }
}

impl Default for Docsmith {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_docsmith_creation() {
        let docsmith = Docsmith::new();
        assert_eq!(docsmith.config().scoring.pass_percent, 70);
        assert!(docsmith.analyzer().supported_languages().contains(&Language::TypeScript));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = DocsmithConfig::default();
        config.scoring.pass_percent = 0;
        assert!(Docsmith::with_config(config).is_err());
    }

    #[test]
    fn test_analyze_then_review() {
        let docsmith = Docsmith::new();
        let analysis = docsmith.analyze(
            "export function greet(name) {\n  return `hi ${name}`;\n}\n",
            Language::JavaScript,
        );
        assert_eq!(analysis.exports.len(), 1);
        assert_eq!(analysis.exports[0].name, "greet");

        let (breakdown, suggestions) = docsmith.review(
            "# greet\n\n## API\n\n`greet(name)` returns a greeting.\n",
            DocType::Readme,
            Some(&analysis),
        );
        assert_eq!(breakdown.score_of(Criterion::ApiCoverage), 25);
        assert_eq!(breakdown.score_of(Criterion::Installation), 0);
        assert_eq!(suggestions.len(), Criterion::ALL.len());
    }

    #[test]
    fn test_facade_matches_free_functions() {
        let docsmith = Docsmith::new();
        let source = "export const answer = () => 42;\n";
        let doc = "# Answer\n\nReturns the answer.\n";

        let analysis = docsmith.analyze(source, Language::JavaScript);
        assert_eq!(analysis, parse(source, Language::JavaScript));
        assert_eq!(
            docsmith.score(doc, DocType::Readme, Some(&analysis)),
            score(doc, DocType::Readme, Some(&analysis))
        );
    }
}
