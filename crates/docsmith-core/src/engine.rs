//! Documentation pipeline that orchestrates all Docsmith components
//!
//! `analyze → prompt → generate → score → suggestions`

use crate::ai::{BoxedProvider, GenerationOptions, HealthStatus, ProviderFactory, RateLimiter};
use crate::analysis::CodeAnalyzer;
use crate::quality::{QualityScorer, suggestions};
use crate::template::PromptBuilder;
use docsmith_shared::{
    CodeAnalysis, DocType, DocsmithConfig, DocsmithError, Language, Result, ScoreBreakdown,
    Suggestion,
};
use serde::Serialize;
use std::path::Path;
use tracing::{info, instrument, warn};

/// Instruction sent alongside every prompt
const SYSTEM_PROMPT: &str =
    "You write accurate technical documentation in GitHub-flavoured markdown.";

/// Everything produced for one source file
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedDocumentation {
    pub file_name: String,
    pub doc_type: DocType,
    pub analysis: CodeAnalysis,
    pub document: String,
    pub breakdown: ScoreBreakdown,
    pub suggestions: Vec<Suggestion>,
}

/// Runs the documentation pipeline for single files.
///
/// Owns the provider and its request budget; nothing is shared between
/// service instances.
pub struct DocumentationService {
    analyzer: CodeAnalyzer,
    scorer: QualityScorer,
    prompts: PromptBuilder,
    provider: BoxedProvider,
    limiter: RateLimiter,
    options: GenerationOptions,
}

impl DocumentationService {
    /// Build the service with the provider named in the configuration
    #[instrument(skip(config))]
    pub fn from_config(config: &DocsmithConfig) -> Result<Self> {
        let provider = ProviderFactory::create(&config.llm)?;
        Self::with_provider(config, provider)
    }

    /// Build the service around an existing provider
    pub fn with_provider(config: &DocsmithConfig, provider: BoxedProvider) -> Result<Self> {
        config.validate()?;

        info!(
            provider = provider.name(),
            model = %provider.model(),
            "Initializing documentation service"
        );

        Ok(Self {
            analyzer: CodeAnalyzer::new(config.analysis.clone()),
            scorer: QualityScorer::new(config.scoring.clone()),
            prompts: PromptBuilder::new(config.llm.max_prompt_source_chars)?,
            provider,
            limiter: RateLimiter::per_minute(config.llm.requests_per_minute),
            options: GenerationOptions {
                system: Some(SYSTEM_PROMPT.to_string()),
                ..GenerationOptions::from(&config.llm)
            },
        })
    }

    pub fn analyzer(&self) -> &CodeAnalyzer {
        &self.analyzer
    }

    pub fn scorer(&self) -> &QualityScorer {
        &self.scorer
    }

    pub fn provider(&self) -> &BoxedProvider {
        &self.provider
    }

    pub async fn health_check(&self) -> Result<HealthStatus> {
        self.provider.health_check().await
    }

    /// Generate and score documentation for one source text
    #[instrument(skip(self, source), fields(bytes = source.len()))]
    pub async fn generate(
        &self,
        file_name: &str,
        source: &str,
        language: Language,
        doc_type: DocType,
    ) -> Result<GeneratedDocumentation> {
        if source.trim().is_empty() {
            return Err(DocsmithError::InvalidInput {
                message: format!("{} is empty", file_name),
            });
        }

        let analysis = self.analyzer.analyze_source(source, language);
        if let Some(error) = &analysis.parse_error {
            warn!(
                line = error.line,
                recoverable = error.recoverable,
                "Generating from an incomplete analysis: {}",
                error.message
            );
        }

        let prompt = self.prompts.build(file_name, source, &analysis, doc_type)?;

        self.limiter.acquire().await;
        let response = self.provider.generate(&prompt, &self.options).await?;
        let document = strip_markdown_fence(&response).to_string();

        let breakdown = self.scorer.score(&document, doc_type, Some(&analysis));
        let suggestions = suggestions(&breakdown);
        info!(
            total = breakdown.total(),
            grade = %breakdown.grade(),
            "Documentation generated"
        );

        Ok(GeneratedDocumentation {
            file_name: file_name.to_string(),
            doc_type,
            analysis,
            document,
            breakdown,
            suggestions,
        })
    }

    /// Read a file and generate documentation for it
    pub async fn generate_file(&self, path: &Path, doc_type: DocType) -> Result<GeneratedDocumentation> {
        let bytes = tokio::fs::read(path).await?;
        let source = String::from_utf8_lossy(&bytes);
        let language = self.analyzer.detect_language(path);
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        self.generate(&file_name, &source, language, doc_type).await
    }
}

/// Drop a code fence wrapped around the whole response
pub fn strip_markdown_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some((info, body)) = rest.split_once('\n') else {
        return trimmed;
    };
    let info = info.trim();
    if !(info.is_empty() || info.eq_ignore_ascii_case("markdown") || info.eq_ignore_ascii_case("md")) {
        return trimmed;
    }
    match body.trim_end().strip_suffix("```") {
        // Inner fences must pair up, otherwise the closing fence belongs to the body
        Some(inner) if !inner.contains("\n```") || inner.matches("```").count() % 2 == 0 => {
            inner.trim()
        }
        _ => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockLlmProvider;
    use docsmith_shared::{Criterion, Grade, ProviderId, Severity};

    const SOURCE: &str = "export function add(a, b) {\n  return a + b;\n}\n";

    const GENERATED: &str = r#"```markdown
# add

A tiny arithmetic helper that adds two numbers together and returns the sum. It
has no dependencies, works in Node.js and in browsers, and is safe to call with
any numeric input including negative and floating point values.

## Installation

```bash
npm install add
```

## Usage

```js
add(1, 2);
```

## API

### add(a, b)

Returns `a + b`.
```"#;

    fn mock_provider(response: &'static str) -> MockLlmProvider {
        let mut provider = MockLlmProvider::new();
        provider.expect_name().return_const("Mock");
        provider.expect_model().returning(|| "mock-model".to_string());
        provider.expect_id().return_const(ProviderId::Ollama);
        provider
            .expect_generate()
            .withf(|prompt: &str, options: &GenerationOptions| {
                prompt.contains("`add(a, b)`") && options.system.is_some()
            })
            .times(1)
            .returning(move |_, _| Ok(response.to_string()));
        provider
    }

    #[tokio::test]
    async fn test_pipeline_scores_generated_document() {
        let service = DocumentationService::with_provider(
            &DocsmithConfig::default(),
            Box::new(mock_provider(GENERATED)),
        )
        .unwrap();

        let generated = service
            .generate("add.js", SOURCE, Language::JavaScript, DocType::Readme)
            .await
            .unwrap();

        assert!(generated.document.starts_with("# add"));
        assert!(generated.document.ends_with("Returns `a + b`."));
        assert_eq!(generated.analysis.functions.len(), 1);
        assert_eq!(generated.breakdown.score_of(Criterion::Installation), 15);
        assert_eq!(generated.breakdown.score_of(Criterion::ApiCoverage), 25);
        assert_eq!(generated.suggestions.len(), 5);
        assert_eq!(generated.suggestions[1].severity, Severity::Pass);
        assert!(generated.breakdown.grade() <= Grade::C);
    }

    #[tokio::test]
    async fn test_empty_source_is_rejected_before_generation() {
        let mut provider = MockLlmProvider::new();
        provider.expect_name().return_const("Mock");
        provider.expect_model().returning(|| "mock-model".to_string());
        provider.expect_generate().never();

        let service =
            DocumentationService::with_provider(&DocsmithConfig::default(), Box::new(provider))
                .unwrap();

        let result = service
            .generate("empty.js", "  \n", Language::JavaScript, DocType::Readme)
            .await;
        assert!(matches!(result, Err(DocsmithError::InvalidInput { .. })));
    }

    #[tokio::test]
    async fn test_provider_errors_propagate() {
        let mut provider = MockLlmProvider::new();
        provider.expect_name().return_const("Mock");
        provider.expect_model().returning(|| "mock-model".to_string());
        provider.expect_generate().returning(|_, _| {
            Err(DocsmithError::Timeout {
                operation: "ollama request".to_string(),
            })
        });

        let service =
            DocumentationService::with_provider(&DocsmithConfig::default(), Box::new(provider))
                .unwrap();

        let result = service
            .generate("add.js", SOURCE, Language::JavaScript, DocType::Api)
            .await;
        assert!(matches!(result, Err(DocsmithError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_zero_rate_limit_builds_service() {
        let mut config = DocsmithConfig::default();
        config.llm.requests_per_minute = 0;

        let service =
            DocumentationService::with_provider(&config, Box::new(mock_provider(GENERATED)))
                .unwrap();
        let generated = service
            .generate("add.js", SOURCE, Language::JavaScript, DocType::Readme)
            .await
            .unwrap();
        assert_eq!(generated.analysis.functions.len(), 1);
    }

    #[tokio::test]
    async fn test_generate_file_detects_language() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("add.ts");
        std::fs::write(&path, SOURCE).unwrap();

        let service = DocumentationService::with_provider(
            &DocsmithConfig::default(),
            Box::new(mock_provider("# add\n\nAdds numbers.\n")),
        )
        .unwrap();

        let generated = service.generate_file(&path, DocType::JsDoc).await.unwrap();
        assert_eq!(generated.file_name, "add.ts");
        assert_eq!(generated.analysis.language, Language::TypeScript);
        assert_eq!(generated.document, "# add\n\nAdds numbers.");
    }

    #[test]
    fn test_strip_markdown_fence() {
        assert_eq!(strip_markdown_fence("```markdown\n# Title\n```"), "# Title");
        assert_eq!(strip_markdown_fence("```\n# Title\n```\n"), "# Title");
        assert_eq!(strip_markdown_fence("# Title\n"), "# Title");
        // A leading code block is content, not a wrapper
        assert_eq!(
            strip_markdown_fence("```js\nrun();\n```"),
            "```js\nrun();\n```"
        );
        assert_eq!(
            strip_markdown_fence("```md\n# T\n\n```sh\nnpm i\n```\n```"),
            "# T\n\n```sh\nnpm i\n```"
        );
    }
}
