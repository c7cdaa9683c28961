//! Code Analyzer for individual files and code snippets
//!
//! This module assembles a `CodeAnalysis` from the parser, the structural
//! extractor and the metrics calculator:
//! - Single source strings (`analyze_source`)
//! - Files on disk (`analyze_file`)
//! - Batches of files analysed in parallel (`analyze_files`)

use super::extractor::StructureExtractor;
use super::metrics::{maintainability_index, scan_lines};
use super::parser::{ParseLimits, ParserRegistry, parse_source};
use docsmith_shared::{
    AnalysisConfig, CodeAnalysis, CodeMetrics, DocsmithError, Language, ParseError, Result,
};
use futures::future::join_all;
use oxc_allocator::Allocator;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use tracing::{debug, instrument, warn};

/// Stack for the parsing thread. Syntax trees recurse as deep as the input
/// nests, within the pre-parse limits.
const PARSER_STACK_BYTES: usize = 32 * 1024 * 1024;

/// Run the full pipeline for one source text.
///
/// Input refused before parsing keeps zeroed metrics; anything that reached
/// the parser gets line metrics even when nothing could be salvaged.
pub(crate) fn assemble(source: &str, language: Language, config: &AnalysisConfig) -> CodeAnalysis {
    let allocator = Allocator::default();
    let outcome = parse_source(&allocator, source, language, &ParseLimits::from(config));

    if outcome.rejected {
        return CodeAnalysis {
            language,
            parse_error: outcome.error,
            ..Default::default()
        };
    }

    let structure = StructureExtractor::new(source).extract(&outcome.tree);
    let lines = scan_lines(source);
    let comment_ratio = lines.comment_ratio();

    let metrics = CodeMetrics {
        total_lines: lines.total_lines,
        lines_of_code: lines.code_lines,
        comment_ratio,
        nesting_depth_max: structure.nesting_depth_max,
        cyclomatic_complexity: structure.cyclomatic_complexity,
        maintainability_index: maintainability_index(
            structure.cyclomatic_complexity,
            lines.code_lines,
            comment_ratio,
            &config.maintainability,
        ),
    };

    CodeAnalysis {
        language,
        functions: structure.functions,
        classes: structure.classes,
        imports: structure.imports,
        exports: structure.exports,
        metrics,
        parse_error: outcome.error,
    }
}

/// Dispatch to the registered parser on a thread of its own, turning
/// panics into parse errors
fn run_parser(registry: &ParserRegistry, source: &str, language: Language) -> CodeAnalysis {
    let Some(parser) = registry.get_parser(language) else {
        debug!("No parser registered for {}", language);
        return CodeAnalysis::failed(
            language,
            ParseError::fatal(format!("unsupported language: {language}"), 0),
        );
    };

    let joined = thread::scope(|scope| {
        thread::Builder::new()
            .name("docsmith-parse".to_string())
            .stack_size(PARSER_STACK_BYTES)
            .spawn_scoped(scope, || parser.parse(source))
            .map(|handle| handle.join())
    });

    match joined {
        Ok(Ok(analysis)) => analysis,
        Ok(Err(_)) => {
            warn!("Parser panicked on {} input", language);
            CodeAnalysis::failed(language, ParseError::fatal("internal parser failure", 0))
        }
        Err(e) => {
            warn!("Failed to start parser thread: {}", e);
            CodeAnalysis::failed(language, ParseError::fatal("internal parser failure", 0))
        }
    }
}

/// Code analyzer for individual files
pub struct CodeAnalyzer {
    config: AnalysisConfig,
    registry: Arc<ParserRegistry>,
}

impl CodeAnalyzer {
    /// Create a new code analyzer
    pub fn new(config: AnalysisConfig) -> Self {
        let registry = Arc::new(ParserRegistry::new(&config));
        Self { config, registry }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Languages with a registered parser
    pub fn supported_languages(&self) -> Vec<Language> {
        self.registry.supported_languages()
    }

    /// Language for a path, falling back to the configured default for
    /// files without a recognised extension
    pub fn detect_language(&self, path: &Path) -> Language {
        match Language::from_path(path) {
            Language::Unknown => self.config.default_language,
            language => language,
        }
    }

    /// Analyze source text. Never fails: problems are recorded in `parse_error`.
    #[instrument(skip(self, source), fields(bytes = source.len()))]
    pub fn analyze_source(&self, source: &str, language: Language) -> CodeAnalysis {
        let analysis = run_parser(&self.registry, source, language);
        debug!(
            functions = analysis.functions.len(),
            classes = analysis.classes.len(),
            salvaged = analysis.is_salvaged(),
            "Analysis complete"
        );
        analysis
    }

    /// Read and analyze a single file
    #[instrument(skip(self))]
    pub async fn analyze_file(&self, path: &Path) -> Result<CodeAnalysis> {
        let language = self.detect_language(path);
        let bytes = tokio::fs::read(path).await?;
        let source = String::from_utf8_lossy(&bytes);

        Ok(self.analyze_source(&source, language))
    }

    /// Analyze many files concurrently.
    ///
    /// Files are read asynchronously and parsed on the blocking pool, one task
    /// per file. Results come back in input order; an unreadable file fails
    /// only its own entry.
    pub async fn analyze_files(&self, paths: &[PathBuf]) -> Vec<(PathBuf, Result<CodeAnalysis>)> {
        self.analyze_files_as(paths, None).await
    }

    /// Like `analyze_files`, parsing every file as `language` when given
    #[instrument(skip(self, paths), fields(files = paths.len()))]
    pub async fn analyze_files_as(
        &self,
        paths: &[PathBuf],
        language: Option<Language>,
    ) -> Vec<(PathBuf, Result<CodeAnalysis>)> {
        let tasks = paths.iter().map(|path| {
            let path = path.clone();
            let language = language.unwrap_or_else(|| self.detect_language(&path));
            let registry = Arc::clone(&self.registry);

            async move {
                let result: Result<CodeAnalysis> = async {
                    let bytes = tokio::fs::read(&path).await?;
                    tokio::task::spawn_blocking(move || {
                        let source = String::from_utf8_lossy(&bytes);
                        run_parser(&registry, &source, language)
                    })
                    .await
                    .map_err(|e| DocsmithError::Internal {
                        message: format!("analysis task failed: {e}"),
                    })
                }
                .await;

                if let Err(e) = &result {
                    warn!("Failed to analyze {}: {}", path.display(), e);
                }
                (path, result)
            }
        });

        join_all(tasks).await
    }
}

impl Default for CodeAnalyzer {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsmith_shared::MaintainabilityWeights;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_scenario_single_function() {
        let analyzer = CodeAnalyzer::default();
        let analysis = analyzer.analyze_source(
            "function add(a, b) {\n  return a + b;\n}\n",
            Language::JavaScript,
        );

        assert!(analysis.parse_error.is_none());
        assert_eq!(analysis.functions.len(), 1);
        assert_eq!(analysis.functions[0].complexity, 1);
        assert!(analysis.classes.is_empty());
        assert_eq!(analysis.metrics.cyclomatic_complexity, 1);
        assert_eq!(analysis.metrics.total_lines, 3);
        assert_eq!(analysis.metrics.lines_of_code, 3);
        assert_eq!(analysis.metrics.nesting_depth_max, 1);
    }

    #[test]
    fn test_empty_source() {
        let analysis = CodeAnalyzer::default().analyze_source("", Language::JavaScript);

        let error = analysis.parse_error.as_ref().expect("error");
        assert!(!error.recoverable);
        assert_eq!(error.line, 0);
        assert!(analysis.functions.is_empty());
        assert_eq!(analysis.metrics, CodeMetrics::default());
    }

    #[test]
    fn test_unsupported_language() {
        let analysis = CodeAnalyzer::default().analyze_source("def f():\n    pass\n", Language::Python);

        assert_eq!(analysis.language, Language::Python);
        assert!(!analysis.is_usable());
        assert_eq!(analysis.metrics, CodeMetrics::default());
    }

    #[test]
    fn test_metrics_are_finite() {
        let source = "// helper\n/** docs */\nexport const f = (x) => x ? 1 : 2;\n";
        let analysis = CodeAnalyzer::default().analyze_source(source, Language::JavaScript);

        let metrics = &analysis.metrics;
        assert!((0.0..=1.0).contains(&metrics.comment_ratio));
        assert!(metrics.maintainability_index.is_finite());
        assert!(metrics.maintainability_index > 0.0);
        assert_eq!(metrics.cyclomatic_complexity, 2);
    }

    #[test]
    fn test_salvaged_analysis_keeps_structure() {
        let source = "export function good() {\n  return 1;\n}\n\nlet = ;\n\nexport class Later {\n  run() {}\n}\n";
        let analysis = CodeAnalyzer::default().analyze_source(source, Language::JavaScript);

        assert!(analysis.is_salvaged());
        assert!(analysis.public_symbols().contains(&"good"));
        assert!(analysis.public_symbols().contains(&"Later"));
        assert!(analysis.metrics.total_lines > 0);
    }

    #[test]
    fn test_custom_weights_change_index() {
        let source = "function f(a) { if (a) { return 1; } return 2; }\n";
        let default = CodeAnalyzer::default().analyze_source(source, Language::JavaScript);

        let heavy = CodeAnalyzer::new(AnalysisConfig {
            maintainability: MaintainabilityWeights {
                complexity: 5.0,
                ..MaintainabilityWeights::default()
            },
            ..AnalysisConfig::default()
        })
        .analyze_source(source, Language::JavaScript);

        assert!(heavy.metrics.maintainability_index < default.metrics.maintainability_index);
    }

    #[test]
    fn test_long_operator_chains_fail_cleanly() {
        let analyzer = CodeAnalyzer::default();

        let concat = format!("const s = {}'x';\n", "'x' + ".repeat(5_000));
        let analysis = analyzer.analyze_source(&concat, Language::JavaScript);
        let error = analysis.parse_error.as_ref().expect("error");
        assert!(!error.recoverable);
        assert_eq!(error.line, 1);

        let condition = format!("if ({}a) {{}}\n", "a && ".repeat(60_000));
        let analysis = analyzer.analyze_source(&condition, Language::TypeScript);
        assert!(!analysis.is_usable());
    }

    #[test]
    fn test_chain_within_limit_parses_on_parser_thread() {
        let analyzer = CodeAnalyzer::new(AnalysisConfig {
            max_operator_chain: 10_000,
            ..AnalysisConfig::default()
        });
        let source = format!("export const s = {}'x';\n", "'x' + ".repeat(1_500));
        let analysis = analyzer.analyze_source(&source, Language::JavaScript);

        assert!(analysis.parse_error.is_none());
        assert_eq!(analysis.exports[0].name, "s");
    }

    #[tokio::test]
    async fn test_long_chain_in_batch_does_not_abort() {
        let dir = TempDir::new().unwrap();
        let chained = dir.path().join("chained.js");
        std::fs::write(&chained, format!("const s = {}'x';\n", "'x' + ".repeat(5_000))).unwrap();

        let results = CodeAnalyzer::default().analyze_files(&[chained]).await;
        let analysis = results[0].1.as_ref().unwrap();
        assert!(analysis.parse_error.as_ref().is_some_and(|e| !e.recoverable));
    }

    #[tokio::test]
    async fn test_analyze_file() {
        let mut file = NamedTempFile::with_suffix(".ts").unwrap();
        writeln!(file, "export function typed(value: string): string {{ return value; }}").unwrap();

        let analysis = CodeAnalyzer::default().analyze_file(file.path()).await.unwrap();
        assert_eq!(analysis.language, Language::TypeScript);
        assert_eq!(analysis.functions[0].name.as_deref(), Some("typed"));
        assert_eq!(analysis.exports[0].name, "typed");
    }

    #[tokio::test]
    async fn test_analyze_files_in_order() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("a.js");
        let second = dir.path().join("b.mjs");
        let missing = dir.path().join("missing.js");
        std::fs::write(&first, "function one() {}\n").unwrap();
        std::fs::write(&second, "class Two {}\n").unwrap();

        let results = CodeAnalyzer::default()
            .analyze_files(&[first.clone(), missing.clone(), second.clone()])
            .await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].0, first);
        assert_eq!(results[0].1.as_ref().unwrap().functions.len(), 1);
        assert!(results[1].1.is_err());
        assert_eq!(results[2].1.as_ref().unwrap().classes.len(), 1);
    }
}
