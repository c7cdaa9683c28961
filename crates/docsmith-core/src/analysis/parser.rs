//! JavaScript / TypeScript Parsing
//!
//! This module turns source text into an oxc syntax tree:
//! - Pre-parse guards (empty, binary, oversized input, deep nesting, long operator chains)
//! - A single clean parse for valid files
//! - Salvage of partial trees around fatal syntax errors
//! - The `LanguageParser` trait and registry used by the analyzer

use super::analyzer::assemble;
use super::metrics::{bracket_overflow, operator_chain_overflow};
use docsmith_shared::{AnalysisConfig, CodeAnalysis, Language, ParseError};
use oxc_allocator::Allocator;
use oxc_ast::ast::Program;
use oxc_parser::{Parser, ParserReturn};
use oxc_span::SourceType;
use std::collections::HashMap;
use tracing::debug;

/// Share of control characters above which input is treated as binary
const BINARY_CONTROL_RATIO: f64 = 0.10;

/// Limits applied before and during parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseLimits {
    pub max_source_bytes: usize,
    pub max_nesting_depth: usize,
    pub max_operator_chain: usize,
    pub max_salvage_attempts: usize,
}

impl From<&AnalysisConfig> for ParseLimits {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            max_source_bytes: config.max_source_bytes,
            max_nesting_depth: config.max_nesting_depth,
            max_operator_chain: config.max_operator_chain,
            max_salvage_attempts: config.max_salvage_attempts,
        }
    }
}

impl Default for ParseLimits {
    fn default() -> Self {
        Self::from(&AnalysisConfig::default())
    }
}

/// A parsed region of the file. `offset` is the byte position of the
/// region's first character in the full source.
pub struct ParsedChunk<'a> {
    pub program: Program<'a>,
    pub offset: usize,
}

/// One or more parsed regions, in source order.
///
/// A clean parse yields one chunk covering the whole file; salvage may yield
/// several disjoint chunks.
#[derive(Default)]
pub struct SyntaxTree<'a> {
    pub chunks: Vec<ParsedChunk<'a>>,
}

impl<'a> SyntaxTree<'a> {
    pub fn is_empty(&self) -> bool {
        self.statement_count() == 0
    }

    /// Top-level statements across all chunks
    pub fn statement_count(&self) -> usize {
        self.chunks.iter().map(|c| c.program.body.len()).sum()
    }
}

/// Result of [`parse_source`]
pub struct ParseOutcome<'a> {
    pub tree: SyntaxTree<'a>,
    pub error: Option<ParseError>,
    /// The input was refused before reaching the parser
    pub rejected: bool,
}

impl<'a> ParseOutcome<'a> {
    fn rejected(message: impl Into<String>, line: usize) -> Self {
        Self {
            tree: SyntaxTree::default(),
            error: Some(ParseError::fatal(message, line)),
            rejected: true,
        }
    }
}

/// Byte offset to 1-based line lookups
#[derive(Debug, Clone)]
pub struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { starts }
    }

    /// 1-based line containing `offset`
    pub fn line(&self, offset: usize) -> usize {
        self.starts.partition_point(|&start| start <= offset).max(1)
    }

    /// Byte offset where the line containing `offset` begins
    pub fn line_start(&self, offset: usize) -> usize {
        self.starts[self.line(offset) - 1]
    }

    /// Starts of lines that can begin a top-level statement: column 0,
    /// not blank, not a closing bracket.
    fn cut_points(&self, source: &str) -> Vec<usize> {
        self.starts
            .iter()
            .copied()
            .filter(|&start| {
                source[start..]
                    .chars()
                    .next()
                    .is_some_and(|c| !c.is_whitespace() && !matches!(c, '}' | ')' | ']'))
            })
            .collect()
    }
}

fn source_type(language: Language) -> Option<SourceType> {
    match language {
        Language::JavaScript => Some(SourceType::default().with_module(true).with_jsx(true)),
        Language::TypeScript => Some(SourceType::default().with_module(true).with_typescript(true)),
        _ => None,
    }
}

fn looks_binary(source: &str) -> bool {
    if source.contains('\0') {
        return true;
    }
    let mut total = 0usize;
    let mut suspicious = 0usize;
    for c in source.chars() {
        total += 1;
        if c == char::REPLACEMENT_CHARACTER || (c.is_control() && !matches!(c, '\n' | '\r' | '\t' | '\x0c')) {
            suspicious += 1;
        }
    }
    total > 0 && suspicious as f64 / total as f64 > BINARY_CONTROL_RATIO
}

/// First diagnostic of a parse as (message, absolute byte offset)
fn first_error(ret: &ParserReturn<'_>, base: usize) -> Option<(String, usize)> {
    ret.errors.first().map(|err| {
        let offset = err
            .labels
            .as_ref()
            .and_then(|labels| labels.first())
            .map(|label| label.offset())
            .unwrap_or(0);
        (err.to_string(), base + offset)
    })
}

/// Parse `source` into a syntax tree, salvaging what is possible.
///
/// Never fails: problems are reported in [`ParseOutcome::error`].
pub fn parse_source<'a>(
    allocator: &'a Allocator,
    source: &'a str,
    language: Language,
    limits: &ParseLimits,
) -> ParseOutcome<'a> {
    if source.trim().is_empty() {
        return ParseOutcome::rejected("empty source", 0);
    }
    let Some(source_type) = source_type(language) else {
        return ParseOutcome::rejected(format!("unsupported language: {language}"), 0);
    };
    if source.len() > limits.max_source_bytes {
        return ParseOutcome::rejected(
            format!(
                "source exceeds {} bytes ({} bytes)",
                limits.max_source_bytes,
                source.len()
            ),
            0,
        );
    }
    if looks_binary(source) {
        return ParseOutcome::rejected("binary input", 0);
    }
    if let Some(line) = bracket_overflow(source, limits.max_nesting_depth) {
        return ParseOutcome::rejected(
            format!("nesting deeper than {} levels", limits.max_nesting_depth),
            line,
        );
    }
    if let Some(line) = operator_chain_overflow(source, limits.max_operator_chain) {
        return ParseOutcome::rejected(
            format!("expression chains more than {} operators", limits.max_operator_chain),
            line,
        );
    }

    let ret = Parser::new(allocator, source, source_type).parse();
    let index = LineIndex::new(source);

    let Some((message, offset)) = first_error(&ret, 0) else {
        return ParseOutcome {
            tree: SyntaxTree {
                chunks: vec![ParsedChunk {
                    program: ret.program,
                    offset: 0,
                }],
            },
            error: None,
            rejected: false,
        };
    };
    let line = index.line(offset);

    if !ret.panicked {
        debug!(errors = ret.errors.len(), "Parsed with recoverable diagnostics");
        let recoverable = !ret.program.body.is_empty();
        let error = if recoverable {
            ParseError::recoverable(message, line)
        } else {
            ParseError::fatal(message, line)
        };
        return ParseOutcome {
            tree: SyntaxTree {
                chunks: vec![ParsedChunk {
                    program: ret.program,
                    offset: 0,
                }],
            },
            error: Some(error),
            rejected: false,
        };
    }

    let mut salvager = Salvager {
        allocator,
        source,
        source_type,
        cuts: index.cut_points(source),
        index: &index,
        budget: limits.max_salvage_attempts,
        chunks: Vec::new(),
    };
    salvager.run(offset);

    let tree = SyntaxTree {
        chunks: salvager.chunks,
    };
    debug!(
        chunks = tree.chunks.len(),
        statements = tree.statement_count(),
        "Salvaged partial syntax tree"
    );

    if tree.is_empty() {
        ParseOutcome {
            tree: SyntaxTree::default(),
            error: Some(ParseError::fatal(message, line)),
            rejected: false,
        }
    } else {
        ParseOutcome {
            tree,
            error: Some(ParseError::recoverable(message, line)),
            rejected: false,
        }
    }
}

/// Re-parses the regions around fatal errors within a fixed budget
struct Salvager<'a, 'i> {
    allocator: &'a Allocator,
    source: &'a str,
    source_type: SourceType,
    cuts: Vec<usize>,
    index: &'i LineIndex,
    budget: usize,
    chunks: Vec<ParsedChunk<'a>>,
}

impl<'a, 'i> Salvager<'a, 'i> {
    fn parse_slice(&mut self, start: usize, end: usize) -> Option<ParserReturn<'a>> {
        if self.budget == 0 {
            return None;
        }
        self.budget -= 1;
        Some(Parser::new(self.allocator, &self.source[start..end], self.source_type).parse())
    }

    fn keep(&mut self, program: Program<'a>, offset: usize) {
        if !program.body.is_empty() {
            self.chunks.push(ParsedChunk { program, offset });
        }
    }

    fn run(&mut self, initial_error: usize) {
        let mut start = 0;
        let mut error_offset = initial_error;

        loop {
            let error_line = self.index.line_start(error_offset).max(start);

            // Longest clean prefix of [start, error line)
            let prefix_cuts: Vec<usize> = self
                .cuts
                .iter()
                .rev()
                .copied()
                .filter(|&cut| cut > start && cut <= error_line)
                .collect();
            for cut in prefix_cuts {
                let Some(ret) = self.parse_slice(start, cut) else {
                    return;
                };
                if !ret.panicked && ret.errors.is_empty() {
                    self.keep(ret.program, start);
                    break;
                }
            }

            // Resume at the next statement start after the error line
            let Some(next) = self.cuts.iter().copied().find(|&cut| cut > error_line) else {
                return;
            };
            let Some(ret) = self.parse_slice(next, self.source.len()) else {
                return;
            };
            if !ret.panicked {
                self.keep(ret.program, next);
                return;
            }
            match first_error(&ret, next) {
                Some((_, offset)) => error_offset = offset,
                None => return,
            }
            start = next;
        }
    }
}

/// Language parser trait
pub trait LanguageParser: Send + Sync {
    /// Parse and analyse source text. Never fails.
    fn parse(&self, content: &str) -> CodeAnalysis;

    /// Get supported language
    fn language(&self) -> Language;
}

/// oxc-backed parser for JavaScript and TypeScript
pub struct JavaScriptParser {
    language: Language,
    config: AnalysisConfig,
}

impl JavaScriptParser {
    pub fn new(language: Language, config: AnalysisConfig) -> Self {
        Self { language, config }
    }
}

impl LanguageParser for JavaScriptParser {
    fn parse(&self, content: &str) -> CodeAnalysis {
        assemble(content, self.language, &self.config)
    }

    fn language(&self) -> Language {
        self.language
    }
}

/// Parser registry for managing language parsers
pub struct ParserRegistry {
    parsers: HashMap<Language, Box<dyn LanguageParser>>,
}

impl ParserRegistry {
    /// Create a registry with parsers for every supported language
    pub fn new(config: &AnalysisConfig) -> Self {
        let mut parsers: HashMap<Language, Box<dyn LanguageParser>> = HashMap::new();

        for language in [Language::JavaScript, Language::TypeScript] {
            parsers.insert(
                language,
                Box::new(JavaScriptParser::new(language, config.clone())),
            );
        }

        Self { parsers }
    }

    /// Get parser for a specific language
    pub fn get_parser(&self, language: Language) -> Option<&dyn LanguageParser> {
        self.parsers.get(&language).map(|p| p.as_ref())
    }

    /// Get all supported languages
    pub fn supported_languages(&self) -> Vec<Language> {
        let mut languages: Vec<Language> = self.parsers.keys().copied().collect();
        languages.sort_by_key(|l| l.as_str());
        languages
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new(&AnalysisConfig::default())
    }
}
