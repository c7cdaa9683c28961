//! Code Analysis
//!
//! This module turns one JavaScript or TypeScript source file into a
//! `CodeAnalysis`:
//! - AST parsing with partial-tree salvage
//! - Structural extraction (functions, classes, imports, exports)
//! - Complexity and maintainability metrics

pub mod analyzer;
pub mod extractor;
pub mod metrics;
pub mod parser;

// Re-export main types
pub use analyzer::CodeAnalyzer;
pub use extractor::{ExtractedStructure, StructureExtractor};
pub use metrics::{ComplexityTracker, LineMetrics, maintainability_index, scan_lines};
pub use parser::{
    JavaScriptParser, LanguageParser, ParseLimits, ParseOutcome, ParserRegistry, SyntaxTree,
    parse_source,
};

use docsmith_shared::{CodeAnalysis, Language};

/// Analyze one source text with the default configuration
pub fn parse(source: &str, language: Language) -> CodeAnalysis {
    CodeAnalyzer::default().analyze_source(source, language)
}

/// Code complexity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ComplexityLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl ComplexityLevel {
    /// Convert from a cyclomatic complexity value
    pub fn from_complexity(complexity: usize) -> Self {
        match complexity {
            c if c < 5 => ComplexityLevel::Low,
            c if c < 10 => ComplexityLevel::Medium,
            c if c < 20 => ComplexityLevel::High,
            _ => ComplexityLevel::VeryHigh,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComplexityLevel::Low => "low",
            ComplexityLevel::Medium => "medium",
            ComplexityLevel::High => "high",
            ComplexityLevel::VeryHigh => "very high",
        }
    }
}
