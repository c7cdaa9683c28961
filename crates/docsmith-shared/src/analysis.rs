//! Structured result of analysing one source file.
//!
//! A `CodeAnalysis` is always produced, even for input that cannot be parsed:
//! the failure is recorded in `parse_error` and every collection holds
//! whatever could be salvaged.

use crate::types::Language;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Everything extracted from a single source file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeAnalysis {
    pub language: Language,

    /// Free functions, function expressions and arrows in source order
    #[serde(default)]
    pub functions: Vec<FunctionSignature>,

    #[serde(default)]
    pub classes: Vec<ClassDescriptor>,

    #[serde(default)]
    pub imports: Vec<ImportBinding>,

    #[serde(default)]
    pub exports: Vec<ExportBinding>,

    #[serde(default)]
    pub metrics: CodeMetrics,

    #[serde(default)]
    pub parse_error: Option<ParseError>,
}

impl CodeAnalysis {
    /// An analysis with no structure and no error
    pub fn empty(language: Language) -> Self {
        Self {
            language,
            ..Default::default()
        }
    }

    /// An analysis for input that could not be parsed at all
    pub fn failed(language: Language, error: ParseError) -> Self {
        Self {
            language,
            parse_error: Some(error),
            ..Default::default()
        }
    }

    /// Whether the structural fields can be trusted (full or partial parse)
    pub fn is_usable(&self) -> bool {
        self.parse_error
            .as_ref()
            .is_none_or(|error| error.recoverable)
    }

    /// Whether the result comes from a partial parse
    pub fn is_salvaged(&self) -> bool {
        self.parse_error
            .as_ref()
            .is_some_and(|error| error.recoverable)
    }

    /// Public function and class names, deduplicated and sorted.
    ///
    /// Anonymous functions and private-convention names (`_name`, `#name`)
    /// are excluded.
    pub fn public_symbols(&self) -> Vec<&str> {
        let functions = self.functions.iter().filter_map(|f| f.name.as_deref());
        let classes = self.classes.iter().filter_map(|c| c.name.as_deref());

        functions
            .chain(classes)
            .filter(|name| !is_private_name(name))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct named bindings imported across all import statements
    pub fn distinct_imported_symbols(&self) -> BTreeSet<&str> {
        self.imports
            .iter()
            .flat_map(|import| import.imported_names.iter().map(String::as_str))
            .collect()
    }

    /// Distinct module specifiers this file depends on
    pub fn import_sources(&self) -> BTreeSet<&str> {
        self.imports.iter().map(|i| i.source.as_str()).collect()
    }

    /// Total number of class methods
    pub fn method_count(&self) -> usize {
        self.classes.iter().map(|c| c.methods.len()).sum()
    }
}

/// Private-by-convention identifiers are not part of the documented surface
pub fn is_private_name(name: &str) -> bool {
    name.starts_with('_') || name.starts_with('#')
}

/// A function outside any class body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionSignature {
    /// `None` for functions with no binding (callbacks, IIFEs)
    pub name: Option<String>,
    pub parameters: Vec<String>,
    pub is_async: bool,
    pub is_generator: bool,
    pub start_line: usize,
    pub end_line: usize,
    /// Cyclomatic complexity of this function's own body (nested functions excluded)
    pub complexity: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDescriptor {
    pub name: Option<String>,
    pub methods: Vec<MethodSignature>,
    pub start_line: usize,
    pub end_line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodSignature {
    pub name: String,
    pub kind: MethodKind,
    pub parameters: Vec<String>,
    pub is_async: bool,
    pub start_line: usize,
    pub end_line: usize,
    pub complexity: usize,
}

/// Exactly one kind per method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodKind {
    Constructor,
    Getter,
    Setter,
    Static,
    Instance,
}

impl MethodKind {
    /// Classify a class member.
    ///
    /// Precedence: a member named `constructor` always wins, then accessor
    /// syntax, then the `static` modifier.
    pub fn classify(name: &str, accessor: Option<Accessor>, is_static: bool) -> Self {
        if name == "constructor" {
            return MethodKind::Constructor;
        }
        match accessor {
            Some(Accessor::Get) => MethodKind::Getter,
            Some(Accessor::Set) => MethodKind::Setter,
            None if is_static => MethodKind::Static,
            None => MethodKind::Instance,
        }
    }
}

impl fmt::Display for MethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MethodKind::Constructor => "constructor",
            MethodKind::Getter => "getter",
            MethodKind::Setter => "setter",
            MethodKind::Static => "static",
            MethodKind::Instance => "instance",
        };
        f.write_str(label)
    }
}

/// Accessor syntax on a class member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accessor {
    Get,
    Set,
}

/// One import statement, `require` call or dynamic `import()`.
///
/// `imported_names` is empty for default, namespace and side-effect imports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportBinding {
    #[serde(default)]
    pub imported_names: BTreeSet<String>,
    pub source: String,
    #[serde(default)]
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBinding {
    pub name: String,
    pub is_default: bool,
    #[serde(default)]
    pub line: usize,
}

/// File-level metrics. Every value is finite and non-negative.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeMetrics {
    pub total_lines: usize,
    pub lines_of_code: usize,
    /// Lines holding any comment divided by total lines, in `[0, 1]`
    pub comment_ratio: f64,
    pub nesting_depth_max: usize,
    pub cyclomatic_complexity: usize,
    pub maintainability_index: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseError {
    pub message: String,
    /// 1-based line of the first error, 0 when no line applies
    pub line: usize,
    /// `true` when the structural fields hold a usable partial result
    pub recoverable: bool,
}

impl ParseError {
    pub fn fatal(message: impl Into<String>, line: usize) -> Self {
        Self {
            message: message.into(),
            line,
            recoverable: false,
        }
    }

    pub fn recoverable(message: impl Into<String>, line: usize) -> Self {
        Self {
            message: message.into(),
            line,
            recoverable: true,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line > 0 {
            write!(f, "line {}: {}", self.line, self.message)
        } else {
            f.write_str(&self.message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn function(name: Option<&str>) -> FunctionSignature {
        FunctionSignature {
            name: name.map(str::to_string),
            parameters: Vec::new(),
            is_async: false,
            is_generator: false,
            start_line: 1,
            end_line: 1,
            complexity: 1,
        }
    }

    #[test]
    fn test_public_symbols_filters_private_and_anonymous() {
        let mut analysis = CodeAnalysis::empty(Language::JavaScript);
        analysis.functions = vec![
            function(Some("render")),
            function(Some("_internal")),
            function(None),
            function(Some("render")),
        ];
        analysis.classes.push(ClassDescriptor {
            name: Some("Parser".to_string()),
            methods: Vec::new(),
            start_line: 1,
            end_line: 2,
        });

        assert_eq!(analysis.public_symbols(), vec!["Parser", "render"]);
    }

    #[test]
    fn test_method_kind_precedence() {
        assert_eq!(
            MethodKind::classify("constructor", None, true),
            MethodKind::Constructor
        );
        assert_eq!(
            MethodKind::classify("value", Some(Accessor::Get), true),
            MethodKind::Getter
        );
        assert_eq!(
            MethodKind::classify("value", Some(Accessor::Set), false),
            MethodKind::Setter
        );
        assert_eq!(MethodKind::classify("create", None, true), MethodKind::Static);
        assert_eq!(MethodKind::classify("run", None, false), MethodKind::Instance);
    }

    #[test]
    fn test_usability() {
        let clean = CodeAnalysis::empty(Language::JavaScript);
        assert!(clean.is_usable());
        assert!(!clean.is_salvaged());

        let mut partial = clean.clone();
        partial.parse_error = Some(ParseError::recoverable("Unexpected token", 4));
        assert!(partial.is_usable());
        assert!(partial.is_salvaged());

        let failed = CodeAnalysis::failed(Language::JavaScript, ParseError::fatal("empty source", 0));
        assert!(!failed.is_usable());
    }

    #[test]
    fn test_camel_case_contract() {
        let analysis = CodeAnalysis::failed(Language::TypeScript, ParseError::fatal("empty source", 0));
        let json = serde_json::to_value(&analysis).unwrap();

        assert_eq!(json["language"], "typescript");
        assert_eq!(json["functions"], serde_json::json!([]));
        assert_eq!(json["metrics"]["linesOfCode"], 0);
        assert_eq!(json["parseError"]["recoverable"], false);
    }

    #[test]
    fn test_distinct_imported_symbols() {
        let mut analysis = CodeAnalysis::empty(Language::JavaScript);
        analysis.imports = vec![
            ImportBinding {
                imported_names: ["a", "b"].iter().map(|s| s.to_string()).collect(),
                source: "./x".to_string(),
                line: 1,
            },
            ImportBinding {
                imported_names: BTreeSet::new(),
                source: "react".to_string(),
                line: 2,
            },
            ImportBinding {
                imported_names: ["b"].iter().map(|s| s.to_string()).collect(),
                source: "./y".to_string(),
                line: 3,
            },
        ];

        assert_eq!(analysis.distinct_imported_symbols().len(), 2);
        assert_eq!(analysis.import_sources().len(), 3);
    }
}
