//! Core types used throughout Docsmith

use crate::error::DocsmithError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Source languages Docsmith knows about.
///
/// Only the JavaScript grammar family is parsed; the others are recognised so
/// that they can be reported as unsupported instead of being mis-parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    JavaScript,
    TypeScript,
    Python,
    Rust,
    Go,
    Java,
    #[default]
    Unknown,
}

impl Language {
    /// Get file extensions for this language
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Language::JavaScript => &["js", "mjs", "cjs", "jsx"],
            Language::TypeScript => &["ts", "mts", "cts", "tsx"],
            Language::Python => &["py", "pyi"],
            Language::Rust => &["rs"],
            Language::Go => &["go"],
            Language::Java => &["java"],
            Language::Unknown => &[],
        }
    }

    /// Detect language from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "js" | "mjs" | "cjs" | "jsx" => Language::JavaScript,
            "ts" | "mts" | "cts" | "tsx" => Language::TypeScript,
            "py" | "pyi" => Language::Python,
            "rs" => Language::Rust,
            "go" => Language::Go,
            "java" => Language::Java,
            _ => Language::Unknown,
        }
    }

    /// Detect language from a file path
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Language::Unknown)
    }

    /// Whether the parser can build a syntax tree for this language
    pub fn is_supported(self) -> bool {
        matches!(self, Language::JavaScript | Language::TypeScript)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Python => "python",
            Language::Rust => "rust",
            Language::Go => "go",
            Language::Java => "java",
            Language::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = DocsmithError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "javascript" | "js" => Ok(Language::JavaScript),
            "typescript" | "ts" => Ok(Language::TypeScript),
            "python" | "py" => Ok(Language::Python),
            "rust" | "rs" => Ok(Language::Rust),
            "go" => Ok(Language::Go),
            "java" => Ok(Language::Java),
            "unknown" => Ok(Language::Unknown),
            other => Err(DocsmithError::InvalidInput {
                message: format!("unknown language: {}", other),
            }),
        }
    }
}

/// Documentation template a document was generated for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DocType {
    #[default]
    Readme,
    JsDoc,
    Api,
    Architecture,
}

impl DocType {
    pub const ALL: [DocType; 4] = [
        DocType::Readme,
        DocType::JsDoc,
        DocType::Api,
        DocType::Architecture,
    ];

    /// Display label of the API coverage criterion for this doc type
    pub fn api_coverage_label(self) -> &'static str {
        match self {
            DocType::Readme => "API Documentation",
            DocType::JsDoc => "JSDoc Comments",
            DocType::Api => "API Endpoints",
            DocType::Architecture => "Function Coverage",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DocType::Readme => "README",
            DocType::JsDoc => "JSDOC",
            DocType::Api => "API",
            DocType::Architecture => "ARCHITECTURE",
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocType {
    type Err = DocsmithError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "readme" => Ok(DocType::Readme),
            "jsdoc" => Ok(DocType::JsDoc),
            "api" => Ok(DocType::Api),
            "architecture" => Ok(DocType::Architecture),
            other => Err(DocsmithError::InvalidInput {
                message: format!("unknown documentation type: {}", other),
            }),
        }
    }
}

/// LLM provider identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    #[default]
    Ollama,
    OpenAi,
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderId::Ollama => write!(f, "ollama"),
            ProviderId::OpenAi => write!(f, "openai"),
        }
    }
}

impl FromStr for ProviderId {
    type Err = DocsmithError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(ProviderId::Ollama),
            "openai" => Ok(ProviderId::OpenAi),
            other => Err(DocsmithError::InvalidInput {
                message: format!("unknown provider: {}", other),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_detection() {
        assert_eq!(Language::from_extension("JS"), Language::JavaScript);
        assert_eq!(Language::from_extension("tsx"), Language::TypeScript);
        assert_eq!(Language::from_extension("py"), Language::Python);
        assert_eq!(Language::from_extension("txt"), Language::Unknown);
        assert_eq!(
            Language::from_path(Path::new("src/index.mjs")),
            Language::JavaScript
        );
        assert_eq!(Language::from_path(Path::new("Makefile")), Language::Unknown);
    }

    #[test]
    fn test_language_support() {
        assert!(Language::JavaScript.is_supported());
        assert!(Language::TypeScript.is_supported());
        assert!(!Language::Python.is_supported());
        assert!(!Language::Unknown.is_supported());
    }

    #[test]
    fn test_doc_type_labels() {
        assert_eq!(DocType::Readme.api_coverage_label(), "API Documentation");
        assert_eq!(DocType::JsDoc.api_coverage_label(), "JSDoc Comments");
        assert_eq!(DocType::Api.api_coverage_label(), "API Endpoints");
        assert_eq!(DocType::Architecture.api_coverage_label(), "Function Coverage");
        assert_eq!("jsdoc".parse::<DocType>().unwrap(), DocType::JsDoc);
        assert!("manual".parse::<DocType>().is_err());
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&DocType::Architecture).unwrap(),
            "\"ARCHITECTURE\""
        );
        assert_eq!(
            serde_json::to_string(&Language::TypeScript).unwrap(),
            "\"typescript\""
        );
        assert_eq!(serde_json::to_string(&ProviderId::OpenAi).unwrap(), "\"openai\"");
    }
}
