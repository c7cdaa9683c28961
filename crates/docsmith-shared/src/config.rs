//! Configuration management for Docsmith
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `DOCSMITH__<SECTION>__<KEY>` environment variables.

use crate::error::{ConfigError, DocsmithError, Result};
use crate::types::{Language, ProviderId};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "DOCSMITH";

/// Main configuration structure for Docsmith
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocsmithConfig {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// Source analysis limits and metric weights
    pub analysis: AnalysisConfig,

    /// Documentation scoring thresholds
    pub scoring: ScoringConfig,

    /// LLM provider settings
    pub llm: LlmConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,

    /// Output format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Source analysis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Language assumed when it cannot be detected from a path
    pub default_language: Language,

    /// Larger inputs are rejected without parsing
    pub max_source_bytes: usize,

    /// Bracket nesting beyond this depth is rejected without parsing
    pub max_nesting_depth: usize,

    /// Longer operator chains in one expression are rejected without parsing
    pub max_operator_chain: usize,

    /// Upper bound on re-parses while salvaging a broken file
    pub max_salvage_attempts: usize,

    /// Maintainability index coefficients
    pub maintainability: MaintainabilityWeights,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            default_language: Language::JavaScript,
            max_source_bytes: 1024 * 1024,
            max_nesting_depth: 128,
            max_operator_chain: 1000,
            max_salvage_attempts: 32,
            maintainability: MaintainabilityWeights::default(),
        }
    }
}

/// Coefficients of the maintainability index.
///
/// All weights must be strictly positive; that is what keeps the index
/// strictly decreasing in complexity and size and increasing in comments.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaintainabilityWeights {
    /// Penalty per unit of cyclomatic complexity
    pub complexity: f64,

    /// Penalty per unit of `ln(1 + LOC)`
    pub volume: f64,

    /// Relative bonus for commented code
    pub comments: f64,
}

impl Default for MaintainabilityWeights {
    fn default() -> Self {
        Self {
            complexity: 0.23,
            volume: 16.2,
            comments: 0.5,
        }
    }
}

/// Documentation scoring configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// A criterion passes at this percentage of its maximum
    pub pass_percent: u32,

    /// Overview word count for full credit
    pub overview_full_words: usize,

    /// Overview word count for the middle partial-credit band
    pub overview_partial_words: usize,

    /// Usage examples needed for full credit
    pub usage_full_examples: usize,

    /// Word count a document needs for full structure credit
    pub structure_base_words: usize,

    /// Additional words expected per public symbol
    pub structure_words_per_symbol: usize,

    /// Cap on the expected word count
    pub structure_max_words: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            pass_percent: 70,
            overview_full_words: 25,
            overview_partial_words: 10,
            usage_full_examples: 3,
            structure_base_words: 120,
            structure_words_per_symbol: 15,
            structure_max_words: 600,
        }
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider to generate documentation with
    pub provider: ProviderId,

    /// Model to use for this provider
    pub model: String,

    /// Custom endpoint (for self-hosted models)
    pub endpoint: Option<String>,

    /// Timeout for requests in seconds
    pub timeout_seconds: u64,

    /// Maximum attempts per request
    pub max_retries: u32,

    /// Temperature settings (0.0 - 2.0)
    pub temperature: f32,

    /// Maximum tokens to generate
    pub max_tokens: usize,

    /// Client-side request budget; 0 disables it
    pub requests_per_minute: u32,

    /// Source excerpt embedded in prompts is truncated to this many characters
    pub max_prompt_source_chars: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderId::Ollama,
            model: "codellama:7b".to_string(),
            endpoint: None,
            timeout_seconds: 120,
            max_retries: 3,
            temperature: 0.2,
            max_tokens: 4096,
            requests_per_minute: 30,
            max_prompt_source_chars: 24_000,
        }
    }
}

impl DocsmithConfig {
    /// Load defaults overlaid with environment variables
    pub fn load_with_env() -> Result<Self> {
        Self::load_layered(None)
    }

    /// Load defaults, then `path` if it exists, then environment variables
    pub fn load_layered(path: Option<&Path>) -> Result<Self> {
        let defaults = ::config::Config::try_from(&DocsmithConfig::default())
            .map_err(config_error)?;

        let mut builder = ::config::Config::builder().add_source(defaults);
        if let Some(path) = path {
            builder = builder.add_source(
                ::config::File::from(path)
                    .format(::config::FileFormat::Toml)
                    .required(false),
            );
        }
        builder = builder.add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: DocsmithConfig = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(config_error)?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            }
            .into());
        }

        let content = std::fs::read_to_string(path)?;
        let config: DocsmithConfig =
            toml::from_str(&content).map_err(|e| ConfigError::InvalidFormat {
                message: e.to_string(),
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidFormat {
            message: e.to_string(),
        })?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<()> {
        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
        if !LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(invalid("logging.level", &self.logging.level));
        }

        let analysis = &self.analysis;
        if analysis.max_source_bytes == 0 {
            return Err(invalid("analysis.max_source_bytes", analysis.max_source_bytes));
        }
        if analysis.max_nesting_depth == 0 {
            return Err(invalid("analysis.max_nesting_depth", analysis.max_nesting_depth));
        }
        if analysis.max_operator_chain == 0 {
            return Err(invalid("analysis.max_operator_chain", analysis.max_operator_chain));
        }

        let weights = analysis.maintainability;
        for (key, value) in [
            ("analysis.maintainability.complexity", weights.complexity),
            ("analysis.maintainability.volume", weights.volume),
            ("analysis.maintainability.comments", weights.comments),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(key, value));
            }
        }

        let scoring = &self.scoring;
        if scoring.pass_percent == 0 || scoring.pass_percent > 100 {
            return Err(invalid("scoring.pass_percent", scoring.pass_percent));
        }
        if scoring.overview_partial_words == 0
            || scoring.overview_partial_words > scoring.overview_full_words
        {
            return Err(invalid(
                "scoring.overview_partial_words",
                scoring.overview_partial_words,
            ));
        }
        if scoring.usage_full_examples < 2 {
            return Err(invalid("scoring.usage_full_examples", scoring.usage_full_examples));
        }
        if scoring.structure_base_words == 0
            || scoring.structure_max_words < scoring.structure_base_words
        {
            return Err(invalid("scoring.structure_max_words", scoring.structure_max_words));
        }

        let llm = &self.llm;
        if llm.model.trim().is_empty() {
            return Err(invalid("llm.model", "<empty>"));
        }
        if !(0.0..=2.0).contains(&llm.temperature) {
            return Err(invalid("llm.temperature", llm.temperature));
        }
        if llm.timeout_seconds == 0 {
            return Err(invalid("llm.timeout_seconds", llm.timeout_seconds));
        }
        if llm.max_retries == 0 {
            return Err(invalid("llm.max_retries", llm.max_retries));
        }

        Ok(())
    }
}

fn invalid(key: &str, value: impl ToString) -> DocsmithError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
    .into()
}

fn config_error(error: ::config::ConfigError) -> DocsmithError {
    DocsmithError::Config {
        message: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = DocsmithConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scoring.pass_percent, 70);
        assert_eq!(config.analysis.max_nesting_depth, 128);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = DocsmithConfig::default();
        config.analysis.maintainability.volume = 0.0;
        assert!(config.validate().is_err());

        let mut config = DocsmithConfig::default();
        config.scoring.pass_percent = 101;
        assert!(config.validate().is_err());

        let mut config = DocsmithConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());

        let mut config = DocsmithConfig::default();
        config.llm.temperature = 3.5;
        assert!(config.validate().is_err());

        let mut config = DocsmithConfig::default();
        config.analysis.max_operator_chain = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_rate_limit_is_valid() {
        let mut config = DocsmithConfig::default();
        config.llm.requests_per_minute = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("docsmith.toml");

        let mut config = DocsmithConfig::default();
        config.llm.model = "llama3:8b".to_string();
        config.logging.format = LogFormat::Json;
        config.save_to_file(&path).unwrap();

        let loaded = DocsmithConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("docsmith.toml");
        std::fs::write(&path, "[scoring]\npass_percent = 80\n").unwrap();

        let loaded = DocsmithConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.scoring.pass_percent, 80);
        assert_eq!(loaded.scoring.overview_full_words, 25);
        assert_eq!(loaded.llm, LlmConfig::default());
    }

    #[test]
    fn test_layered_load_reads_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("docsmith.toml");
        std::fs::write(&path, "[llm]\nmodel = \"mistral:7b\"\n").unwrap();

        let loaded = DocsmithConfig::load_layered(Some(&path)).unwrap();
        assert_eq!(loaded.llm.model, "mistral:7b");
        assert_eq!(loaded.analysis, AnalysisConfig::default());
    }

    #[test]
    fn test_missing_file_is_reported() {
        let err = DocsmithConfig::load_from_file(Path::new("/nonexistent/docsmith.toml"))
            .unwrap_err();
        assert!(matches!(err, DocsmithError::Config { .. }));
    }
}
