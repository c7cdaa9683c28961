//! Prompt Templates
//!
//! This module renders a `CodeAnalysis` into the prompt sent to an LLM:
//! - One handlebars template per documentation type
//! - A serializable context built from the analysis and the source
//! - Source excerpts truncated to a configurable number of characters

use docsmith_shared::{CodeAnalysis, DocType, DocsmithError, Result};
use handlebars::{Handlebars, RenderErrorReason};
use serde::Serialize;
use tracing::{debug, instrument};

const README_TEMPLATE: &str = r#"You are a technical writer. Write a README.md in markdown for the {{language}} file `{{file_name}}`.

Structure the document with these sections:
1. A `#` title followed by an overview paragraph of at least three sentences
2. `## Installation` with the install command in a fenced code block
3. `## Usage` with at least three fenced code examples
4. `## API` with a `###` sub-heading for every public function and class
{{> analysis}}
Return only the markdown document.
"#;

const JSDOC_TEMPLATE: &str = r#"You are a technical writer. Write JSDoc comments for the {{language}} file `{{file_name}}`.

Document every public function and class below with a summary line, `@param`
tags for each parameter, `@returns`, and an `@example` block. Present the
result as markdown: a `#` title, a short overview, then one `###` section per
symbol holding the comment in a fenced code block.
{{> analysis}}
Return only the markdown document.
"#;

const API_TEMPLATE: &str = r#"You are a technical writer. Write API reference documentation in markdown for the {{language}} file `{{file_name}}`.

Start with a `#` title and an overview of what the module exposes. Add an
`## Installation` section, then an `## API` section with a `###` sub-heading per
exported symbol giving its signature, parameters, return value and a fenced
usage example.
{{> analysis}}
Return only the markdown document.
"#;

const ARCHITECTURE_TEMPLATE: &str = r#"You are a software architect. Write an architecture overview in markdown for the {{language}} file `{{file_name}}`.

Cover the purpose of the module, its dependencies, how its functions and
classes collaborate, and where complexity concentrates. Use `##` sections,
name every function and class explicitly, and include code examples where they
clarify control flow.
{{> analysis}}
Return only the markdown document.
"#;

const ANALYSIS_PARTIAL: &str = r#"
## Code analysis

{{#if functions}}{{pluralize function_count "function"}}:
{{#each functions}}- `{{name}}({{join parameters ", "}})`{{#if is_async}} (async){{/if}}, complexity {{complexity}}
{{/each}}{{else}}No free functions.
{{/if}}
{{#if classes}}{{pluralize class_count "class"}}:
{{#each classes}}- `{{name}}` with methods: {{#if methods}}{{join methods ", "}}{{else}}none{{/if}}
{{/each}}{{else}}No classes.
{{/if}}
{{#if imports}}Depends on: {{join imports ", "}}
{{/if}}{{#if exports}}Exports: {{join exports ", "}}
{{/if}}
Metrics: {{metrics.lines_of_code}} lines of code, cyclomatic complexity {{metrics.cyclomatic_complexity}}, maintainability index {{metrics.maintainability_index}}.
{{#if parse_error}}
Note: parsing was incomplete ({{parse_error}}); infer the rest from the source.
{{/if}}
## Source{{#if truncated}} (truncated){{/if}}

```{{language}}
{{source}}
```
"#;

/// Renders documentation prompts
pub struct PromptBuilder {
    /// Handlebars engine
    handlebars: Handlebars<'static>,

    /// Source excerpts are cut to this many characters
    max_source_chars: usize,
}

/// Values available to the prompt templates
#[derive(Debug, Clone, Serialize)]
pub struct PromptContext {
    pub file_name: String,
    pub language: String,
    pub doc_type: DocType,
    pub functions: Vec<FunctionEntry>,
    pub function_count: usize,
    pub classes: Vec<ClassEntry>,
    pub class_count: usize,
    pub imports: Vec<String>,
    pub exports: Vec<String>,
    pub metrics: MetricsEntry,
    pub parse_error: Option<String>,
    pub source: String,
    pub truncated: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionEntry {
    pub name: String,
    pub parameters: Vec<String>,
    pub is_async: bool,
    pub complexity: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassEntry {
    pub name: String,
    pub methods: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsEntry {
    pub lines_of_code: usize,
    pub cyclomatic_complexity: usize,
    pub maintainability_index: String,
}

impl PromptBuilder {
    /// Create a new prompt builder
    pub fn new(max_source_chars: usize) -> Result<Self> {
        let mut handlebars = Handlebars::new();

        handlebars.set_strict_mode(true);
        handlebars.register_escape_fn(handlebars::no_escape);

        handlebars.register_helper("pluralize", Box::new(pluralize_helper));
        handlebars.register_helper("join", Box::new(join_helper));

        handlebars
            .register_partial("analysis", ANALYSIS_PARTIAL)
            .map_err(template_error)?;
        for doc_type in DocType::ALL {
            handlebars
                .register_template_string(doc_type.as_str(), template_for(doc_type))
                .map_err(template_error)?;
        }

        Ok(Self {
            handlebars,
            max_source_chars,
        })
    }

    pub fn max_source_chars(&self) -> usize {
        self.max_source_chars
    }

    /// Build the template context for an analysis
    pub fn context(
        &self,
        file_name: &str,
        source: &str,
        analysis: &CodeAnalysis,
        doc_type: DocType,
    ) -> PromptContext {
        let (source, truncated) = truncate_chars(source, self.max_source_chars);

        let functions: Vec<FunctionEntry> = analysis
            .functions
            .iter()
            .map(|function| FunctionEntry {
                name: function.name.clone().unwrap_or_else(|| "<anonymous>".to_string()),
                parameters: function.parameters.clone(),
                is_async: function.is_async,
                complexity: function.complexity,
            })
            .collect();

        let classes: Vec<ClassEntry> = analysis
            .classes
            .iter()
            .map(|class| ClassEntry {
                name: class.name.clone().unwrap_or_else(|| "<anonymous>".to_string()),
                methods: class
                    .methods
                    .iter()
                    .map(|method| format!("{} ({})", method.name, method.kind))
                    .collect(),
            })
            .collect();

        PromptContext {
            file_name: file_name.to_string(),
            language: analysis.language.to_string(),
            doc_type,
            function_count: functions.len(),
            functions,
            class_count: classes.len(),
            classes,
            imports: analysis.import_sources().into_iter().map(str::to_string).collect(),
            exports: analysis.exports.iter().map(|e| e.name.clone()).collect(),
            metrics: MetricsEntry {
                lines_of_code: analysis.metrics.lines_of_code,
                cyclomatic_complexity: analysis.metrics.cyclomatic_complexity,
                maintainability_index: format!("{:.1}", analysis.metrics.maintainability_index),
            },
            parse_error: analysis.parse_error.as_ref().map(|e| {
                if e.line > 0 {
                    format!("line {}: {}", e.line, e.message)
                } else {
                    e.message.clone()
                }
            }),
            source: source.to_string(),
            truncated,
        }
    }

    /// Render the prompt for one file
    #[instrument(skip(self, source, analysis))]
    pub fn build(
        &self,
        file_name: &str,
        source: &str,
        analysis: &CodeAnalysis,
        doc_type: DocType,
    ) -> Result<String> {
        let context = self.context(file_name, source, analysis, doc_type);
        if context.truncated {
            debug!(limit = self.max_source_chars, "Source truncated for prompt");
        }

        self.handlebars
            .render(doc_type.as_str(), &context)
            .map_err(template_error)
    }
}

fn template_for(doc_type: DocType) -> &'static str {
    match doc_type {
        DocType::Readme => README_TEMPLATE,
        DocType::JsDoc => JSDOC_TEMPLATE,
        DocType::Api => API_TEMPLATE,
        DocType::Architecture => ARCHITECTURE_TEMPLATE,
    }
}

fn template_error(error: impl std::fmt::Display) -> DocsmithError {
    DocsmithError::Template {
        message: error.to_string(),
    }
}

/// Cut `text` to at most `max_chars` characters
pub fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => (&text[..cut], true),
        None => (text, false),
    }
}

/// `{{pluralize count "word"}}` renders "1 word" or "3 words"
fn pluralize_helper(
    h: &handlebars::Helper,
    _: &Handlebars,
    _: &handlebars::Context,
    _: &mut handlebars::RenderContext,
    out: &mut dyn handlebars::Output,
) -> handlebars::HelperResult {
    let count = h
        .param(0)
        .and_then(|p| p.value().as_u64())
        .ok_or_else(|| RenderErrorReason::Other("pluralize helper requires a count".to_string()))?;

    let word = h
        .param(1)
        .and_then(|p| p.value().as_str())
        .ok_or_else(|| RenderErrorReason::Other("pluralize helper requires a word".to_string()))?;

    let rendered = if count == 1 {
        format!("{} {}", count, word)
    } else {
        format!("{} {}", count, pluralize(word))
    };
    out.write(&rendered)?;
    Ok(())
}

/// `{{join list ", "}}` joins an array of strings
fn join_helper(
    h: &handlebars::Helper,
    _: &Handlebars,
    _: &handlebars::Context,
    _: &mut handlebars::RenderContext,
    out: &mut dyn handlebars::Output,
) -> handlebars::HelperResult {
    let items = h
        .param(0)
        .and_then(|p| p.value().as_array())
        .ok_or_else(|| RenderErrorReason::Other("join helper requires an array".to_string()))?;

    let separator = h.param(1).and_then(|p| p.value().as_str()).unwrap_or(", ");

    let joined = items
        .iter()
        .filter_map(|item| item.as_str())
        .collect::<Vec<_>>()
        .join(separator);
    out.write(&joined)?;
    Ok(())
}

fn pluralize(s: &str) -> String {
    if s.ends_with("ss") || s.ends_with('x') || s.ends_with("ch") || s.ends_with("sh") {
        format!("{}es", s)
    } else if s.ends_with('y') && !s.ends_with("ey") {
        format!("{}ies", &s[..s.len() - 1])
    } else {
        format!("{}s", s)
    }
}
