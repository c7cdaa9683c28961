use super::{OutputFormat, print_json};
use anyhow::bail;
use clap::Args;
use docsmith_core::CodeAnalyzer;
use docsmith_core::analysis::ComplexityLevel;
use docsmith_shared::{CodeAnalysis, DocsmithConfig, Language};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Files or directories to analyze
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Parse every file as this language instead of detecting it
    #[arg(long)]
    pub language: Option<Language>,

    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FileReport<'a> {
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    analysis: Option<&'a CodeAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub async fn run(args: AnalyzeArgs, config: &DocsmithConfig) -> anyhow::Result<()> {
    let files = collect_sources(&args.paths);
    if files.is_empty() {
        bail!("no JavaScript or TypeScript files found");
    }
    info!("Analyzing {} file(s)", files.len());

    let analyzer = CodeAnalyzer::new(config.analysis.clone());
    let results = analyzer.analyze_files_as(&files, args.language).await;

    let reports: Vec<FileReport> = results
        .iter()
        .map(|(path, result)| FileReport {
            path: path.display().to_string(),
            analysis: result.as_ref().ok(),
            error: result.as_ref().err().map(|e| e.to_string()),
        })
        .collect();

    match args.format {
        OutputFormat::Json => print_json(&reports)?,
        OutputFormat::Text => {
            for report in &reports {
                print!("{}", render_file(report));
            }
        }
    }

    let failed = reports.iter().filter(|r| r.error.is_some()).count();
    if failed > 0 {
        bail!("{} of {} file(s) could not be analyzed", failed, reports.len());
    }
    Ok(())
}

/// Expand directories into the supported source files beneath them.
///
/// Explicit file arguments are kept as given.
pub fn collect_sources(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }

        let walker = WalkDir::new(path)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_ignored_dir(entry));

        for entry in walker.filter_map(Result::ok) {
            if entry.file_type().is_file() && Language::from_path(entry.path()).is_supported() {
                files.push(entry.into_path());
            }
        }
    }

    debug!("Collected {} source file(s)", files.len());
    files
}

fn is_ignored_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry.file_name().to_str().is_some_and(|name| {
            name.starts_with('.') || matches!(name, "node_modules" | "dist" | "build" | "coverage")
        })
}

fn render_file(report: &FileReport) -> String {
    let Some(analysis) = report.analysis else {
        return format!(
            "{}\n  error: {}\n",
            report.path,
            report.error.as_deref().unwrap_or("unknown error")
        );
    };

    let metrics = &analysis.metrics;
    let mut out = format!(
        "{} ({})\n  functions: {}, classes: {}, methods: {}, imports: {}, exports: {}\n  lines: {} ({} code), complexity: {}, maintainability: {:.1}\n",
        report.path,
        analysis.language,
        analysis.functions.len(),
        analysis.classes.len(),
        analysis.method_count(),
        analysis.imports.len(),
        analysis.exports.len(),
        metrics.total_lines,
        metrics.lines_of_code,
        metrics.cyclomatic_complexity,
        metrics.maintainability_index,
    );

    for function in &analysis.functions {
        let level = ComplexityLevel::from_complexity(function.complexity);
        if level >= ComplexityLevel::High {
            out.push_str(&format!(
                "  complex: {} at line {} (complexity {}, {})\n",
                function.name.as_deref().unwrap_or("<anonymous>"),
                function.start_line,
                function.complexity,
                level.as_str()
            ));
        }
    }

    if let Some(error) = &analysis.parse_error {
        let kind = if error.recoverable { "partial parse" } else { "parse failed" };
        out.push_str(&format!("  {} at line {}: {}\n", kind, error.line, error.message));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_collect_sources_skips_dependencies() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("src/nested")).unwrap();
        std::fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        std::fs::write(root.join("src/index.ts"), "").unwrap();
        std::fs::write(root.join("src/nested/util.js"), "").unwrap();
        std::fs::write(root.join("src/notes.md"), "").unwrap();
        std::fs::write(root.join("node_modules/pkg/index.js"), "").unwrap();

        let files = collect_sources(&[root.to_path_buf()]);
        assert_eq!(
            files,
            vec![root.join("src/index.ts"), root.join("src/nested/util.js")]
        );
    }

    #[test]
    fn test_explicit_files_are_kept() {
        let files = collect_sources(&[PathBuf::from("snippet.txt")]);
        assert_eq!(files, vec![PathBuf::from("snippet.txt")]);
    }

    #[test]
    fn test_render_partial_parse() {
        let analysis = docsmith_core::parse(
            "function ok() {}\nfunction broken( {\n",
            Language::JavaScript,
        );
        let report = FileReport {
            path: "broken.js".to_string(),
            analysis: Some(&analysis),
            error: None,
        };

        let text = render_file(&report);
        assert!(text.starts_with("broken.js (javascript)"));
        assert!(text.contains(" at line "));
    }

    #[test]
    fn test_render_counts_methods() {
        let analysis = docsmith_core::parse(
            "class Queue {\n  push(x) {}\n  pop() {}\n}\nclass Empty {}\n",
            Language::JavaScript,
        );
        let report = FileReport {
            path: "queue.js".to_string(),
            analysis: Some(&analysis),
            error: None,
        };

        assert!(render_file(&report).contains("classes: 2, methods: 2,"));
    }

    #[test]
    fn test_render_flags_complex_functions() {
        let branches = "  if (a) { a(); }\n".repeat(12);
        let source = format!("function busy(a) {{\n{branches}}}\nfunction calm() {{}}\n");
        let analysis = docsmith_core::parse(&source, Language::JavaScript);
        let report = FileReport {
            path: "busy.js".to_string(),
            analysis: Some(&analysis),
            error: None,
        };

        let text = render_file(&report);
        assert!(text.contains("functions: 2, classes: 0, methods: 0,"));
        assert!(text.contains("complex: busy at line 1 (complexity 13, high)"));
        assert!(!text.contains("calm"));
    }
}
