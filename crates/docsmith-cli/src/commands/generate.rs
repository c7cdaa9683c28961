use super::{OutputFormat, print_json, render_report};
use anyhow::Context;
use clap::Args;
use docsmith_core::DocumentationService;
use docsmith_shared::{DocType, DocsmithConfig};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Source file to document
    pub file: PathBuf,

    #[arg(long, default_value = "readme")]
    pub doc_type: DocType,

    /// Write the generated document here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,
}

pub async fn run(args: GenerateArgs, config: &DocsmithConfig) -> anyhow::Result<()> {
    let service = DocumentationService::from_config(config)
        .context("failed to set up the documentation service")?;

    let health = service.health_check().await?;
    if !health.is_available() {
        warn!("Provider {} looks unavailable: {:?}", service.provider().name(), health);
    }

    let generated = service
        .generate_file(&args.file, args.doc_type)
        .await
        .with_context(|| format!("failed to generate documentation for {}", args.file.display()))?;

    if let Some(output) = &args.output {
        tokio::fs::write(output, &generated.document)
            .await
            .with_context(|| format!("failed to write {}", output.display()))?;
        info!("Documentation written to {}", output.display());
    }

    match args.format {
        OutputFormat::Json => print_json(&generated)?,
        OutputFormat::Text => {
            let report = render_report(&generated.breakdown, &generated.suggestions);
            if args.output.is_some() {
                print!("{report}");
            } else {
                println!("{}\n", generated.document);
                eprint!("{report}");
            }
        }
    }
    Ok(())
}
