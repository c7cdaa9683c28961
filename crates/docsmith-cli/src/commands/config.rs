use super::{OutputFormat, print_json};
use anyhow::{Context, bail};
use clap::Subcommand;
use docsmith_core::ConfigManager;
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show {
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// Write a default configuration file
    Init {
        /// Target file; defaults to the user configuration directory
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print one value, e.g. `llm.model`
    Get { key: String },

    /// Update one value in the loaded configuration file
    Set { key: String, value: String },
}

/// `config init` runs before any configuration is loaded
pub fn init(path: Option<PathBuf>, force: bool) -> anyhow::Result<()> {
    let path = path.unwrap_or_else(ConfigManager::default_config_path);
    ConfigManager::init(&path, force)
        .with_context(|| format!("failed to create {}", path.display()))?;
    println!("Created {}", path.display());
    Ok(())
}

pub async fn run(command: ConfigCommand, manager: &ConfigManager) -> anyhow::Result<()> {
    match command {
        ConfigCommand::Show { format } => {
            let config = manager.get_config().await;
            match format {
                OutputFormat::Json => print_json(&config)?,
                OutputFormat::Text => {
                    match manager.config_path() {
                        Some(path) => println!("# {}", path.display()),
                        None => println!("# defaults (no configuration file found)"),
                    }
                    print!("{}", toml::to_string_pretty(&config)?);
                }
            }
        }
        ConfigCommand::Init { path, force } => init(path, force)?,
        ConfigCommand::Get { key } => match manager.get_value(&key).await {
            Some(serde_json::Value::String(text)) => println!("{text}"),
            Some(serde_json::Value::Null) => println!("(unset)"),
            Some(value) => println!("{value}"),
            None => bail!("unknown configuration key: {key}"),
        },
        ConfigCommand::Set { key, value } => {
            let Some(path) = manager.config_path() else {
                bail!("no configuration file loaded; run `docsmith config init` first");
            };
            manager.set_value(&key, &value).await?;
            println!("Updated {} in {}", key, path.display());
        }
    }
    Ok(())
}
