pub mod commands;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use thiserror::Error;
use vodimport_core::{load_importer_config, ImporterConfig};

use commands::check::{CheckStatus, HealthEntry};
use commands::completions::CompletionsArgs;
use commands::run::RunArgs;
use commands::summary::SummaryArgs;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] vodimport_core::ConfigError),
    #[error("import error: {0}")]
    Import(#[from] vodimport_core::ImportError),
    #[error("asset client error: {0}")]
    Client(#[from] vodimport_core::AssetClientError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("required resource missing: {0}")]
    MissingResource(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Bulk asset import with checkpointed batches", long_about = None)]
pub struct Cli {
    /// Path to importer.toml
    #[arg(long, default_value = "configs/importer.toml")]
    pub config: PathBuf,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Import every descriptor of the input file
    Run(RunArgs),
    /// Summarize a checkpoint file
    Summary(SummaryArgs),
    /// Verify config, input, checkpoint location and credentials
    Check,
    /// Print shell completions
    Completions(CompletionsArgs),
}

pub fn run(cli: Cli) -> Result<()> {
    if let Commands::Completions(args) = &cli.command {
        commands::completions::execute(args);
        return Ok(());
    }

    let context = AppContext::new(&cli)?;
    match &cli.command {
        Commands::Run(args) => {
            let outcome = commands::run::execute(&context, args)?;
            render(&outcome, cli.format)?;
        }
        Commands::Summary(args) => {
            let summary = commands::summary::execute(&context, args)?;
            render(&summary, cli.format)?;
        }
        Commands::Check => {
            let report = commands::check::execute(&context);
            render(&report, cli.format)?;
            if report
                .iter()
                .any(|entry| matches!(entry.status, CheckStatus::Error))
            {
                return Err(AppError::MissingResource(
                    "one or more checks failed".to_string(),
                ));
            }
        }
        Commands::Completions(_) => {}
    }

    Ok(())
}

fn render<T>(value: &T, format: OutputFormat) -> Result<()>
where
    T: Serialize + DisplayFallback,
{
    match format {
        OutputFormat::Text => {
            println!("{}", value.display());
            Ok(())
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{}", json);
            Ok(())
        }
    }
}

pub(crate) trait DisplayFallback {
    fn display(&self) -> String;
}

impl DisplayFallback for Vec<HealthEntry> {
    fn display(&self) -> String {
        self.iter()
            .map(DisplayFallback::display)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug)]
pub struct AppContext {
    config: ImporterConfig,
    config_path: PathBuf,
}

impl AppContext {
    pub fn new(cli: &Cli) -> Result<Self> {
        Self::from_path(&cli.config)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let config = load_importer_config(path)?;
        Ok(Self {
            config,
            config_path: path.to_path_buf(),
        })
    }

    pub fn config(&self) -> &ImporterConfig {
        &self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub(crate) fn input_path(&self, override_path: Option<&PathBuf>) -> PathBuf {
        override_path
            .cloned()
            .unwrap_or_else(|| self.config.input_path())
    }

    pub(crate) fn checkpoint_path(&self, override_path: Option<&PathBuf>) -> PathBuf {
        override_path
            .cloned()
            .unwrap_or_else(|| self.config.checkpoint_path())
    }
}
