use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(
    name = "event-ingest",
    about = "Validates event-creation requests and stores them in DynamoDB"
)]
pub struct Cli {
    /// DynamoDB table that receives event records
    #[arg(long, env = "EVENT_TABLE")]
    pub table: Option<String>,

    /// AWS region (defaults to the SDK provider chain)
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,

    /// Custom DynamoDB endpoint, e.g. http://localhost:4566 for LocalStack
    #[arg(long, env = "DYNAMODB_ENDPOINT_URL")]
    pub endpoint_url: Option<String>,

    /// Log output format
    #[arg(long, env = "EVENT_INGEST_LOG_FORMAT", value_enum)]
    pub log_format: Option<LogFormat>,

    /// Log file path (stderr when unset)
    #[arg(long, env = "EVENT_INGEST_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the handler once against an invocation event read from a file
    Invoke {
        /// Path to a JSON invocation event, or `-` for stdin
        #[arg(long)]
        event: String,

        /// Keep records in memory instead of writing to DynamoDB
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(ValueEnum, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    pub table: Option<String>,
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
    pub log_format: Option<LogFormat>,
}

impl ConfigFile {
    pub fn load() -> Option<Self> {
        let config_dir = dirs::config_dir()?;
        let config_path = config_dir.join("event-ingest").join("config.toml");
        let content = std::fs::read_to_string(config_path).ok()?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Option<Self> {
        toml::from_str(content).ok()
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no event table configured: set EVENT_TABLE or pass --table")]
    MissingTable,
}

/// Effective settings after merging flags, environment and the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub table: String,
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
    pub log_format: LogFormat,
    pub log_file: Option<PathBuf>,
    pub command: Option<Command>,
}

impl Settings {
    pub fn resolve(cli: Cli, file: Option<ConfigFile>) -> Result<Self, ConfigError> {
        let file = file.unwrap_or_default();
        let table = cli
            .table
            .or(file.table)
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingTable)?;

        Ok(Self {
            table,
            region: cli.region.or(file.region),
            endpoint_url: cli.endpoint_url.or(file.endpoint_url),
            log_format: cli.log_format.or(file.log_format).unwrap_or_default(),
            log_file: cli.log_file,
            command: cli.command,
        })
    }
}
