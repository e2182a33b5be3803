use anyhow::{Context as AnyhowContext, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::scheduler::parse_period;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "paramflow")]
#[command(about = "Run periodic jobs from a config file and report their completion events", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load and validate a config file or directory without running it
    Validate {
        /// Config file (yaml, yml, json) or directory of config files
        #[arg(short, long, value_name = "PATH")]
        config: PathBuf,
    },

    /// Run the configured jobs and print each completion event
    Run {
        /// Config file (yaml, yml, json) or directory of config files
        #[arg(short, long, value_name = "PATH")]
        config: PathBuf,

        /// How long to run (e.g. 5s, 1.5m, PT10S); runs until Ctrl-C if omitted
        #[arg(short, long, value_name = "PERIOD", value_parser = parse_duration)]
        duration: Option<Duration>,

        /// Output format for events and the final summary
        #[arg(short = 'f', long, default_value = "text")]
        format: OutputFormat,
    },
}

impl Command {
    pub fn config(&self) -> &Path {
        match self {
            Command::Validate { config } | Command::Run { config, .. } => config,
        }
    }
}

impl Args {
    pub fn validate(&self) -> Result<()> {
        validate_path(self.command.config())
    }
}

fn parse_duration(value: &str) -> Result<Duration, String> {
    parse_period(value).map_err(|e| e.to_string())
}

pub fn validate_path(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("Path does not exist: {}", path.display());
    }

    if path.is_file() {
        std::fs::metadata(path).with_context(|| format!("Cannot read file: {}", path.display()))?;
    } else if path.is_dir() {
        std::fs::metadata(path)
            .with_context(|| format!("Cannot read directory: {}", path.display()))?;
    } else {
        anyhow::bail!("Path is neither a file nor a directory: {}", path.display());
    }

    Ok(())
}
