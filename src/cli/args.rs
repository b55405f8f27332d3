//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// pipeline-init - Scan a repository and generate a CI pipeline.
#[derive(Debug, Parser)]
#[command(name = "pipeline-init")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan a repository and generate its pipeline
    Config(ConfigArgs),

    /// Write every platform's default options, without scanning
    ManualConfig(ManualConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Serialization format of written files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

impl OutputFormat {
    /// File extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Yaml => "yml",
            Self::Json => "json",
        }
    }
}

/// Arguments for the `config` command.
#[derive(Debug, Clone, clap::Args)]
pub struct ConfigArgs {
    /// Repository to scan
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// Directory the generated files are written to
    #[arg(long, default_value = "_defaults")]
    pub output_dir: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
    pub format: OutputFormat,

    /// Never prompt; write the scan result instead of a pipeline
    #[arg(long)]
    pub ci: bool,

    /// Answer a question up front (repeatable)
    #[arg(long = "answer", value_name = "KEY=VALUE", value_parser = parse_answer)]
    pub answers: Vec<(String, String)>,

    /// Platform to generate the pipeline for
    #[arg(long)]
    pub platform: Option<String>,
}

impl Default for ConfigArgs {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            output_dir: PathBuf::from("_defaults"),
            format: OutputFormat::Yaml,
            ci: false,
            answers: Vec::new(),
            platform: None,
        }
    }
}

/// Arguments for the `manual-config` command.
#[derive(Debug, Clone, clap::Args)]
pub struct ManualConfigArgs {
    /// Directory the generated file is written to
    #[arg(long, default_value = "_defaults")]
    pub output_dir: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
    pub format: OutputFormat,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Parse a `KEY=VALUE` answer. The value may be empty or contain `=`.
fn parse_answer(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid answer '{}': expected KEY=VALUE", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("invalid answer '{}': empty key", s));
    }
    Ok((key.to_string(), value.to_string()))
}
