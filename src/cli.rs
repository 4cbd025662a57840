//! CLI argument parsing for the calltrace self-check binary

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::StrategyKind;

/// Output format for the export listing
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
}

/// Caller resolution strategy, as spelled on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StrategyArg {
    /// Fixed-depth stack index
    Fixed,
    /// First frame outside the resolver's modules
    Scan,
}

impl From<StrategyArg> for StrategyKind {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Fixed => Self::Fixed,
            StrategyArg::Scan => Self::Scan,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "calltrace")]
#[command(version)]
#[command(about = "Caller-identification logging helper for instrumented programs", long_about = None)]
pub struct Cli {
    /// List the injectable operation allow-list
    #[arg(long)]
    pub exports: bool,

    /// Emit one trace_log record through a named probe function
    #[arg(long)]
    pub probe: bool,

    /// Export registry TOML (defaults to the embedded allow-list)
    #[arg(long, value_name = "PATH")]
    pub registry: Option<PathBuf>,

    /// Resolver configuration TOML
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the caller resolution strategy
    #[arg(long, value_enum, value_name = "STRATEGY")]
    pub strategy: Option<StrategyArg>,

    /// Override the fixed stack-depth offset
    #[arg(long = "stack-depth", value_name = "N")]
    pub stack_depth: Option<usize>,

    /// Output format for --exports
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Enable debug logging to stderr
    #[arg(short, long)]
    pub debug: bool,
}
