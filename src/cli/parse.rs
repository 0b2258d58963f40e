//! CLI parse: clap types for deployconf. No behavior; definitions only.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// deployconf - inspect layered deployment configuration
#[derive(Parser, Debug)]
#[command(name = "deployconf")]
#[command(about = "Resolve layered, lazily evaluated deployment configuration")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, global = true, default_value = ".")]
    pub workspace: PathBuf,

    /// Named configuration (loads deploy/<name>.toml)
    #[arg(long = "conf", global = true)]
    pub conf_name: Option<String>,

    /// Configuration file path (overrides default config loading)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Explicit argument for the task, as key=value (repeatable)
    #[arg(long = "set", global = true, value_parser = parse_key_value)]
    pub set: Vec<(String, String)>,

    /// Task whose namespaces apply, as module.name
    #[arg(long, global = true)]
    pub task: Option<String>,

    /// Extra namespace to unprefix
    #[arg(long, global = true)]
    pub namespace: Option<String>,

    /// Never prompt; unresolved keys are errors
    #[arg(long, global = true)]
    pub no_input: bool,

    /// Enable logging at info level (default: warnings only)
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the resolved value of a key (may prompt)
    Get {
        /// Configuration key
        key: String,
    },
    /// Print every key that resolves without prompting
    Dump {
        /// Output format
        #[arg(long, value_enum, default_value_t = DumpFormat::Text)]
        format: DumpFormat,
    },
    /// List known keys, one per line
    Keys,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpFormat {
    Text,
    Json,
}

/// Parse `key=value`; the value may itself contain `=`.
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got '{}'", s)),
    }
}
