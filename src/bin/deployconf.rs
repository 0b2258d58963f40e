//! deployconf CLI Binary
//!
//! Resolves deployment configuration for a workspace and prints it.

use clap::Parser;
use deployconf::cli::{map_error, Cli, RunContext};
use deployconf::config::ConfigLoader;
use deployconf::logging::{init_logging, LoggingConfig};
use std::process;
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();

    let logging_config = build_logging_config(&cli);
    if let Err(e) = init_logging(Some(&logging_config)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    let context = match RunContext::new(&cli) {
        Ok(ctx) => {
            info!(conf_name = %ctx.config().conf_name, "Configuration loaded");
            ctx
        }
        Err(e) => {
            error!("Error loading configuration: {}", e);
            eprintln!("{}", map_error(&e));
            process::exit(1);
        }
    };

    match context.execute(&cli.command) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("{}", map_error(&e));
            process::exit(1);
        }
    }
}

/// Build logging configuration from CLI args, environment, and config file
fn build_logging_config(cli: &Cli) -> LoggingConfig {
    if cli.quiet {
        return LoggingConfig {
            enabled: false,
            ..LoggingConfig::default()
        };
    }

    let mut config = match cli.config {
        Some(ref path) => ConfigLoader::load_from_file(path).ok(),
        None => ConfigLoader::load(&cli.workspace, cli.conf_name.as_deref()).ok(),
    }
    .map(|c| c.logging)
    .unwrap_or_default();

    if cli.verbose {
        config.level = "info".to_string();
    }
    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }
    config
}
