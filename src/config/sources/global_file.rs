//! Global config file source: $XDG_CONFIG_HOME/deployconf/config.toml, else the
//! platform config directory.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Path to global config file.
pub fn global_config_path() -> Option<PathBuf> {
    let base = match std::env::var_os("XDG_CONFIG_HOME") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => directories::BaseDirs::new()?.config_dir().to_path_buf(),
    };
    Some(base.join("deployconf").join("config.toml"))
}

/// Add the global config file to builder if it exists.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    path: Option<&Path>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let Some(path) = path else {
        return Ok(builder);
    };
    if !path.exists() {
        debug!(config_path = %path.display(), "No global configuration file");
        return Ok(builder);
    }
    let canonical = dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    debug!(config_path = %canonical.display(), "Loading global configuration");
    Ok(builder.add_source(File::from(canonical).required(false)))
}
