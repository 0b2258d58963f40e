//! Workspace config file source: deploy/config.toml and deploy/{conf_name}.toml

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::File;
use std::path::Path;
use tracing::{debug, warn};

pub const CONFIG_DIR: &str = "deploy";

/// Add workspace config files to builder.
/// Precedence: deploy/config.toml (base) then deploy/{conf_name}.toml.
pub fn add_to_builder(
    mut builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
    conf_name: &str,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let config_dir = workspace_root.join(CONFIG_DIR);

    let base_config_path = config_dir.join("config.toml");
    if base_config_path.exists() {
        debug!(config_path = %base_config_path.display(), "Loading workspace configuration");
        builder = builder.add_source(File::from(base_config_path).required(false));
    }

    if conf_name == "config" {
        return Ok(builder);
    }
    let named_config_path = config_dir.join(format!("{}.toml", conf_name));
    if named_config_path.exists() {
        debug!(config_path = %named_config_path.display(), "Loading named configuration");
        builder = builder.add_source(File::from(named_config_path).required(false));
    } else if conf_name != crate::config::DEFAULT_CONF_NAME {
        warn!(
            config_path = %named_config_path.display(),
            conf_name,
            "Named configuration file not found, using base configuration only"
        );
    }

    Ok(builder)
}
