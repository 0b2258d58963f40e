//! Loader facade: builds the layered `config::Config` and extracts a `DeployConfig`.

use super::merge::merge_policy;
use super::sources::{env, global_file, workspace_file};
use super::{flatten_table, DeployConfig, DEFAULT_CONF_NAME};
use crate::error::DeployError;
use crate::layer::ConfigLayer;
use crate::logging::LoggingConfig;
use config::{Config, ConfigError, File};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load the layered configuration for `workspace_root`.
    ///
    /// Lowest precedence first: merge-policy defaults, the global file, the workspace
    /// base file, the named workspace file, then `DEPLOYCONF_*` environment variables.
    pub fn load(workspace_root: &Path, conf_name: Option<&str>) -> Result<DeployConfig, DeployError> {
        Self::load_with_global(
            workspace_root,
            conf_name,
            global_file::global_config_path().as_deref(),
        )
    }

    /// Like `load`, with an explicit global file location (`None` skips it).
    pub fn load_with_global(
        workspace_root: &Path,
        conf_name: Option<&str>,
        global_path: Option<&Path>,
    ) -> Result<DeployConfig, DeployError> {
        let conf_name = conf_name
            .map(str::to_string)
            .or_else(env::conf_name_from_env)
            .unwrap_or_else(|| DEFAULT_CONF_NAME.to_string());

        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder, global_path)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root, &conf_name)?;
        let builder = env::add_to_builder(builder);

        let config = builder.build()?;
        Self::extract(config, conf_name)
    }

    /// Load a single explicit file on top of the merge-policy defaults.
    pub fn load_from_file(path: &Path) -> Result<DeployConfig, DeployError> {
        let conf_name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(DEFAULT_CONF_NAME)
            .to_string();
        let config = merge_policy::builder_with_defaults()?
            .add_source(File::from(path).required(true))
            .build()?;
        Self::extract(config, conf_name)
    }

    fn extract(config: Config, conf_name: String) -> Result<DeployConfig, DeployError> {
        let logging: LoggingConfig = config.get("logging")?;

        let table = match config.get_table("conf") {
            Ok(table) => table,
            Err(ConfigError::NotFound(_)) => Default::default(),
            Err(e) => return Err(e.into()),
        };
        let mut flat = BTreeMap::new();
        flatten_table(None, table, &mut flat);
        debug!(conf_name = %conf_name, keys = flat.len(), "Loaded configuration overrides");

        let overrides: ConfigLayer = flat.into_iter().collect();
        let mut loaded = DeployConfig::with_overrides(conf_name, overrides);
        loaded.logging = logging;
        Ok(loaded)
    }
}
