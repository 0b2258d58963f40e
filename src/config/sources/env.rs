//! Environment source: `DEPLOYCONF_<SECTION>__<KEY>`, e.g. `DEPLOYCONF_CONF__ADDRESS`.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::Environment;

pub const ENV_PREFIX: &str = "DEPLOYCONF";
pub const CONF_NAME_ENV: &str = "DEPLOYCONF_CONF_NAME";

pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__"),
    )
}

/// Configuration name from the environment, if set and non-empty.
pub fn conf_name_from_env() -> Option<String> {
    std::env::var(CONF_NAME_ENV)
        .ok()
        .filter(|name| !name.trim().is_empty())
}
