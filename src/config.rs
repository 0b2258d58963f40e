//! Configuration System
//!
//! Operator-supplied overrides and logging settings, layered from files and the
//! environment with the `config` crate. The `[conf]` table becomes the seed of the
//! global layer every task context copies.

use crate::layer::ConfigLayer;
use crate::logging::LoggingConfig;
use crate::value::Value;
use std::collections::BTreeMap;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;
pub use sources::env::{CONF_NAME_ENV, ENV_PREFIX};
pub use sources::global_file::global_config_path;

/// Name used when neither the caller nor the environment picks a configuration.
pub const DEFAULT_CONF_NAME: &str = "default";

/// Loaded configuration
#[derive(Debug, Clone)]
pub struct DeployConfig {
    /// Which named configuration was loaded (`deploy/<conf_name>.toml`)
    pub conf_name: String,
    pub logging: LoggingConfig,
    /// Flattened `[conf]` table, inserted in sorted key order
    pub overrides: ConfigLayer,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self::with_overrides(DEFAULT_CONF_NAME, ConfigLayer::new())
    }
}

impl DeployConfig {
    /// Config with the given overrides; `conf_name` is recorded unless already present.
    pub fn with_overrides(conf_name: impl Into<String>, mut overrides: ConfigLayer) -> Self {
        let conf_name = conf_name.into();
        overrides.insert_if_absent("conf_name", Value::Str(conf_name.clone()));
        Self {
            conf_name,
            logging: LoggingConfig::default(),
            overrides,
        }
    }
}

/// Flatten nested tables into dotted keys: `{mysql: {db_port: 3307}}` → `mysql.db_port`.
pub(crate) fn flatten_table(
    prefix: Option<&str>,
    table: config::Map<String, config::Value>,
    out: &mut BTreeMap<String, Value>,
) {
    for (key, value) in table {
        let key = match prefix {
            Some(prefix) => format!("{}.{}", prefix, key),
            None => key,
        };
        match value.kind {
            config::ValueKind::Table(nested) => flatten_table(Some(&key), nested, out),
            other => {
                out.insert(key, convert(other));
            }
        }
    }
}

fn convert(kind: config::ValueKind) -> Value {
    use config::ValueKind;
    match kind {
        ValueKind::Nil => Value::Null,
        ValueKind::Boolean(b) => Value::Bool(b),
        ValueKind::I64(i) => Value::Int(i),
        ValueKind::I128(i) => i64::try_from(i)
            .map(Value::Int)
            .unwrap_or_else(|_| Value::Str(i.to_string())),
        ValueKind::U64(u) => i64::try_from(u)
            .map(Value::Int)
            .unwrap_or_else(|_| Value::Str(u.to_string())),
        ValueKind::U128(u) => i64::try_from(u)
            .map(Value::Int)
            .unwrap_or_else(|_| Value::Str(u.to_string())),
        ValueKind::Float(f) => Value::Float(f),
        ValueKind::String(s) => Value::Str(s),
        ValueKind::Array(items) => Value::List(items.into_iter().map(|v| convert(v.kind)).collect()),
        ValueKind::Table(table) => {
            // Tables inside arrays have no dotted form; keep them as text.
            let mut flat = BTreeMap::new();
            flatten_table(None, table, &mut flat);
            Value::Str(
                flat.into_iter()
                    .map(|(k, v)| format!("{}={}", k, v))
                    .collect::<Vec<_>>()
                    .join(" "),
            )
        }
    }
}
