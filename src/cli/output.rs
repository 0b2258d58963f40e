//! CLI output: error mapping and presentation of resolved values.

use crate::error::{DeployError, ResolveError};
use crate::value::Value;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use std::collections::BTreeMap;

/// Map domain errors to a string for CLI output.
pub fn map_error(e: &DeployError) -> String {
    match e {
        DeployError::Resolve(ResolveError::MissingKey(key)) => format!(
            "Missing configuration key: {} (set it with --set {}=<value> or in deploy/config.toml)",
            key, key
        ),
        other => other.to_string(),
    }
}

pub fn format_dump_text(snapshot: &BTreeMap<String, Value>) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Key", "Value"]);
    for (key, value) in snapshot {
        table.add_row(vec![key.clone(), value.to_string()]);
    }
    table.to_string()
}

pub fn format_dump_json(snapshot: &BTreeMap<String, Value>) -> Result<String, DeployError> {
    Ok(serde_json::to_string_pretty(snapshot)?)
}

pub fn format_keys(keys: &[String]) -> String {
    keys.join("\n")
}
