//! Namespaced overrides
//!
//! `mysql.db_port = 3307` only applies to tasks in the `mysql` module: when such a
//! task starts, the prefix is stripped and the value shadows the plain `db_port`.

use crate::layer::ConfigLayer;
use std::sync::Arc;
use tracing::trace;

/// Namespace prefixes for a task, least specific first.
pub fn namespaces_for(module: &str, task: &str, explicit: Option<&str>) -> Vec<String> {
    let mut namespaces = vec![
        format!("{}.", module),
        format!("{}.", task),
        format!("{}.{}.", module, task),
    ];
    if let Some(ns) = explicit.filter(|ns| !ns.is_empty()) {
        if ns.ends_with('.') {
            namespaces.push(ns.to_string());
        } else {
            namespaces.push(format!("{}.", ns));
        }
    }
    namespaces
}

/// Copy every key carrying one of `namespaces` onto its unprefixed name.
///
/// Prefixes are applied in order, so a later (more specific) namespace overwrites an
/// earlier one. Prefixed keys stay in the layer.
pub fn unprefix(layer: &mut ConfigLayer, namespaces: &[String]) {
    for ns in namespaces {
        let matches: Vec<(String, _)> = layer
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(ns.as_str())
                    .filter(|rest| !rest.is_empty())
                    .map(|rest| (rest.to_string(), value.clone()))
            })
            .collect();
        for (key, value) in matches {
            trace!(namespace = %ns, key = %key, "Unprefixed namespaced key");
            layer.insert(key, value);
        }
    }
}

/// `layer` with `namespaces` applied, shared unchanged when no key carries one of them.
pub fn unprefixed_view(layer: &Arc<ConfigLayer>, namespaces: &[String]) -> Arc<ConfigLayer> {
    let applies = layer
        .keys()
        .any(|key| namespaces.iter().any(|ns| key.starts_with(ns.as_str())));
    if !applies {
        return Arc::clone(layer);
    }
    let mut view = ConfigLayer::clone(layer);
    unprefix(&mut view, namespaces);
    Arc::new(view)
}
