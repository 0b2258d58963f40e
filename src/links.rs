//! Version links
//!
//! Releases live in per-version directories under the home path, and a handful of
//! symlinks (`active`, `last`, `previous`, ...) point at specific ones. For every key
//! `<stem>_path` a context answers `<version>_<stem>_link` for each entry of
//! `versions`, computed by swapping the version directory for the link directory.
//! Links are looked up when asked for, so task-computed paths and paths written
//! after the context was created get them too.

use crate::context::Context;
use crate::path::join_remote;
use crate::value::{ConfigValue, Value};
use tracing::trace;

pub const PATH_SUFFIX: &str = "_path";
pub const LINK_SUFFIX: &str = "_link";

/// `release_path` + `active` → `active_release_link`
pub fn link_key(version: &str, path_key: &str) -> Option<String> {
    path_key
        .strip_suffix(PATH_SUFFIX)
        .filter(|stem| !stem.is_empty())
        .map(|stem| format!("{}_{}{}", version, stem, LINK_SUFFIX))
}

/// Resolved `path_key` with the version directory replaced by `home_path/<version>`.
pub fn versioned_path(
    ctx: &Context,
    version: &str,
    path_key: &str,
) -> Result<String, crate::error::ResolveError> {
    let path = ctx.get_str(path_key)?;
    let version_path = ctx.get_str("version_path")?;
    if version_path.is_empty() {
        return Ok(path);
    }
    let home = ctx.get_str("home_path")?;
    let link_dir = join_remote(&[home.as_str(), version]);
    Ok(path.replace(&version_path, &link_dir))
}

fn versions(ctx: &Context) -> Option<Vec<String>> {
    let value = ctx.resolve_quiet("versions").ok()?;
    Some(value.to_string_list().unwrap_or_else(|| vec![value.to_string()]))
}

/// Computed value for `key` when it names a version link of a path key with a source.
///
/// Only consulted after the explicit, task, local and global layers miss, so an
/// operator's value always wins.
pub(crate) fn derive(ctx: &Context, key: &str) -> Option<ConfigValue> {
    let rest = key.strip_suffix(LINK_SUFFIX)?;
    versions(ctx)?.into_iter().find_map(|version| {
        let stem = rest.strip_prefix(version.as_str())?.strip_prefix('_')?;
        if stem.is_empty() {
            return None;
        }
        let path_key = format!("{}{}", stem, PATH_SUFFIX);
        if !ctx.has_source(&path_key) {
            return None;
        }
        trace!(link = %key, path = %path_key, "Derived version link");
        Some(ConfigValue::computed(move |ctx| {
            versioned_path(ctx, &version, &path_key).map(Value::Str)
        }))
    })
}

/// Link keys implied by the `_path` entries of `keys`.
pub(crate) fn link_keys(ctx: &Context, keys: &[String]) -> Vec<String> {
    let Some(versions) = versions(ctx) else {
        return Vec::new();
    };
    keys.iter()
        .flat_map(|path_key| versions.iter().filter_map(move |v| link_key(v, path_key)))
        .collect()
}
