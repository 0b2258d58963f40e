//! Shared test utilities for integration tests
//!
//! Environment variable changes are serialized through one mutex and restored
//! afterwards, since every test in this binary shares the process environment.

use deployconf::prompt::{DisabledPrompter, Prompter};
use deployconf::{ConfigLayer, Environment};
use std::path::Path;
use std::sync::{Arc, Mutex};

static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Run `f` with the given variables set (`Some`) or removed (`None`), then restore them.
pub fn with_env<F, R>(vars: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let saved: Vec<(String, Option<String>)> = vars
        .iter()
        .map(|(name, _)| (name.to_string(), std::env::var(name).ok()))
        .collect();

    for (name, value) in vars {
        match value {
            Some(value) => std::env::set_var(name, value),
            None => std::env::remove_var(name),
        }
    }

    let result = f();

    for (name, value) in saved {
        match value {
            Some(value) => std::env::set_var(&name, value),
            None => std::env::remove_var(&name),
        }
    }
    result
}

/// Write `content` to `root/relative`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

/// Non-interactive environment over the built-in defaults.
pub fn quiet_env(overrides: ConfigLayer) -> Environment {
    with_prompter(overrides, Arc::new(DisabledPrompter))
}

pub fn with_prompter(overrides: ConfigLayer, prompter: Arc<dyn Prompter>) -> Environment {
    Environment::new(overrides).with_prompter(prompter)
}

/// Overrides pinning the connection target and release version.
pub fn alice_overrides() -> ConfigLayer {
    ConfigLayer::new()
        .literal("address", "alice@localhost")
        .literal("version", "2024.01.01-00.00.00")
}
