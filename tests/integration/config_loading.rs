//! Integration tests for layered configuration loading

use crate::integration::test_utils::{quiet_env, with_env, write_file};
use deployconf::config::{global_config_path, ConfigLoader};
use deployconf::prompt::DisabledPrompter;
use deployconf::task::TaskScope;
use deployconf::{ConfigLayer, Environment};
use std::sync::Arc;
use tempfile::TempDir;

const LOADER_VARS: [&str; 3] = [
    "DEPLOYCONF_CONF_NAME",
    "DEPLOYCONF_CONF__ADDRESS",
    "DEPLOYCONF_LOGGING__LEVEL",
];

/// Run with every loader-related variable cleared, plus `extra`.
fn with_clean_env<F, R>(extra: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let mut vars: Vec<(&str, Option<&str>)> = LOADER_VARS.iter().map(|v| (*v, None)).collect();
    vars.extend_from_slice(extra);
    with_env(&vars, f)
}

fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_file(
        dir.path(),
        "deploy/config.toml",
        r#"
[logging]
level = "info"

[conf]
address = "deploy@web1.example.com"
project_dir = "site"

[conf.postgres]
db_name = "site_db"
"#,
    );
    write_file(
        dir.path(),
        "deploy/staging.toml",
        r#"
[conf]
address = "deploy@staging.example.com"
"#,
    );
    dir
}

#[test]
fn test_named_configuration_overrides_base() {
    let root = workspace();
    let config = with_clean_env(&[], || {
        ConfigLoader::load_with_global(root.path(), Some("staging"), None).unwrap()
    });
    assert_eq!(config.conf_name, "staging");
    assert_eq!(config.logging.level, "info");

    let env = Environment::from_config(&config).with_prompter(Arc::new(DisabledPrompter));
    let conf = env.root();
    assert_eq!(conf.get_str("host").unwrap(), "staging.example.com");
    assert_eq!(conf.get_str("conf_name").unwrap(), "staging");
    assert_eq!(
        conf.get_list("config_templates_paths").unwrap(),
        vec!["config_templates/staging", "config_templates"]
    );

    let postgres = env.context(&TaskScope::new("postgres", "create_db"), ConfigLayer::new());
    assert_eq!(postgres.get_str("db_name").unwrap(), "site_db");
}

#[test]
fn test_conf_name_from_environment() {
    let root = workspace();
    let config = with_clean_env(&[("DEPLOYCONF_CONF_NAME", Some("staging"))], || {
        ConfigLoader::load_with_global(root.path(), None, None).unwrap()
    });
    assert_eq!(config.conf_name, "staging");
}

#[test]
fn test_environment_variables_beat_files() {
    let root = workspace();
    let config = with_clean_env(
        &[("DEPLOYCONF_CONF__ADDRESS", Some("ops@web9.example.com"))],
        || ConfigLoader::load_with_global(root.path(), None, None).unwrap(),
    );
    assert_eq!(config.conf_name, "default");
    let conf = quiet_env(config.overrides.clone()).root();
    assert_eq!(conf.get_str("host").unwrap(), "web9.example.com");
    assert_eq!(conf.get_str("user").unwrap(), "ops");
}

#[test]
fn test_global_file_is_lowest_file_layer() {
    let root = workspace();
    let global_dir = TempDir::new().unwrap();
    write_file(
        global_dir.path(),
        "deployconf/config.toml",
        r#"
[conf]
address = "nobody@ignored"
sudo_user = "admin"
"#,
    );

    let config = with_clean_env(
        &[("XDG_CONFIG_HOME", Some(global_dir.path().to_str().unwrap()))],
        || {
            let path = global_config_path().unwrap();
            assert!(path.starts_with(global_dir.path()));
            ConfigLoader::load(root.path(), None).unwrap()
        },
    );
    let conf = quiet_env(config.overrides.clone()).root();
    assert_eq!(conf.get_str("sudo_user").unwrap(), "admin");
    assert_eq!(conf.get_str("host").unwrap(), "web1.example.com");
}

#[test]
fn test_missing_workspace_files_fall_back_to_defaults() {
    let empty = TempDir::new().unwrap();
    let config = with_clean_env(&[], || {
        ConfigLoader::load_with_global(empty.path(), Some("production"), None).unwrap()
    });
    assert_eq!(config.conf_name, "production");
    assert_eq!(config.logging.level, "warn");
    assert_eq!(config.overrides.keys().collect::<Vec<_>>(), vec!["conf_name"]);
}

#[test]
fn test_load_from_explicit_file() {
    let root = workspace();
    let config = ConfigLoader::load_from_file(&root.path().join("deploy/staging.toml")).unwrap();
    assert_eq!(config.conf_name, "staging");
    assert!(config.overrides.contains_key("address"));
    assert!(!config.overrides.contains_key("project_dir"));
}
