//! Integration tests for the built-in layout derived from one address

use crate::integration::test_utils::{alice_overrides, quiet_env, write_file};
use deployconf::defaults::{
    config_template_lpath, django_lpath_for, django_path_for, pip_req_path_for,
};
use deployconf::task::TaskScope;
use deployconf::{ConfigLayer, Value};
use std::path::Path;
use tempfile::TempDir;

#[test]
fn test_address_drives_connection_keys() {
    let conf = quiet_env(alice_overrides()).root();
    assert_eq!(conf.get_str("user").unwrap(), "alice");
    assert_eq!(conf.get_str("host").unwrap(), "localhost");
    assert_eq!(conf.get_int("port").unwrap(), 22);
    assert_eq!(conf.get_str("home_path").unwrap(), "/home/alice");
    assert_eq!(conf.get_str("instance_name").unwrap(), "alice");
    assert_eq!(conf.get_str("db_name").unwrap(), "alice");
}

#[test]
fn test_root_lives_in_slash_root() {
    let conf = quiet_env(ConfigLayer::new().literal("address", "root@build1:2200")).root();
    assert_eq!(conf.get_str("home_path").unwrap(), "/root");
    assert_eq!(conf.get_int("port").unwrap(), 2200);
}

#[test]
fn test_release_paths() {
    let conf = quiet_env(alice_overrides()).root();
    let release = "/home/alice/2024.01.01-00.00.00";
    assert_eq!(conf.get_str("version_path").unwrap(), release);
    assert_eq!(conf.get_str("src_path").unwrap(), format!("{}/src", release));
    // empty project_dir adds nothing
    assert_eq!(conf.get_str("project_path").unwrap(), format!("{}/src", release));
    assert_eq!(conf.get_str("log_path").unwrap(), format!("{}/env/var/log", release));
    assert_eq!(
        conf.get_str("supervisor_config_path").unwrap(),
        format!("{}/env/etc/supervisor", release)
    );
    assert_eq!(
        django_path_for(&conf, "manage.py").unwrap(),
        format!("{}/src/manage.py", release)
    );
    assert_eq!(pip_req_path_for(&conf, "active.txt").unwrap(), "reqs/active.txt");
}

#[test]
fn test_version_links() {
    let conf = quiet_env(alice_overrides()).root();
    assert_eq!(conf.get_str("active_src_link").unwrap(), "/home/alice/active/src");
    assert_eq!(conf.get_str("last_env_link").unwrap(), "/home/alice/last/env");
    assert_eq!(conf.get_str("previous_version_link").unwrap(), "/home/alice/previous");
    assert_eq!(
        conf.versioned_path("active", "log_path").unwrap(),
        "/home/alice/active/env/var/log"
    );
}

#[test]
fn test_user_link_value_wins() {
    let overrides = alice_overrides().literal("active_src_link", "/srv/current");
    let conf = quiet_env(overrides).root();
    assert_eq!(conf.get_str("active_src_link").unwrap(), "/srv/current");
    assert_eq!(conf.get_str("last_src_link").unwrap(), "/home/alice/last/src");
}

#[test]
fn test_custom_versions_and_paths_get_links() {
    let overrides = alice_overrides()
        .literal("versions", vec!["current"])
        .segments("static_path", ["{version_path}", "static"]);
    let conf = quiet_env(overrides).root();
    assert_eq!(conf.get_str("current_static_link").unwrap(), "/home/alice/current/static");
    assert!(!conf.contains("active_static_link"));
}

#[test]
fn test_links_for_task_computed_and_later_paths() {
    let scope = TaskScope::new("apache", "push_config").with_computed("wsgi_path", |conf| {
        Ok(Value::Str(format!("{}/wsgi.py", conf.get_str("src_path")?)))
    });
    let conf = quiet_env(alice_overrides()).context(&scope, ConfigLayer::new());
    assert_eq!(
        conf.get_str("active_wsgi_link").unwrap(),
        "/home/alice/active/src/wsgi.py"
    );
    assert!(conf.keys().contains(&"last_wsgi_link".to_string()));

    assert!(!conf.contains("previous_static_link"));
    conf.set("static_path", "/home/alice/2024.01.01-00.00.00/static");
    assert_eq!(
        conf.get_str("previous_static_link").unwrap(),
        "/home/alice/previous/static"
    );
}

#[test]
fn test_version_is_shared_across_contexts() {
    let env = quiet_env(ConfigLayer::new().literal("address", "alice@localhost"));
    let first = env.context(&TaskScope::new("release", "create"), ConfigLayer::new());
    let version = first.get_str("version").unwrap();
    let second = env.context(&TaskScope::new("release", "activate"), ConfigLayer::new());
    assert_eq!(second.get_str("version").unwrap(), version);
    assert!(env.global().read().contains_key("version"));
}

#[test]
fn test_worker_counts_follow_cpu_count() {
    let conf = quiet_env(alice_overrides().literal("cpu_count", 4)).root();
    assert_eq!(conf.get_int("apache_threads").unwrap(), 9);
    assert_eq!(conf.get_int("uwsgi_processes").unwrap(), 9);
}

#[test]
fn test_snapshot_skips_unresolvable_keys() {
    let conf = quiet_env(alice_overrides()).root();
    let snapshot = conf.snapshot();
    assert_eq!(snapshot.get("user"), Some(&Value::from("alice")));
    assert_eq!(
        snapshot.get("active_src_link"),
        Some(&Value::from("/home/alice/active/src"))
    );
    // cpu_count is never defaulted
    assert!(!snapshot.contains_key("apache_threads"));
}

#[test]
fn test_config_template_lookup_prefers_named_configuration() {
    let templates = TempDir::new().unwrap();
    let base = templates.path().to_str().unwrap().to_string();
    write_file(templates.path(), "staging/nginx.conf", "server {}");
    write_file(templates.path(), "nginx.conf", "server {}");
    write_file(templates.path(), "uwsgi.ini", "[uwsgi]");

    let overrides = alice_overrides().literal("conf_name", "staging").literal(
        "config_templates_paths",
        vec![format!("{}/{{conf_name}}", base), base.clone()],
    );
    let conf = quiet_env(overrides).root();
    assert_eq!(
        config_template_lpath(&conf, "nginx.conf").unwrap(),
        Some(templates.path().join("staging").join("nginx.conf"))
    );
    assert_eq!(
        config_template_lpath(&conf, "uwsgi.ini").unwrap(),
        Some(templates.path().join("uwsgi.ini"))
    );
    assert_eq!(config_template_lpath(&conf, "missing.conf").unwrap(), None);
}

#[test]
fn test_local_paths_are_absolute() {
    let conf = quiet_env(alice_overrides().literal("django_dir", "web")).root();
    let settings = django_lpath_for(&conf, "settings.py").unwrap();
    assert!(settings.is_absolute());
    assert!(settings.ends_with("web/settings.py"));
    for key in ["home_lpath", "src_lpath", "project_lpath"] {
        assert!(Path::new(&conf.get_str(key).unwrap()).is_absolute(), "{}", key);
    }
}
