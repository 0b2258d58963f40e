//! Integration tests for task runs and nested invocations

use crate::integration::test_utils::{alice_overrides, quiet_env};
use deployconf::task::{Task, TaskScope};
use deployconf::{ConfigLayer, Context, ResolveError, Value};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Defaults a few keys before running, then reports them.
struct CreateDb {
    scope: TaskScope,
    after_calls: AtomicUsize,
}

impl CreateDb {
    fn new() -> Self {
        Self {
            scope: TaskScope::from_type_name("postgres", "CreateDb"),
            after_calls: AtomicUsize::new(0),
        }
    }
}

impl Task for CreateDb {
    type Output = (String, String);

    fn scope(&self) -> &TaskScope {
        &self.scope
    }

    fn before_do(&self, conf: &Context) -> Result<(), ResolveError> {
        conf.set_default("db_encoding", "UTF8");
        conf.set_default("db_name", "never-used");
        Ok(())
    }

    fn execute(&self, conf: &Context) -> Result<(String, String), ResolveError> {
        Ok((conf.get_str("db_name")?, conf.get_str("db_encoding")?))
    }

    fn after_do(&self, _conf: &Context, _output: &(String, String)) -> Result<(), ResolveError> {
        self.after_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn test_hooks_run_in_order() {
    let env = quiet_env(alice_overrides());
    let task = CreateDb::new();
    let (name, encoding) = env.run(&task, ConfigLayer::new()).unwrap();
    assert_eq!(name, "alice");
    assert_eq!(encoding, "UTF8");
    assert_eq!(task.after_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_local_writes_are_discarded_after_run() {
    let env = quiet_env(alice_overrides());
    env.run(&CreateDb::new(), ConfigLayer::new()).unwrap();
    assert!(!env.global().read().contains_key("db_encoding"));
    assert!(!env.root().contains("db_encoding"));
}

/// Publishes a value for every later task.
struct PickPort {
    scope: TaskScope,
}

impl Task for PickPort {
    type Output = ();

    fn scope(&self) -> &TaskScope {
        &self.scope
    }

    fn execute(&self, conf: &Context) -> Result<(), ResolveError> {
        conf.set_globally("app_port", 8042);
        conf.set("scratch", "local only");
        Ok(())
    }
}

#[test]
fn test_global_writes_reach_later_tasks() {
    let env = quiet_env(alice_overrides());
    env.run(
        &PickPort {
            scope: TaskScope::new("app", "pick_port"),
        },
        ConfigLayer::new(),
    )
    .unwrap();
    let later = env.context(&TaskScope::new("nginx", "push_config"), ConfigLayer::new());
    assert_eq!(later.get_int("app_port").unwrap(), 8042);
    assert!(!later.contains("scratch"));
}

/// Runs `CreateDb` nested, overriding one argument.
struct Deploy {
    scope: TaskScope,
}

impl Task for Deploy {
    type Output = (String, String);

    fn scope(&self) -> &TaskScope {
        &self.scope
    }

    fn execute(&self, conf: &Context) -> Result<(String, String), ResolveError> {
        conf.set("db_encoding", "LATIN1");
        conf.run_nested(&CreateDb::new(), ConfigLayer::new().literal("db_name", "nested"))
    }
}

#[test]
fn test_nested_task_sees_parent_chain() {
    let env = quiet_env(alice_overrides());
    let deploy = Deploy {
        scope: TaskScope::new("project", "deploy"),
    };
    let (name, encoding) = env
        .run(&deploy, ConfigLayer::new().literal("db_name", "outer"))
        .unwrap();
    assert_eq!(name, "nested");
    // the parent's local write is inherited, so the child's default does not apply
    assert_eq!(encoding, "LATIN1");
}

#[test]
fn test_child_merges_explicit_arguments() {
    let env = quiet_env(alice_overrides());
    let parent = env.context(
        &TaskScope::new("project", "deploy"),
        ConfigLayer::new()
            .literal("branch", "main")
            .literal("db_name", "outer"),
    );
    let child = parent.child(
        TaskScope::new("postgres", "create_db"),
        ConfigLayer::new().literal("db_name", "inner"),
    );
    assert_eq!(child.get_str("branch").unwrap(), "main");
    assert_eq!(child.get_str("db_name").unwrap(), "inner");
    assert_eq!(parent.get_str("db_name").unwrap(), "outer");
    assert_eq!(child.name(), "postgres.create_db");
}

#[test]
fn test_set_replaces_explicit_argument() {
    let env = quiet_env(alice_overrides());
    let conf = env.context(
        &TaskScope::new("release", "create"),
        ConfigLayer::new().literal("branch", "main"),
    );
    conf.set("branch", "hotfix");
    assert_eq!(conf.get("branch").unwrap(), Value::from("hotfix"));
}

#[test]
fn test_task_computed_value_may_read_overrides() {
    let scope = TaskScope::new("release", "purge_old").with_computed("keep_number", |conf| {
        Ok(Value::Int(conf.get_or("keep", 5)?.as_int().unwrap_or(5) * 2))
    });
    let env = quiet_env(alice_overrides().literal("keep", 3));
    let conf = env.context(&scope, ConfigLayer::new());
    assert_eq!(conf.get_int("keep_number").unwrap(), 6);
    let overridden = env.context(&scope, ConfigLayer::new().literal("keep_number", 1));
    assert_eq!(overridden.get_int("keep_number").unwrap(), 1);
}

#[test]
fn test_global_write_from_child_reaches_parent_and_siblings() {
    let env = quiet_env(alice_overrides().literal("app_port", 80));
    let parent = env.context(&TaskScope::new("project", "deploy"), ConfigLayer::new());
    let child = parent.child(TaskScope::new("app", "pick_port"), ConfigLayer::new());
    child.set_globally("app_port", 8042);

    assert_eq!(parent.get_int("app_port").unwrap(), 8042);
    let sibling = parent.child(TaskScope::new("nginx", "push_config"), ConfigLayer::new());
    assert_eq!(sibling.get_int("app_port").unwrap(), 8042);

    // a later local write takes over again, for the parent and its new children
    parent.set("app_port", 9000);
    assert_eq!(parent.get_int("app_port").unwrap(), 9000);
    let reload = parent.child(TaskScope::new("nginx", "reload"), ConfigLayer::new());
    assert_eq!(reload.get_int("app_port").unwrap(), 9000);
    assert_eq!(env.root().get_int("app_port").unwrap(), 8042);
}

#[test]
fn test_namespaced_value_beats_later_global_write() {
    let env = quiet_env(alice_overrides().literal("postgres.db_name", "site_db"));
    let postgres = env.context(&TaskScope::new("postgres", "create_db"), ConfigLayer::new());
    env.root().set_globally("db_name", "shared");
    assert_eq!(postgres.get_str("db_name").unwrap(), "site_db");
    assert_eq!(env.root().get_str("db_name").unwrap(), "shared");
}
