//! Property-based tests for resolution guarantees

use deployconf::interpolate::{render, OnMissing};
use deployconf::path::join_remote;
use deployconf::prompt::DisabledPrompter;
use deployconf::{ConfigLayer, Environment, ResolveError, Value};
use proptest::prelude::*;
use std::sync::Arc;

fn environment(overrides: ConfigLayer) -> Environment {
    Environment::new(overrides).with_prompter(Arc::new(DisabledPrompter))
}

/// Joined remote paths never end with a separator, except the root itself
#[test]
fn test_remote_join_has_no_trailing_separator() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &proptest::collection::vec("(/?[a-z0-9._-]{1,8}/?)?", 1..6),
            |segments| {
                let joined = join_remote(&segments);
                prop_assert!(joined == "/" || !joined.ends_with('/'));
                prop_assert!(!joined.contains("//"));
                Ok(())
            },
        )
        .unwrap();
}

/// Text without braces or percent signs renders unchanged, without any lookup
#[test]
fn test_plain_text_renders_unchanged() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&"[^{}%]{0,40}", |text| {
            let rendered = render("key", &text, OnMissing::Fail, |name| {
                Err(ResolveError::MissingKey(name.to_string()))
            })
            .unwrap();
            prop_assert_eq!(rendered, text);
            Ok(())
        })
        .unwrap();
}

/// An explicit argument always beats an operator override of the same key
#[test]
fn test_explicit_argument_wins() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &("[a-z][a-z_]{0,10}", "[a-z0-9]{1,10}", "[a-z0-9]{1,10}"),
            |(key, global_value, kwarg_value)| {
                let env = environment(ConfigLayer::new().literal(key.as_str(), global_value));
                let conf = env.context(
                    &deployconf::TaskScope::new("prop", "check"),
                    ConfigLayer::new().literal(key.as_str(), kwarg_value.clone()),
                );
                prop_assert_eq!(conf.get(&key).unwrap(), Value::Str(kwarg_value));
                Ok(())
            },
        )
        .unwrap();
}

/// Resolving the same key twice gives the same value
#[test]
fn test_resolution_is_idempotent() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &("[a-z]{1,8}", "[a-z]{1,8}", "[1-9][0-9]{0,3}"),
            |(user, host, port)| {
                let address = format!("{}@{}:{}", user, host, port);
                let env = environment(ConfigLayer::new().literal("address", address));
                let conf = env.root();
                for key in ["user", "home_path", "src_path", "active_src_link", "server_admin"] {
                    let first = conf.get(key).unwrap();
                    let second = conf.get(key).unwrap();
                    prop_assert_eq!(first, second);
                }
                prop_assert_eq!(conf.get_str("user").unwrap(), user);
                Ok(())
            },
        )
        .unwrap();
}
