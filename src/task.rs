//! Task identity and computed-value registration
//!
//! A task reads its configuration through a `Context`. What the task contributes to
//! resolution is its `TaskScope`: the module and task names used for namespacing and
//! prompt labels, plus a table of computed values that rank just below explicit
//! arguments.

use crate::context::Context;
use crate::error::ResolveError;
use crate::namespace::namespaces_for;
use crate::value::{Computed, Value};
use std::collections::BTreeMap;

/// Name → computed value, registered when the task is constructed
#[derive(Debug, Clone, Default)]
pub struct ComputedTable {
    entries: BTreeMap<String, Computed>,
}

impl ComputedTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&Context) -> Result<Value, ResolveError> + Send + Sync + 'static,
    {
        self.entries.insert(name.into(), Computed::new(f));
    }

    pub fn get(&self, name: &str) -> Option<&Computed> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct TaskScope {
    module: String,
    name: String,
    computed: ComputedTable,
}

impl TaskScope {
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
            computed: ComputedTable::new(),
        }
    }

    /// Scope named after a type: `SetupBackports` in module `system` → `system.setup_backports`
    pub fn from_type_name(module: impl Into<String>, type_name: &str) -> Self {
        Self::new(module, snake_case(type_name))
    }

    /// Builder: register a computed value
    pub fn with_computed<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Context) -> Result<Value, ResolveError> + Send + Sync + 'static,
    {
        self.computed.register(name, f);
        self
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.module, self.name)
    }

    pub fn computed(&self) -> &ComputedTable {
        &self.computed
    }

    pub fn namespaces(&self, explicit: Option<&str>) -> Vec<String> {
        namespaces_for(&self.module, &self.name, explicit)
    }
}

/// Convert `CamelCase` to `snake_case`, keeping acronyms together (`HTTPServer` → `http_server`).
pub fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).map_or(false, |n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower)
            {
                out.push('_');
            }
        }
        out.extend(c.to_lowercase());
    }
    out
}

/// A unit of deployment work driven by resolved configuration
pub trait Task {
    type Output;

    fn scope(&self) -> &TaskScope;

    fn before_do(&self, _conf: &Context) -> Result<(), ResolveError> {
        Ok(())
    }

    fn execute(&self, conf: &Context) -> Result<Self::Output, ResolveError>;

    fn after_do(&self, _conf: &Context, _output: &Self::Output) -> Result<(), ResolveError> {
        Ok(())
    }
}

/// Run the hooks of `task` against an already-built context.
pub(crate) fn drive<T: Task + ?Sized>(task: &T, conf: &Context) -> Result<T::Output, ResolveError> {
    task.before_do(conf)?;
    let output = task.execute(conf)?;
    task.after_do(conf, &output)?;
    Ok(output)
}
