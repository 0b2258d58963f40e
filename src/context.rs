//! Resolution context
//!
//! A `Context` is the configuration a single task invocation sees. Lookups walk a
//! fixed chain of sources, highest precedence first:
//!
//! 1. explicit arguments passed to this invocation
//! 2. computed values registered by the owning task
//! 3. the local layer: a copy of the global layer taken at creation (unprefixed for
//!    the task's namespaces), plus local writes
//! 4. the live global layer, which carries `set_globally` writes and prompt answers.
//!    A global write made after the copy was taken shadows the stale copy, unless
//!    this context wrote the key locally since or one of its namespaces overrides it.
//! 5. derived version links, looked up lazily for any `_path` key with a source
//! 6. built-in defaults
//! 7. an operator prompt
//!
//! Whatever the source, the raw value is interpolated and passed through the path
//! suffix policy before it is returned.

use crate::error::ResolveError;
use crate::interpolate::{self, OnMissing};
use crate::layer::{ConfigLayer, SharedLayer};
use crate::links;
use crate::namespace;
use crate::path;
use crate::prompt::Prompter;
use crate::task::{self, Task, TaskScope};
use crate::value::{ConfigValue, Value};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info, info_span, trace};

/// Keys starting with this marker are internal and never prompted for.
pub const INTERNAL_MARKER: char = '_';

/// Explicit argument naming an extra namespace for the invocation.
pub const NAMESPACE_KWARG: &str = "_namespace";

/// Which layer produced a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Explicit,
    Task,
    Local,
    Global,
    Derived,
    Default,
    Prompt,
}

#[derive(Debug, Clone, Copy)]
struct Lookup {
    prompt: bool,
}

impl Lookup {
    const INTERACTIVE: Lookup = Lookup { prompt: true };
    const QUIET: Lookup = Lookup { prompt: false };
}

/// Orders writes, so a context can tell whether a global write happened after its
/// copy of the global layer was taken.
#[derive(Debug, Default)]
pub(crate) struct WriteLog {
    clock: AtomicU64,
    global: Mutex<HashMap<String, u64>>,
}

impl WriteLog {
    fn now(&self) -> u64 {
        self.clock.load(Ordering::SeqCst)
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn record_global(&self, key: &str, at: u64) {
        self.global.lock().insert(key.to_string(), at);
    }

    fn last_global(&self, key: &str) -> Option<u64> {
        self.global.lock().get(key).copied()
    }
}

/// Shared pieces every context of one environment points at
#[derive(Clone)]
pub(crate) struct Shared {
    pub(crate) global: SharedLayer,
    pub(crate) writes: Arc<WriteLog>,
    pub(crate) defaults: Arc<ConfigLayer>,
    pub(crate) prompter: Arc<dyn Prompter>,
    pub(crate) on_missing: OnMissing,
}

pub struct Context {
    scope: TaskScope,
    namespaces: Vec<String>,
    kwargs: RwLock<ConfigLayer>,
    local: RwLock<ConfigLayer>,
    /// When the local copy of the global layer was taken
    born: u64,
    /// When each key was last written through this context
    local_writes: Mutex<HashMap<String, u64>>,
    /// Defaults with this task's namespaces applied
    defaults: Arc<ConfigLayer>,
    shared: Shared,
    /// Keys currently being resolved, with their nesting depth.
    in_progress: Mutex<HashMap<String, u8>>,
    /// Number of active non-prompting lookups; computed values they trigger stay quiet too.
    quiet: AtomicUsize,
}

/// Decrements the in-progress count for a key when dropped
struct EntryGuard<'a> {
    ctx: &'a Context,
    key: &'a str,
}

impl Drop for EntryGuard<'_> {
    fn drop(&mut self) {
        let mut in_progress = self.ctx.in_progress.lock();
        if let Some(depth) = in_progress.get_mut(self.key) {
            *depth -= 1;
            if *depth == 0 {
                in_progress.remove(self.key);
            }
        }
    }
}

/// Marks a non-prompting lookup as active until dropped
struct QuietGuard<'a>(&'a AtomicUsize);

impl Drop for QuietGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Context {
    /// Build a context from explicit arguments and a fresh copy of the global layer.
    pub(crate) fn build(
        scope: TaskScope,
        kwargs: ConfigLayer,
        mut local: ConfigLayer,
        shared: Shared,
    ) -> Self {
        let explicit_ns = match kwargs.get(NAMESPACE_KWARG) {
            Some(ConfigValue::Literal(v)) => Some(v.to_string()),
            _ => None,
        };
        let namespaces = scope.namespaces(explicit_ns.as_deref());
        namespace::unprefix(&mut local, &namespaces);
        let defaults = namespace::unprefixed_view(&shared.defaults, &namespaces);

        Context {
            scope,
            namespaces,
            kwargs: RwLock::new(kwargs),
            local: RwLock::new(local),
            born: shared.writes.now(),
            local_writes: Mutex::new(HashMap::new()),
            defaults,
            shared,
            in_progress: Mutex::new(HashMap::new()),
            quiet: AtomicUsize::new(0),
        }
    }

    /// Fully-qualified name of the owning task, used to label prompts.
    pub fn name(&self) -> String {
        self.scope.qualified_name()
    }

    pub fn scope(&self) -> &TaskScope {
        &self.scope
    }

    /// The root layer this context writes back to.
    pub fn global(&self) -> SharedLayer {
        Arc::clone(&self.shared.global)
    }

    // ---- reads -------------------------------------------------------------

    /// Resolve `key`, prompting the operator if no layer provides it.
    pub fn get(&self, key: &str) -> Result<Value, ResolveError> {
        self.resolve_public(key, Lookup::INTERACTIVE)
    }

    /// Resolve `key` without prompting, falling back to `default` when it is missing.
    pub fn get_or(&self, key: &str, default: impl Into<Value>) -> Result<Value, ResolveError> {
        match self.resolve_public(key, Lookup::QUIET) {
            Err(ResolveError::MissingKey(_)) => Ok(default.into()),
            other => other,
        }
    }

    pub fn get_str(&self, key: &str) -> Result<String, ResolveError> {
        Ok(self.get(key)?.to_string())
    }

    pub fn get_int(&self, key: &str) -> Result<i64, ResolveError> {
        let value = self.get(key)?;
        value.as_int().ok_or_else(|| ResolveError::InvalidValue {
            key: key.to_string(),
            reason: format!("expected an integer, got '{}'", value),
        })
    }

    /// List of strings. A scalar is returned as a one-element list.
    pub fn get_list(&self, key: &str) -> Result<Vec<String>, ResolveError> {
        let value = self.get(key)?;
        Ok(value
            .to_string_list()
            .unwrap_or_else(|| vec![value.to_string()]))
    }

    /// Whether `key` resolves. Never prompts.
    pub fn contains(&self, key: &str) -> bool {
        self.resolve_public(key, Lookup::QUIET).is_ok()
    }

    /// Every key any layer knows about, in first-seen order from lowest precedence up.
    pub fn keys(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut keys = Vec::new();
        let mut push = |key: &str| {
            if seen.insert(key.to_string()) {
                keys.push(key.to_string());
            }
        };
        self.defaults.keys().for_each(&mut push);
        self.shared.global.read().keys().for_each(&mut push);
        self.local.read().keys().for_each(&mut push);
        self.scope.computed().names().for_each(&mut push);
        self.kwargs.read().keys().for_each(&mut push);
        for link in links::link_keys(self, &keys) {
            if seen.insert(link.clone()) {
                keys.push(link);
            }
        }
        keys
    }

    /// Flat view of every key that resolves without prompting, for template rendering.
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        let mut snapshot = BTreeMap::new();
        for key in self.keys() {
            match self.resolve_public(&key, Lookup::QUIET) {
                Ok(value) => {
                    snapshot.insert(key, value);
                }
                Err(e) => debug!(key = %key, error = %e, "Skipping key in snapshot"),
            }
        }
        snapshot
    }

    /// `path_key` rewritten for a named version, e.g. `active` for `release_path`.
    pub fn versioned_path(&self, version: &str, path_key: &str) -> Result<String, ResolveError> {
        links::versioned_path(self, version, path_key)
    }

    // ---- writes ------------------------------------------------------------

    /// Write into this context only. An explicit argument of the same name is replaced
    /// as well so the write is visible.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        let at = self.shared.writes.tick();
        self.set_at(key.into(), ConfigValue::Literal(value.into()), at);
    }

    fn set_at(&self, key: String, value: ConfigValue, at: u64) {
        {
            let mut kwargs = self.kwargs.write();
            if kwargs.contains_key(&key) {
                kwargs.insert(key.clone(), value.clone());
            }
        }
        self.local.write().insert(key.clone(), value);
        self.local_writes.lock().insert(key, at);
    }

    /// Write only when `key` does not already resolve.
    pub fn set_default(&self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        if !self.contains(&key) {
            self.set(key, value);
        }
    }

    /// Write into this context and into the global layer, so contexts created later,
    /// and lookups that fall through to the global layer, observe the value.
    pub fn set_globally(&self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = ConfigValue::Literal(value.into());
        let at = self.shared.writes.tick();
        self.set_at(key.clone(), value.clone(), at);
        self.shared.global.write().insert(key.clone(), value);
        self.shared.writes.record_global(&key, at);
    }

    // ---- nesting -----------------------------------------------------------

    /// Context for a nested invocation: the parent's explicit arguments merged with
    /// `kwargs`, over a fresh copy of the global layer carrying the parent's local
    /// writes that are still current.
    pub fn child(&self, scope: TaskScope, kwargs: ConfigLayer) -> Context {
        let mut merged = self.kwargs.read().clone();
        merged.merge(&kwargs);
        let global = self.shared.global.read().clone();
        let child = Context::build(scope, merged, global, self.shared.clone());

        let writes: Vec<(String, u64)> = self
            .local_writes
            .lock()
            .iter()
            .map(|(key, at)| (key.clone(), *at))
            .collect();
        for (key, at) in writes {
            if self.global_supersedes(&key) {
                continue;
            }
            let value = self.local.read().get(&key).cloned();
            if let Some(value) = value {
                child.local.write().insert(key.clone(), value);
                child.local_writes.lock().insert(key, at);
            }
        }
        child
    }

    /// Run `task` in a child context that is discarded afterwards.
    pub fn run_nested<T: Task + ?Sized>(
        &self,
        task: &T,
        kwargs: ConfigLayer,
    ) -> Result<T::Output, ResolveError> {
        let child = self.child(task.scope().clone(), kwargs);
        let span = info_span!("task", name = %child.name(), parent = %self.name());
        let _enter = span.enter();
        info!("Running nested task");
        task::drive(task, &child)
    }

    // ---- resolution --------------------------------------------------------

    pub(crate) fn has_source(&self, key: &str) -> bool {
        self.kwargs.read().contains_key(key)
            || self.scope.computed().contains(key)
            || self.local.read().contains_key(key)
            || self.shared.global.read().contains_key(key)
            || self.defaults.contains_key(key)
    }

    /// Whether a global write made after this context's copy should win over it.
    fn global_supersedes(&self, key: &str) -> bool {
        let Some(written) = self.shared.writes.last_global(key) else {
            return false;
        };
        let mark = self
            .local_writes
            .lock()
            .get(key)
            .copied()
            .unwrap_or(self.born);
        if written <= mark {
            return false;
        }
        let local = self.local.read();
        !self
            .namespaces
            .iter()
            .any(|ns| local.contains_key(&format!("{}{}", ns, key)))
    }

    /// Resolve without prompting; recursion surfaces as a missing key.
    pub(crate) fn resolve_quiet(&self, key: &str) -> Result<Value, ResolveError> {
        self.resolve_public(key, Lookup::QUIET)
    }

    fn resolve_public(&self, key: &str, lookup: Lookup) -> Result<Value, ResolveError> {
        let _quiet = (!lookup.prompt).then(|| {
            self.quiet.fetch_add(1, Ordering::SeqCst);
            QuietGuard(&self.quiet)
        });
        match self.resolve(key, lookup) {
            Err(ResolveError::RecursionDetected(_)) => Err(ResolveError::MissingKey(key.to_string())),
            other => other,
        }
    }

    fn enter<'a>(&'a self, key: &'a str) -> Result<(EntryGuard<'a>, u8), ResolveError> {
        let mut in_progress = self.in_progress.lock();
        let depth = in_progress.entry(key.to_string()).or_insert(0);
        if *depth >= 2 {
            return Err(ResolveError::RecursionDetected(key.to_string()));
        }
        let entered_at = *depth;
        *depth += 1;
        Ok((EntryGuard { ctx: self, key }, entered_at))
    }

    fn resolve(&self, key: &str, lookup: Lookup) -> Result<Value, ResolveError> {
        let (guard, depth) = self.enter(key)?;
        let result = self.resolve_entered(key, depth, lookup);
        drop(guard);
        match result {
            Err(ResolveError::RecursionDetected(k)) if depth == 0 && k == key => {
                debug!(key, "Recursive lookup broken, treating key as missing");
                Err(ResolveError::MissingKey(key.to_string()))
            }
            other => other,
        }
    }

    fn candidate(&self, key: &str, allow_computed: bool) -> Option<(Source, ConfigValue)> {
        let usable = |v: &&ConfigValue| allow_computed || !v.is_computed();

        if let Some(v) = self.kwargs.read().get(key).filter(usable) {
            return Some((Source::Explicit, v.clone()));
        }
        if allow_computed {
            if let Some(c) = self.scope.computed().get(key) {
                return Some((Source::Task, ConfigValue::Computed(c.clone())));
            }
        }
        let local = self.local.read().get(key).filter(usable).cloned();
        if let Some(v) = local {
            if !self.global_supersedes(key) {
                return Some((Source::Local, v));
            }
        }
        if let Some(v) = self.shared.global.read().get(key).filter(usable) {
            return Some((Source::Global, v.clone()));
        }
        // A link stored as a default counts as set by the user.
        if allow_computed && !self.defaults.contains_key(key) {
            if let Some(v) = links::derive(self, key) {
                return Some((Source::Derived, v));
            }
        }
        if let Some(v) = self.defaults.get(key).filter(usable) {
            return Some((Source::Default, v.clone()));
        }
        None
    }

    fn resolve_entered(&self, key: &str, depth: u8, lookup: Lookup) -> Result<Value, ResolveError> {
        // A key re-entered while its own evaluation runs only sees stored values.
        let reentered = depth > 0;
        match self.candidate(key, !reentered) {
            Some((source, value)) => {
                trace!(key, ?source, "Resolved configuration key");
                self.evaluate(key, value, lookup)
            }
            None if reentered => Err(ResolveError::RecursionDetected(key.to_string())),
            None => self.prompt_or_fail(key, lookup),
        }
    }

    fn evaluate(&self, key: &str, value: ConfigValue, lookup: Lookup) -> Result<Value, ResolveError> {
        let (raw, always_join) = match value {
            ConfigValue::Literal(v) => (v, false),
            ConfigValue::Computed(c) => (c.call(self)?, false),
            ConfigValue::DerivedPath(segments) => (
                Value::List(segments.into_iter().map(Value::Str).collect()),
                true,
            ),
        };
        let interpolated = self.interpolate(key, raw, lookup)?;
        path::apply_policy(key, interpolated, always_join)
    }

    fn interpolate(&self, key: &str, raw: Value, lookup: Lookup) -> Result<Value, ResolveError> {
        match raw {
            Value::Str(s) => {
                let rendered = interpolate::render(key, &s, self.shared.on_missing, |name| {
                    self.resolve(name, lookup)
                })?;
                Ok(Value::Str(rendered))
            }
            Value::List(items) => items
                .into_iter()
                .map(|item| self.interpolate(key, item, lookup))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            other => Ok(other),
        }
    }

    fn prompt_or_fail(&self, key: &str, lookup: Lookup) -> Result<Value, ResolveError> {
        let quiet = !lookup.prompt || self.quiet.load(Ordering::SeqCst) > 0;
        if key.starts_with(INTERNAL_MARKER) || quiet {
            return Err(ResolveError::MissingKey(key.to_string()));
        }
        let name = self.name();
        match self.shared.prompter.ask(&name, key)? {
            Some(answer) => {
                info!(context = %name, key, "Stored prompted configuration value");
                self.set_globally(key, answer.clone());
                trace!(key, source = ?Source::Prompt, "Resolved configuration key");
                self.evaluate(key, ConfigValue::Literal(Value::Str(answer)), lookup)
            }
            None => Err(ResolveError::MissingKey(key.to_string())),
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("name", &self.name())
            .field("kwargs", &self.kwargs.read().len())
            .field("local", &self.local.read().len())
            .finish()
    }
}
