//! Deployment environment
//!
//! The `Environment` owns what outlives a single task: the global layer (user
//! overrides, prompt answers, `set_globally` writes), the default table and the
//! prompter. Every task invocation gets its own `Context` built from a copy of the
//! global layer; the copy is dropped when the task returns.

use crate::config::DeployConfig;
use crate::context::{Context, Shared, WriteLog};
use crate::defaults;
use crate::error::ResolveError;
use crate::interpolate::OnMissing;
use crate::layer::{shared, ConfigLayer, SharedLayer};
use crate::prompt::{Prompter, TerminalPrompter};
use crate::task::{self, Task, TaskScope};
use std::sync::Arc;
use tracing::{info, info_span};

pub const ROOT_MODULE: &str = "env";
pub const ROOT_TASK: &str = "conf";

pub struct Environment {
    global: SharedLayer,
    writes: Arc<WriteLog>,
    defaults: Arc<ConfigLayer>,
    prompter: Arc<dyn Prompter>,
    on_missing: OnMissing,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new(ConfigLayer::new())
    }
}

impl Environment {
    /// Environment seeded with `overrides`, built-in defaults and a terminal prompter.
    pub fn new(overrides: ConfigLayer) -> Self {
        Self {
            global: shared(overrides),
            writes: Arc::default(),
            defaults: Arc::new(defaults::builtin()),
            prompter: Arc::new(TerminalPrompter),
            on_missing: OnMissing::Leave,
        }
    }

    pub fn from_config(config: &DeployConfig) -> Self {
        Self::new(config.overrides.clone())
    }

    pub fn with_prompter(mut self, prompter: Arc<dyn Prompter>) -> Self {
        self.prompter = prompter;
        self
    }

    /// Replace the default layer entirely.
    pub fn with_defaults(mut self, defaults: ConfigLayer) -> Self {
        self.defaults = Arc::new(defaults);
        self
    }

    pub fn with_on_missing(mut self, on_missing: OnMissing) -> Self {
        self.on_missing = on_missing;
        self
    }

    pub fn global(&self) -> SharedLayer {
        Arc::clone(&self.global)
    }

    fn shared(&self) -> Shared {
        Shared {
            global: Arc::clone(&self.global),
            writes: Arc::clone(&self.writes),
            defaults: Arc::clone(&self.defaults),
            prompter: Arc::clone(&self.prompter),
            on_missing: self.on_missing,
        }
    }

    /// Context for one invocation of the task described by `scope`.
    pub fn context(&self, scope: &TaskScope, kwargs: ConfigLayer) -> Context {
        let local = self.global.read().clone();
        Context::build(scope.clone(), kwargs, local, self.shared())
    }

    /// Context outside any task, for inspection.
    pub fn root(&self) -> Context {
        self.context(&TaskScope::new(ROOT_MODULE, ROOT_TASK), ConfigLayer::new())
    }

    /// Run `task` with `kwargs` as its explicit arguments.
    pub fn run<T: Task + ?Sized>(
        &self,
        task: &T,
        kwargs: ConfigLayer,
    ) -> Result<T::Output, ResolveError> {
        let conf = self.context(task.scope(), kwargs);
        let span = info_span!("task", name = %conf.name());
        let _enter = span.enter();
        info!("Running task");
        let output = task::drive(task, &conf);
        info!(ok = output.is_ok(), "Task finished");
        output
    }
}
