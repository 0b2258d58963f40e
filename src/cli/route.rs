//! CLI route: single route table and run context.

use crate::cli::output::{format_dump_json, format_dump_text, format_keys};
use crate::cli::parse::{Cli, Commands, DumpFormat};
use crate::config::{ConfigLoader, DeployConfig};
use crate::context::NAMESPACE_KWARG;
use crate::environment::{Environment, ROOT_MODULE, ROOT_TASK};
use crate::error::DeployError;
use crate::layer::ConfigLayer;
use crate::prompt::{DisabledPrompter, Prompter, TerminalPrompter};
use crate::task::TaskScope;
use crate::value::Value;
use std::sync::Arc;
use tracing::info;

/// Runtime context for CLI execution: loaded configuration, environment and task scope.
pub struct RunContext {
    config: DeployConfig,
    env: Environment,
    scope: TaskScope,
    kwargs: ConfigLayer,
}

impl RunContext {
    /// Load configuration and build the environment described by the CLI flags.
    pub fn new(cli: &Cli) -> Result<Self, DeployError> {
        let config = match cli.config {
            Some(ref path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&cli.workspace, cli.conf_name.as_deref())?,
        };
        Self::from_config(config, cli)
    }

    pub fn from_config(config: DeployConfig, cli: &Cli) -> Result<Self, DeployError> {
        let prompter: Arc<dyn Prompter> = if cli.no_input {
            Arc::new(DisabledPrompter)
        } else {
            Arc::new(TerminalPrompter)
        };
        let env = Environment::from_config(&config).with_prompter(prompter);

        let scope = match cli.task {
            Some(ref task) => parse_task(task)?,
            None => TaskScope::new(ROOT_MODULE, ROOT_TASK),
        };

        let mut kwargs: ConfigLayer = cli.set.iter().cloned().collect();
        if let Some(ref namespace) = cli.namespace {
            kwargs.insert(NAMESPACE_KWARG, Value::Str(namespace.clone()));
        }

        Ok(Self {
            config,
            env,
            scope,
            kwargs,
        })
    }

    pub fn config(&self) -> &DeployConfig {
        &self.config
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, DeployError> {
        let conf = self.env.context(&self.scope, self.kwargs.clone());
        info!(context = %conf.name(), conf_name = %self.config.conf_name, "Executing command");
        match command {
            Commands::Get { key } => Ok(conf.get(key)?.to_string()),
            Commands::Dump { format } => {
                let snapshot = conf.snapshot();
                match format {
                    DumpFormat::Text => Ok(format_dump_text(&snapshot)),
                    DumpFormat::Json => format_dump_json(&snapshot),
                }
            }
            Commands::Keys => Ok(format_keys(&conf.keys())),
        }
    }
}

/// `module.name` → scope; a bare name lands in the root module.
fn parse_task(task: &str) -> Result<TaskScope, DeployError> {
    let (module, name) = task.rsplit_once('.').unwrap_or((ROOT_MODULE, task));
    if module.is_empty() || name.is_empty() {
        return Err(DeployError::InvalidArgument(format!(
            "task must be module.name, got '{}'",
            task
        )));
    }
    Ok(TaskScope::new(module, name))
}
