//! deployconf: layered, lazily evaluated deployment configuration
//!
//! Deployment tasks read settings through a `Context` that resolves each key on
//! demand from explicit arguments, task-computed values, operator overrides, derived
//! version links and built-in defaults, interpolating `{placeholders}` along the way
//! and asking the operator for anything still missing.

pub mod cli;
pub mod config;
pub mod context;
pub mod defaults;
pub mod environment;
pub mod error;
pub mod interpolate;
pub mod layer;
pub mod links;
pub mod logging;
pub mod namespace;
pub mod path;
pub mod prompt;
pub mod task;
pub mod value;

pub use context::{Context, Source};
pub use environment::Environment;
pub use error::{DeployError, ResolveError};
pub use interpolate::OnMissing;
pub use layer::{ConfigLayer, SharedLayer};
pub use task::{Task, TaskScope};
pub use value::{ConfigValue, Value};
