//! Configuration values
//!
//! `Value` is the resolved, plain data a task reads. `ConfigValue` is what a layer
//! stores before resolution: a literal, a lazily computed value, or a list of path
//! segments that is joined once interpolated.

use crate::context::Context;
use crate::error::ResolveError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Resolved configuration data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view. Numeric strings count, since prompted answers arrive as text.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Every element rendered as a string; `None` unless this is a list.
    pub fn to_string_list(&self) -> Option<Vec<String>> {
        self.as_list()
            .map(|items| items.iter().map(|item| item.to_string()).collect())
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => f.write_str(s),
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<u16> for Value {
    fn from(i: u16) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

type ComputeFn = dyn Fn(&Context) -> Result<Value, ResolveError> + Send + Sync;

/// A value produced on demand from the context it is read through
#[derive(Clone)]
pub struct Computed(Arc<ComputeFn>);

impl Computed {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Context) -> Result<Value, ResolveError> + Send + Sync + 'static,
    {
        Computed(Arc::new(f))
    }

    pub fn call(&self, ctx: &Context) -> Result<Value, ResolveError> {
        (self.0)(ctx)
    }
}

impl fmt::Debug for Computed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Computed(..)")
    }
}

/// A layer entry before resolution
#[derive(Debug, Clone)]
pub enum ConfigValue {
    Literal(Value),
    Computed(Computed),
    /// Path segment templates, joined after interpolation.
    DerivedPath(Vec<String>),
}

impl ConfigValue {
    pub fn literal(value: impl Into<Value>) -> Self {
        ConfigValue::Literal(value.into())
    }

    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&Context) -> Result<Value, ResolveError> + Send + Sync + 'static,
    {
        ConfigValue::Computed(Computed::new(f))
    }

    pub fn segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ConfigValue::DerivedPath(segments.into_iter().map(Into::into).collect())
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, ConfigValue::Computed(_))
    }
}

impl From<Value> for ConfigValue {
    fn from(value: Value) -> Self {
        ConfigValue::Literal(value)
    }
}
