//! Configuration layers
//!
//! A layer is an insertion-ordered map from key to `ConfigValue`. Order matters for
//! the default table (it reads top to bottom like a settings file) and for bulk export.

use crate::context::Context;
use crate::error::ResolveError;
use crate::value::{ConfigValue, Value};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Handle to the root layer that receives prompt answers and global writes
pub type SharedLayer = Arc<RwLock<ConfigLayer>>;

pub fn shared(layer: ConfigLayer) -> SharedLayer {
    Arc::new(RwLock::new(layer))
}

#[derive(Debug, Clone, Default)]
pub struct ConfigLayer {
    entries: Vec<(String, ConfigValue)>,
    index: HashMap<String, usize>,
}

impl ConfigLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace. A replaced key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ConfigValue>) {
        let key = key.into();
        let value = value.into();
        match self.index.get(&key) {
            Some(&pos) => self.entries[pos].1 = value,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    /// Insert only when the key is absent. Returns whether the value was stored.
    pub fn insert_if_absent(
        &mut self,
        key: impl Into<String>,
        value: impl Into<ConfigValue>,
    ) -> bool {
        let key = key.into();
        if self.index.contains_key(&key) {
            return false;
        }
        self.insert(key, value);
        true
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.index.get(key).map(|&pos| &self.entries[pos].1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy every entry of `other` into this layer; `other` wins on conflicts.
    pub fn merge(&mut self, other: &ConfigLayer) {
        for (key, value) in other.iter() {
            self.insert(key, value.clone());
        }
    }

    /// Builder: add a literal value
    pub fn literal(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, ConfigValue::Literal(value.into()));
        self
    }

    /// Builder: add a computed value
    pub fn computed<F>(mut self, key: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Context) -> Result<Value, ResolveError> + Send + Sync + 'static,
    {
        self.insert(key, ConfigValue::computed(f));
        self
    }

    /// Builder: add a path assembled from segment templates
    pub fn segments<I, S>(mut self, key: impl Into<String>, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(key, ConfigValue::segments(segments));
        self
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ConfigLayer {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut layer = ConfigLayer::new();
        for (key, value) in iter {
            layer.insert(key, ConfigValue::Literal(value.into()));
        }
        layer
    }
}
