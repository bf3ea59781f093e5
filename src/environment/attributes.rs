//! Per-request attribute bag shared by all pipeline stages.

use std::collections::HashMap;

use serde_json::Value;

/// Well-known key holding the resolved environment label.
pub const ATTRIBUTE_ENVIRONMENT: &str = "ARCHURA_REQUEST_ENVIRONMENT";

/// String-keyed, request-scoped attributes.
///
/// Stages only ever insert or overwrite. Nothing is removed until the bag is
/// dropped with the request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    inner: HashMap<String, Value>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.inner.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.inner.get(key)
    }

    /// Value under `key` if it is a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.inner.get(key).and_then(Value::as_str)
    }

    /// The resolved environment, if a resolver ran.
    pub fn environment(&self) -> Option<&str> {
        self.get_str(ATTRIBUTE_ENVIRONMENT)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
