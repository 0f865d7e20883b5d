use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use crate::error::ConvertError;

/// Value stored in a context. No type constraints beyond `Send`.
pub type ContextValue = Box<dyn Any + Send>;

/// Optional context argument threaded through factories and populators.
///
/// `None` means "no parameters available": every consumer falls back to its
/// documented default.
pub type ContextRef<'a> = Option<&'a mut (dyn ConverterContext + 'static)>;

/// Mutable key/value parameter carrier for a single conversion.
///
/// The boundary is duck-typed: anything that can answer `has_key`,
/// `get_value` and `set_value` can be passed in, so domain-specific
/// contexts stay pluggable. Values written by a factory or populator are
/// visible to the populators that run after it in the same conversion.
///
/// A context is owned by one logical conversion and is not shared across
/// threads.
pub trait ConverterContext {
    fn has_key(&self, key: &str) -> bool;

    /// `None` when the key is absent.
    fn get_value(&self, key: &str) -> Option<&(dyn Any + Send)>;

    fn set_value(&mut self, key: String, value: ContextValue);
}

impl<'a> dyn ConverterContext + 'a {
    /// Typed read. `None` when absent or stored with a different type.
    pub fn get<V: Any>(&self, key: &str) -> Option<&V> {
        self.get_value(key)?.downcast_ref::<V>()
    }

    /// String read, accepting both `String` and `&'static str` values.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        let value = self.get_value(key)?;
        value
            .downcast_ref::<String>()
            .map(String::as_str)
            .or_else(|| value.downcast_ref::<&'static str>().copied())
    }

    /// Typed read for values a populator cannot do without.
    pub fn require<V: Any>(&self, key: &str) -> Result<&V, ConvertError> {
        match self.get_value(key) {
            None => Err(ConvertError::population(format!(
                "context key '{key}' is required"
            ))),
            Some(value) => value.downcast_ref::<V>().ok_or_else(|| {
                ConvertError::population(format!(
                    "context key '{key}' holds a value of an unexpected type"
                ))
            }),
        }
    }

    pub fn set<V: Any + Send>(&mut self, key: impl Into<String>, value: V) {
        self.set_value(key.into(), Box::new(value));
    }
}

/// Map-backed reference context.
#[derive(Default)]
pub struct ContextMap {
    entries: HashMap<String, ContextValue>,
}

impl ContextMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with<V: Any + Send>(mut self, key: impl Into<String>, value: V) -> Self {
        self.entries.insert(key.into(), Box::new(value));
        self
    }

    pub fn insert<V: Any + Send>(&mut self, key: impl Into<String>, value: V) {
        self.entries.insert(key.into(), Box::new(value));
    }

    pub fn remove(&mut self, key: &str) -> Option<ContextValue> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl ConverterContext for ContextMap {
    fn has_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn get_value(&self, key: &str) -> Option<&(dyn Any + Send)> {
        self.entries.get(key).map(|v| v.as_ref())
    }

    fn set_value(&mut self, key: String, value: ContextValue) {
        self.entries.insert(key, value);
    }
}

impl fmt::Debug for ContextMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.keys().collect();
        keys.sort_unstable();
        f.debug_struct("ContextMap").field("keys", &keys).finish()
    }
}
