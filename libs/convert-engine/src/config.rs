use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;

use convert_api::{CacheKeyFactory, CacheStore, CacheStoreFactory, Converter};
use store_memory::MemoryCacheStoreFactory;

use crate::cached::{CacheMode, CachedConverter};
use crate::discriminator::ContextKeysDiscriminator;
use crate::error::EngineError;

// ═══════════════════════════════════════════════════════════════
//  Cache Config
// ═══════════════════════════════════════════════════════════════

/// Configuration of a cached converter.
#[derive(Debug, Default, Deserialize)]
pub struct CacheConfig {
    /// Handling of concurrent misses for one key.
    #[serde(default)]
    pub mode: CacheMode,
    /// Backing store.
    #[serde(default)]
    pub store: StoreConfig,
    /// Context keys mixed into the cache key. Empty = source-only keys.
    #[serde(default)]
    pub discriminate_by: Vec<String>,
}

/// Store backend selection.
#[derive(Debug, Deserialize)]
pub struct StoreConfig {
    /// Registered store kind: "memory" (built-in) or an application store.
    #[serde(default = "default_store_kind")]
    pub kind: String,
    /// Store-specific configuration, handed to the store factory as JSON.
    #[serde(default)]
    pub config: Option<serde_json::Value>,
}

fn default_store_kind() -> String {
    "memory".into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: default_store_kind(),
            config: None,
        }
    }
}

/// Store config as a JSON string, `"{}"` when absent.
pub fn config_json_or_empty(config: &Option<serde_json::Value>) -> Result<String, EngineError> {
    match config {
        Some(value) => Ok(serde_json::to_string(value)?),
        None => Ok("{}".into()),
    }
}

// ═══════════════════════════════════════════════════════════════
//  Store Registry
// ═══════════════════════════════════════════════════════════════

/// Store factories by kind.
pub struct StoreRegistry<T> {
    factories: HashMap<String, Arc<dyn CacheStoreFactory<T>>>,
}

impl<T: Send + Sync + 'static> StoreRegistry<T> {
    /// Registry with the built-in "memory" store.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register("memory", Arc::new(MemoryCacheStoreFactory::<T>::new()));
        registry
    }

    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    pub fn register(&mut self, kind: impl Into<String>, factory: Arc<dyn CacheStoreFactory<T>>) {
        self.factories.insert(kind.into(), factory);
    }

    pub fn create(&self, config: &StoreConfig) -> Result<Arc<dyn CacheStore<T>>, EngineError> {
        let factory = self
            .factories
            .get(&config.kind)
            .ok_or_else(|| EngineError::UnknownStore(config.kind.clone()))?;
        let config_json = config_json_or_empty(&config.config)?;
        let store = factory.create(&config_json).map_err(|source| EngineError::Store {
            kind: config.kind.clone(),
            source,
        })?;
        tracing::info!(kind = %config.kind, "created cache store");
        Ok(store)
    }
}

impl<T: Send + Sync + 'static> Default for StoreRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, T: Send + Sync + 'static> CachedConverter<S, T> {
    /// Assemble a cached converter from configuration.
    pub fn from_config(
        inner: Arc<dyn Converter<S, T>>,
        key_factory: Arc<dyn CacheKeyFactory<S>>,
        config: &CacheConfig,
        stores: &StoreRegistry<T>,
    ) -> Result<Self, EngineError> {
        let store = stores.create(&config.store)?;
        let mut converter = CachedConverter::new(inner, key_factory, store).with_mode(config.mode);
        if !config.discriminate_by.is_empty() {
            converter = converter.with_discriminator(Arc::new(ContextKeysDiscriminator::new(
                config.discriminate_by.iter().cloned(),
            )));
        }
        tracing::debug!(
            mode = ?config.mode,
            store = %config.store.kind,
            discriminate_by = ?config.discriminate_by,
            "assembled cached converter"
        );
        Ok(converter)
    }
}
