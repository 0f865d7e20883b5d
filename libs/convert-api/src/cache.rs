use std::sync::Arc;

use crate::error::ConvertError;

/// Derives the cache identity of a source.
///
/// The key is a pure function of the source and never sees the context:
/// the same source converted under two different contexts lands on the same
/// cache entry. Callers whose conversions depend on context must keep their
/// key spaces apart themselves (see `ContextDiscriminator` in the engine).
///
/// The key is not a content hash either. If the relevant content of a
/// source changes while its key stays the same, the cache keeps serving the
/// old target.
pub trait CacheKeyFactory<S>: Send + Sync {
    fn create_cache_key(&self, source: &S) -> Result<String, ConvertError>;
}

/// Closure adapter.
pub struct FnKeyFactory<F> {
    key: F,
}

impl<F> FnKeyFactory<F> {
    pub fn new<S>(key: F) -> Self
    where
        F: Fn(&S) -> Result<String, ConvertError> + Send + Sync,
    {
        Self { key }
    }
}

impl<S, F> CacheKeyFactory<S> for FnKeyFactory<F>
where
    F: Fn(&S) -> Result<String, ConvertError> + Send + Sync,
{
    fn create_cache_key(&self, source: &S) -> Result<String, ConvertError> {
        (self.key)(source)
    }
}

/// Key → target store behind a cached converter.
///
/// Targets are shared, never copied: after `put` the store and the caller
/// both own the same `Arc`. One entry per key; a second `put` replaces the
/// first. Eviction, expiry and capacity are up to the implementation.
pub trait CacheStore<T>: Send + Sync {
    /// `Ok(None)` is a miss.
    fn get(&self, key: &str) -> Result<Option<Arc<T>>, ConvertError>;

    fn put(&self, key: String, target: Arc<T>) -> Result<(), ConvertError>;

    /// Drop a single entry, returning it.
    ///
    /// Default: returns error (store does not support invalidation).
    fn remove(&self, _key: &str) -> Result<Option<Arc<T>>, ConvertError> {
        Err(ConvertError::logic("remove not supported"))
    }

    /// Drop every entry.
    ///
    /// Default: returns error (store does not support invalidation).
    fn clear(&self) -> Result<(), ConvertError> {
        Err(ConvertError::logic("clear not supported"))
    }
}

/// Builds a store from its JSON configuration (`"{}"` = defaults).
pub trait CacheStoreFactory<T>: Send + Sync {
    fn create(&self, config_json: &str) -> Result<Arc<dyn CacheStore<T>>, ConvertError>;
}
