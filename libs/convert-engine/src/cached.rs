use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Deserialize;

use convert_api::{
    CacheKeyFactory, CacheStore, ContextRef, ConvertError, Converter, ConverterContext,
};

use crate::discriminator::ContextDiscriminator;
use crate::stats::{AtomicCacheStats, CacheStats};

/// How concurrent misses for the same key are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheMode {
    /// No coordination: concurrent misses all convert, the last `put` wins.
    #[default]
    BestEffort,
    /// Compute-or-wait: one conversion per key at a time, waiters reuse its
    /// result.
    Exclusive,
}

// ═══════════════════════════════════════════════════════════════
//  Key locks
// ═══════════════════════════════════════════════════════════════

/// Per-key mutexes for `CacheMode::Exclusive`. An entry lives only while
/// some caller holds or waits for it.
#[derive(Default)]
struct KeyLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyLocks {
    fn lease<'a>(&'a self, key: &'a str) -> KeyLease<'a> {
        let mut locks = self.locks.lock();
        let lock = Arc::clone(locks.entry(key.to_owned()).or_default());
        KeyLease { locks: self, key, lock }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().len()
    }
}

/// Claim on one key's mutex. Dropping it, on return or on unwind, removes
/// the map entry once no other lease refers to it.
struct KeyLease<'a> {
    locks: &'a KeyLocks,
    key: &'a str,
    lock: Arc<Mutex<()>>,
}

impl Drop for KeyLease<'_> {
    fn drop(&mut self) {
        let mut locks = self.locks.locks.lock();
        // The map's reference plus ours.
        if locks.get(self.key).is_some_and(|l| Arc::strong_count(l) == 2) {
            locks.remove(self.key);
        }
    }
}

/// Escapes `\` and every char of `special` with a backslash.
pub(crate) fn escape_key_part(part: &str, special: &[char]) -> String {
    let mut escaped = String::with_capacity(part.len());
    for c in part.chars() {
        if c == '\\' || special.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

// ═══════════════════════════════════════════════════════════════
//  CachedConverter
// ═══════════════════════════════════════════════════════════════

/// Read-through cache in front of a converter.
///
/// Per call: derive the key from the source, look it up, return the stored
/// target on a hit. On a miss convert with the inner converter, store the
/// result and return it. A hit never touches the inner converter, its
/// factory or its populators, and the context of that call is ignored.
///
/// Keys depend on the source only (unless a `ContextDiscriminator` is set),
/// so the same source under two contexts shares one entry.
///
/// A failed `put` is logged and the freshly converted target is still
/// returned. Key derivation and `get` failures abort the call.
///
/// In `Exclusive` mode the inner conversion runs under a per-key lock; an
/// inner converter that re-enters this cached converter with the same key
/// deadlocks.
pub struct CachedConverter<S, T> {
    inner: Arc<dyn Converter<S, T>>,
    key_factory: Arc<dyn CacheKeyFactory<S>>,
    store: Arc<dyn CacheStore<T>>,
    discriminator: Option<Arc<dyn ContextDiscriminator>>,
    mode: CacheMode,
    key_locks: KeyLocks,
    stats: AtomicCacheStats,
}

impl<S, T> CachedConverter<S, T> {
    pub fn new(
        inner: Arc<dyn Converter<S, T>>,
        key_factory: Arc<dyn CacheKeyFactory<S>>,
        store: Arc<dyn CacheStore<T>>,
    ) -> Self {
        Self {
            inner,
            key_factory,
            store,
            discriminator: None,
            mode: CacheMode::default(),
            key_locks: KeyLocks::default(),
            stats: AtomicCacheStats::default(),
        }
    }

    pub fn with_mode(mut self, mode: CacheMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_discriminator(mut self, discriminator: Arc<dyn ContextDiscriminator>) -> Self {
        self.discriminator = Some(discriminator);
        self
    }

    pub fn mode(&self) -> CacheMode {
        self.mode
    }

    /// The backing store, for preloading and invalidation.
    pub fn store(&self) -> &Arc<dyn CacheStore<T>> {
        &self.store
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    /// Key under which `source` is cached for the given context.
    ///
    /// Without a discriminator this is the source key as-is. With one, every
    /// key has the form `"{source key}#{discriminator}"` (the discriminator
    /// part may be empty) and `#` and `\` in the source key are escaped, so
    /// no source key can reach another source's context-specific entry.
    pub fn cache_key(
        &self,
        source: &S,
        ctx: Option<&(dyn ConverterContext + 'static)>,
    ) -> Result<String, ConvertError> {
        let key = self.key_factory.create_cache_key(source)?;
        let Some(discriminator) = &self.discriminator else {
            return Ok(key);
        };
        let disc = discriminator.discriminate(ctx)?.unwrap_or_default();
        Ok(format!("{}#{disc}", escape_key_part(&key, &['#'])))
    }

    fn hit(&self, key: &str, target: Arc<T>) -> Arc<T> {
        self.stats.record_hit();
        tracing::debug!(key, "cache hit");
        target
    }

    fn convert_and_store(
        &self,
        key: String,
        source: &S,
        ctx: ContextRef<'_>,
    ) -> Result<Arc<T>, ConvertError> {
        self.stats.record_miss();
        tracing::debug!(key = %key, "cache miss");

        let target = Arc::new(self.inner.convert(source, ctx)?);
        if let Err(e) = self.store.put(key.clone(), Arc::clone(&target)) {
            self.stats.record_store_failure();
            tracing::warn!(key = %key, error = %e, "cache put failed, returning uncached target");
        }
        Ok(target)
    }

    fn convert_exclusive(
        &self,
        key: String,
        source: &S,
        ctx: ContextRef<'_>,
    ) -> Result<Arc<T>, ConvertError> {
        let lease = self.key_locks.lease(&key);
        let _held = lease.lock.lock();
        // Another caller may have filled the entry while we waited.
        match self.store.get(&key)? {
            Some(target) => Ok(self.hit(&key, target)),
            None => self.convert_and_store(key.clone(), source, ctx),
        }
    }

    #[cfg(test)]
    fn pending_key_locks(&self) -> usize {
        self.key_locks.len()
    }
}

impl<S, T> Converter<S, Arc<T>> for CachedConverter<S, T>
where
    T: Send + Sync,
{
    fn convert(&self, source: &S, ctx: ContextRef<'_>) -> Result<Arc<T>, ConvertError> {
        let key = self.cache_key(source, ctx.as_deref())?;

        if let Some(target) = self.store.get(&key)? {
            return Ok(self.hit(&key, target));
        }

        match self.mode {
            CacheMode::BestEffort => self.convert_and_store(key, source, ctx),
            CacheMode::Exclusive => self.convert_exclusive(key, source, ctx),
        }
    }
}
