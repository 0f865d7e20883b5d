use std::collections::{HashMap, VecDeque};
use std::marker::PhantomData;
use std::num::NonZeroUsize;
use std::sync::Arc;

use parking_lot::RwLock;

use convert_api::{CacheStore, CacheStoreFactory, ConvertError};

// ═══════════════════════════════════════════════════════════════
//  MemoryCacheStoreConfig
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Default, serde::Deserialize)]
pub struct MemoryCacheStoreConfig {
    /// Upper bound on stored entries. Absent = unbounded.
    #[serde(default)]
    pub max_entries: Option<usize>,
}

// ═══════════════════════════════════════════════════════════════
//  MemoryCacheStore
// ═══════════════════════════════════════════════════════════════

struct Entries<T> {
    map: HashMap<String, Arc<T>>,
    /// Insertion order of keys, tracked only when the store is bounded.
    order: VecDeque<String>,
}

/// In-process key → target store.
///
/// Unbounded by default: entries live until removed. With `max_entries`
/// set, inserting a new key into a full store evicts the oldest inserted
/// key first. Replacing the value of an existing key never evicts.
pub struct MemoryCacheStore<T> {
    entries: RwLock<Entries<T>>,
    max_entries: Option<NonZeroUsize>,
}

impl<T> MemoryCacheStore<T> {
    pub fn new() -> Self {
        Self::with_limit(None)
    }

    /// Store holding at most `max_entries` keys. A zero bound is not
    /// representable; callers that want no caching skip the store instead.
    pub fn bounded(max_entries: NonZeroUsize) -> Self {
        Self::with_limit(Some(max_entries))
    }

    fn with_limit(max_entries: Option<NonZeroUsize>) -> Self {
        Self {
            entries: RwLock::new(Entries {
                map: HashMap::new(),
                order: VecDeque::with_capacity(max_entries.map_or(0, NonZeroUsize::get).min(65536)),
            }),
            max_entries,
        }
    }

    pub fn max_entries(&self) -> Option<usize> {
        self.max_entries.map(NonZeroUsize::get)
    }

    pub fn len(&self) -> usize {
        self.entries.read().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().map.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.read().map.contains_key(key)
    }
}

impl<T> Default for MemoryCacheStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync> CacheStore<T> for MemoryCacheStore<T> {
    fn get(&self, key: &str) -> Result<Option<Arc<T>>, ConvertError> {
        Ok(self.entries.read().map.get(key).cloned())
    }

    fn put(&self, key: String, target: Arc<T>) -> Result<(), ConvertError> {
        let mut entries = self.entries.write();
        if let Some(slot) = entries.map.get_mut(&key) {
            *slot = target;
            return Ok(());
        }

        if let Some(max) = self.max_entries {
            while entries.map.len() >= max.get() {
                let Some(oldest) = entries.order.pop_front() else {
                    break;
                };
                entries.map.remove(&oldest);
                tracing::trace!(key = %oldest, "evicted cache entry");
            }
            entries.order.push_back(key.clone());
        }
        entries.map.insert(key, target);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<Option<Arc<T>>, ConvertError> {
        let mut entries = self.entries.write();
        let removed = entries.map.remove(key);
        if removed.is_some() && self.max_entries.is_some() {
            entries.order.retain(|k| k != key);
        }
        Ok(removed)
    }

    fn clear(&self) -> Result<(), ConvertError> {
        let mut entries = self.entries.write();
        entries.map.clear();
        entries.order.clear();
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════
//  MemoryCacheStoreFactory
// ═══════════════════════════════════════════════════════════════

pub struct MemoryCacheStoreFactory<T> {
    _target: PhantomData<fn() -> T>,
}

impl<T> MemoryCacheStoreFactory<T> {
    pub fn new() -> Self {
        Self { _target: PhantomData }
    }
}

impl<T> Default for MemoryCacheStoreFactory<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync + 'static> CacheStoreFactory<T> for MemoryCacheStoreFactory<T> {
    fn create(&self, config_json: &str) -> Result<Arc<dyn CacheStore<T>>, ConvertError> {
        let config: MemoryCacheStoreConfig = if config_json == "{}" {
            MemoryCacheStoreConfig::default()
        } else {
            serde_json::from_str(config_json)?
        };
        let max_entries = match config.max_entries {
            None => None,
            Some(max) => Some(NonZeroUsize::new(max).ok_or_else(|| {
                ConvertError::config("memory store: max_entries must be positive")
            })?),
        };
        tracing::debug!(max_entries = ?config.max_entries, "created memory cache store");
        Ok(Arc::new(MemoryCacheStore::with_limit(max_entries)))
    }
}
