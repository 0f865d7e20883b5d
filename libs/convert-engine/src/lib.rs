//! Conversion pipeline and read-through cache on top of `convert-api`.

pub mod cached;
pub mod config;
pub mod discriminator;
pub mod error;
pub mod nested;
pub mod pipeline;
pub mod stats;

pub use cached::{CacheMode, CachedConverter};
pub use config::{CacheConfig, StoreConfig, StoreRegistry};
pub use discriminator::{ContextDiscriminator, ContextKeysDiscriminator};
pub use error::EngineError;
pub use nested::CollectionPopulator;
pub use pipeline::{ConverterBuilder, PopulatingConverter};
pub use stats::CacheStats;

pub use store_memory::{MemoryCacheStore, MemoryCacheStoreFactory};
