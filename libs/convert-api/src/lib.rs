//! Capability traits of the conversion framework.
//!
//! A [`Converter`] turns a source into a target. The stock implementation
//! (in `convert-engine`) asks a [`TargetTypeFactory`] for an empty target and
//! runs an ordered list of [`Populator`]s over it. A cached converter puts a
//! [`CacheStore`] in front, keyed by a [`CacheKeyFactory`].

pub mod cache;
pub mod context;
pub mod converter;
pub mod error;
pub mod factory;
pub mod populator;

pub use cache::{CacheKeyFactory, CacheStore, CacheStoreFactory, FnKeyFactory};
pub use context::{ContextMap, ContextRef, ContextValue, ConverterContext};
pub use converter::Converter;
pub use error::{ConvertError, ErrorKind};
pub use factory::{DefaultFactory, FnFactory, TargetTypeFactory};
pub use populator::{FnPopulator, Populator};
