use std::marker::PhantomData;

use crate::context::ContextRef;
use crate::error::ConvertError;

/// Produces a fresh, not-yet-populated target.
///
/// A factory never sees the source: it may read the context to pick a
/// variant of the target, but what goes into the target is the populators'
/// business. When no target can be built it returns a `Construction` error
/// instead of a half-initialized value; the converter does not check what
/// the factory hands back.
pub trait TargetTypeFactory<T>: Send + Sync {
    fn create(&self, ctx: ContextRef<'_>) -> Result<T, ConvertError>;
}

/// Factory for targets that have a sensible `Default`.
pub struct DefaultFactory<T> {
    _target: PhantomData<fn() -> T>,
}

impl<T> DefaultFactory<T> {
    pub fn new() -> Self {
        Self { _target: PhantomData }
    }
}

impl<T> Default for DefaultFactory<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Default> TargetTypeFactory<T> for DefaultFactory<T> {
    fn create(&self, _ctx: ContextRef<'_>) -> Result<T, ConvertError> {
        Ok(T::default())
    }
}

/// Closure adapter.
pub struct FnFactory<F> {
    create: F,
}

impl<F> FnFactory<F> {
    pub fn new<T>(create: F) -> Self
    where
        F: Fn(ContextRef<'_>) -> Result<T, ConvertError> + Send + Sync,
    {
        Self { create }
    }
}

impl<T, F> TargetTypeFactory<T> for FnFactory<F>
where
    F: Fn(ContextRef<'_>) -> Result<T, ConvertError> + Send + Sync,
{
    fn create(&self, ctx: ContextRef<'_>) -> Result<T, ConvertError> {
        (self.create)(ctx)
    }
}
