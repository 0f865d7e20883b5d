use crate::context::ContextRef;
use crate::error::ConvertError;

/// One unit of transformation logic from `S` into an existing `T`.
///
/// A populator only mutates the target it is given. Several populators run
/// on the same target one after another; when two of them write the same
/// field the one registered later wins. A populator may hold other
/// converters to fill nested parts of the target.
pub trait Populator<S, T>: Send + Sync {
    fn populate(&self, target: &mut T, source: &S, ctx: ContextRef<'_>) -> Result<(), ConvertError>;
}

/// Closure adapter.
pub struct FnPopulator<F> {
    populate: F,
}

impl<F> FnPopulator<F> {
    pub fn new<S, T>(populate: F) -> Self
    where
        F: Fn(&mut T, &S, ContextRef<'_>) -> Result<(), ConvertError> + Send + Sync,
    {
        Self { populate }
    }
}

impl<S, T, F> Populator<S, T> for FnPopulator<F>
where
    F: Fn(&mut T, &S, ContextRef<'_>) -> Result<(), ConvertError> + Send + Sync,
{
    fn populate(&self, target: &mut T, source: &S, ctx: ContextRef<'_>) -> Result<(), ConvertError> {
        (self.populate)(target, source, ctx)
    }
}
