use crate::context::ContextRef;
use crate::error::ConvertError;

/// Source → target conversion.
///
/// Every call is independent: implementations hold no per-call state, so one
/// converter can serve concurrent callers as long as they don't share a
/// context.
pub trait Converter<S, T>: Send + Sync {
    fn convert(&self, source: &S, ctx: ContextRef<'_>) -> Result<T, ConvertError>;

    /// Convert every source in order, sharing one context.
    ///
    /// Stops at the first failure; nothing converted so far is returned.
    fn convert_all(&self, sources: &[S], mut ctx: ContextRef<'_>) -> Result<Vec<T>, ConvertError> {
        sources
            .iter()
            .map(|source| self.convert(source, ctx.as_deref_mut()))
            .collect()
    }
}
