use std::sync::Arc;

use convert_api::{ContextRef, ConvertError, Converter, Populator};

/// Populates a collection field by running another converter over a child
/// collection of the source.
///
/// `children` picks the child slice out of the source, `assign` stores the
/// converted vector on the target. Children share the context of the outer
/// conversion; the first failing child aborts the outer conversion.
pub struct CollectionPopulator<C, U, G, A> {
    converter: Arc<dyn Converter<C, U>>,
    children: G,
    assign: A,
}

impl<C, U, G, A> CollectionPopulator<C, U, G, A> {
    pub fn new<S, T>(converter: Arc<dyn Converter<C, U>>, children: G, assign: A) -> Self
    where
        G: Fn(&S) -> &[C] + Send + Sync,
        A: Fn(&mut T, Vec<U>) + Send + Sync,
    {
        Self { converter, children, assign }
    }
}

impl<S, T, C, U, G, A> Populator<S, T> for CollectionPopulator<C, U, G, A>
where
    G: Fn(&S) -> &[C] + Send + Sync,
    A: Fn(&mut T, Vec<U>) + Send + Sync,
{
    fn populate(&self, target: &mut T, source: &S, ctx: ContextRef<'_>) -> Result<(), ConvertError> {
        let converted = self.converter.convert_all((self.children)(source), ctx)?;
        (self.assign)(target, converted);
        Ok(())
    }
}
