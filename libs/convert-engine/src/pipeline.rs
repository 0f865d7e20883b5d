use std::sync::Arc;

use convert_api::{ContextRef, ConvertError, Converter, Populator, TargetTypeFactory};

/// Factory + ordered populators.
///
/// `convert` asks the factory for an empty target, then runs every
/// populator in registration order over it. The first failure aborts the
/// conversion: the half-populated target is dropped and the error goes to
/// the caller untouched.
pub struct PopulatingConverter<S, T> {
    factory: Arc<dyn TargetTypeFactory<T>>,
    populators: Vec<Arc<dyn Populator<S, T>>>,
}

impl<S, T> PopulatingConverter<S, T> {
    pub fn new(
        factory: Arc<dyn TargetTypeFactory<T>>,
        populators: Vec<Arc<dyn Populator<S, T>>>,
    ) -> Self {
        Self { factory, populators }
    }

    pub fn builder(factory: impl TargetTypeFactory<T> + 'static) -> ConverterBuilder<S, T> {
        ConverterBuilder {
            factory: Arc::new(factory),
            populators: Vec::new(),
        }
    }

    pub fn populator_count(&self) -> usize {
        self.populators.len()
    }
}

impl<S, T> Converter<S, T> for PopulatingConverter<S, T> {
    fn convert(&self, source: &S, mut ctx: ContextRef<'_>) -> Result<T, ConvertError> {
        let mut target = self.factory.create(ctx.as_deref_mut()).inspect_err(|e| {
            tracing::debug!(error = %e, "target construction failed");
        })?;

        for (index, populator) in self.populators.iter().enumerate() {
            if let Err(e) = populator.populate(&mut target, source, ctx.as_deref_mut()) {
                tracing::debug!(populator = index, kind = %e.kind(), error = %e, "population failed");
                return Err(e);
            }
            tracing::trace!(populator = index, "populated");
        }

        Ok(target)
    }
}

/// Assembles a `PopulatingConverter`; populators run in the order added.
pub struct ConverterBuilder<S, T> {
    factory: Arc<dyn TargetTypeFactory<T>>,
    populators: Vec<Arc<dyn Populator<S, T>>>,
}

impl<S, T> ConverterBuilder<S, T> {
    pub fn populator(mut self, populator: impl Populator<S, T> + 'static) -> Self {
        self.populators.push(Arc::new(populator));
        self
    }

    /// Register a populator that is shared with other converters.
    pub fn shared_populator(mut self, populator: Arc<dyn Populator<S, T>>) -> Self {
        self.populators.push(populator);
        self
    }

    pub fn build(self) -> PopulatingConverter<S, T> {
        PopulatingConverter::new(self.factory, self.populators)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use convert_api::{ContextMap, ConverterContext, DefaultFactory, ErrorKind, FnFactory, FnPopulator};

    #[derive(Debug, Default)]
    struct Row {
        cells: Vec<String>,
    }

    /// Appends its tag to the target and to a shared call log.
    struct Tagging {
        tag: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Populator<u32, Row> for Tagging {
        fn populate(&self, target: &mut Row, source: &u32, _ctx: ContextRef<'_>) -> Result<(), ConvertError> {
            self.log.lock().unwrap().push(self.tag);
            target.cells.push(format!("{}{source}", self.tag));
            Ok(())
        }
    }

    #[test]
    fn populators_run_once_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let converter = PopulatingConverter::builder(DefaultFactory::<Row>::new())
            .populator(Tagging { tag: "a", log: Arc::clone(&log) })
            .populator(Tagging { tag: "b", log: Arc::clone(&log) })
            .populator(Tagging { tag: "c", log: Arc::clone(&log) })
            .build();

        let row = converter.convert(&7, None).unwrap();
        assert_eq!(row.cells, ["a7", "b7", "c7"]);
        assert_eq!(*log.lock().unwrap(), ["a", "b", "c"]);
        assert_eq!(converter.populator_count(), 3);
    }

    #[test]
    fn context_written_by_factory_is_visible_to_populators() {
        let converter = PopulatingConverter::builder(FnFactory::new(|ctx: ContextRef<'_>| {
            if let Some(ctx) = ctx {
                ctx.set("factory", "ran");
            }
            Ok(Row::default())
        }))
        .populator(FnPopulator::new(|row: &mut Row, _src: &u32, ctx: ContextRef<'_>| {
            let seen = ctx.as_deref().and_then(|c| c.get_str("factory")).unwrap_or("absent");
            row.cells.push(seen.to_string());
            Ok(())
        }))
        .build();

        let mut ctx = ContextMap::new();
        assert_eq!(converter.convert(&1, Some(&mut ctx)).unwrap().cells, ["ran"]);
        assert!(ctx.has_key("factory"));
        assert_eq!(converter.convert(&1, None).unwrap().cells, ["absent"]);
    }

    #[test]
    fn factory_failure_skips_populators() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let converter = PopulatingConverter::builder(FnFactory::new(|_ctx: ContextRef<'_>| {
            Err::<Row, _>(ConvertError::construction("no row type for locale"))
        }))
        .populator(Tagging { tag: "a", log: Arc::clone(&log) })
        .build();

        let err = converter.convert(&1, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Construction);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn convert_all_stops_at_first_failure() {
        let converter = PopulatingConverter::builder(DefaultFactory::<Row>::new())
            .populator(FnPopulator::new(|row: &mut Row, src: &u32, _ctx: ContextRef<'_>| {
                if *src == 0 {
                    return Err(ConvertError::population("zero is not a row"));
                }
                row.cells.push(src.to_string());
                Ok(())
            }))
            .build();

        let rows = converter.convert_all(&[1, 2], None).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].cells, ["2"]);

        let err = converter.convert_all(&[1, 0, 2], None).unwrap_err();
        assert_eq!(err.message(), "zero is not a row");
    }

    #[test]
    fn factory_runs_once_per_conversion() {
        let created = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&created);
        let converter = PopulatingConverter::builder(FnFactory::new(move |_ctx: ContextRef<'_>| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Row::default())
        }))
        .populator(Tagging { tag: "a", log: Arc::new(Mutex::new(Vec::new())) })
        .build();

        converter.convert(&1, None).unwrap();
        assert_eq!(created.load(Ordering::SeqCst), 1);

        let rows = converter.convert_all(&[1, 2, 3, 4], None).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(created.load(Ordering::SeqCst), 5);
    }
}
