use std::sync::Arc;

use convert_api::{ContextMap, Converter, DefaultFactory};
use convert_engine::{CacheConfig, CachedConverter, PopulatingConverter, StoreRegistry};

use crate::config::{ConvertArgs, DemoConfig};
use crate::domain::{FullNamePopulator, IdPopulator, InitialsPopulator, Person, PersonView, UuidKey};
use crate::error::DemoError;

pub async fn run(args: ConvertArgs) -> Result<(), DemoError> {
    tracing::info!("convert-demo starting");

    let config = match &args.config {
        Some(path) => {
            let config = DemoConfig::load(path)?;
            tracing::info!(config = %path, "loaded config");
            config
        }
        None => DemoConfig::default(),
    };

    let people = read_people(&args.input)?;
    tracing::info!(input = %args.input, people = people.len(), "loaded input");

    let separator = args.separator.or(config.separator);
    let converter = Arc::new(build_converter(&config.cache)?);
    let views = convert_people(Arc::clone(&converter), people, separator, config.workers).await?;

    let stats = converter.stats();
    tracing::info!(
        converted = views.len(),
        hits = stats.hits,
        misses = stats.misses,
        store_failures = stats.store_failures,
        "conversion finished"
    );

    let rendered: Vec<&PersonView> = views.iter().map(|view| view.as_ref()).collect();
    println!("{}", serde_json::to_string_pretty(&rendered)?);
    Ok(())
}

fn read_people(path: &str) -> Result<Vec<Person>, DemoError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| DemoError::Input { context: "read", detail: format!("'{path}': {e}") })?;
    serde_json::from_str(&content)
        .map_err(|e| DemoError::Input { context: "parse", detail: format!("'{path}': {e}") })
}

pub fn build_converter(cache: &CacheConfig) -> Result<CachedConverter<Person, PersonView>, DemoError> {
    let inner = PopulatingConverter::builder(DefaultFactory::<PersonView>::new())
        .populator(IdPopulator)
        .populator(FullNamePopulator)
        .populator(InitialsPopulator)
        .build();
    let converter = CachedConverter::from_config(
        Arc::new(inner),
        Arc::new(UuidKey),
        cache,
        &StoreRegistry::new(),
    )?;
    Ok(converter)
}

/// Converts `people` on blocking workers sharing one cached converter.
///
/// Each worker takes a contiguous chunk and one context for the whole chunk;
/// output order follows input order.
pub async fn convert_people(
    converter: Arc<CachedConverter<Person, PersonView>>,
    people: Vec<Person>,
    separator: Option<String>,
    workers: usize,
) -> Result<Vec<Arc<PersonView>>, DemoError> {
    if people.is_empty() {
        return Ok(Vec::new());
    }
    let chunk_size = people.len().div_ceil(workers.max(1));

    let mut handles = Vec::new();
    for (index, chunk) in people.chunks(chunk_size).enumerate() {
        let chunk = chunk.to_vec();
        let converter = Arc::clone(&converter);
        let separator = separator.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            let mut ctx = ContextMap::new();
            if let Some(separator) = separator {
                ctx.insert("separator", separator);
            }
            tracing::debug!(worker = index, records = chunk.len(), "worker started");
            converter.convert_all(&chunk, Some(&mut ctx))
        }));
    }

    let mut views = Vec::with_capacity(people.len());
    for handle in handles {
        views.extend(handle.await??);
    }
    Ok(views)
}
