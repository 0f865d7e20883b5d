use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use convert_api::{
    CacheKeyFactory, CacheStore, ContextMap, ContextRef, ConvertError, Converter, DefaultFactory,
    ErrorKind, FnPopulator, Populator,
};
use convert_engine::{CachedConverter, MemoryCacheStore, PopulatingConverter};

#[derive(Debug, Clone)]
struct Person {
    uuid: Option<u64>,
    firstname: Option<String>,
    lastname: Option<String>,
}

impl Person {
    fn new(uuid: u64, firstname: &str, lastname: &str) -> Self {
        Self {
            uuid: Some(uuid),
            firstname: Some(firstname.into()),
            lastname: Some(lastname.into()),
        }
    }
}

#[derive(Debug, Default, PartialEq)]
struct PersonView {
    full_name: String,
}

/// Joins first and last name with the context's `separator`, a single space
/// when absent.
struct FullNamePopulator {
    calls: AtomicUsize,
}

impl FullNamePopulator {
    fn new() -> Arc<Self> {
        Arc::new(Self { calls: AtomicUsize::new(0) })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Populator<Person, PersonView> for FullNamePopulator {
    fn populate(&self, target: &mut PersonView, source: &Person, ctx: ContextRef<'_>) -> Result<(), ConvertError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let first = source
            .firstname
            .as_deref()
            .ok_or_else(|| ConvertError::population("firstname is required"))?;
        let last = source
            .lastname
            .as_deref()
            .ok_or_else(|| ConvertError::population("lastname is required"))?;
        let separator = ctx.as_deref().and_then(|c| c.get_str("separator")).unwrap_or(" ");
        target.full_name = format!("{first}{separator}{last}");
        Ok(())
    }
}

struct UuidKey;

impl CacheKeyFactory<Person> for UuidKey {
    fn create_cache_key(&self, source: &Person) -> Result<String, ConvertError> {
        source
            .uuid
            .map(|uuid| uuid.to_string())
            .ok_or_else(|| ConvertError::cache_key("person without uuid"))
    }
}

fn person_converter(populator: Arc<FullNamePopulator>) -> PopulatingConverter<Person, PersonView> {
    PopulatingConverter::builder(DefaultFactory::<PersonView>::new())
        .shared_populator(populator)
        .build()
}

fn cached_person_converter() -> (
    Arc<FullNamePopulator>,
    Arc<MemoryCacheStore<PersonView>>,
    CachedConverter<Person, PersonView>,
) {
    let populator = FullNamePopulator::new();
    let store = Arc::new(MemoryCacheStore::<PersonView>::new());
    let converter = CachedConverter::new(
        Arc::new(person_converter(Arc::clone(&populator))),
        Arc::new(UuidKey),
        store.clone(),
    );
    (populator, store, converter)
}

#[test]
fn full_name_uses_space_without_context() {
    let converter = person_converter(FullNamePopulator::new());
    let view = converter.convert(&Person::new(1, "Ada", "Lovelace"), None).unwrap();
    assert_eq!(view.full_name, "Ada Lovelace");
}

#[test]
fn full_name_uses_separator_from_context() {
    let converter = person_converter(FullNamePopulator::new());
    let mut ctx = ContextMap::new().with("separator", "-");
    let view = converter.convert(&Person::new(1, "Ada", "Lovelace"), Some(&mut ctx)).unwrap();
    assert_eq!(view.full_name, "Ada-Lovelace");
}

#[test]
fn absent_and_empty_context_agree() {
    let converter = person_converter(FullNamePopulator::new());
    let ada = Person::new(1, "Ada", "Lovelace");
    let mut empty = ContextMap::new();
    assert_eq!(
        converter.convert(&ada, None).unwrap(),
        converter.convert(&ada, Some(&mut empty)).unwrap()
    );
}

#[test]
fn later_populator_wins_on_shared_field() {
    let converter = PopulatingConverter::builder(DefaultFactory::<PersonView>::new())
        .shared_populator(FullNamePopulator::new())
        .populator(FnPopulator::new(|view: &mut PersonView, person: &Person, _ctx: ContextRef<'_>| {
            view.full_name = person.lastname.clone().unwrap_or_default().to_uppercase();
            Ok(())
        }))
        .build();

    let view = converter.convert(&Person::new(1, "Ada", "Lovelace"), None).unwrap();
    assert_eq!(view.full_name, "LOVELACE");
}

#[test]
fn cache_hit_returns_same_instance_without_populating() {
    let (populator, _store, converter) = cached_person_converter();
    let ada = Person::new(42, "Ada", "Lovelace");

    let first = converter.convert(&ada, None).unwrap();
    let second = converter.convert(&ada, None).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(populator.calls(), 1);
    let stats = converter.stats();
    assert_eq!((stats.hits, stats.misses), (1, 1));
}

#[test]
fn cache_hit_ignores_context() {
    let (populator, _store, converter) = cached_person_converter();
    let ada = Person::new(7, "Ada", "Lovelace");

    let mut dash = ContextMap::new().with("separator", "-");
    let first = converter.convert(&ada, Some(&mut dash)).unwrap();
    let mut slash = ContextMap::new().with("separator", "/");
    let second = converter.convert(&ada, Some(&mut slash)).unwrap();

    assert_eq!(second.full_name, "Ada-Lovelace");
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(populator.calls(), 1);
}

#[test]
fn cache_identity_is_key_only() {
    let (_populator, store, converter) = cached_person_converter();
    let ada = Person::new(42, "Ada", "Lovelace");
    assert_eq!(UuidKey.create_cache_key(&ada).unwrap(), "42");

    let first = converter.convert(&ada, None).unwrap();
    let impostor = Person::new(42, "Charles", "Babbage");
    let second = converter.convert(&impostor, None).unwrap();

    assert_eq!(second.full_name, "Ada Lovelace");
    assert!(Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&store.get("42").unwrap().unwrap(), &first));
}

#[test]
fn failing_populator_leaves_no_cache_entry() {
    let (_populator, store, converter) = cached_person_converter();
    let nameless = Person {
        uuid: Some(42),
        firstname: Some("Ada".into()),
        lastname: None,
    };

    let err = converter.convert(&nameless, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Population);
    assert_eq!(err.message(), "lastname is required");
    assert!(store.is_empty());
    assert!(store.get("42").unwrap().is_none());
}

#[test]
fn missing_uuid_fails_before_conversion() {
    let (populator, store, converter) = cached_person_converter();
    let anonymous = Person {
        uuid: None,
        firstname: Some("Ada".into()),
        lastname: Some("Lovelace".into()),
    };

    let err = converter.convert(&anonymous, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CacheKey);
    assert_eq!(populator.calls(), 0);
    assert!(store.is_empty());
}

#[test]
fn cached_converters_nest_as_converters() {
    let (populator, _store, converter) = cached_person_converter();
    let converter: Arc<dyn Converter<Person, Arc<PersonView>>> = Arc::new(converter);
    let people = vec![
        Person::new(1, "Ada", "Lovelace"),
        Person::new(2, "Charles", "Babbage"),
        Person::new(1, "Ada", "Lovelace"),
    ];

    let views = converter.convert_all(&people, None).unwrap();
    assert_eq!(views[1].full_name, "Charles Babbage");
    assert!(Arc::ptr_eq(&views[0], &views[2]));
    assert_eq!(populator.calls(), 2);
}
