use serde::{Deserialize, Serialize};

use convert_api::{CacheKeyFactory, ContextRef, ConvertError, Populator};

/// Input record.
#[derive(Debug, Clone, Deserialize)]
pub struct Person {
    pub uuid: Option<u64>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
}

/// Output record.
#[derive(Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonView {
    pub id: String,
    pub full_name: String,
    pub initials: String,
}

fn names(person: &Person) -> Result<(&str, &str), ConvertError> {
    let first = person
        .firstname
        .as_deref()
        .ok_or_else(|| ConvertError::population("firstname is required"))?;
    let last = person
        .lastname
        .as_deref()
        .ok_or_else(|| ConvertError::population("lastname is required"))?;
    Ok((first, last))
}

pub struct IdPopulator;

impl Populator<Person, PersonView> for IdPopulator {
    fn populate(&self, target: &mut PersonView, source: &Person, _ctx: ContextRef<'_>) -> Result<(), ConvertError> {
        target.id = source
            .uuid
            .map(|uuid| uuid.to_string())
            .ok_or_else(|| ConvertError::population("uuid is required"))?;
        Ok(())
    }
}

/// `first{separator}last`; the separator defaults to a single space.
pub struct FullNamePopulator;

impl Populator<Person, PersonView> for FullNamePopulator {
    fn populate(&self, target: &mut PersonView, source: &Person, ctx: ContextRef<'_>) -> Result<(), ConvertError> {
        let (first, last) = names(source)?;
        let separator = ctx.as_deref().and_then(|c| c.get_str("separator")).unwrap_or(" ");
        target.full_name = format!("{first}{separator}{last}");
        Ok(())
    }
}

pub struct InitialsPopulator;

impl Populator<Person, PersonView> for InitialsPopulator {
    fn populate(&self, target: &mut PersonView, source: &Person, _ctx: ContextRef<'_>) -> Result<(), ConvertError> {
        let (first, last) = names(source)?;
        target.initials = first.chars().take(1).chain(last.chars().take(1)).collect();
        Ok(())
    }
}

/// People are cached by uuid.
pub struct UuidKey;

impl CacheKeyFactory<Person> for UuidKey {
    fn create_cache_key(&self, source: &Person) -> Result<String, ConvertError> {
        source
            .uuid
            .map(|uuid| uuid.to_string())
            .ok_or_else(|| ConvertError::cache_key("person without uuid"))
    }
}
