use std::any::Any;

use convert_api::{ConvertError, ConverterContext};

use crate::cached::escape_key_part;

/// Separates cache entries of the same source by context.
///
/// The stricter variant of source-only keys. Once a cached converter has a
/// discriminator, every entry is stored under `"{key}#{d}"`, with `d` empty
/// when `discriminate` yields `None`. An error aborts the conversion before
/// the store is consulted.
pub trait ContextDiscriminator: Send + Sync {
    fn discriminate(
        &self,
        ctx: Option<&(dyn ConverterContext + 'static)>,
    ) -> Result<Option<String>, ConvertError>;
}

/// Discriminates by the values of a fixed list of context keys.
///
/// Renders `name=value` pairs in the configured order, joined by `,`, with
/// `,`, `=` and `\` in values escaped. Absent keys are skipped; a context
/// with none of the keys yields `None`. Strings, chars, bools and numbers
/// are rendered; a listed key holding any other type is a `CacheKey` error.
#[derive(Debug, Clone)]
pub struct ContextKeysDiscriminator {
    keys: Vec<String>,
}

impl ContextKeysDiscriminator {
    pub fn new<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }
}

fn render_value(value: &(dyn Any + Send)) -> Option<String> {
    macro_rules! render {
        ($($ty:ty),*) => {
            $(
                if let Some(v) = value.downcast_ref::<$ty>() {
                    return Some(v.to_string());
                }
            )*
        };
    }
    render!(String, &'static str, char, bool, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);
    None
}

impl ContextDiscriminator for ContextKeysDiscriminator {
    fn discriminate(
        &self,
        ctx: Option<&(dyn ConverterContext + 'static)>,
    ) -> Result<Option<String>, ConvertError> {
        let Some(ctx) = ctx else {
            return Ok(None);
        };
        let mut parts = Vec::new();
        for key in &self.keys {
            let Some(value) = ctx.get_value(key) else {
                continue;
            };
            let rendered = render_value(value).ok_or_else(|| {
                ConvertError::cache_key(format!(
                    "context key '{key}' holds a value that cannot be part of a cache key"
                ))
            })?;
            parts.push(format!("{key}={}", escape_key_part(&rendered, &[',', '='])));
        }
        if parts.is_empty() {
            Ok(None)
        } else {
            Ok(Some(parts.join(",")))
        }
    }
}
