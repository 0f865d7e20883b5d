use std::fmt;

/// Category of a conversion error. Tells the caller which stage of the
/// pipeline gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The factory could not build a target for the given context.
    Construction,
    /// A populator rejected the source or a required context value.
    Population,
    /// No cache key could be derived from the source.
    CacheKey,
    /// The backing cache store failed (get or put).
    Store,
    /// Invalid configuration of a collaborator.
    Config,
    /// Logical error (unsupported operation, invalid state, generic).
    Logic,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Construction => f.write_str("construction"),
            ErrorKind::Population => f.write_str("population"),
            ErrorKind::CacheKey => f.write_str("cache-key"),
            ErrorKind::Store => f.write_str("store"),
            ErrorKind::Config => f.write_str("config"),
            ErrorKind::Logic => f.write_str("logic"),
        }
    }
}

/// Unified error type for every capability trait of the framework.
///
/// Carries an `ErrorKind` for categorization and a human-readable message.
/// Nothing in the pipeline retries; the error reaches the `convert` caller as-is.
#[derive(Clone, PartialEq, Eq)]
pub struct ConvertError {
    kind: ErrorKind,
    message: String,
}

impl ConvertError {
    pub fn new(kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self { kind, message: msg.into() }
    }

    pub fn construction(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Construction, msg)
    }

    pub fn population(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Population, msg)
    }

    pub fn cache_key(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::CacheKey, msg)
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Store, msg)
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, msg)
    }

    pub fn logic(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Logic, msg)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Add context to the error, preserving the original ErrorKind.
    ///
    /// Produces: `"context: original message"`.
    pub fn with_context(self, ctx: impl fmt::Display) -> Self {
        Self {
            kind: self.kind,
            message: format!("{ctx}: {}", self.message),
        }
    }
}

impl fmt::Debug for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ConvertError {}

impl From<serde_json::Error> for ConvertError {
    fn from(e: serde_json::Error) -> Self {
        Self::config(e.to_string())
    }
}

impl From<std::io::Error> for ConvertError {
    fn from(e: std::io::Error) -> Self {
        Self::store(e.to_string())
    }
}
