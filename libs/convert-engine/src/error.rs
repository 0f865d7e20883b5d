#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("config serialization: {0}")]
    ConfigSerialization(#[from] serde_json::Error),

    #[error("store kind '{0}' is not registered")]
    UnknownStore(String),

    #[error("store ({kind}): {source}")]
    Store { kind: String, source: convert_api::ConvertError },
}

impl EngineError {
    /// Convert to ConvertError preserving ErrorKind.
    ///
    /// `Store(ConvertError)` → inner ConvertError as-is (kind preserved).
    /// Everything else → Config kind.
    pub fn into_convert_error(self) -> convert_api::ConvertError {
        match self {
            EngineError::Store { source, .. } => source,
            other => convert_api::ConvertError::config(other.to_string()),
        }
    }
}
