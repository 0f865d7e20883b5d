#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    #[error("config ({context}): {detail}")]
    Config { context: &'static str, detail: String },

    #[error("input ({context}): {detail}")]
    Input { context: &'static str, detail: String },

    #[error("{0}")]
    Engine(#[from] convert_engine::EngineError),

    #[error("conversion: {0}")]
    Convert(#[from] convert_api::ConvertError),

    #[error("worker: {0}")]
    Worker(#[from] tokio::task::JoinError),

    #[error("output: {0}")]
    Output(#[from] serde_json::Error),
}
