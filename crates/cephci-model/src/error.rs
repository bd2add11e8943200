use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidEnv { key: String, value: String },
    #[error("invalid node spec {0:?}: {1}")]
    InvalidNode(String, String),
    #[error("failed to read run config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse run config: {0}")]
    Parse(#[from] serde_json::Error),
}
