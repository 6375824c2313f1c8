use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Provider not ready: {0}")]
    NotReady(String),

    #[error("Trigger error: {0}")]
    Trigger(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serde error: {0}")]
    Serde(String),
}
