use adaptive_payment_engine::traits::ProcessorError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdaptiveApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Could not deserialize response: {0}")]
    JsonError(String),
}

impl From<AdaptiveApiError> for ProcessorError {
    fn from(e: AdaptiveApiError) -> Self {
        match e {
            AdaptiveApiError::Initialization(m) => ProcessorError::Initialization(m),
            AdaptiveApiError::Transport(m) => ProcessorError::Transport(m),
            AdaptiveApiError::QueryError { status, message } => ProcessorError::QueryError { status, message },
            AdaptiveApiError::JsonError(m) => ProcessorError::JsonError(m),
        }
    }
}
