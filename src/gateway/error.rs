use thiserror::Error;

use crate::domain::EntryId;

/// Failure reported by a persistence gateway.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("form `{0}` not found")]
    FormNotFound(String),
    #[error("entry {id} not found in form `{form}`")]
    EntryNotFound { form: String, id: EntryId },
    #[error("form `{0}` already exists")]
    FormExists(String),
    #[error("storage error: {0}")]
    Io(String),
    #[error("json error: {0}")]
    Serde(String),
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("gateway unavailable: {0}")]
    Unavailable(String),
}

impl GatewayError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            GatewayError::FormNotFound(_) | GatewayError::EntryNotFound { .. }
        )
    }
}

impl From<std::io::Error> for GatewayError {
    fn from(err: std::io::Error) -> Self {
        GatewayError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::Serde(err.to_string())
    }
}
