use thiserror::Error;

use super::conversation_store::StoreOperation;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Could not reach the store to {operation}: {source}")]
    Network {
        operation: StoreOperation,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to {operation} (HTTP {status})")]
    Fetch { operation: StoreOperation, status: u16 },

    #[error("Malformed response while trying to {operation}: {source}")]
    Parse {
        operation: StoreOperation,
        #[source]
        source: serde_json::Error,
    },

    #[error("Conversation {0} not found")]
    NotFound(i64),
}

pub type StoreResult<T> = Result<T, StoreError>;
