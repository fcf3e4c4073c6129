use shared::api::ApiError;
use shared::storage::StorageError;
use thiserror::Error;

use crate::client::ClientError;

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Product unavailable")]
    Unavailable,
    #[error(transparent)]
    Upstream(#[from] ClientError),
    #[error("order storage failed: {0}")]
    Storage(#[from] StorageError),
}

impl OrderError {
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Unavailable)
    }

    /// Converts to the HTTP error body; internal failures are reported as `detail`.
    pub fn into_api_error(self, detail: &str) -> ApiError {
        match self {
            OrderError::Unavailable => ApiError::bad_request(self.to_string()),
            OrderError::Upstream(_) | OrderError::Storage(_) => ApiError::internal(detail),
        }
    }
}
