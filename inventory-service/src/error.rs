use shared::api::ApiError;
use shared::storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("Product not found")]
    NotFound,
    #[error("Product unavailable")]
    Unavailable,
    #[error("inventory storage failed: {0}")]
    Storage(#[from] StorageError),
}

impl InventoryError {
    /// Business rejections, as opposed to internal failures.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::NotFound | Self::Unavailable)
    }
}

impl From<InventoryError> for ApiError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::NotFound | InventoryError::Unavailable => {
                ApiError::bad_request(err.to_string())
            }
            InventoryError::Storage(_) => ApiError::internal("Internal Server Error"),
        }
    }
}
