//! Checkout error types.

use common::ProductId;
use domain::SessionError;
use store::StoreError;
use thiserror::Error;

/// Errors that stop a checkout attempt. None of them leave an order behind.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Shipping details are missing or malformed.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Stock ran out between the snapshot read and the write.
    #[error("Product {product_id} sold out while placing the order (wanted {wanted})")]
    OutOfStock { product_id: ProductId, wanted: u32 },

    /// Reading inventory or writing the order failed.
    #[error("Persistence failed: {0}")]
    Persistence(#[from] StoreError),

    /// The session could not be read.
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl CheckoutError {
    /// Returns true if the buyer can simply try again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CheckoutError::OutOfStock { .. } | CheckoutError::Persistence(_)
        )
    }
}

/// Convenience type alias for checkout results.
pub type Result<T> = std::result::Result<T, CheckoutError>;
