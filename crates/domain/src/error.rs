//! Domain error types.

use common::ProductId;
use store::StoreError;
use thiserror::Error;

/// Errors raised while reconciling a cart against inventory.
#[derive(Debug, Error)]
pub enum CartError {
    /// The product does not exist.
    #[error("Product not found: {0}")]
    NotFound(ProductId),

    /// Every remaining unit is already in the cart.
    #[error("Product {product_id} is out of stock ({in_cart} in cart, {stock} in stock)")]
    OutOfStock {
        product_id: ProductId,
        in_cart: u32,
        stock: i64,
    },

    /// Reading inventory failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// The session collaborator could not load or save state.
#[derive(Debug, Error)]
#[error("Session error: {0}")]
pub struct SessionError(pub String);
