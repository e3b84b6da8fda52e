//! The session and identity collaborator.

use std::sync::Arc;

use async_trait::async_trait;
use common::UserId;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::cart::Cart;
use crate::error::SessionError;

/// The signed-in buyer, as supplied by the authentication layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyerIdentity {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// Per-session state: the cart and who (if anyone) is signed in.
#[async_trait]
pub trait CartSession: Send + Sync {
    /// Loads the cart, or an empty one if none is stored.
    async fn load_cart(&self) -> Result<Cart, SessionError>;

    /// Replaces the stored cart.
    async fn store_cart(&self, cart: &Cart) -> Result<(), SessionError>;

    /// Removes every line from the stored cart.
    async fn clear_cart(&self) -> Result<(), SessionError>;

    /// Returns the signed-in buyer, or None for anonymous sessions.
    async fn current_buyer(&self) -> Result<Option<BuyerIdentity>, SessionError>;
}

/// A session held in process memory.
#[derive(Debug, Clone, Default)]
pub struct InMemorySession {
    cart: Arc<RwLock<Cart>>,
    buyer: Arc<RwLock<Option<BuyerIdentity>>>,
}

impl InMemorySession {
    /// Creates an anonymous session with an empty cart.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Creates a session signed in as `buyer`.
    pub fn signed_in(buyer: BuyerIdentity) -> Self {
        Self {
            cart: Arc::default(),
            buyer: Arc::new(RwLock::new(Some(buyer))),
        }
    }

    /// Sets the initial cart.
    pub fn with_cart(self, cart: Cart) -> Self {
        Self {
            cart: Arc::new(RwLock::new(cart)),
            buyer: self.buyer,
        }
    }

    /// Returns a copy of the current cart.
    pub async fn cart(&self) -> Cart {
        self.cart.read().await.clone()
    }
}

#[async_trait]
impl CartSession for InMemorySession {
    async fn load_cart(&self) -> Result<Cart, SessionError> {
        Ok(self.cart.read().await.clone())
    }

    async fn store_cart(&self, cart: &Cart) -> Result<(), SessionError> {
        *self.cart.write().await = cart.clone();
        Ok(())
    }

    async fn clear_cart(&self) -> Result<(), SessionError> {
        *self.cart.write().await = Cart::new();
        Ok(())
    }

    async fn current_buyer(&self) -> Result<Option<BuyerIdentity>, SessionError> {
        Ok(self.buyer.read().await.clone())
    }
}
