//! Shopping cart domain for the storefront.
//!
//! This crate provides:
//! - [`Cart`], the session-held value type of product quantities
//! - [`CartReconciler`], which clamps cart quantities to live stock
//! - [`CartSession`], the collaborator that stores carts and knows the buyer

pub mod cart;
pub mod error;
pub mod reconciler;
pub mod session;

pub use cart::{Cart, MAX_LINE_QUANTITY};
pub use error::{CartError, SessionError};
pub use reconciler::{
    AddOutcome, CartLine, CartReconciler, CartTotals, CartView, QuantityNotice, UpdateOutcome,
    totals,
};
pub use session::{BuyerIdentity, CartSession, InMemorySession};
