//! Checkout for the storefront.
//!
//! A checkout attempt moves through these states:
//! 1. Loading: read the cart, the buyer and one inventory snapshot
//! 2. Validating: compare every cart line against the snapshot
//! 3. Committing: write order, items, stock and seller counters atomically
//!
//! Stock is decremented with a conditional update, so a concurrent checkout
//! that drains a product after the snapshot was taken aborts the whole
//! transaction instead of overselling.

pub mod error;
pub mod orchestrator;
pub mod outcome;
pub mod state;

pub use error::{CheckoutError, Result};
pub use orchestrator::CheckoutOrchestrator;
pub use outcome::{CheckoutOutcome, Rejection, ShippingDetails, StockViolation};
pub use state::CheckoutState;
