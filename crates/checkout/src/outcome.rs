//! Inputs and results of a checkout attempt.

use common::{Money, OrderId, ProductId};
use serde::{Deserialize, Serialize};

use crate::error::CheckoutError;

/// Where and to whom the order ships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingDetails {
    pub name: String,
    pub email: String,
    pub address: String,
}

impl ShippingDetails {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            address: address.into(),
        }
    }

    /// Trims every field and rejects blanks.
    pub fn validated(self) -> Result<Self, CheckoutError> {
        let name = required("name", &self.name)?;
        let email = required("email", &self.email)?;
        let address = required("address", &self.address)?;
        Ok(Self {
            name,
            email,
            address,
        })
    }
}

fn required(field: &str, value: &str) -> Result<String, CheckoutError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CheckoutError::Validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

/// A cart line that exceeds the stock in the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockViolation {
    pub product_id: ProductId,
    /// Units left; 0 when the product no longer exists.
    pub available: i64,
    pub wanted: u32,
}

impl std::fmt::Display for StockViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.available <= 0 {
            write!(f, "product {} is no longer available", self.product_id)
        } else {
            write!(
                f,
                "product {} only has {} left (wanted {})",
                self.product_id, self.available, self.wanted
            )
        }
    }
}

/// Why a checkout was turned away before anything was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    EmptyCart,
    Unauthenticated,
    /// One entry per offending line.
    Unavailable(Vec<StockViolation>),
}

impl Rejection {
    /// Short label used for metrics and logs.
    pub fn reason(&self) -> &'static str {
        match self {
            Rejection::EmptyCart => "empty_cart",
            Rejection::Unauthenticated => "unauthenticated",
            Rejection::Unavailable(_) => "unavailable",
        }
    }
}

/// The result of a checkout attempt that did not error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    Confirmed { order_id: OrderId, total: Money },
    Rejected(Rejection),
}

impl CheckoutOutcome {
    pub fn order_id(&self) -> Option<OrderId> {
        match self {
            CheckoutOutcome::Confirmed { order_id, .. } => Some(*order_id),
            CheckoutOutcome::Rejected(_) => None,
        }
    }
}
