//! The session-held shopping cart.

use std::collections::BTreeMap;

use common::ProductId;
use serde::{Deserialize, Serialize};

/// Largest quantity a single cart line may hold, bounded by the order item
/// column type.
pub const MAX_LINE_QUANTITY: u32 = i32::MAX as u32;

/// Desired purchase quantities keyed by product.
///
/// Every stored quantity is at least 1. Operations that would store zero
/// remove the entry instead, and every mutation returns a new cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<ProductId, u32>", into = "BTreeMap<ProductId, u32>")]
pub struct Cart {
    lines: BTreeMap<ProductId, u32>,
}

impl Cart {
    /// Creates an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a cart with `product_id` set to exactly `quantity`.
    ///
    /// A quantity of zero removes the line.
    pub fn with_quantity(&self, product_id: ProductId, quantity: u32) -> Self {
        let mut lines = self.lines.clone();
        if quantity == 0 {
            lines.remove(&product_id);
        } else {
            lines.insert(product_id, quantity);
        }
        Self { lines }
    }

    /// Returns a cart without `product_id`.
    pub fn without(&self, product_id: &ProductId) -> Self {
        let mut lines = self.lines.clone();
        lines.remove(product_id);
        Self { lines }
    }

    /// Returns the quantity held for a product, or 0.
    pub fn quantity_of(&self, product_id: &ProductId) -> u32 {
        self.lines.get(product_id).copied().unwrap_or(0)
    }

    /// Sums the quantities of every line.
    pub fn total_quantity(&self) -> u64 {
        self.lines.values().map(|&q| u64::from(q)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct products.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Iterates lines in product id order.
    pub fn iter(&self) -> impl Iterator<Item = (&ProductId, u32)> {
        self.lines.iter().map(|(id, &q)| (id, q))
    }

    pub fn product_ids(&self) -> Vec<ProductId> {
        self.lines.keys().cloned().collect()
    }
}

impl From<BTreeMap<ProductId, u32>> for Cart {
    fn from(mut lines: BTreeMap<ProductId, u32>) -> Self {
        lines.retain(|_, q| *q > 0);
        Self { lines }
    }
}

impl From<Cart> for BTreeMap<ProductId, u32> {
    fn from(cart: Cart) -> Self {
        cart.lines
    }
}

impl FromIterator<(ProductId, u32)> for Cart {
    fn from_iter<I: IntoIterator<Item = (ProductId, u32)>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<BTreeMap<_, _>>())
    }
}
