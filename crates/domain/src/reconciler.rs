//! Keeps cart quantities consistent with live stock.

use std::collections::HashMap;

use common::{Money, ProductId};
use serde::Serialize;
use store::{InventoryStore, Product};

use crate::cart::{Cart, MAX_LINE_QUANTITY};
use crate::error::CartError;

/// Item count and amount for a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CartTotals {
    pub total_items: u64,
    pub total_amount: Money,
}

/// Sums quantities and `price * quantity` for every line.
///
/// Lines whose product no longer exists still count towards `total_items`
/// but are priced at zero.
pub fn totals(cart: &Cart, products: &HashMap<ProductId, Product>) -> CartTotals {
    let mut result = CartTotals::default();
    for (id, quantity) in cart.iter() {
        result.total_items += u64::from(quantity);
        if let Some(product) = products.get(id) {
            result.total_amount += product.price.multiply(quantity);
        }
    }
    result
}

/// Units a single line may hold: the product's stock, capped at
/// [`MAX_LINE_QUANTITY`]. Unlimited products get the cap.
fn line_limit(product: &Product) -> i64 {
    let cap = i64::from(MAX_LINE_QUANTITY);
    product.stock.map_or(cap, |stock| stock.min(cap))
}

/// The result of adding a product to a cart.
#[derive(Debug, Clone, PartialEq)]
pub struct AddOutcome {
    pub cart: Cart,
    pub granted: u32,
    pub requested: u32,
    pub message: String,
}

impl AddOutcome {
    /// Returns true if stock limited the grant.
    pub fn is_partial(&self) -> bool {
        self.granted < self.requested
    }
}

/// A user-visible adjustment made during a bulk update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuantityNotice {
    /// The requested quantity exceeded stock and was reduced to it.
    Clamped { product_id: ProductId, stock: i64 },
    /// The product is gone or has no stock left; its line was dropped.
    Removed { product_id: ProductId },
}

impl std::fmt::Display for QuantityNotice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuantityNotice::Clamped { product_id, stock } => write!(
                f,
                "Quantity for product {product_id} reduced to available stock ({stock})."
            ),
            QuantityNotice::Removed { product_id } => write!(
                f,
                "Product {product_id} is no longer available and was removed from your cart."
            ),
        }
    }
}

/// The result of a bulk quantity update.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOutcome {
    pub cart: Cart,
    pub notices: Vec<QuantityNotice>,
}

/// A cart line joined with its product, for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub title: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub line_total: Money,
    pub stock: Option<i64>,
}

/// Every displayable line of a cart plus its totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLine>,
    #[serde(flatten)]
    pub totals: CartTotals,
}

/// Reconciles carts against an inventory store.
pub struct CartReconciler<S: InventoryStore> {
    store: S,
}

impl<S: InventoryStore> CartReconciler<S> {
    /// Creates a reconciler reading from the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Adds up to `requested` units of a product, limited by the stock not
    /// already in the cart.
    ///
    /// `requested` below 1 is treated as 1. Fails with
    /// [`CartError::OutOfStock`] when nothing can be granted; the input cart
    /// is never modified.
    #[tracing::instrument(skip(self, cart))]
    pub async fn add(
        &self,
        cart: &Cart,
        product_id: ProductId,
        requested: i64,
    ) -> Result<AddOutcome, CartError> {
        let requested = u32::try_from(requested.max(1)).unwrap_or(u32::MAX);

        let product = self
            .store
            .get_product(&product_id)
            .await?
            .ok_or_else(|| CartError::NotFound(product_id.clone()))?;

        let in_cart = cart.quantity_of(&product_id);
        let stock = line_limit(&product);
        let available = stock - i64::from(in_cart);
        if available <= 0 {
            tracing::info!(%product_id, in_cart, stock, "add refused: out of stock");
            return Err(CartError::OutOfStock {
                product_id,
                in_cart,
                stock,
            });
        }
        let granted = u32::try_from(available.min(i64::from(requested))).unwrap_or(requested);

        let message = if granted < requested {
            metrics::counter!("cart_partial_adds_total").increment(1);
            tracing::info!(%product_id, granted, requested, "partial add");
            format!("Only {granted} items were added due to limited stock.")
        } else {
            "Added to cart.".to_string()
        };

        Ok(AddOutcome {
            cart: cart.with_quantity(product_id, in_cart + granted),
            granted,
            requested,
            message,
        })
    }

    /// Replaces the quantity of each listed product.
    ///
    /// Quantities at or below zero remove the line. Quantities above stock,
    /// or above [`MAX_LINE_QUANTITY`] for unlimited products, are clamped and
    /// reported.
    #[tracing::instrument(skip(self, cart, updates))]
    pub async fn bulk_update(
        &self,
        cart: &Cart,
        updates: impl IntoIterator<Item = (ProductId, i64)>,
    ) -> Result<UpdateOutcome, CartError> {
        let updates: Vec<(ProductId, i64)> = updates.into_iter().collect();
        let wanted: Vec<ProductId> = updates
            .iter()
            .filter(|(_, qty)| *qty > 0)
            .map(|(id, _)| id.clone())
            .collect();
        let products = self.store.get_products(&wanted).await?;

        let mut next = cart.clone();
        let mut notices = Vec::new();

        for (product_id, quantity) in updates {
            if quantity <= 0 {
                next = next.without(&product_id);
                continue;
            }

            let Some(product) = products.get(&product_id) else {
                next = next.without(&product_id);
                notices.push(QuantityNotice::Removed { product_id });
                continue;
            };

            let stock = line_limit(product);
            if quantity <= stock {
                let quantity = u32::try_from(quantity).unwrap_or(MAX_LINE_QUANTITY);
                next = next.with_quantity(product_id, quantity);
            } else if stock <= 0 {
                next = next.without(&product_id);
                notices.push(QuantityNotice::Removed { product_id });
            } else {
                let clamped = u32::try_from(stock).unwrap_or(MAX_LINE_QUANTITY);
                next = next.with_quantity(product_id.clone(), clamped);
                notices.push(QuantityNotice::Clamped { product_id, stock });
            }
        }

        if !notices.is_empty() {
            tracing::info!(notices = notices.len(), "cart quantities adjusted");
        }

        Ok(UpdateOutcome {
            cart: next,
            notices,
        })
    }

    /// Removes a product from the cart.
    pub fn remove(&self, cart: &Cart, product_id: &ProductId) -> Cart {
        cart.without(product_id)
    }

    /// Computes totals from current prices.
    pub async fn summary(&self, cart: &Cart) -> Result<CartTotals, CartError> {
        let products = self.store.get_products(&cart.product_ids()).await?;
        Ok(totals(cart, &products))
    }

    /// Joins each line with its product for display.
    ///
    /// Lines for missing products are omitted from `lines` but still counted
    /// in the totals.
    pub async fn view(&self, cart: &Cart) -> Result<CartView, CartError> {
        let products = self.store.get_products(&cart.product_ids()).await?;
        let lines = cart
            .iter()
            .filter_map(|(id, quantity)| {
                products.get(id).map(|product| CartLine {
                    product_id: id.clone(),
                    title: product.title.clone(),
                    unit_price: product.price,
                    quantity,
                    line_total: product.price.multiply(quantity),
                    stock: product.stock,
                })
            })
            .collect();

        Ok(CartView {
            lines,
            totals: totals(cart, &products),
        })
    }
}
