//! Checkout orchestrator: the only path from a cart to an order.

use std::collections::HashMap;

use common::{Money, OrderId, ProductId};
use domain::{BuyerIdentity, Cart, CartSession, totals};
use store::{InventoryStore, NewOrder, NewOrderItem, Product, StockUpdate, StoreTransaction};

use crate::error::{CheckoutError, Result};
use crate::outcome::{CheckoutOutcome, Rejection, ShippingDetails, StockViolation};
use crate::state::CheckoutState;

/// Validates a session's cart against one inventory snapshot and, if every
/// line fits, writes the order, its items, stock decrements and seller
/// counters in a single transaction.
pub struct CheckoutOrchestrator<S: InventoryStore> {
    store: S,
}

impl<S: InventoryStore> CheckoutOrchestrator<S> {
    /// Creates a new orchestrator writing to the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Runs one checkout attempt for the session.
    ///
    /// On confirmation the session's cart is cleared. On rejection or error
    /// nothing is written and the cart is left as it was.
    #[tracing::instrument(skip(self, session, details))]
    pub async fn checkout<C>(&self, session: &C, details: ShippingDetails) -> Result<CheckoutOutcome>
    where
        C: CartSession + ?Sized,
    {
        metrics::counter!("checkout_attempts_total").increment(1);
        let start = std::time::Instant::now();

        let result = self.run(session, details).await;

        match &result {
            Ok(CheckoutOutcome::Confirmed { order_id, total }) => {
                metrics::counter!("checkout_confirmed_total").increment(1);
                tracing::info!(%order_id, %total, "checkout confirmed");
            }
            Ok(CheckoutOutcome::Rejected(rejection)) => {
                metrics::counter!("checkout_rejected_total", "reason" => rejection.reason())
                    .increment(1);
                tracing::info!(reason = rejection.reason(), "checkout rejected");
            }
            Err(e) => {
                metrics::counter!("checkout_failed_total").increment(1);
                tracing::warn!(error = %e, retryable = e.is_retryable(), "checkout failed");
            }
        }
        metrics::histogram!("checkout_duration_seconds").record(start.elapsed().as_secs_f64());

        result
    }

    async fn run<C>(&self, session: &C, details: ShippingDetails) -> Result<CheckoutOutcome>
    where
        C: CartSession + ?Sized,
    {
        let mut state = CheckoutState::Loading;

        let cart = session.load_cart().await?;
        if cart.is_empty() {
            advance(&mut state, CheckoutState::Rejected);
            return Ok(CheckoutOutcome::Rejected(Rejection::EmptyCart));
        }
        let Some(buyer) = session.current_buyer().await? else {
            advance(&mut state, CheckoutState::Rejected);
            return Ok(CheckoutOutcome::Rejected(Rejection::Unauthenticated));
        };
        let details = details.validated()?;

        let products = self.store.get_products(&cart.product_ids()).await?;
        let total = totals(&cart, &products).total_amount;

        advance(&mut state, CheckoutState::Validating);
        let violations = stock_violations(&cart, &products);
        if !violations.is_empty() {
            advance(&mut state, CheckoutState::Rejected);
            return Ok(CheckoutOutcome::Rejected(Rejection::Unavailable(violations)));
        }

        advance(&mut state, CheckoutState::Committing);
        let mut tx = self.store.begin().await?;
        let written = write_order(tx.as_mut(), &buyer, &details, &cart, &products, total).await;

        let order_id = match written {
            Ok(order_id) => {
                tx.commit().await?;
                order_id
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!(error = %rollback_err, "rollback failed");
                }
                advance(&mut state, CheckoutState::Failed);
                return Err(e);
            }
        };
        advance(&mut state, CheckoutState::Confirmed);

        // The order is durable from here on; clearing the cart is best effort.
        if let Err(e) = session.clear_cart().await {
            tracing::error!(%order_id, error = %e, "failed to clear cart after checkout");
        }

        Ok(CheckoutOutcome::Confirmed { order_id, total })
    }
}

fn advance(state: &mut CheckoutState, next: CheckoutState) {
    debug_assert!(
        state.can_transition_to(next),
        "invalid checkout transition {state} -> {next}"
    );
    tracing::debug!(from = %state, to = %next, "checkout state");
    *state = next;
}

/// Lists every cart line whose quantity exceeds snapshot stock. A missing
/// product counts as zero available.
fn stock_violations(cart: &Cart, products: &HashMap<ProductId, Product>) -> Vec<StockViolation> {
    cart.iter()
        .filter_map(|(id, wanted)| {
            let available = match products.get(id) {
                None => 0,
                Some(product) => match product.stock {
                    None => return None,
                    Some(stock) if i64::from(wanted) <= stock => return None,
                    Some(stock) => stock.max(0),
                },
            };
            Some(StockViolation {
                product_id: id.clone(),
                available,
                wanted,
            })
        })
        .collect()
}

async fn write_order(
    tx: &mut dyn StoreTransaction,
    buyer: &BuyerIdentity,
    details: &ShippingDetails,
    cart: &Cart,
    products: &HashMap<ProductId, Product>,
    total: Money,
) -> Result<OrderId> {
    let order_id = tx
        .insert_order(&NewOrder {
            buyer_id: Some(buyer.id),
            buyer_name: details.name.clone(),
            buyer_email: details.email.clone(),
            shipping_address: details.address.clone(),
            total,
        })
        .await?;

    match tx.save_address(buyer.id, &details.address).await {
        Ok(saved) => tracing::debug!(saved, "shipping address recorded"),
        Err(e) => tracing::warn!(buyer_id = %buyer.id, error = %e, "failed to save address"),
    }

    for (product_id, quantity) in cart.iter() {
        let product = products.get(product_id).ok_or_else(|| CheckoutError::OutOfStock {
            product_id: product_id.clone(),
            wanted: quantity,
        })?;

        tx.insert_order_item(
            order_id,
            &NewOrderItem {
                product_id: product_id.clone(),
                quantity,
                unit_price: product.price,
            },
        )
        .await?;

        match tx.decrement_stock(product_id, quantity).await? {
            StockUpdate::Insufficient => {
                return Err(CheckoutError::OutOfStock {
                    product_id: product_id.clone(),
                    wanted: quantity,
                });
            }
            StockUpdate::Decremented { remaining } => {
                tracing::debug!(%product_id, remaining, "stock decremented");
            }
            StockUpdate::Unlimited => {}
        }

        if let Some(seller_id) = product.seller_id
            && let Err(e) = tx.increment_seller_sales(seller_id, quantity).await
        {
            tracing::warn!(%seller_id, error = %e, "failed to update seller sales");
        }
    }

    Ok(order_id)
}
