//! Integration tests for cart reconciliation.
//!
//! These tests drive a cart through a session the way the HTTP layer does:
//! load, reconcile against live stock, store.

use common::{Money, ProductId};
use domain::{
    Cart, CartError, CartReconciler, CartSession, InMemorySession, QuantityNotice, totals,
};
use store::{InMemoryStore, InventoryStore, Product, SampleData};

async fn seeded() -> (CartReconciler<InMemoryStore>, InMemoryStore) {
    let store = InMemoryStore::new();
    SampleData::new().seed_memory(&store).await;
    (CartReconciler::new(store.clone()), store)
}

mod add_to_cart {
    use super::*;

    #[tokio::test]
    async fn anonymous_session_accumulates_quantities() {
        let (reconciler, _) = seeded().await;
        let session = InMemorySession::anonymous();
        let mouse = ProductId::new("SKU-003");

        for _ in 0..3 {
            let cart = session.load_cart().await.unwrap();
            let outcome = reconciler.add(&cart, mouse.clone(), 2).await.unwrap();
            session.store_cart(&outcome.cart).await.unwrap();
        }

        let cart = session.cart().await;
        assert_eq!(cart.quantity_of(&mouse), 6);

        let summary = reconciler.summary(&cart).await.unwrap();
        assert_eq!(summary.total_items, 6);
        assert_eq!(summary.total_amount, Money::from_cents(1995 * 6));
    }

    #[tokio::test]
    async fn stock_shrinking_between_adds_is_respected() {
        let (reconciler, store) = seeded().await;
        let clock = ProductId::new("SKU-001");

        let first = reconciler.add(&Cart::new(), clock.clone(), 2).await.unwrap();
        assert_eq!(first.granted, 2);

        // Someone else bought most of the stock.
        store.set_stock(&clock, Some(3)).await;

        let second = reconciler.add(&first.cart, clock.clone(), 4).await.unwrap();
        assert_eq!(second.granted, 1);
        assert!(second.is_partial());
        assert_eq!(second.cart.quantity_of(&clock), 3);

        let third = reconciler.add(&second.cart, clock.clone(), 1).await;
        assert!(matches!(third, Err(CartError::OutOfStock { .. })));
    }
}

mod update_cart {
    use super::*;

    #[tokio::test]
    async fn update_after_product_deleted() {
        let (reconciler, store) = seeded().await;
        let vase = ProductId::new("SKU-002");
        let keyboard = ProductId::new("SKU-004");
        let cart = Cart::new()
            .with_quantity(vase.clone(), 1)
            .with_quantity(keyboard.clone(), 1);

        store.remove_product(&vase).await;

        let products = store.get_products(&cart.product_ids()).await.unwrap();
        let stale = totals(&cart, &products);
        assert_eq!(stale.total_items, 2);
        assert_eq!(stale.total_amount, Money::from_cents(8999));

        let outcome = reconciler
            .bulk_update(&cart, vec![(vase.clone(), 1), (keyboard.clone(), 12)])
            .await
            .unwrap();

        assert_eq!(outcome.cart.quantity_of(&vase), 0);
        assert_eq!(outcome.cart.quantity_of(&keyboard), 10);
        assert_eq!(
            outcome.notices,
            vec![
                QuantityNotice::Removed {
                    product_id: vase.clone()
                },
                QuantityNotice::Clamped {
                    product_id: keyboard.clone(),
                    stock: 10
                },
            ]
        );
    }

    #[tokio::test]
    async fn remove_then_summary() {
        let (reconciler, store) = seeded().await;
        store
            .insert_product(Product::new(
                "SKU-900",
                "Gift card",
                Money::from_cents(2500),
                None,
            ))
            .await;

        let cart = Cart::new()
            .with_quantity(ProductId::new("SKU-900"), 4)
            .with_quantity(ProductId::new("SKU-003"), 1);
        let cart = reconciler.remove(&cart, &ProductId::new("SKU-003"));

        let summary = reconciler.summary(&cart).await.unwrap();
        assert_eq!(summary.total_items, 4);
        assert_eq!(summary.total_amount, Money::from_cents(10000));
    }
}
