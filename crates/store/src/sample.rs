//! Demo catalog used when the server runs without a database, and by tests.

use chrono::{Duration, Utc};

use crate::{InMemoryStore, Money, PostgresStore, Product, Result, User};

/// A small marketplace: one admin who also sells, one plain buyer and one
/// more seller, with four products between them.
#[derive(Debug, Clone)]
pub struct SampleData {
    pub admin: User,
    pub buyer: User,
    pub seller: User,
    pub products: Vec<Product>,
    pub addresses: Vec<(&'static str, &'static str)>,
}

impl SampleData {
    pub fn new() -> Self {
        let mut admin = User::new("angus", "angus@example.com")
            .as_seller("Alice's Antiques")
            .as_admin();
        admin.seller_description = Some("Curated antiques and collectibles.".to_string());
        admin.rating = 4.8;

        let buyer = User::new("bob", "bob@example.com");

        let mut seller = User::new("charlie", "charlie@example.com").as_seller("Tech Haven");
        seller.seller_description = Some("Peripherals and gadgets.".to_string());
        seller.rating = 4.5;

        // Staggered creation times keep "newest first" deterministic.
        let now = Utc::now();
        let dated = |product: Product, minutes_ago: i64| Product {
            created_at: now - Duration::minutes(minutes_ago),
            ..product
        };

        let products = vec![
            dated(
                Product::new("SKU-001", "Vintage Clock", Money::from_cents(4999), Some(5))
                    .with_seller(admin.id)
                    .with_description("A restored 1920s mantel clock."),
                40,
            ),
            dated(
                Product::new("SKU-002", "Crystal Vase", Money::from_cents(29999), Some(2))
                    .with_seller(admin.id)
                    .with_description("Hand-cut lead crystal."),
                30,
            ),
            dated(
                Product::new("SKU-003", "Wireless Mouse", Money::from_cents(1995), Some(25))
                    .with_seller(seller.id)
                    .with_description("Silent clicks, two-year battery."),
                20,
            ),
            dated(
                Product::new(
                    "SKU-004",
                    "Mechanical Keyboard",
                    Money::from_cents(8999),
                    Some(10),
                )
                .with_seller(seller.id)
                .with_description("Tactile switches, aluminium frame."),
                10,
            ),
        ];

        Self {
            admin,
            buyer,
            seller,
            products,
            addresses: vec![
                ("Home", "12 Harbour Road, Portsmouth"),
                ("Work", "1 Market Street, Portsmouth"),
            ],
        }
    }

    /// Loads the sample data into an in-memory store.
    pub async fn seed_memory(&self, store: &InMemoryStore) {
        for user in [&self.admin, &self.buyer, &self.seller] {
            store.insert_user(user.clone()).await;
        }
        for product in &self.products {
            store.insert_product(product.clone()).await;
        }
        for (label, text) in &self.addresses {
            store.insert_address(self.buyer.id, Some(label), text).await;
        }
    }

    /// Loads the sample data into PostgreSQL.
    pub async fn seed_postgres(&self, store: &PostgresStore) -> Result<()> {
        for user in [&self.admin, &self.buyer, &self.seller] {
            store.insert_user(user).await?;
        }
        for product in &self.products {
            store.insert_product(product).await?;
        }
        for (label, text) in &self.addresses {
            store.insert_address(self.buyer.id, Some(label), text).await?;
        }
        Ok(())
    }
}

impl Default for SampleData {
    fn default() -> Self {
        Self::new()
    }
}
