use std::collections::HashMap;

use async_trait::async_trait;
use common::{OrderId, ProductId, UserId};

use crate::{
    Address, DashboardStats, NewOrder, NewOrderItem, OrderDetail, Product, ProductQuery, Result,
    StockUpdate, User,
};

/// Read access to live inventory, and the entry point for order transactions.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Reads current price and stock for a set of products in one batch.
    ///
    /// Ids without a matching product are absent from the returned map.
    async fn get_products(&self, ids: &[ProductId]) -> Result<HashMap<ProductId, Product>>;

    /// Lists catalog products matching a query.
    async fn list_products(&self, query: ProductQuery) -> Result<Vec<Product>>;

    /// Opens a unit of work. Nothing written through it is visible to other
    /// readers until [`StoreTransaction::commit`] succeeds.
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>>;

    /// Reads a single product.
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>> {
        let mut products = self.get_products(std::slice::from_ref(id)).await?;
        Ok(products.remove(id))
    }
}

/// An all-or-nothing unit of work over orders, stock and seller counters.
///
/// Dropping a transaction without committing discards every write.
#[async_trait]
pub trait StoreTransaction: Send {
    /// Inserts an order header and returns its new id.
    async fn insert_order(&mut self, order: &NewOrder) -> Result<OrderId>;

    /// Saves `address` to the user's address book unless the exact text is
    /// already there. Returns true if a row was added.
    ///
    /// A failure here leaves the transaction usable.
    async fn save_address(&mut self, user_id: UserId, address: &str) -> Result<bool>;

    /// Inserts one order line.
    async fn insert_order_item(&mut self, order_id: OrderId, item: &NewOrderItem) -> Result<()>;

    /// Decrements stock by `quantity` only if at least `quantity` units remain.
    ///
    /// Products with unlimited stock are never touched.
    async fn decrement_stock(&mut self, product_id: &ProductId, quantity: u32)
    -> Result<StockUpdate>;

    /// Adds `quantity` to the seller's cumulative sales counter.
    ///
    /// A failure here leaves the transaction usable.
    async fn increment_seller_sales(&mut self, seller_id: UserId, quantity: u32) -> Result<()>;

    /// Makes every write in this transaction durable.
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Discards every write in this transaction.
    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// Read access to committed orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Loads an order with its lines. Returns None if it doesn't exist.
    async fn get_order(&self, order_id: OrderId) -> Result<Option<OrderDetail>>;

    /// Lists all order headers, newest first.
    async fn list_orders(&self) -> Result<Vec<crate::Order>>;

    /// Counts products, users and orders.
    async fn dashboard_stats(&self) -> Result<DashboardStats>;
}

/// Read access to users and their saved addresses.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Loads a user. Returns None if it doesn't exist.
    async fn get_user(&self, user_id: UserId) -> Result<Option<User>>;

    /// Returns the user's saved addresses containing `query`, newest first.
    async fn address_suggestions(
        &self,
        user_id: UserId,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Address>>;
}

/// Everything the storefront needs from persistence.
pub trait Store: InventoryStore + OrderStore + AccountStore {}

impl<T: InventoryStore + OrderStore + AccountStore + ?Sized> Store for T {}
