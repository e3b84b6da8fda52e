use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::{
    AccountStore, Address, DashboardStats, InventoryStore, NewOrder, NewOrderItem, Order,
    OrderDetail, OrderId, OrderLine, OrderStore, Product, ProductId, ProductQuery, ProductSort,
    Result, StockUpdate, StoreError, StoreTransaction, User, UserId, model::OrderItem,
};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    products: HashMap<ProductId, Product>,
    users: HashMap<UserId, User>,
    /// Insertion order; newest last.
    orders: Vec<Order>,
    order_items: Vec<OrderItem>,
    addresses: Vec<Address>,
    next_address_id: i64,
}

#[derive(Debug, Default)]
struct Faults {
    order_items: AtomicBool,
    seller_sales: AtomicBool,
    address: AtomicBool,
}

/// In-memory store implementation for testing and local runs.
///
/// Readers always see the last committed state. Transactions are serialized:
/// each one takes the writer lock, works on a private copy of the committed
/// state and publishes it on commit, so a transaction that opened after a
/// competing commit observes that commit's stock levels. The seeding helpers
/// take the same lock and wait for any open transaction to finish.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    committed: Arc<RwLock<MemoryState>>,
    writer: Arc<Mutex<()>>,
    faults: Arc<Faults>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a user.
    pub async fn insert_user(&self, user: User) {
        let _writer = self.writer.lock().await;
        self.committed.write().await.users.insert(user.id, user);
    }

    /// Inserts or replaces a product.
    pub async fn insert_product(&self, product: Product) {
        let _writer = self.writer.lock().await;
        self.committed
            .write()
            .await
            .products
            .insert(product.id.clone(), product);
    }

    /// Deletes a product from the catalog.
    pub async fn remove_product(&self, product_id: &ProductId) {
        let _writer = self.writer.lock().await;
        self.committed.write().await.products.remove(product_id);
    }

    /// Overwrites a product's stock level.
    pub async fn set_stock(&self, product_id: &ProductId, stock: Option<i64>) {
        let _writer = self.writer.lock().await;
        if let Some(product) = self.committed.write().await.products.get_mut(product_id) {
            product.stock = stock;
        }
    }

    /// Saves an address directly, bypassing checkout.
    pub async fn insert_address(&self, user_id: UserId, label: Option<&str>, address: &str) {
        let _writer = self.writer.lock().await;
        let mut state = self.committed.write().await;
        push_address(&mut state, user_id, label.map(String::from), address);
    }

    /// Returns a product's stock, or None if the product doesn't exist.
    pub async fn product_stock(&self, product_id: &ProductId) -> Option<Option<i64>> {
        self.committed
            .read()
            .await
            .products
            .get(product_id)
            .map(|p| p.stock)
    }

    /// Returns a user's cumulative sales counter.
    pub async fn user_total_sales(&self, user_id: UserId) -> Option<i64> {
        self.committed
            .read()
            .await
            .users
            .get(&user_id)
            .map(|u| u.total_sales)
    }

    /// Returns the number of committed orders.
    pub async fn order_count(&self) -> usize {
        self.committed.read().await.orders.len()
    }

    /// Returns the number of committed order lines.
    pub async fn order_item_count(&self) -> usize {
        self.committed.read().await.order_items.len()
    }

    /// Returns every address saved for a user, oldest first.
    pub async fn addresses_for(&self, user_id: UserId) -> Vec<Address> {
        self.committed
            .read()
            .await
            .addresses
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Configures order line inserts to fail.
    pub fn set_fail_on_order_items(&self, fail: bool) {
        self.faults.order_items.store(fail, Ordering::SeqCst);
    }

    /// Configures seller sales counter updates to fail.
    pub fn set_fail_on_seller_sales(&self, fail: bool) {
        self.faults.seller_sales.store(fail, Ordering::SeqCst);
    }

    /// Configures address saves to fail.
    pub fn set_fail_on_address(&self, fail: bool) {
        self.faults.address.store(fail, Ordering::SeqCst);
    }
}

fn push_address(
    state: &mut MemoryState,
    user_id: UserId,
    label: Option<String>,
    address: &str,
) -> bool {
    let exists = state
        .addresses
        .iter()
        .any(|a| a.user_id == user_id && a.address_text == address);
    if exists {
        return false;
    }
    state.next_address_id += 1;
    let id = state.next_address_id;
    state.addresses.push(Address {
        id,
        user_id,
        label,
        address_text: address.to_string(),
        created_at: Utc::now(),
    });
    true
}

#[async_trait]
impl InventoryStore for InMemoryStore {
    async fn get_products(&self, ids: &[ProductId]) -> Result<HashMap<ProductId, Product>> {
        let state = self.committed.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.products.get(id).map(|p| (id.clone(), p.clone())))
            .collect())
    }

    async fn list_products(&self, query: ProductQuery) -> Result<Vec<Product>> {
        let state = self.committed.read().await;
        let mut products: Vec<Product> = state
            .products
            .values()
            .filter(|p| query.seller_id.is_none() || p.seller_id == query.seller_id)
            .filter(|p| query.matches_text(&p.title, p.description.as_deref()))
            .cloned()
            .collect();

        match query.sort {
            ProductSort::Newest => products.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            ProductSort::PriceLow => products.sort_by(|a, b| a.price.cmp(&b.price)),
            ProductSort::PriceHigh => products.sort_by(|a, b| b.price.cmp(&a.price)),
        }
        if let Some(limit) = query.limit {
            products.truncate(limit);
        }
        Ok(products)
    }

    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        let guard = self.writer.clone().lock_owned().await;
        let working = self.committed.read().await.clone();
        Ok(Box::new(InMemoryTransaction {
            committed: self.committed.clone(),
            faults: self.faults.clone(),
            working,
            _guard: guard,
        }))
    }
}

struct InMemoryTransaction {
    committed: Arc<RwLock<MemoryState>>,
    faults: Arc<Faults>,
    working: MemoryState,
    _guard: OwnedMutexGuard<()>,
}

#[async_trait]
impl StoreTransaction for InMemoryTransaction {
    async fn insert_order(&mut self, order: &NewOrder) -> Result<OrderId> {
        let id = OrderId::new();
        self.working.orders.push(Order {
            id,
            buyer_id: order.buyer_id,
            buyer_name: order.buyer_name.clone(),
            buyer_email: order.buyer_email.clone(),
            shipping_address: order.shipping_address.clone(),
            total: order.total,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn save_address(&mut self, user_id: UserId, address: &str) -> Result<bool> {
        if self.faults.address.load(Ordering::SeqCst) {
            return Err(StoreError::FaultInjected("address save"));
        }
        if !self.working.users.contains_key(&user_id) {
            return Err(StoreError::NotFound(format!("user {user_id}")));
        }
        Ok(push_address(&mut self.working, user_id, None, address))
    }

    async fn insert_order_item(&mut self, order_id: OrderId, item: &NewOrderItem) -> Result<()> {
        if self.faults.order_items.load(Ordering::SeqCst) {
            return Err(StoreError::FaultInjected("order item insert"));
        }
        if !self.working.products.contains_key(&item.product_id) {
            return Err(StoreError::NotFound(format!("product {}", item.product_id)));
        }
        self.working.order_items.push(OrderItem {
            order_id,
            product_id: item.product_id.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
        });
        Ok(())
    }

    async fn decrement_stock(
        &mut self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<StockUpdate> {
        let Some(product) = self.working.products.get_mut(product_id) else {
            return Ok(StockUpdate::Insufficient);
        };
        match product.stock {
            None => Ok(StockUpdate::Unlimited),
            Some(stock) if stock >= i64::from(quantity) => {
                let remaining = stock - i64::from(quantity);
                product.stock = Some(remaining);
                Ok(StockUpdate::Decremented { remaining })
            }
            Some(_) => Ok(StockUpdate::Insufficient),
        }
    }

    async fn increment_seller_sales(&mut self, seller_id: UserId, quantity: u32) -> Result<()> {
        if self.faults.seller_sales.load(Ordering::SeqCst) {
            return Err(StoreError::FaultInjected("seller sales update"));
        }
        let seller = self
            .working
            .users
            .get_mut(&seller_id)
            .ok_or_else(|| StoreError::NotFound(format!("seller {seller_id}")))?;
        seller.total_sales += i64::from(quantity);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let this = *self;
        *this.committed.write().await = this.working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn get_order(&self, order_id: OrderId) -> Result<Option<OrderDetail>> {
        let state = self.committed.read().await;
        let Some(order) = state.orders.iter().find(|o| o.id == order_id) else {
            return Ok(None);
        };

        let lines = state
            .order_items
            .iter()
            .filter(|item| item.order_id == order_id)
            .map(|item| OrderLine {
                product_id: item.product_id.clone(),
                title: state
                    .products
                    .get(&item.product_id)
                    .map(|p| p.title.clone())
                    .unwrap_or_else(|| item.product_id.to_string()),
                quantity: item.quantity,
                unit_price: item.unit_price,
            })
            .collect();

        Ok(Some(OrderDetail {
            order: order.clone(),
            lines,
        }))
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        let state = self.committed.read().await;
        Ok(state.orders.iter().rev().cloned().collect())
    }

    async fn dashboard_stats(&self) -> Result<DashboardStats> {
        let state = self.committed.read().await;
        Ok(DashboardStats {
            products: state.products.len() as i64,
            users: state.users.len() as i64,
            orders: state.orders.len() as i64,
        })
    }
}

#[async_trait]
impl AccountStore for InMemoryStore {
    async fn get_user(&self, user_id: UserId) -> Result<Option<User>> {
        Ok(self.committed.read().await.users.get(&user_id).cloned())
    }

    async fn address_suggestions(
        &self,
        user_id: UserId,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Address>> {
        let state = self.committed.read().await;
        let needle = query.trim().to_lowercase();
        Ok(state
            .addresses
            .iter()
            .rev()
            .filter(|a| a.user_id == user_id)
            .filter(|a| needle.is_empty() || a.address_text.to_lowercase().contains(&needle))
            .take(limit)
            .cloned()
            .collect())
    }
}
