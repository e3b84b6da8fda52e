//! Inventory accessor and order persistence for the storefront.
//!
//! The [`InventoryStore`] trait is the single read path for live stock and
//! price, and the only way to open a [`StoreTransaction`], the unit of work
//! that turns a validated cart into an order. Two implementations are
//! provided: [`InMemoryStore`] for tests and local runs, and
//! [`PostgresStore`] backed by sqlx.

pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod query;
pub mod sample;
pub mod store;

pub use common::{Money, OrderId, ProductId, UserId};
pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use model::{
    Address, DashboardStats, NewOrder, NewOrderItem, Order, OrderDetail, OrderItem, OrderLine,
    Product, StockUpdate, User,
};
pub use postgres::PostgresStore;
pub use query::{ProductQuery, ProductSort};
pub use sample::SampleData;
pub use store::{AccountStore, InventoryStore, OrderStore, Store, StoreTransaction};
