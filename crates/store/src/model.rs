//! Rows persisted by the store.

use chrono::{DateTime, Utc};
use common::{Money, OrderId, ProductId, UserId};
use serde::{Deserialize, Serialize};

/// A sellable product with its live price and stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub seller_id: Option<UserId>,
    pub title: String,
    pub description: Option<String>,
    pub price: Money,
    /// Remaining sellable units. `None` means unlimited.
    pub stock: Option<i64>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Creates a product with no seller, description or image.
    pub fn new(
        id: impl Into<ProductId>,
        title: impl Into<String>,
        price: Money,
        stock: Option<i64>,
    ) -> Self {
        Self {
            id: id.into(),
            seller_id: None,
            title: title.into(),
            description: None,
            price,
            stock,
            image_url: None,
            created_at: Utc::now(),
        }
    }

    /// Sets the seller.
    pub fn with_seller(mut self, seller_id: UserId) -> Self {
        self.seller_id = Some(seller_id);
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A registered user. Sellers and admins are users with the matching flag set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
    pub is_seller: bool,
    pub business_name: Option<String>,
    pub seller_description: Option<String>,
    pub rating: f64,
    /// Cumulative units sold across all orders.
    pub total_sales: i64,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Creates a plain buyer account.
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: UserId::new(),
            username: username.into(),
            email: email.into(),
            is_admin: false,
            is_seller: false,
            business_name: None,
            seller_description: None,
            rating: 0.0,
            total_sales: 0,
            created_at: Utc::now(),
        }
    }

    /// Marks the user as a seller trading under `business_name`.
    pub fn as_seller(mut self, business_name: impl Into<String>) -> Self {
        self.is_seller = true;
        self.business_name = Some(business_name.into());
        self
    }

    /// Marks the user as an admin.
    pub fn as_admin(mut self) -> Self {
        self.is_admin = true;
        self
    }
}

/// A committed order header. Never mutated after commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub buyer_id: Option<UserId>,
    pub buyer_name: String,
    pub buyer_email: String,
    pub shipping_address: String,
    pub total: Money,
    pub created_at: DateTime<Utc>,
}

/// A committed order line with the unit price captured at purchase time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Money,
}

/// An order line joined with the product title, for confirmation views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub title: String,
    pub quantity: u32,
    pub unit_price: Money,
}

impl OrderLine {
    /// Returns `unit_price * quantity`.
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// An order header together with its lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDetail {
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

/// A saved shipping address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub id: i64,
    pub user_id: UserId,
    pub label: Option<String>,
    pub address_text: String,
    pub created_at: DateTime<Utc>,
}

/// Input for inserting an order header.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub buyer_id: Option<UserId>,
    pub buyer_name: String,
    pub buyer_email: String,
    pub shipping_address: String,
    pub total: Money,
}

/// Input for inserting an order line.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Money,
}

/// Result of a conditional stock decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockUpdate {
    /// Stock was reduced; `remaining` is the new level.
    Decremented { remaining: i64 },
    /// The product has unlimited stock and was left untouched.
    Unlimited,
    /// Fewer units than requested remain (or the product is gone); nothing was written.
    Insufficient,
}

/// Row counts for the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DashboardStats {
    pub products: i64,
    pub users: i64,
    pub orders: i64,
}
