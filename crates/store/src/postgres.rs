use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{Connection, PgPool, Postgres, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    AccountStore, Address, DashboardStats, InventoryStore, Money, NewOrder, NewOrderItem, Order,
    OrderDetail, OrderId, OrderLine, OrderStore, Product, ProductId, ProductQuery, Result,
    StockUpdate, StoreError, StoreTransaction, User, UserId,
};

const PRODUCT_COLUMNS: &str =
    "id, seller_id, title, description, price, stock, image_url, created_at";

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    /// Inserts a user row.
    pub async fn insert_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, is_admin, is_seller, business_name,
                               seller_description, rating, total_sales, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.username)
        .bind(&user.email)
        .bind(user.is_admin)
        .bind(user.is_seller)
        .bind(&user.business_name)
        .bind(&user.seller_description)
        .bind(user.rating)
        .bind(user.total_sales)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Inserts a product row.
    pub async fn insert_product(&self, product: &Product) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, seller_id, title, description, price, stock, image_url, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(product.id.as_str())
        .bind(product.seller_id.map(|id| id.as_uuid()))
        .bind(&product.title)
        .bind(&product.description)
        .bind(product.price.amount())
        .bind(product.stock)
        .bind(&product.image_url)
        .bind(product.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Saves an address directly, bypassing checkout.
    pub async fn insert_address(
        &self,
        user_id: UserId,
        label: Option<&str>,
        address: &str,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO addresses (user_id, label, address_text)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, address_text) DO NOTHING
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(label)
        .bind(address)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        Ok(Product {
            id: ProductId::new(row.try_get::<String, _>("id")?),
            seller_id: row
                .try_get::<Option<Uuid>, _>("seller_id")?
                .map(UserId::from_uuid),
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            price: Money::new(row.try_get::<Decimal, _>("price")?),
            stock: row.try_get("stock")?,
            image_url: row.try_get("image_url")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_order(row: &PgRow) -> Result<Order> {
        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            buyer_id: row
                .try_get::<Option<Uuid>, _>("buyer_id")?
                .map(UserId::from_uuid),
            buyer_name: row.try_get("buyer_name")?,
            buyer_email: row.try_get("buyer_email")?,
            shipping_address: row.try_get("shipping_address")?,
            total: Money::new(row.try_get::<Decimal, _>("total")?),
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_user(row: PgRow) -> Result<User> {
        Ok(User {
            id: UserId::from_uuid(row.try_get::<Uuid, _>("id")?),
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            is_admin: row.try_get("is_admin")?,
            is_seller: row.try_get("is_seller")?,
            business_name: row.try_get("business_name")?,
            seller_description: row.try_get("seller_description")?,
            rating: row.try_get("rating")?,
            total_sales: row.try_get("total_sales")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Builds an `ILIKE` pattern matching `term` literally anywhere in the text.
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn limit_to_db(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

fn quantity_to_db(quantity: u32) -> Result<i32> {
    i32::try_from(quantity)
        .map_err(|_| StoreError::InvalidRow(format!("quantity {quantity} out of range")))
}

fn quantity_from_db(quantity: i32) -> Result<u32> {
    u32::try_from(quantity)
        .map_err(|_| StoreError::InvalidRow(format!("negative quantity {quantity}")))
}

#[async_trait]
impl InventoryStore for PostgresStore {
    async fn get_products(&self, ids: &[ProductId]) -> Result<HashMap<ProductId, Product>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let keys: Vec<String> = ids.iter().map(|id| id.as_str().to_string()).collect();

        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1)"
        ))
        .bind(keys)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| Self::row_to_product(row).map(|p| (p.id.clone(), p)))
            .collect()
    }

    async fn list_products(&self, query: ProductQuery) -> Result<Vec<Product>> {
        let mut sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE 1=1");
        let mut param_count = 0;

        if query.search.is_some() {
            param_count += 1;
            sql.push_str(&format!(
                " AND (title ILIKE ${param_count} ESCAPE '\\' OR description ILIKE ${param_count} ESCAPE '\\')"
            ));
        }
        if query.seller_id.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND seller_id = ${param_count}"));
        }

        sql.push_str(&format!(" ORDER BY {}", query.sort.order_by()));

        if query.limit.is_some() {
            param_count += 1;
            sql.push_str(&format!(" LIMIT ${param_count}"));
        }

        let mut sqlx_query = sqlx::query(&sql);
        if let Some(term) = &query.search {
            sqlx_query = sqlx_query.bind(contains_pattern(term));
        }
        if let Some(seller_id) = query.seller_id {
            sqlx_query = sqlx_query.bind(seller_id.as_uuid());
        }
        if let Some(limit) = query.limit {
            sqlx_query = sqlx_query.bind(limit_to_db(limit));
        }

        let rows = sqlx_query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PostgresTransaction { tx }))
    }
}

/// A checkout unit of work on one pooled connection.
///
/// Best-effort writes (address book, seller counters) run inside a savepoint
/// so that their failure does not abort the enclosing transaction.
struct PostgresTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for PostgresTransaction {
    async fn insert_order(&mut self, order: &NewOrder) -> Result<OrderId> {
        let id = OrderId::new();
        sqlx::query(
            r#"
            INSERT INTO orders (id, buyer_id, buyer_name, buyer_email, shipping_address, total)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id.as_uuid())
        .bind(order.buyer_id.map(|b| b.as_uuid()))
        .bind(&order.buyer_name)
        .bind(&order.buyer_email)
        .bind(&order.shipping_address)
        .bind(order.total.amount())
        .execute(&mut *self.tx)
        .await?;
        Ok(id)
    }

    async fn save_address(&mut self, user_id: UserId, address: &str) -> Result<bool> {
        let mut savepoint = self.tx.begin().await?;
        let result = sqlx::query(
            r#"
            INSERT INTO addresses (user_id, address_text)
            VALUES ($1, $2)
            ON CONFLICT (user_id, address_text) DO NOTHING
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(address)
        .execute(&mut *savepoint)
        .await;

        match result {
            Ok(done) => {
                savepoint.commit().await?;
                Ok(done.rows_affected() > 0)
            }
            Err(e) => {
                tracing::debug!(%user_id, error = %e, "address save rolled back to savepoint");
                savepoint.rollback().await?;
                Err(e.into())
            }
        }
    }

    async fn insert_order_item(&mut self, order_id: OrderId, item: &NewOrderItem) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO order_items (order_id, product_id, quantity, unit_price)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(order_id.as_uuid())
        .bind(item.product_id.as_str())
        .bind(quantity_to_db(item.quantity)?)
        .bind(item.unit_price.amount())
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn decrement_stock(
        &mut self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<StockUpdate> {
        // NULL - n stays NULL, so unlimited rows pass through unchanged.
        let row: Option<PgRow> = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock - $1
            WHERE id = $2 AND (stock IS NULL OR stock >= $1)
            RETURNING stock
            "#,
        )
        .bind(i64::from(quantity))
        .bind(product_id.as_str())
        .fetch_optional(&mut *self.tx)
        .await?;

        match row {
            None => Ok(StockUpdate::Insufficient),
            Some(row) => match row.try_get::<Option<i64>, _>("stock")? {
                Some(remaining) => Ok(StockUpdate::Decremented { remaining }),
                None => Ok(StockUpdate::Unlimited),
            },
        }
    }

    async fn increment_seller_sales(&mut self, seller_id: UserId, quantity: u32) -> Result<()> {
        let mut savepoint = self.tx.begin().await?;
        let result = sqlx::query("UPDATE users SET total_sales = total_sales + $1 WHERE id = $2")
            .bind(i64::from(quantity))
            .bind(seller_id.as_uuid())
            .execute(&mut *savepoint)
            .await;

        match result {
            Ok(done) => {
                savepoint.commit().await?;
                if done.rows_affected() == 0 {
                    return Err(StoreError::NotFound(format!("seller {seller_id}")));
                }
                Ok(())
            }
            Err(e) => {
                tracing::debug!(%seller_id, error = %e, "seller sales update rolled back to savepoint");
                savepoint.rollback().await?;
                Err(e.into())
            }
        }
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn get_order(&self, order_id: OrderId) -> Result<Option<OrderDetail>> {
        let header: Option<PgRow> = sqlx::query(
            r#"
            SELECT id, buyer_id, buyer_name, buyer_email, shipping_address, total, created_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        let Some(header) = header else {
            return Ok(None);
        };
        let order = Self::row_to_order(&header)?;

        let rows = sqlx::query(
            r#"
            SELECT oi.product_id, p.title, oi.quantity, oi.unit_price
            FROM order_items oi
            JOIN products p ON oi.product_id = p.id
            WHERE oi.order_id = $1
            ORDER BY oi.id ASC
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        let lines = rows
            .into_iter()
            .map(|row| {
                Ok(OrderLine {
                    product_id: ProductId::new(row.try_get::<String, _>("product_id")?),
                    title: row.try_get("title")?,
                    quantity: quantity_from_db(row.try_get("quantity")?)?,
                    unit_price: Money::new(row.try_get::<Decimal, _>("unit_price")?),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(OrderDetail { order, lines }))
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT id, buyer_id, buyer_name, buyer_email, shipping_address, total, created_at
            FROM orders
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_order).collect()
    }

    async fn dashboard_stats(&self) -> Result<DashboardStats> {
        let row = sqlx::query(
            r#"
            SELECT
              (SELECT COUNT(*) FROM products) AS products_count,
              (SELECT COUNT(*) FROM users) AS users_count,
              (SELECT COUNT(*) FROM orders) AS orders_count
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(DashboardStats {
            products: row.try_get("products_count")?,
            users: row.try_get("users_count")?,
            orders: row.try_get("orders_count")?,
        })
    }
}

#[async_trait]
impl AccountStore for PostgresStore {
    async fn get_user(&self, user_id: UserId) -> Result<Option<User>> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT id, username, email, is_admin, is_seller, business_name,
                   seller_description, rating, total_sales, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_user).transpose()
    }

    async fn address_suggestions(
        &self,
        user_id: UserId,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Address>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, label, address_text, created_at
            FROM addresses
            WHERE user_id = $1 AND address_text ILIKE $2 ESCAPE '\'
            ORDER BY created_at DESC, id DESC
            LIMIT $3
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(contains_pattern(query.trim()))
        .bind(limit_to_db(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(Address {
                    id: row.try_get("id")?,
                    user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
                    label: row.try_get("label")?,
                    address_text: row.try_get("address_text")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }
}
