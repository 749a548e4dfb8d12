//! # Order Repository
//!
//! Database operations for orders and their item snapshots.
//!
//! An order and its items are always written together in one transaction;
//! an order row without its lines would break receipt recomputation.

use chrono::{DateTime, Utc};
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use savora_core::{ItemExtra, Order, OrderItem, OrderStatus};

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    user_id: String,
    status: OrderStatus,
    coupon_code: Option<String>,
    subtotal_cents: i64,
    delivery_fee_cents: i64,
    tip_cents: i64,
    discount_cents: i64,
    total_cents: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Order {
            id: row.id,
            user_id: row.user_id,
            status: row.status,
            coupon_code: row.coupon_code,
            subtotal_cents: row.subtotal_cents,
            delivery_fee_cents: row.delivery_fee_cents,
            tip_cents: row.tip_cents,
            discount_cents: row.discount_cents,
            total_cents: row.total_cents,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Raw database row for an order item. `extras` is a JSON array of
/// `{ name, price_cents }` objects.
#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: String,
    order_id: String,
    product_id: String,
    name_snapshot: String,
    size: Option<String>,
    unit_price_cents: i64,
    quantity: i64,
    extras: String,
    created_at: DateTime<Utc>,
}

impl ItemRow {
    fn into_item(self) -> DbResult<OrderItem> {
        let extras: Vec<ItemExtra> = serde_json::from_str(&self.extras)
            .map_err(|e| DbError::corrupt("order_items", format!("extras: {e}")))?;

        Ok(OrderItem {
            id: self.id,
            order_id: self.order_id,
            product_id: self.product_id,
            name_snapshot: self.name_snapshot,
            size: self.size,
            unit_price_cents: self.unit_price_cents,
            quantity: self.quantity,
            extras,
            created_at: self.created_at,
        })
    }
}

const ORDER_COLUMNS: &str = "\
    id, user_id, status, coupon_code, \
    subtotal_cents, delivery_fee_cents, tip_cents, discount_cents, total_cents, \
    created_at, updated_at";

const ITEM_COLUMNS: &str = "\
    id, order_id, product_id, name_snapshot, size, \
    unit_price_cents, quantity, extras, created_at";

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Inserts an order together with its item snapshots, atomically.
    pub async fn insert(&self, order: &Order, items: &[OrderItem]) -> DbResult<()> {
        debug!(order_id = %order.id, items = items.len(), "Inserting order");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        insert_order(&mut *tx, order).await?;
        for item in items {
            insert_item(&mut *tx, item).await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    /// Gets an order by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let row: Option<OrderRow> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(Order::from))
    }

    /// Gets the item snapshots of an order, in insertion order.
    pub async fn get_items(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let rows: Vec<ItemRow> = sqlx::query_as(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ? ORDER BY created_at, id"
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ItemRow::into_item).collect()
    }

    /// Lists a user's orders, newest first (customer dashboard).
    pub async fn list_for_user(&self, user_id: &str) -> DbResult<Vec<Order>> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = ? ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Order::from).collect())
    }

    /// Lists orders in a given status, oldest first (admin back-office).
    pub async fn list_by_status(&self, status: OrderStatus) -> DbResult<Vec<Order>> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE status = ? ORDER BY created_at"
        ))
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Order::from).collect())
    }

    /// Moves an order to a new status.
    ///
    /// Statuses are set by the fulfillment workflow; there is no transition
    /// check here.
    pub async fn set_status(&self, order_id: &str, status: OrderStatus) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query("UPDATE orders SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status)
            .bind(now)
            .bind(order_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", order_id));
        }

        debug!(order_id = %order_id, status = ?status, "Order status updated");
        Ok(())
    }

    /// Counts how many of a user's orders carry the given coupon code.
    ///
    /// Cancelled orders still count: a redemption is spent at checkout and
    /// never refunded.
    pub async fn count_user_redemptions(&self, user_id: &str, code: &str) -> DbResult<i64> {
        count_user_redemptions(&self.pool, user_id, code).await
    }
}

// =============================================================================
// Transaction-Scoped Functions
// =============================================================================

pub(crate) async fn insert_order<'e, E>(executor: E, order: &Order) -> DbResult<()>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO orders (
            id, user_id, status, coupon_code,
            subtotal_cents, delivery_fee_cents, tip_cents,
            discount_cents, total_cents,
            created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&order.id)
    .bind(&order.user_id)
    .bind(order.status)
    .bind(&order.coupon_code)
    .bind(order.subtotal_cents)
    .bind(order.delivery_fee_cents)
    .bind(order.tip_cents)
    .bind(order.discount_cents)
    .bind(order.total_cents)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(executor)
    .await?;

    Ok(())
}

pub(crate) async fn insert_item<'e, E>(executor: E, item: &OrderItem) -> DbResult<()>
where
    E: SqliteExecutor<'e>,
{
    let extras =
        serde_json::to_string(&item.extras).map_err(|e| DbError::Internal(e.to_string()))?;

    sqlx::query(
        r#"
        INSERT INTO order_items (
            id, order_id, product_id, name_snapshot, size,
            unit_price_cents, quantity, extras, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&item.id)
    .bind(&item.order_id)
    .bind(&item.product_id)
    .bind(&item.name_snapshot)
    .bind(&item.size)
    .bind(item.unit_price_cents)
    .bind(item.quantity)
    .bind(extras)
    .bind(item.created_at)
    .execute(executor)
    .await?;

    Ok(())
}

pub(crate) async fn count_user_redemptions<'e, E>(
    executor: E,
    user_id: &str,
    code: &str,
) -> DbResult<i64>
where
    E: SqliteExecutor<'e>,
{
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM orders WHERE user_id = ? AND coupon_code = ?",
    )
    .bind(user_id)
    .bind(code)
    .fetch_one(executor)
    .await?;

    Ok(count)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use uuid::Uuid;

    fn sample_order(user_id: &str, coupon_code: Option<&str>) -> Order {
        let now = Utc::now();
        Order {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            status: OrderStatus::Pending,
            coupon_code: coupon_code.map(str::to_string),
            subtotal_cents: 20000,
            delivery_fee_cents: 4900,
            tip_cents: 0,
            discount_cents: coupon_code.map(|_| 2000).unwrap_or(0),
            total_cents: coupon_code.map(|_| 22900).unwrap_or(24900),
            created_at: now,
            updated_at: now,
        }
    }

    fn sample_item(order_id: &str) -> OrderItem {
        OrderItem {
            id: Uuid::new_v4().to_string(),
            order_id: order_id.to_string(),
            product_id: "pizza-margherita".to_string(),
            name_snapshot: "Pizza Margherita".to_string(),
            size: Some("large".to_string()),
            unit_price_cents: 1090,
            quantity: 2,
            extras: vec![ItemExtra {
                name: "Extra cheese".to_string(),
                price_cents: 150,
            }],
            created_at: Utc::now(),
        }
    }

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_load_with_items() {
        let db = test_db().await;
        let repo = db.orders();

        let order = sample_order("user-1", None);
        let item = sample_item(&order.id);
        repo.insert(&order, std::slice::from_ref(&item)).await.unwrap();

        let loaded = repo.get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(loaded.total_cents, 24900);
        assert!(loaded.totals_consistent());

        let items = repo.get_items(&order.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name_snapshot, "Pizza Margherita");
        assert_eq!(items[0].extras[0].price_cents, 150);
        // (10.90 + 1.50) × 2
        assert_eq!(items[0].line_total().cents(), 2480);
    }

    #[tokio::test]
    async fn test_item_requires_existing_order() {
        let db = test_db().await;

        let item = sample_item("no-such-order");
        let err = insert_item(db.pool(), &item).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_list_for_user_newest_first() {
        let db = test_db().await;
        let repo = db.orders();

        let mut older = sample_order("user-1", None);
        older.created_at = Utc::now() - chrono::Duration::hours(1);
        repo.insert(&older, &[]).await.unwrap();
        let newer = sample_order("user-1", None);
        repo.insert(&newer, &[]).await.unwrap();
        repo.insert(&sample_order("user-2", None), &[]).await.unwrap();

        let orders = repo.list_for_user("user-1").await.unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].id, newer.id);
    }

    #[tokio::test]
    async fn test_set_status() {
        let db = test_db().await;
        let repo = db.orders();

        let order = sample_order("user-1", None);
        repo.insert(&order, &[]).await.unwrap();

        repo.set_status(&order.id, OrderStatus::Paid).await.unwrap();
        let loaded = repo.get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, OrderStatus::Paid);

        let err = repo
            .set_status("missing", OrderStatus::Paid)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_count_user_redemptions_includes_cancelled() {
        let db = test_db().await;
        let repo = db.orders();

        let first = sample_order("user-1", Some("WELCOME10"));
        repo.insert(&first, &[]).await.unwrap();
        let second = sample_order("user-1", Some("WELCOME10"));
        repo.insert(&second, &[]).await.unwrap();
        repo.set_status(&second.id, OrderStatus::Cancelled)
            .await
            .unwrap();

        // other user and other code must not count
        repo.insert(&sample_order("user-2", Some("WELCOME10")), &[])
            .await
            .unwrap();
        repo.insert(&sample_order("user-1", Some("OTHER")), &[])
            .await
            .unwrap();

        let count = repo
            .count_user_redemptions("user-1", "WELCOME10")
            .await
            .unwrap();
        assert_eq!(count, 2);
    }
}
