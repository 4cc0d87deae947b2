use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use merx_core::OrderError;
use merx_order::{Order, OrderDraft, OrderItem, OrderRepository, OrderStatus, PaidNotice};

pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const ORDER_COLUMNS: &str =
    "id, total_cents, total_items, status, paid, paid_at, payment_charge_id, created_at";

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    total_cents: i64,
    total_items: i32,
    status: String,
    paid: bool,
    paid_at: Option<DateTime<Utc>>,
    payment_charge_id: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    product_id: String,
    quantity: i32,
    price_cents: i64,
}

impl OrderRow {
    fn into_order(self, items: Vec<ItemRow>) -> Result<Order, OrderError> {
        let status = OrderStatus::parse(&self.status).ok_or_else(|| {
            OrderError::storage(format!(
                "unknown status {:?} on order {}",
                self.status, self.id
            ))
        })?;

        Ok(Order {
            id: self.id,
            total_cents: self.total_cents,
            total_items: self.total_items,
            status,
            paid: self.paid,
            paid_at: self.paid_at,
            payment_charge_id: self.payment_charge_id,
            created_at: self.created_at,
            items: items
                .into_iter()
                .map(|item| OrderItem {
                    product_id: item.product_id,
                    quantity: item.quantity,
                    price_cents: item.price_cents,
                })
                .collect(),
        })
    }
}

impl PgOrderRepository {
    async fn items_for(&self, order_id: Uuid) -> Result<Vec<ItemRow>, OrderError> {
        sqlx::query_as::<_, ItemRow>(
            "SELECT product_id, quantity, price_cents FROM order_items WHERE order_id = $1 ORDER BY id",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await
        .map_err(OrderError::storage)
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn create_order(&self, draft: &OrderDraft) -> Result<Order, OrderError> {
        let mut tx = self.pool.begin().await.map_err(OrderError::storage)?;

        let row: OrderRow = sqlx::query_as(&format!(
            "INSERT INTO orders (total_cents, total_items, status) \
             VALUES ($1, $2, $3) RETURNING {ORDER_COLUMNS}"
        ))
        .bind(draft.total_cents)
        .bind(draft.total_items)
        .bind(OrderStatus::Pending.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(OrderError::storage)?;

        for item in &draft.items {
            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, quantity, price_cents) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(row.id)
            .bind(&item.product_id)
            .bind(item.quantity)
            .bind(item.price_cents)
            .execute(&mut *tx)
            .await
            .map_err(OrderError::storage)?;
        }

        // Read back the persisted item set before committing.
        let items: Vec<ItemRow> = sqlx::query_as(
            "SELECT product_id, quantity, price_cents FROM order_items WHERE order_id = $1 ORDER BY id",
        )
        .bind(row.id)
        .fetch_all(&mut *tx)
        .await
        .map_err(OrderError::storage)?;

        tx.commit().await.map_err(OrderError::storage)?;

        row.into_order(items)
    }

    async fn find_order(&self, id: Uuid) -> Result<Option<Order>, OrderError> {
        let row: Option<OrderRow> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(OrderError::storage)?;

        match row {
            Some(row) => {
                let items = self.items_for(row.id).await?;
                row.into_order(items).map(Some)
            }
            None => Ok(None),
        }
    }

    async fn count_orders(&self, status: Option<OrderStatus>) -> Result<u64, OrderError> {
        let count: i64 = match status {
            Some(status) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE status = $1")
                    .bind(status.as_str())
                    .fetch_one(&self.pool)
                    .await
            }
            None => {
                sqlx::query_scalar("SELECT COUNT(*) FROM orders")
                    .fetch_one(&self.pool)
                    .await
            }
        }
        .map_err(OrderError::storage)?;

        Ok(count as u64)
    }

    async fn fetch_orders(
        &self,
        status: Option<OrderStatus>,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<Order>, OrderError> {
        let rows: Vec<OrderRow> = match status {
            Some(status) => {
                sqlx::query_as(&format!(
                    "SELECT {ORDER_COLUMNS} FROM orders WHERE status = $1 \
                     ORDER BY created_at LIMIT $2 OFFSET $3"
                ))
                .bind(status.as_str())
                .bind(i64::from(limit))
                .bind(offset as i64)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as(&format!(
                    "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at LIMIT $1 OFFSET $2"
                ))
                .bind(i64::from(limit))
                .bind(offset as i64)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(OrderError::storage)?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let items = self.items_for(row.id).await?;
            orders.push(row.into_order(items)?);
        }
        Ok(orders)
    }

    async fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<Order, OrderError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "UPDATE orders SET status = $1, updated_at = NOW() WHERE id = $2 \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(status.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(OrderError::storage)?;

        match row {
            Some(row) => {
                let items = self.items_for(row.id).await?;
                row.into_order(items)
            }
            None => Err(OrderError::NotFound(id)),
        }
    }

    async fn mark_paid(&self, notice: &PaidNotice) -> Result<Order, OrderError> {
        let mut tx = self.pool.begin().await.map_err(OrderError::storage)?;

        // Compare-and-swap on status: a redelivered notification matches
        // zero rows and falls through to the no-op read below.
        let updated: Option<OrderRow> = sqlx::query_as(&format!(
            "UPDATE orders SET status = 'PAID', paid = TRUE, paid_at = NOW(), \
             payment_charge_id = $1, updated_at = NOW() \
             WHERE id = $2 AND status <> 'PAID' RETURNING {ORDER_COLUMNS}"
        ))
        .bind(&notice.charge_id)
        .bind(notice.order_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(OrderError::storage)?;

        match updated {
            Some(row) => {
                sqlx::query("INSERT INTO order_receipts (order_id, receipt_url) VALUES ($1, $2)")
                    .bind(notice.order_id)
                    .bind(&notice.receipt_url)
                    .execute(&mut *tx)
                    .await
                    .map_err(OrderError::storage)?;

                let items: Vec<ItemRow> = sqlx::query_as(
                    "SELECT product_id, quantity, price_cents FROM order_items \
                     WHERE order_id = $1 ORDER BY id",
                )
                .bind(notice.order_id)
                .fetch_all(&mut *tx)
                .await
                .map_err(OrderError::storage)?;

                tx.commit().await.map_err(OrderError::storage)?;
                row.into_order(items)
            }
            None => {
                tx.rollback().await.map_err(OrderError::storage)?;
                self.find_order(notice.order_id)
                    .await?
                    .ok_or(OrderError::NotFound(notice.order_id))
            }
        }
    }
}
