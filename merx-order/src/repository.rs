use async_trait::async_trait;
use merx_core::OrderError;
use uuid::Uuid;

use crate::models::{Order, OrderItem, OrderStatus, PaidNotice};

/// What the orchestrator hands to the store when creating an order.
/// Totals are computed by the caller from validator-resolved prices.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub total_cents: i64,
    pub total_items: i32,
    pub items: Vec<OrderItem>,
}

/// Repository trait for order data access
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persist an order and its items as one atomic write; returns the
    /// stored order with its read-back item set.
    async fn create_order(&self, draft: &OrderDraft) -> Result<Order, OrderError>;

    async fn find_order(&self, id: Uuid) -> Result<Option<Order>, OrderError>;

    /// Number of orders matching the status filter.
    async fn count_orders(&self, status: Option<OrderStatus>) -> Result<u64, OrderError>;

    /// One page of orders in creation order, under the same filter.
    async fn fetch_orders(
        &self,
        status: Option<OrderStatus>,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<Order>, OrderError>;

    /// Single-field status update; `NotFound` if the row vanished.
    async fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<Order, OrderError>;

    /// Atomically set the paid fields and insert the receipt. Applying
    /// a notice to an already-paid order must be a no-op that returns
    /// the stored order unchanged.
    async fn mark_paid(&self, notice: &PaidNotice) -> Result<Order, OrderError>;
}
