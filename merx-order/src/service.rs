use std::collections::HashMap;
use std::sync::Arc;

use merx_core::{
    BillableItem, OrderError, Page, PageMeta, PaymentGateway, PaymentSessionRequest,
    ProductRecord, ProductValidator,
};
use serde_json::Value;
use uuid::Uuid;

use crate::models::{NewOrderItem, Order, OrderDetail, OrderItem, OrderStatus, PaidNotice, PricedItem};
use crate::repository::{OrderDraft, OrderRepository};

/// Orchestrates the order lifecycle across the store and the two remote
/// capabilities. Holds no mutable state of its own; every operation is
/// an independent unit of work.
pub struct OrderService {
    repo: Arc<dyn OrderRepository>,
    validator: Arc<dyn ProductValidator>,
    gateway: Arc<dyn PaymentGateway>,
    currency: String,
}

impl OrderService {
    pub fn new(
        repo: Arc<dyn OrderRepository>,
        validator: Arc<dyn ProductValidator>,
        gateway: Arc<dyn PaymentGateway>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            repo,
            validator,
            gateway,
            currency: currency.into(),
        }
    }

    /// Create an order from (product id, quantity) pairs. Prices always
    /// come from the validator; a single unresolved id aborts the whole
    /// operation before anything is written.
    pub async fn create(&self, items: Vec<NewOrderItem>) -> Result<OrderDetail, OrderError> {
        let ids = distinct_ids(items.iter().map(|item| item.product_id.as_str()));
        let products = self.validator.validate_products(&ids).await?;
        let by_id: HashMap<&str, &ProductRecord> =
            products.iter().map(|p| (p.id.as_str(), p)).collect();

        let missing: Vec<String> = ids
            .iter()
            .filter(|id| !by_id.contains_key(id.as_str()))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(OrderError::UnknownProducts { ids: missing });
        }

        let mut order_items = Vec::with_capacity(items.len());
        let mut total_cents: i64 = 0;
        let mut total_items: i32 = 0;
        for item in &items {
            let product = by_id[item.product_id.as_str()];
            total_cents += product.price_cents * i64::from(item.quantity);
            total_items += item.quantity;
            order_items.push(OrderItem {
                product_id: item.product_id.clone(),
                quantity: item.quantity,
                price_cents: product.price_cents,
            });
        }

        let order = self
            .repo
            .create_order(&OrderDraft {
                total_cents,
                total_items,
                items: order_items,
            })
            .await?;

        tracing::info!(
            "Order {} created: {} cents across {} items",
            order.id,
            order.total_cents,
            order.total_items
        );
        decorate(order, &by_id)
    }

    /// Paginated listing under an optional status filter. Items are not
    /// decorated with catalog names on this path.
    pub async fn find_all(
        &self,
        page: u32,
        limit: u32,
        status: Option<OrderStatus>,
    ) -> Result<Page<Order>, OrderError> {
        let page = page.max(1);
        let limit = limit.max(1);

        let total = self.repo.count_orders(status).await?;
        let meta = PageMeta::compute(page, limit, total);
        let offset = u64::from(page - 1) * u64::from(limit);
        let data = self.repo.fetch_orders(status, limit, offset).await?;

        Ok(Page { data, meta })
    }

    /// Point lookup with items decorated from a fresh validator call
    /// over the order's own product ids.
    pub async fn find_one(&self, id: Uuid) -> Result<OrderDetail, OrderError> {
        let order = self
            .repo
            .find_order(id)
            .await?
            .ok_or(OrderError::NotFound(id))?;

        let ids = distinct_ids(order.items.iter().map(|item| item.product_id.as_str()));
        let products = self.validator.validate_products(&ids).await?;
        let by_id: HashMap<&str, &ProductRecord> =
            products.iter().map(|p| (p.id.as_str(), p)).collect();

        decorate(order, &by_id)
    }

    /// Transition an order's status. A target equal to the current
    /// status is an idempotent no-op that never touches the store. The
    /// written result keeps the stored item shape; only the read paths
    /// join catalog names.
    pub async fn change_status(&self, id: Uuid, status: OrderStatus) -> Result<Order, OrderError> {
        let current = self.find_one(id).await?;
        if current.status == status {
            return Ok(current.into_order());
        }
        self.repo.update_status(id, status).await
    }

    /// Request a checkout session for an order that already carries
    /// resolved items. Pure orchestration: no local state is touched and
    /// the gateway payload is returned verbatim.
    pub async fn create_payment_session(&self, order: &OrderDetail) -> Result<Value, OrderError> {
        let request = PaymentSessionRequest {
            order_id: order.id,
            currency: self.currency.clone(),
            items: order
                .items
                .iter()
                .map(|item| BillableItem {
                    name: item.name.clone(),
                    price_cents: item.price_cents,
                    quantity: item.quantity,
                })
                .collect(),
        };
        self.gateway.create_session(&request).await
    }

    /// Apply an asynchronous paid notification: one atomic update sets
    /// the paid fields and creates the receipt. Redelivery of the same
    /// notice is a no-op; a replay carrying a different charge reference
    /// is logged and otherwise ignored.
    pub async fn mark_paid(&self, notice: PaidNotice) -> Result<Order, OrderError> {
        let order = self.repo.mark_paid(&notice).await?;
        if let Some(existing) = order.payment_charge_id.as_deref() {
            if existing != notice.charge_id {
                tracing::warn!(
                    "Paid notification replay for order {} with charge {} (recorded {})",
                    order.id,
                    notice.charge_id,
                    existing
                );
            }
        }
        Ok(order)
    }
}

/// Distinct ids in first-seen order.
fn distinct_ids<'a>(ids: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = Vec::new();
    for id in ids {
        if !seen.iter().any(|s: &String| s == id) {
            seen.push(id.to_string());
        }
    }
    seen
}

/// Join stored items to validated product names. The snapshot price on
/// the item wins; only the name comes from the catalog record.
fn decorate(
    order: Order,
    products: &HashMap<&str, &ProductRecord>,
) -> Result<OrderDetail, OrderError> {
    let mut items = Vec::with_capacity(order.items.len());
    let mut missing = Vec::new();
    for item in &order.items {
        match products.get(item.product_id.as_str()) {
            Some(product) => items.push(PricedItem {
                product_id: item.product_id.clone(),
                name: product.name.clone(),
                price_cents: item.price_cents,
                quantity: item.quantity,
            }),
            None => {
                if !missing.contains(&item.product_id) {
                    missing.push(item.product_id.clone());
                }
            }
        }
    }
    if !missing.is_empty() {
        return Err(OrderError::UnknownProducts { ids: missing });
    }

    Ok(OrderDetail {
        id: order.id,
        total_cents: order.total_cents,
        total_items: order.total_items,
        status: order.status,
        paid: order.paid,
        paid_at: order.paid_at,
        payment_charge_id: order.payment_charge_id,
        created_at: order.created_at,
        items,
    })
}
