use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Order status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Paid,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Paid => "PAID",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(OrderStatus::Pending),
            "PAID" => Some(OrderStatus::Paid),
            "DELIVERED" => Some(OrderStatus::Delivered),
            "CANCELLED" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }
}

/// The single source of truth for a customer's purchase. Totals are
/// fixed at creation time from validator-resolved prices and never
/// recomputed from the catalog afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub total_cents: i64,
    pub total_items: i32,
    pub status: OrderStatus,
    pub paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub payment_charge_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

/// One priced, quantified reference to an externally-owned product.
/// `price_cents` is a snapshot taken at order creation; later catalog
/// price changes never alter it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: String,
    pub quantity: i32,
    pub price_cents: i64,
}

/// Receipt created exactly once, as part of paid finalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub order_id: Uuid,
    pub receipt_url: String,
}

/// Incoming line of a create request. Carries no price on purpose:
/// pricing always comes from the validator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub product_id: String,
    pub quantity: i32,
}

/// Read-side view of an order with items joined to their catalog names.
/// The names are looked up per read and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    pub id: Uuid,
    pub total_cents: i64,
    pub total_items: i32,
    pub status: OrderStatus,
    pub paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub payment_charge_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<PricedItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricedItem {
    pub product_id: String,
    pub name: String,
    pub price_cents: i64,
    pub quantity: i32,
}

impl OrderDetail {
    /// Drop the joined names and recover the stored order shape.
    pub fn into_order(self) -> Order {
        Order {
            id: self.id,
            total_cents: self.total_cents,
            total_items: self.total_items,
            status: self.status,
            paid: self.paid,
            paid_at: self.paid_at,
            payment_charge_id: self.payment_charge_id,
            created_at: self.created_at,
            items: self
                .items
                .into_iter()
                .map(|item| OrderItem {
                    product_id: item.product_id,
                    quantity: item.quantity,
                    price_cents: item.price_cents,
                })
                .collect(),
        }
    }
}

/// Asynchronous paid notification relayed from the payment provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaidNotice {
    pub order_id: Uuid,
    pub charge_id: String,
    pub receipt_url: String,
}
