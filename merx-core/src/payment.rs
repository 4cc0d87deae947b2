use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::OrderError;

/// One billable line as the gateway sees it. The product id is
/// deliberately dropped; the gateway only needs name, price and count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillableItem {
    pub name: String,
    pub price_cents: i64,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSessionRequest {
    pub order_id: Uuid,
    pub currency: String,
    pub items: Vec<BillableItem>,
}

/// Client-side contract for the remote payment gateway capability.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Open a checkout session with the provider. The reply payload is
    /// provider-defined and returned to the caller unmodified.
    async fn create_session(
        &self,
        request: &PaymentSessionRequest,
    ) -> Result<serde_json::Value, OrderError>;
}
