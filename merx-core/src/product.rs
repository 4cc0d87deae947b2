use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::OrderError;

/// Authoritative product record as returned by the remote validator.
/// The price here is the only price the orchestrator ever trusts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: String,
    pub name: String,
    pub price_cents: i64,
}

/// Client-side contract for the remote product validation capability.
#[async_trait]
pub trait ProductValidator: Send + Sync {
    /// Resolve product ids to authoritative records. Ids unknown to the
    /// remote side are simply absent from the reply; transport or remote
    /// faults surface as `OrderError::Dependency`.
    async fn validate_products(&self, ids: &[String]) -> Result<Vec<ProductRecord>, OrderError>;
}
