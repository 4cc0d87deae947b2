use async_trait::async_trait;
use serde_json::Value;

use crate::error::BoxError;

/// Request/reply messaging contract. Implementations own the transport
/// and framing; payloads are JSON on both sides. A call either returns
/// a reply or errors; callers treat both terminally.
#[async_trait]
pub trait RequestClient: Send + Sync {
    async fn request(&self, subject: &str, payload: Value) -> Result<Value, BoxError>;
}
