use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use merx_core::{
    BoxError, OrderError, PaymentGateway, PaymentSessionRequest, ProductRecord, ProductValidator,
    RequestClient,
};

const VALIDATE_SUBJECT: &str = "products.validate";
const SESSION_SUBJECT: &str = "payments.create_session";

/// Request/reply over redis lists. A request envelope is pushed to
/// `rpc:{subject}`; the responder pushes its reply to the per-call
/// `rpc:reply:{correlation id}` queue named in the envelope.
pub struct RedisRequestClient {
    client: redis::Client,
    timeout: Duration,
}

impl RedisRequestClient {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, redis::RedisError> {
        Ok(Self {
            client: redis::Client::open(url)?,
            timeout,
        })
    }
}

#[async_trait]
impl RequestClient for RedisRequestClient {
    async fn request(&self, subject: &str, payload: Value) -> Result<Value, BoxError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let correlation = Uuid::new_v4().to_string();
        let reply_key = format!("rpc:reply:{}", correlation);
        let envelope = serde_json::to_string(&serde_json::json!({
            "id": correlation,
            "reply_to": reply_key,
            "data": payload,
        }))?;

        let _: () = redis::cmd("RPUSH")
            .arg(format!("rpc:{}", subject))
            .arg(&envelope)
            .query_async(&mut conn)
            .await?;

        let popped: Option<(String, String)> = redis::cmd("BLPOP")
            .arg(&reply_key)
            .arg(self.timeout.as_secs_f64())
            .query_async(&mut conn)
            .await?;

        let (_, body) =
            popped.ok_or_else(|| format!("no reply on {} within {:?}", subject, self.timeout))?;
        let reply: Value = serde_json::from_str(&body)?;

        if let Some(message) = reply.get("error").and_then(|e| e.as_str()) {
            return Err(message.to_string().into());
        }
        Ok(reply.get("data").cloned().unwrap_or(Value::Null))
    }
}

/// Messaging-backed product validation capability.
pub struct MessagingProductValidator {
    client: Arc<dyn RequestClient>,
    timeout: Duration,
}

impl MessagingProductValidator {
    pub fn new(client: Arc<dyn RequestClient>, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl ProductValidator for MessagingProductValidator {
    async fn validate_products(&self, ids: &[String]) -> Result<Vec<ProductRecord>, OrderError> {
        let payload = serde_json::to_value(ids).map_err(OrderError::dependency)?;

        let reply = tokio::time::timeout(self.timeout, self.client.request(VALIDATE_SUBJECT, payload))
            .await
            .map_err(|_| OrderError::dependency(format!("{} timed out", VALIDATE_SUBJECT)))?
            .map_err(|cause| OrderError::Dependency { cause })?;

        serde_json::from_value(reply).map_err(OrderError::dependency)
    }
}

/// Messaging-backed payment gateway capability. The reply payload is
/// gateway-defined and handed back untouched.
pub struct MessagingPaymentGateway {
    client: Arc<dyn RequestClient>,
    timeout: Duration,
}

impl MessagingPaymentGateway {
    pub fn new(client: Arc<dyn RequestClient>, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl PaymentGateway for MessagingPaymentGateway {
    async fn create_session(&self, request: &PaymentSessionRequest) -> Result<Value, OrderError> {
        let payload = serde_json::to_value(request).map_err(OrderError::dependency)?;

        tokio::time::timeout(self.timeout, self.client.request(SESSION_SUBJECT, payload))
            .await
            .map_err(|_| OrderError::dependency(format!("{} timed out", SESSION_SUBJECT)))?
            .map_err(|cause| OrderError::Dependency { cause })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct StubClient {
        reply: Result<Value, String>,
        calls: Mutex<Vec<(String, Value)>>,
    }

    impl StubClient {
        fn replying(reply: Value) -> Self {
            Self {
                reply: Ok(reply),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn erroring(message: &str) -> Self {
            Self {
                reply: Err(message.to_string()),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl RequestClient for StubClient {
        async fn request(&self, subject: &str, payload: Value) -> Result<Value, BoxError> {
            self.calls
                .lock()
                .unwrap()
                .push((subject.to_string(), payload));
            match &self.reply {
                Ok(value) => Ok(value.clone()),
                Err(message) => Err(message.clone().into()),
            }
        }
    }

    #[tokio::test]
    async fn validator_decodes_product_records() {
        let client = Arc::new(StubClient::replying(serde_json::json!([
            { "id": "A", "name": "Widget", "price_cents": 1000 },
            { "id": "B", "name": "Gadget", "price_cents": 500 },
        ])));
        let validator =
            MessagingProductValidator::new(client.clone(), Duration::from_secs(1));

        let records = validator
            .validate_products(&["A".to_string(), "B".to_string()])
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Widget");
        assert_eq!(records[1].price_cents, 500);

        let calls = client.calls.lock().unwrap();
        assert_eq!(calls[0].0, VALIDATE_SUBJECT);
        assert_eq!(calls[0].1, serde_json::json!(["A", "B"]));
    }

    #[tokio::test]
    async fn validator_transport_error_becomes_dependency() {
        let client = Arc::new(StubClient::erroring("broker down"));
        let validator = MessagingProductValidator::new(client, Duration::from_secs(1));

        let err = validator
            .validate_products(&["A".to_string()])
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::Dependency { .. }));
        assert!(err.to_string().contains("broker down"));
    }

    #[tokio::test]
    async fn gateway_sends_request_and_returns_payload_verbatim() {
        let reply = serde_json::json!({ "url": "https://pay.example/cs_1", "id": "cs_1" });
        let client = Arc::new(StubClient::replying(reply.clone()));
        let gateway = MessagingPaymentGateway::new(client.clone(), Duration::from_secs(1));

        let payload = gateway
            .create_session(&PaymentSessionRequest {
                order_id: Uuid::new_v4(),
                currency: "usd".to_string(),
                items: vec![],
            })
            .await
            .unwrap();

        assert_eq!(payload, reply);
        assert_eq!(client.calls.lock().unwrap()[0].0, SESSION_SUBJECT);
    }

    #[tokio::test]
    async fn gateway_error_becomes_dependency() {
        let client = Arc::new(StubClient::erroring("gateway down"));
        let gateway = MessagingPaymentGateway::new(client, Duration::from_secs(1));

        let err = gateway
            .create_session(&PaymentSessionRequest {
                order_id: Uuid::new_v4(),
                currency: "usd".to_string(),
                items: vec![],
            })
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::Dependency { .. }));
    }
}
