use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::Utc;
use serde_json::{json, Value};
use tower::util::ServiceExt;
use uuid::Uuid;

use merx_api::{app, AppState};
use merx_core::{
    OrderError, PaymentGateway, PaymentSessionRequest, ProductRecord, ProductValidator,
};
use merx_order::{
    Order, OrderDraft, OrderRepository, OrderService, OrderStatus, PaidNotice,
};

struct FakeOrders {
    orders: Mutex<Vec<Order>>,
}

impl FakeOrders {
    fn new() -> Self {
        Self {
            orders: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl OrderRepository for FakeOrders {
    async fn create_order(&self, draft: &OrderDraft) -> Result<Order, OrderError> {
        let order = Order {
            id: Uuid::new_v4(),
            total_cents: draft.total_cents,
            total_items: draft.total_items,
            status: OrderStatus::Pending,
            paid: false,
            paid_at: None,
            payment_charge_id: None,
            created_at: Utc::now(),
            items: draft.items.clone(),
        };
        self.orders.lock().unwrap().push(order.clone());
        Ok(order)
    }

    async fn find_order(&self, id: Uuid) -> Result<Option<Order>, OrderError> {
        Ok(self
            .orders
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.id == id)
            .cloned())
    }

    async fn count_orders(&self, status: Option<OrderStatus>) -> Result<u64, OrderError> {
        Ok(self
            .orders
            .lock()
            .unwrap()
            .iter()
            .filter(|o| status.map_or(true, |s| o.status == s))
            .count() as u64)
    }

    async fn fetch_orders(
        &self,
        status: Option<OrderStatus>,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<Order>, OrderError> {
        Ok(self
            .orders
            .lock()
            .unwrap()
            .iter()
            .filter(|o| status.map_or(true, |s| o.status == s))
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<Order, OrderError> {
        let mut orders = self.orders.lock().unwrap();
        let order = orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(OrderError::NotFound(id))?;
        order.status = status;
        Ok(order.clone())
    }

    async fn mark_paid(&self, notice: &PaidNotice) -> Result<Order, OrderError> {
        let mut orders = self.orders.lock().unwrap();
        let order = orders
            .iter_mut()
            .find(|o| o.id == notice.order_id)
            .ok_or(OrderError::NotFound(notice.order_id))?;
        if order.status == OrderStatus::Paid {
            return Ok(order.clone());
        }
        order.status = OrderStatus::Paid;
        order.paid = true;
        order.paid_at = Some(Utc::now());
        order.payment_charge_id = Some(notice.charge_id.clone());
        Ok(order.clone())
    }
}

struct FakeValidator {
    products: Vec<ProductRecord>,
}

#[async_trait]
impl ProductValidator for FakeValidator {
    async fn validate_products(&self, ids: &[String]) -> Result<Vec<ProductRecord>, OrderError> {
        Ok(self
            .products
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }
}

struct FakeGateway;

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_session(
        &self,
        request: &PaymentSessionRequest,
    ) -> Result<Value, OrderError> {
        Ok(json!({
            "session_id": "cs_test_123",
            "url": format!("https://pay.example/{}", request.order_id),
        }))
    }
}

fn product(id: &str, name: &str, price_cents: i64) -> ProductRecord {
    ProductRecord {
        id: id.to_string(),
        name: name.to_string(),
        price_cents,
    }
}

fn test_app() -> Router {
    let service = OrderService::new(
        Arc::new(FakeOrders::new()),
        Arc::new(FakeValidator {
            products: vec![product("A", "Widget", 10), product("B", "Gadget", 5)],
        }),
        Arc::new(FakeGateway),
        "usd",
    );
    app(AppState {
        orders: Arc::new(service),
        events: None,
    })
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn create_then_get_returns_decorated_order() {
    let app = test_app();

    let (status, created) = send(
        &app,
        "POST",
        "/v1/orders",
        Some(json!({ "items": [
            { "product_id": "A", "quantity": 2 },
            { "product_id": "B", "quantity": 1 },
        ]})),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["total_cents"], 25);
    assert_eq!(created["total_items"], 3);
    assert_eq!(created["status"], "PENDING");
    assert_eq!(created["items"][0]["name"], "Widget");

    let id = created["id"].as_str().unwrap();
    let (status, fetched) = send(&app, "GET", &format!("/v1/orders/{}", id), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["items"][1]["name"], "Gadget");
    assert_eq!(fetched["items"][1]["price_cents"], 5);
}

#[tokio::test]
async fn get_unknown_order_is_404() {
    let app = test_app();
    let id = Uuid::new_v4();

    let (status, body) = send(&app, "GET", &format!("/v1/orders/{}", id), None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains(&id.to_string()));
}

#[tokio::test]
async fn create_with_unknown_product_is_400() {
    let app = test_app();

    let (status, body) = send(
        &app,
        "POST",
        "/v1/orders",
        Some(json!({ "items": [{ "product_id": "MISSING", "quantity": 1 }] })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("MISSING"));
}

#[tokio::test]
async fn create_with_no_items_is_400() {
    let app = test_app();

    let (status, _) = send(&app, "POST", "/v1/orders", Some(json!({ "items": [] }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn listing_reports_pagination_meta() {
    let app = test_app();
    for _ in 0..3 {
        send(
            &app,
            "POST",
            "/v1/orders",
            Some(json!({ "items": [{ "product_id": "A", "quantity": 1 }] })),
        )
        .await;
    }

    let (status, page) = send(&app, "GET", "/v1/orders?page=1&limit=2", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["data"].as_array().unwrap().len(), 2);
    assert_eq!(page["meta"]["total_pages"], 2);
    assert_eq!(page["meta"]["last_page"], 2);

    let (status, beyond) = send(&app, "GET", "/v1/orders?page=9&limit=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(beyond["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn change_status_returns_undecorated_order() {
    let app = test_app();
    let (_, created) = send(
        &app,
        "POST",
        "/v1/orders",
        Some(json!({ "items": [{ "product_id": "A", "quantity": 1 }] })),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    let (status, updated) = send(
        &app,
        "PATCH",
        &format!("/v1/orders/{}/status", id),
        Some(json!({ "status": "DELIVERED" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "DELIVERED");
    // Written results keep the stored item shape; no catalog names here.
    assert!(updated["items"][0].get("name").is_none());
}

#[tokio::test]
async fn payment_session_returns_gateway_payload() {
    let app = test_app();
    let (_, created) = send(
        &app,
        "POST",
        "/v1/orders",
        Some(json!({ "items": [{ "product_id": "A", "quantity": 1 }] })),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    let (status, session) = send(
        &app,
        "POST",
        &format!("/v1/orders/{}/payment-session", id),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["session_id"], "cs_test_123");
}

#[tokio::test]
async fn paid_webhook_finalizes_and_tolerates_redelivery() {
    let app = test_app();
    let (_, created) = send(
        &app,
        "POST",
        "/v1/orders",
        Some(json!({ "items": [{ "product_id": "A", "quantity": 1 }] })),
    )
    .await;
    let notice = json!({
        "order_id": created["id"],
        "charge_id": "ch_1",
        "receipt_url": "https://pay.example/receipts/1",
    });

    let (status, paid) = send(&app, "POST", "/v1/webhooks/payments", Some(notice.clone())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(paid["status"], "PAID");
    assert_eq!(paid["paid"], true);
    assert_eq!(paid["payment_charge_id"], "ch_1");
    assert!(!paid["paid_at"].is_null());

    let (status, replay) = send(&app, "POST", "/v1/webhooks/payments", Some(notice)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(replay["status"], "PAID");
}
