use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use merx_core::Page;
use merx_order::events::OrderCreatedEvent;
use merx_order::{NewOrderItem, Order, OrderDetail, OrderStatus};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<NewOrderItem>,
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
    pub status: Option<OrderStatus>,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    10
}

#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    pub status: OrderStatus,
}

/// POST /v1/orders
/// Create an order; pricing comes from the remote validator.
pub async fn create_order(
    State(state): State<AppState>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderDetail>), AppError> {
    if req.items.is_empty() {
        return Err(AppError::Validation("items must not be empty".to_string()));
    }
    if req
        .items
        .iter()
        .any(|item| item.product_id.is_empty() || item.quantity < 1)
    {
        return Err(AppError::Validation(
            "every item needs a product_id and a positive quantity".to_string(),
        ));
    }

    let order = state.orders.create(req.items).await?;

    if let Some(events) = &state.events {
        let _ = events
            .log_order_created(OrderCreatedEvent {
                order_id: order.id,
                total_cents: order.total_cents,
                total_items: order.total_items,
                timestamp: chrono::Utc::now().timestamp(),
            })
            .await;
    }

    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /v1/orders
/// Paginated listing with an optional status filter.
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<Page<Order>>, AppError> {
    if query.page < 1 || query.limit < 1 {
        return Err(AppError::Validation(
            "page and limit must be at least 1".to_string(),
        ));
    }

    let page = state
        .orders
        .find_all(query.page, query.limit, query.status)
        .await?;
    Ok(Json(page))
}

/// GET /v1/orders/{id}
/// Point lookup with name-decorated items.
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderDetail>, AppError> {
    let order = state.orders.find_one(order_id).await?;
    Ok(Json(order))
}

/// PATCH /v1/orders/{id}/status
/// Transition the order's status. The response keeps the stored item
/// shape; only the read paths decorate with catalog names.
pub async fn change_order_status(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(req): Json<ChangeStatusRequest>,
) -> Result<Json<Order>, AppError> {
    let order = state.orders.change_status(order_id, req.status).await?;
    Ok(Json(order))
}

/// POST /v1/orders/{id}/payment-session
/// Open a checkout session with the payment gateway; the gateway's
/// payload is returned verbatim.
pub async fn create_payment_session(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let order = state.orders.find_one(order_id).await?;
    let session = state.orders.create_payment_session(&order).await?;
    Ok(Json(session))
}
