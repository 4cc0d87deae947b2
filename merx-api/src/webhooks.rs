use axum::{extract::State, Json};

use merx_order::events::OrderPaidEvent;
use merx_order::{Order, PaidNotice};

use crate::error::AppError;
use crate::state::AppState;

/// POST /v1/webhooks/payments
/// Paid notification relayed from the payment provider. Safe to
/// redeliver: finalization is a compare-and-swap in the store.
pub async fn handle_paid_notification(
    State(state): State<AppState>,
    Json(notice): Json<PaidNotice>,
) -> Result<Json<Order>, AppError> {
    tracing::info!(
        "Received paid notification for order {} (charge {})",
        notice.order_id,
        notice.charge_id
    );

    let charge_id = notice.charge_id.clone();
    let order = state.orders.mark_paid(notice).await?;

    if let Some(events) = &state.events {
        let _ = events
            .log_order_paid(OrderPaidEvent {
                order_id: order.id,
                charge_id,
                total_cents: order.total_cents,
                timestamp: chrono::Utc::now().timestamp(),
            })
            .await;
    }

    Ok(Json(order))
}
