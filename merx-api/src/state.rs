use std::sync::Arc;

use merx_order::OrderService;
use merx_store::EventProducer;

#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<OrderService>,
    /// Lifecycle event producer; `None` when no broker is wired up
    /// (event publication is fire-and-forget either way).
    pub events: Option<Arc<EventProducer>>,
}
