pub mod events;
pub mod models;
pub mod repository;
pub mod service;

pub use models::{
    NewOrderItem, Order, OrderDetail, OrderItem, OrderReceipt, OrderStatus, PaidNotice, PricedItem,
};
pub use repository::{OrderDraft, OrderRepository};
pub use service::OrderService;
