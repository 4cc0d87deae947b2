pub mod app_config;
pub mod database;
pub mod events;
pub mod order_repo;
pub mod rpc;

pub use app_config::Config;
pub use database::DbClient;
pub use events::EventProducer;
pub use order_repo::PgOrderRepository;
pub use rpc::{MessagingPaymentGateway, MessagingProductValidator, RedisRequestClient};
