use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use merx_api::{app, AppState};
use merx_order::OrderService;
use merx_store::{
    DbClient, EventProducer, MessagingPaymentGateway, MessagingProductValidator,
    PgOrderRepository, RedisRequestClient,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "merx_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = merx_store::Config::load().expect("Failed to load config");
    tracing::info!("Starting Merx API on port {}", config.server.port);

    let db = DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    let rpc_timeout = Duration::from_secs(config.payment.rpc_timeout_secs);
    let rpc_client = Arc::new(
        RedisRequestClient::new(&config.redis.url, rpc_timeout)
            .expect("Failed to open Redis RPC client"),
    );

    let kafka_producer =
        EventProducer::new(&config.kafka.brokers).expect("Failed to create Kafka producer");

    let orders = OrderService::new(
        Arc::new(PgOrderRepository::new(db.pool.clone())),
        Arc::new(MessagingProductValidator::new(rpc_client.clone(), rpc_timeout)),
        Arc::new(MessagingPaymentGateway::new(rpc_client, rpc_timeout)),
        config.payment.currency.clone(),
    );

    let app_state = AppState {
        orders: Arc::new(orders),
        events: Some(Arc::new(kafka_producer)),
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
