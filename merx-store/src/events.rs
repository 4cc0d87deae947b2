use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use std::time::Duration;
use tracing::{error, info};

use merx_core::BoxError;
use merx_order::events::{OrderCreatedEvent, OrderPaidEvent};

#[derive(Clone)]
pub struct EventProducer {
    producer: FutureProducer,
}

impl EventProducer {
    pub fn new(brokers: &str) -> Result<Self, rdkafka::error::KafkaError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()?;

        Ok(Self { producer })
    }

    pub async fn publish(
        &self,
        topic: &str,
        key: &str,
        payload: &str,
    ) -> Result<(), rdkafka::error::KafkaError> {
        let record = FutureRecord::to(topic).key(key).payload(payload);

        match self
            .producer
            .send(record, Timeout::After(Duration::from_secs(0)))
            .await
        {
            Ok(_) => {
                info!("Sent message to {}/{}", topic, key);
                Ok(())
            }
            Err((e, _msg)) => {
                error!("Failed to send message to {}: {}", topic, e);
                Err(e)
            }
        }
    }

    pub async fn log_order_created(&self, event: OrderCreatedEvent) -> Result<(), BoxError> {
        let payload = serde_json::to_string(&event)?;
        self.publish("order.created", &event.order_id.to_string(), &payload)
            .await?;
        Ok(())
    }

    pub async fn log_order_paid(&self, event: OrderPaidEvent) -> Result<(), BoxError> {
        let payload = serde_json::to_string(&event)?;
        self.publish("order.paid", &event.order_id.to_string(), &payload)
            .await?;
        Ok(())
    }
}
