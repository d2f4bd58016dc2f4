//! Publisher used by monitors to emit lifecycle events onto
//! `internal.events`, and by test harnesses / upstream shims to emit
//! commands onto `external.orders`.

use lapin::options::{BasicPublishOptions, ExchangeDeclareOptions};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind};

use crate::error::BusError;

pub struct BusPublisher {
    channel: Channel,
    exchange: &'static str,
}

impl BusPublisher {
    pub async fn connect(
        url: &str,
        exchange: &'static str,
        exchange_kind: ExchangeKind,
    ) -> Result<Self, BusError> {
        let connection = Connection::connect(url, ConnectionProperties::default()).await?;
        let channel = connection.create_channel().await?;
        channel
            .exchange_declare(
                exchange,
                exchange_kind,
                ExchangeDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;
        Ok(Self { channel, exchange })
    }

    /// Serializes `payload` to JSON and publishes it as a persistent
    /// message with `content_type: application/json`.
    pub async fn publish<T: serde::Serialize>(
        &self,
        routing_key: &str,
        payload: &T,
    ) -> Result<(), BusError> {
        let body = serde_json::to_vec(payload)?;
        self.channel
            .basic_publish(
                self.exchange,
                routing_key,
                BasicPublishOptions::default(),
                &body,
                BasicProperties::default()
                    .with_delivery_mode(2)
                    .with_content_type("application/json".into()),
            )
            .await?
            .await?;
        Ok(())
    }
}
