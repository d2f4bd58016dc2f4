//! Bus Loop: auto-reconnecting AMQP consumer with prefetch=1 and explicit
//! ack/nack/requeue semantics. Runs on the async I/O context; never touches
//! the Broker Gateway directly — callers hand decoded payloads off to a
//! bounded queue via the `handler` closure and report back how to
//! acknowledge the delivery.

use std::future::Future;

use futures_util::StreamExt;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicQosOptions,
    ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{Connection, ConnectionProperties, ExchangeKind};
use tokio_util::sync::CancellationToken;

use crate::error::BusError;

/// What the handler decided once it finished (or failed) processing a
/// delivery's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckDecision {
    Ack,
    NackRequeue,
    NackDrop,
}

/// Binds one queue to one exchange with one routing key and consumes it.
pub struct BusConsumer {
    url: String,
    exchange: &'static str,
    exchange_kind: ExchangeKind,
    queue: &'static str,
    routing_key: String,
}

impl BusConsumer {
    pub fn new(
        url: impl Into<String>,
        exchange: &'static str,
        exchange_kind: ExchangeKind,
        queue: &'static str,
        routing_key: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            exchange,
            exchange_kind,
            queue,
            routing_key: routing_key.into(),
        }
    }

    /// Runs until `token` is cancelled, reconnecting with a fixed backoff
    /// whenever the connection drops. `handler` returns a future so
    /// processing may await cache/DB/broker-handoff work before the
    /// delivery is acked.
    pub async fn run<F, Fut>(&self, token: CancellationToken, mut handler: F)
    where
        F: FnMut(Vec<u8>) -> Fut,
        Fut: Future<Output = AckDecision>,
    {
        while !token.is_cancelled() {
            match self.connect_and_consume(&token, &mut handler).await {
                Ok(()) => {}
                Err(e) => {
                    tracing::warn!(error = %e, queue = self.queue, "bus consumer error, reconnecting");
                }
            }

            if token.is_cancelled() {
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(fb_core::constants::BUS_RECONNECT_DELAY) => {}
                _ = token.cancelled() => break,
            }
        }
    }

    async fn connect_and_consume<F, Fut>(
        &self,
        token: &CancellationToken,
        handler: &mut F,
    ) -> Result<(), BusError>
    where
        F: FnMut(Vec<u8>) -> Fut,
        Fut: Future<Output = AckDecision>,
    {
        let connection = Connection::connect(&self.url, ConnectionProperties::default()).await?;
        let channel = connection.create_channel().await?;
        channel
            .basic_qos(1, BasicQosOptions::default())
            .await?;

        channel
            .exchange_declare(
                self.exchange,
                self.exchange_kind.clone(),
                ExchangeDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;

        channel
            .queue_declare(
                self.queue,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;

        channel
            .queue_bind(
                self.queue,
                self.exchange,
                &self.routing_key,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await?;

        let mut consumer = channel
            .basic_consume(
                self.queue,
                "fb-bus-consumer",
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await?;

        tracing::info!(queue = self.queue, exchange = self.exchange, "bus consumer connected");

        loop {
            tokio::select! {
                _ = token.cancelled() => return Ok(()),
                next = consumer.next() => {
                    let Some(delivery) = next else { return Ok(()) };
                    let delivery = delivery?;
                    let decision = handler(delivery.data.clone()).await;
                    match decision {
                        AckDecision::Ack => {
                            delivery.ack(BasicAckOptions::default()).await?;
                        }
                        AckDecision::NackRequeue => {
                            delivery
                                .nack(BasicNackOptions {
                                    requeue: true,
                                    ..Default::default()
                                })
                                .await?;
                        }
                        AckDecision::NackDrop => {
                            delivery
                                .nack(BasicNackOptions {
                                    requeue: false,
                                    ..Default::default()
                                })
                                .await?;
                        }
                    }
                }
            }
        }
    }
}
