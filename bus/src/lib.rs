//! AMQP wrapper around the bridge's fixed exchange/queue topology: a
//! prefetch=1 auto-reconnecting consumer with explicit ack/nack/requeue
//! semantics, and a publisher for monitors and command producers.

pub mod consumer;
pub mod error;
pub mod publisher;
pub mod topology;

pub use consumer::{AckDecision, BusConsumer};
pub use error::BusError;
pub use lapin::ExchangeKind;
pub use publisher::BusPublisher;
