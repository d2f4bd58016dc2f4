//! Abstraction over the Broker Gateway: a single-threaded, blocking,
//! event-pump SDK client. Exposes a `drain()` primitive and three live
//! dictionaries (orders, positions, account) mutated in place by it.
//!
//! The default build uses [`mock::MockGateway`]. A real implementation,
//! behind the `real_gateway` feature, loads the vendor SDK dynamically via
//! `libloading` — see [`ffi`].

/// The `BrokerGateway` trait, `Credentials`, and backend selection.
pub mod api;

/// Unified error type for the gateway.
pub mod error;

/// Mock gateway used by every service-level test and by default builds.
pub mod mock;

#[cfg(feature = "real_gateway")]
/// FFI-backed gateway, behind the `real_gateway` feature.
pub mod ffi;

pub use api::{new_gateway, BrokerGateway, Credentials, DrainOutcome};
pub use error::BrokerError;
