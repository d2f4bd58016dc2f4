//! `BrokerGateway`: the abstraction every worker loop drives.
//!
//! Mirrors the vendor SDK's actual shape — a single-threaded, blocking,
//! event-pump object. Every read and every write happens through this
//! trait from the one execution context that owns it.

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use fb_core::model::{Account, FullPosition, Order};

use crate::error::BrokerError;
use crate::mock::MockGateway;

/// Credentials for `initialize_login`, loaded from the `tq` section of the
/// bridge config or straight from the environment for standalone tools.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub activation_key: String,
}

impl Credentials {
    /// Loads credentials from `TQ_USERNAME`/`TQ_PASSWORD`/`TQ_ACTIVATION_KEY`.
    pub fn from_env() -> Result<Self, BrokerError> {
        let username = env::var("TQ_USERNAME").map_err(|_| BrokerError::InvalidCredentials)?;
        let password = env::var("TQ_PASSWORD").map_err(|_| BrokerError::InvalidCredentials)?;
        let activation_key = env::var("TQ_ACTIVATION_KEY").unwrap_or_default();
        Ok(Self {
            username,
            password,
            activation_key,
        })
    }
}

/// Whether a `drain()` call observed any broker-side event before its
/// deadline. Feeds the liveness counter in the worker loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainOutcome {
    pub observed_event: bool,
}

/// Abstraction over the broker's single-threaded SDK session.
///
/// Implementations are never `Send` across an await point — the whole
/// point of the dual-loop skeleton is that this trait's methods only ever
/// run on the dedicated worker thread that created the session.
pub trait BrokerGateway {
    /// Advances the session, blocking until an event arrives or `deadline`
    /// elapses. Refreshes the live order/position/account views in place.
    fn drain(&mut self, deadline: Duration) -> Result<DrainOutcome, BrokerError>;

    /// Live order view, keyed by `order_id`. Mutated in place by `drain()`.
    fn orders(&self) -> &HashMap<String, Order>;

    /// Live position view, keyed by broker symbol.
    fn positions(&self) -> &HashMap<String, FullPosition>;

    /// Live account snapshot.
    fn account(&self) -> &Account;

    /// Submits a new order. The broker returns immediately; the order's
    /// state is refreshed by subsequent `drain()` calls, not by this call.
    #[allow(clippy::too_many_arguments)]
    fn insert_order(
        &mut self,
        order_id: &str,
        symbol: &str,
        direction: fb_core::model::order::Direction,
        offset: fb_core::model::order::Offset,
        volume: i64,
        limit_price: Option<rust_decimal::Decimal>,
    ) -> Result<(), BrokerError>;

    fn cancel_order(&mut self, order_id: &str) -> Result<(), BrokerError>;

    fn shutdown(&mut self) {}
}

/// Backend selection, mirroring the vendor SDK wrapper's own fallback
/// chain: force-mock via env var, else try the real gateway behind the
/// `real_gateway` feature, else fall back to the mock.
pub fn new_gateway(creds: &Credentials) -> Result<Box<dyn BrokerGateway + Send>, BrokerError> {
    let force_mock = env::var("BROKER_FORCE_MOCK")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    if force_mock {
        return Ok(Box::new(MockGateway::new(creds.clone())));
    }

    #[cfg(feature = "real_gateway")]
    {
        match crate::ffi::RealGateway::connect(creds) {
            Ok(gateway) => return Ok(Box::new(gateway)),
            Err(e) if env::var("BROKER_STRICT").map(|v| v == "1").unwrap_or(false) => {
                return Err(e);
            }
            Err(e) => {
                tracing_fallback_warning(&e);
            }
        }
    }

    Ok(Box::new(MockGateway::new(creds.clone())))
}

#[cfg(feature = "real_gateway")]
fn tracing_fallback_warning(e: &BrokerError) {
    eprintln!("[fb-broker] real gateway unavailable, falling back to mock: {e}");
}
