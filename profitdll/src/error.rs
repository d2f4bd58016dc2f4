//! Unified error type for the broker gateway, shared between the mock and
//! the real FFI-backed implementation.

use fb_core::error::BridgeError;

#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("session not initialized")]
    NotInitialized,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("order rejected by gateway: {0}")]
    OrderRejected(String),
    #[error("order not found: {0}")]
    OrderNotFound(String),
    #[error("drain deadline exceeded with no session activity")]
    DrainTimeout,
    #[error("gateway connection failed: {0}")]
    ConnectionFailed(String),
    #[cfg(feature = "real_gateway")]
    #[error("failed to load gateway library: {0}")]
    Load(String),
    #[cfg(feature = "real_gateway")]
    #[error("missing symbol in gateway library: {0}")]
    MissingSymbol(&'static str),
}

impl From<BrokerError> for BridgeError {
    fn from(value: BrokerError) -> Self {
        match value {
            BrokerError::DrainTimeout => BridgeError::BrokerCallFailure {
                stage: "drain",
                source: value.to_string(),
            },
            _ => BridgeError::BrokerCallFailure {
                stage: "broker_call",
                source: value.to_string(),
            },
        }
    }
}
