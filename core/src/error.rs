//! Central error taxonomy for the bridge.
//!
//! `BridgeError` aggregates the seven error kinds named in the component
//! design: bus transport failures, decode/validation rejects, persistence
//! failures, broker-call failures, and the two fatal conditions (liveness
//! violation, session create failure). Each leaf crate (`fb-bus`,
//! `fb-storage`, `fb-broker`) owns its own error enum and converts into this
//! one via `#[from]`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    /// Bus connection or channel dropped; the bus loop reconnects with
    /// backoff rather than propagating this further.
    #[error("transient bus failure: {0}")]
    TransientBusFailure(String),

    /// Message body was not valid JSON, or didn't match the expected shape.
    #[error("decode failure: {0}")]
    DecodeFailure(String),

    /// A Submitter pre-submit check rejected the request.
    #[error("validation reject for order {order_id}: {reason}")]
    ValidationReject { order_id: String, reason: String },

    /// A cache or database write failed.
    #[error("persistence failure ({stage}): {source}")]
    PersistenceFailure { stage: &'static str, source: String },

    /// The broker gateway raised an error handling `insert_order`,
    /// `cancel_order`, or similar.
    #[error("broker call failure ({stage}): {source}")]
    BrokerCallFailure { stage: &'static str, source: String },

    /// The drain-failure counter exceeded `block_counter_max`. Fatal.
    #[error("liveness violation: {0} consecutive failed drains during trading hours")]
    LivenessViolation(u32),

    /// Broker gateway session could not be created at startup. Fatal.
    #[error("session create failure: {0}")]
    SessionCreateFailure(String),
}

impl BridgeError {
    pub fn persistence(stage: &'static str, source: impl ToString) -> Self {
        Self::PersistenceFailure {
            stage,
            source: source.to_string(),
        }
    }

    pub fn broker_call(stage: &'static str, source: impl ToString) -> Self {
        Self::BrokerCallFailure {
            stage,
            source: source.to_string(),
        }
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(value: serde_json::Error) -> Self {
        Self::DecodeFailure(value.to_string())
    }
}

impl<T> From<crossbeam_channel::SendError<T>> for BridgeError {
    fn from(value: crossbeam_channel::SendError<T>) -> Self {
        Self::TransientBusFailure(format!("hand-off channel closed: {value}"))
    }
}

impl From<tokio::task::JoinError> for BridgeError {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::SessionCreateFailure(format!("worker thread join failed: {value}"))
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
