use fb_core::error::BridgeError;

#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("amqp error: {0}")]
    Amqp(#[from] lapin::Error),
    #[error("invalid message payload: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<BusError> for BridgeError {
    fn from(value: BusError) -> Self {
        match value {
            BusError::Amqp(e) => BridgeError::TransientBusFailure(e.to_string()),
            BusError::Decode(e) => BridgeError::DecodeFailure(e.to_string()),
        }
    }
}
