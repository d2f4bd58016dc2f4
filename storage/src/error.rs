use fb_core::error::BridgeError;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("postgres error: {0}")]
    Postgres(#[from] sqlx::Error),
    #[error("invalid cached payload: {0}")]
    Decode(#[from] serde_json::Error),
}

impl StorageError {
    pub fn into_bridge_error(self, stage: &'static str) -> BridgeError {
        BridgeError::persistence(stage, self.to_string())
    }
}
