//! Redis-backed cache for positions and account snapshots.
//!
//! Key schema and TTLs mirror the original bridge's Redis layout exactly —
//! other services in the fleet still read these keys directly.

use fb_core::constants::{ACCOUNT_TTL_SECONDS, POSITION_TTL_SECONDS};
use fb_core::model::{Account, FullPosition};
use redis::AsyncCommands;

use crate::error::StorageError;

pub fn position_key(portfolio_id: &str, symbol: &str) -> String {
    format!("TQ_Position_PortfolioId_{portfolio_id}_Symbol_{symbol}")
}

pub fn account_key(portfolio_id: &str) -> String {
    format!("TQ_Account_PortfolioId_{portfolio_id}")
}

pub struct CacheClient {
    manager: redis::aio::ConnectionManager,
}

impl CacheClient {
    pub async fn connect(config: &fb_core::config::RedisConfig) -> Result<Self, StorageError> {
        let url = match &config.password {
            Some(password) => format!(
                "redis://:{password}@{host}:{port}/{db}",
                host = config.host,
                port = config.port,
                db = config.db
            ),
            None => format!(
                "redis://{host}:{port}/{db}",
                host = config.host,
                port = config.port,
                db = config.db
            ),
        };
        let client = redis::Client::open(url)?;
        let manager = redis::aio::ConnectionManager::new(client).await?;
        Ok(Self { manager })
    }

    pub async fn set_position(
        &self,
        portfolio_id: &str,
        symbol: &str,
        position: &FullPosition,
    ) -> Result<(), StorageError> {
        let payload = serde_json::to_string(position)?;
        let mut conn = self.manager.clone();
        conn.set_ex::<_, _, ()>(
            position_key(portfolio_id, symbol),
            payload,
            POSITION_TTL_SECONDS,
        )
        .await?;
        Ok(())
    }

    pub async fn get_position(
        &self,
        portfolio_id: &str,
        symbol: &str,
    ) -> Result<Option<FullPosition>, StorageError> {
        let mut conn = self.manager.clone();
        let raw: Option<String> = conn.get(position_key(portfolio_id, symbol)).await?;
        raw.map(|s| Ok(serde_json::from_str(&s)?)).transpose()
    }

    pub async fn set_account(
        &self,
        portfolio_id: &str,
        account: &Account,
    ) -> Result<(), StorageError> {
        let payload = serde_json::to_string(account)?;
        let mut conn = self.manager.clone();
        conn.set_ex::<_, _, ()>(account_key(portfolio_id), payload, ACCOUNT_TTL_SECONDS)
            .await?;
        Ok(())
    }

    pub async fn get_account(&self, portfolio_id: &str) -> Result<Option<Account>, StorageError> {
        let mut conn = self.manager.clone();
        let raw: Option<String> = conn.get(account_key(portfolio_id)).await?;
        raw.map(|s| Ok(serde_json::from_str(&s)?)).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_key_matches_the_upstream_pattern() {
        assert_eq!(
            position_key("P1", "SHFE.rb2505"),
            "TQ_Position_PortfolioId_P1_Symbol_SHFE.rb2505"
        );
    }

    #[test]
    fn account_key_matches_the_upstream_pattern() {
        assert_eq!(account_key("P1"), "TQ_Account_PortfolioId_P1");
    }
}
