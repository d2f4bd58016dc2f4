//! Account Handler: writes every `internal.account_updates` message straight
//! through to the account cache. No merge logic — the monitor already only
//! publishes on change, so the handler just refreshes the TTL.

use fb_core::error::BridgeError;
use fb_core::model::events::AccountUpdate;
use fb_storage::CacheClient;

pub struct AccountHandler {
    cache: CacheClient,
}

impl AccountHandler {
    pub fn new(cache: CacheClient) -> Self {
        Self { cache }
    }

    pub async fn process(&self, update: AccountUpdate) -> Result<(), BridgeError> {
        self.cache
            .set_account(&update.portfolio_id, &update.account)
            .await
            .map_err(|e| e.into_bridge_error("account_cache_write"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use fb_core::model::Account;

    #[test]
    fn account_update_envelope_carries_portfolio_and_snapshot() {
        let update = AccountUpdate {
            timestamp: Utc::now(),
            portfolio_id: "P1".into(),
            account: Account::default(),
        };
        assert_eq!(update.portfolio_id, "P1");
        assert_eq!(update.account, Account::default());
    }
}
