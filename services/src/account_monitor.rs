//! Account Monitor: publishes an `AccountUpdate` whenever the broker's
//! account snapshot changes between drains.

use chrono::Utc;
use fb_broker::BrokerGateway;
use fb_bus::topology::ACCOUNT_UPDATES_ROUTING_KEY;
use fb_bus::BusPublisher;
use fb_core::error::BridgeError;
use fb_core::model::events::AccountUpdate;
use fb_core::model::Account;

use crate::skeleton::MonitorHandler;

pub struct AccountMonitor {
    portfolio_id: String,
    publisher: BusPublisher,
    rt: tokio::runtime::Handle,
    previous: Option<Account>,
}

impl AccountMonitor {
    pub fn new(portfolio_id: String, publisher: BusPublisher, rt: tokio::runtime::Handle) -> Self {
        Self {
            portfolio_id,
            publisher,
            rt,
            previous: None,
        }
    }
}

impl MonitorHandler for AccountMonitor {
    fn on_tick(&mut self, gateway: &mut dyn BrokerGateway) -> Result<(), BridgeError> {
        let current = *gateway.account();
        if self.previous == Some(current) {
            return Ok(());
        }
        self.previous = Some(current);

        let update = AccountUpdate {
            timestamp: Utc::now(),
            portfolio_id: self.portfolio_id.clone(),
            account: current,
        };
        if let Err(e) = self
            .rt
            .block_on(self.publisher.publish(ACCOUNT_UPDATES_ROUTING_KEY, &update))
        {
            tracing::error!(error = %e, "failed to publish account update");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fb_broker::mock::MockGateway;
    use fb_broker::Credentials;
    use rust_decimal_macros::dec;

    fn creds() -> Credentials {
        Credentials {
            username: "u".into(),
            password: "p".into(),
            activation_key: "k".into(),
        }
    }

    #[test]
    fn equal_account_snapshots_are_silent() {
        let mut gw = MockGateway::new(creds());
        let previous: Option<Account> = Some(*gw.account());
        let current = *gw.account();
        assert_eq!(previous, Some(current));
    }

    #[test]
    fn unequal_account_snapshots_differ() {
        let mut gw = MockGateway::new(creds());
        let previous = *gw.account();
        gw.set_account(Account {
            balance: dec!(1000),
            ..Default::default()
        });
        gw.drain(std::time::Duration::from_secs(1)).unwrap();
        assert_ne!(previous, *gw.account());
    }
}
