//! Alert / Heartbeat Monitor (component G, spec.md §4.G). Grounded on
//! `relayer/alert.go::alert`: read the relayer's balance through the
//! destination pool, optionally emit a heartbeat, and alert if the balance
//! has dropped to or below the configured threshold. All amounts are
//! rendered in whole native-unit (divided by 10^18).

use std::sync::Arc;
use std::time::Duration;

use alloy::providers::Provider;
use anyhow::Result;
use rust_decimal::Decimal;

use crate::config::AlertConfig;
use crate::core_chain::{CoreEndpointClient, DestinationEndpointPool};
use crate::telegram::send_telegram_message;

const RETRY_INTERVAL: Duration = Duration::from_secs(5);
const WEI_PER_NATIVE_UNIT: i64 = 1_000_000_000_000_000_000;

pub struct AlertMonitor {
    pool: Arc<DestinationEndpointPool<CoreEndpointClient>>,
    cfg: AlertConfig,
    balance_threshold: Decimal,
}

impl AlertMonitor {
    pub fn new(pool: Arc<DestinationEndpointPool<CoreEndpointClient>>, cfg: AlertConfig) -> Result<Self> {
        let balance_threshold: Decimal = cfg.balance_threshold.parse()?;
        Ok(Self {
            pool,
            cfg,
            balance_threshold,
        })
    }

    /// Runs forever. A no-op if `enable_alert` is false, matching
    /// `relayer/alert.go`'s early return.
    pub async fn run(&self) {
        if !self.cfg.enable_alert {
            return;
        }

        let divisor = Decimal::from(WEI_PER_NATIVE_UNIT);
        loop {
            // Always routes through the Destination Pool's current endpoint
            // rather than holding its own provider handle, so it tracks the
            // same endpoint failover as the relay path.
            let endpoint = self.pool.current();
            let balance = match endpoint.provider().get_balance(endpoint.sender()).await {
                Ok(balance) => balance,
                Err(err) => {
                    tracing::warn!(%err, "failed to fetch relayer balance, retrying");
                    tokio::time::sleep(RETRY_INTERVAL).await;
                    continue;
                },
            };

            let balance: Decimal = match balance.to_string().parse() {
                Ok(balance) => balance,
                Err(err) => {
                    tracing::error!(%err, "failed to parse relayer balance");
                    tokio::time::sleep(Duration::from_secs(self.cfg.interval as u64)).await;
                    continue;
                },
            };

            if self.cfg.enable_heart_beat {
                send_telegram_message(
                    &self.cfg.identity,
                    &self.cfg.telegram_bot_id,
                    &self.cfg.telegram_chat_id,
                    &format!("Info: heartbeat message: relayer balance: {balance}"),
                )
                .await;
            }

            if balance <= self.balance_threshold {
                let msg = format!(
                    "Alert: btc-relayer balance ({}:Core) on Core Chain is less than threshold ({}:Core)",
                    balance / divisor,
                    self.balance_threshold / divisor,
                );
                send_telegram_message(&self.cfg.identity, &self.cfg.telegram_bot_id, &self.cfg.telegram_chat_id, &msg)
                    .await;
            }

            tokio::time::sleep(Duration::from_secs(self.cfg.interval as u64)).await;
        }
    }
}
