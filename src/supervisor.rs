//! Supervisor. Owns the two Endpoint Pools, both Gateways and the Relay
//! Driver, runs the one-time relayer registration sub-routine, then starts
//! the four long-lived activities and blocks forever.

use std::sync::Arc;

use alloy::primitives::U256;
use anyhow::{bail, Context, Result};

use crate::alert_monitor::AlertMonitor;
use crate::btc::{BtcEndpointClient, SourceEndpointPool};
use crate::config::Config;
use crate::core_chain::api::RegistryApi;
use crate::core_chain::{CoreEndpointClient, DestinationEndpointPool, GasPolicy, LightClientGateway, RelayerHubGateway};
use crate::driver::RelayDriver;

/// The fixed relayer deposit: 100 native-unit * 10^18.
const REGISTRATION_DEPOSIT_WEI: u128 = 100 * 1_000_000_000_000_000_000;

pub struct Supervisor {
    config: Config,
    source_pool: Arc<SourceEndpointPool<BtcEndpointClient>>,
    destination_pool: Arc<DestinationEndpointPool<CoreEndpointClient>>,
    light_client: Arc<LightClientGateway>,
    relayer_hub: Arc<RelayerHubGateway>,
}

impl Supervisor {
    pub async fn build(config: Config) -> Result<Self> {
        let mut btc_endpoints = Vec::with_capacity(config.btc_config.rpc_addrs.len());
        for addr in &config.btc_config.rpc_addrs {
            let client = BtcEndpointClient::connect(&addr.host, &addr.user, &addr.pass)
                .await
                .with_context(|| format!("connecting to bitcoin endpoint {}", addr.host))?;
            btc_endpoints.push((addr.host.clone(), client));
        }
        let source_pool = Arc::new(SourceEndpointPool::new(
            btc_endpoints,
            &config.btc_config,
            &config.alert_config.identity,
            &config.alert_config.telegram_bot_id,
            &config.alert_config.telegram_chat_id,
        ));

        let mut core_endpoints = Vec::with_capacity(config.core_config.providers.len());
        for url in &config.core_config.providers {
            let client = CoreEndpointClient::connect(url.clone(), &config.core_config.private_key)
                .with_context(|| format!("connecting to core endpoint {url}"))?;
            core_endpoints.push((url.to_string(), client));
        }
        let destination_pool = Arc::new(DestinationEndpointPool::new(
            core_endpoints,
            &config.core_config,
            &config.alert_config.identity,
            &config.alert_config.telegram_bot_id,
            &config.alert_config.telegram_chat_id,
        ));

        let light_client = Arc::new(LightClientGateway::new(destination_pool.clone()));
        let relayer_hub = Arc::new(RelayerHubGateway::new(destination_pool.clone()));

        Ok(Self {
            config,
            source_pool,
            destination_pool,
            light_client,
            relayer_hub,
        })
    }

    /// Registers the relayer if needed, then starts the probe loops, the
    /// relay driver and the alert monitor as concurrent tasks and blocks
    /// until one of them exits.
    pub async fn run(self) -> Result<()> {
        self.register_relayer().await?;

        let source_pool = self.source_pool.clone();
        let destination_pool = self.destination_pool.clone();
        let light_client = self.light_client.clone();
        let genesis_height = self.config.btc_config.light_client_genesis_height;
        let gas_policy = GasPolicy::new(
            self.config.core_config.gas_limit,
            self.config.core_config.gas_price,
            self.config.core_config.gas_increase,
        );
        let alert_cfg = self.config.alert_config.clone();
        let alert_pool = self.destination_pool.clone();

        let source_probe = tokio::spawn({
            let pool = source_pool.clone();
            async move { pool.probe_loop().await }
        });
        let destination_probe = tokio::spawn({
            let pool = destination_pool.clone();
            async move { pool.probe_loop().await }
        });
        let relay_driver = tokio::spawn(async move {
            let driver = RelayDriver::new(source_pool.clone(), light_client, gas_policy, genesis_height);
            let highest_seen = move || source_pool.highest_seen_height();
            driver.run(highest_seen).await
        });
        let alert_monitor = tokio::spawn(async move {
            match AlertMonitor::new(alert_pool, alert_cfg) {
                Ok(monitor) => monitor.run().await,
                Err(err) => tracing::error!(%err, "failed to start alert monitor"),
            }
        });

        tracing::info!("relayer started, all activities running");
        let _ = tokio::join!(source_probe, destination_probe, relay_driver, alert_monitor);
        Ok(())
    }

    /// Registers the configured sender with the RelayerHub if it isn't
    /// already registered, and waits for the transaction to confirm.
    async fn register_relayer(&self) -> Result<()> {
        if self.relayer_hub.is_relayer().await? {
            tracing::info!("this relayer has already been registered");
            return Ok(());
        }

        tracing::info!("registering this relayer to RelayerHub");
        self.relayer_hub
            .register(U256::from(REGISTRATION_DEPOSIT_WEI))
            .await
            .context("submitting registration transaction")?;

        tracing::info!("waiting for registration tx to be confirmed");
        tokio::time::sleep(std::time::Duration::from_secs(20)).await;

        if !self.relayer_hub.is_relayer().await? {
            bail!("failed to register relayer");
        }
        Ok(())
    }
}
