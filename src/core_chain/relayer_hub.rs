//! Relayer Registry Gateway (component D, spec.md §4.D). Typed wrapper over
//! the RelayerHub contract at the fixed address `0x…1004`
//! (`executor/const.go::relayerHubContractAddr`). ABI shape read off
//! `executor/core_executor.go::IsRelayer` / `RegisterRelayer`.

use std::sync::Arc;

use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::Provider;
use alloy::sol;
use anyhow::{Context, Result};
use async_trait::async_trait;

use super::api::RegistryApi;
use super::client::CoreEndpointClient;
use super::pool::DestinationEndpointPool;

sol! {
    #[sol(rpc)]
    interface IRelayerHub {
        function isRelayer(address account) external view returns (bool);
        function register() external payable;
    }
}

/// `0x0000000000000000000000000000000000001004`
/// (`executor/const.go::relayerHubContractAddr`).
pub const RELAYER_HUB_ADDR: Address = Address::new([
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x10, 0x04,
]);

pub struct RelayerHubGateway {
    pool: Arc<DestinationEndpointPool<CoreEndpointClient>>,
}

impl RelayerHubGateway {
    pub fn new(pool: Arc<DestinationEndpointPool<CoreEndpointClient>>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RegistryApi for RelayerHubGateway {
    async fn is_relayer(&self) -> Result<bool> {
        let endpoint = self.pool.current();
        let contract = IRelayerHub::new(RELAYER_HUB_ADDR, endpoint.provider());
        let is_relayer = contract
            .isRelayer(endpoint.sender())
            .call()
            .await
            .context("isRelayer")?
            ._0;
        Ok(is_relayer)
    }

    async fn register(&self, deposit: U256) -> Result<TxHash> {
        let endpoint = self.pool.current();
        let contract = IRelayerHub::new(RELAYER_HUB_ADDR, endpoint.provider());
        let nonce = endpoint
            .provider()
            .get_transaction_count(endpoint.sender())
            .pending()
            .await
            .context("fetching pending nonce")?;
        let pending = contract
            .register()
            .value(deposit)
            .nonce(nonce)
            .send()
            .await
            .context("submitting register")?;
        Ok(*pending.tx_hash())
    }
}
