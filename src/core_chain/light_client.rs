//! Light-Client Gateway (component C, spec.md §4.C). Typed wrapper over the
//! on-chain light-client contract at the fixed address `0x…1003`
//! (`executor/const.go::pcsAddr`). ABI shape is read off
//! `executor/core_executor.go`'s `cgccaller` calls
//! (`GetChainTip`/`IsHeaderSynced`/`QuerySubmitters`/`SyncBtcHeader`); the
//! `sol!` macro usage pattern (typed contract instance over a provider
//! reference, `.send().await?.get_receipt().await?`) is grounded on
//! `staking-cli/src/registration.rs`.

use std::sync::Arc;

use alloy::primitives::{Address, TxHash};
use alloy::providers::Provider;
use alloy::sol;
use anyhow::{Context, Result};
use async_trait::async_trait;

use super::api::{Hash32, LightClientApi, TxInfo, TxReceiptInfo, TxStatus};
use super::client::CoreEndpointClient;
use super::mirror::reverse_hash;
use super::pool::DestinationEndpointPool;

sol! {
    #[sol(rpc)]
    interface IBtcLightClient {
        function getChainTip() external view returns (bytes32);
        function isHeaderSynced(bytes32 blockHash) external view returns (bool);
        function querySubmitters(bytes32 blockHash) external view returns (string memory);
        function syncBtcHeader(bytes calldata mirror) external;
    }
}

/// `0x0000000000000000000000000000000000001003`
/// (`executor/const.go::pcsAddr`).
pub const LIGHT_CLIENT_ADDR: Address = Address::new([
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x10, 0x03,
]);

pub struct LightClientGateway {
    pool: Arc<DestinationEndpointPool<CoreEndpointClient>>,
}

impl LightClientGateway {
    pub fn new(pool: Arc<DestinationEndpointPool<CoreEndpointClient>>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LightClientApi for LightClientGateway {
    async fn get_tip(&self) -> Result<Hash32> {
        let endpoint = self.pool.current();
        let contract = IBtcLightClient::new(LIGHT_CLIENT_ADDR, endpoint.provider());
        let onwire = contract.getChainTip().call().await.context("getChainTip")?._0;
        Ok(reverse_hash(*onwire))
    }

    async fn is_relayed(&self, hash: Hash32) -> Result<bool> {
        let endpoint = self.pool.current();
        let contract = IBtcLightClient::new(LIGHT_CLIENT_ADDR, endpoint.provider());
        let onwire = reverse_hash(hash);
        let relayed = contract
            .isHeaderSynced(onwire.into())
            .call()
            .await
            .context("isHeaderSynced")?
            ._0;
        Ok(relayed)
    }

    async fn query_submitter(&self, hash: Hash32) -> Result<String> {
        let endpoint = self.pool.current();
        let contract = IBtcLightClient::new(LIGHT_CLIENT_ADDR, endpoint.provider());
        let onwire = reverse_hash(hash);
        let submitter = contract
            .querySubmitters(onwire.into())
            .call()
            .await
            .context("querySubmitters")?
            ._0;
        Ok(submitter)
    }

    async fn submit(
        &self,
        mirror_bytes: Vec<u8>,
        gas_limit: u64,
        gas_price: u64,
    ) -> Result<TxHash> {
        let endpoint = self.pool.current();
        let contract = IBtcLightClient::new(LIGHT_CLIENT_ADDR, endpoint.provider());
        let nonce = endpoint
            .provider()
            .get_transaction_count(endpoint.sender())
            .pending()
            .await
            .context("fetching pending nonce")?;

        let pending = contract
            .syncBtcHeader(mirror_bytes.into())
            .nonce(nonce)
            .gas(gas_limit)
            .gas_price(gas_price as u128)
            .send()
            .await
            .context("submitting syncBtcHeader")?;
        Ok(*pending.tx_hash())
    }

    async fn tx_receipt(&self, tx_hash: TxHash) -> Result<Option<TxReceiptInfo>> {
        let endpoint = self.pool.current();
        let receipt = endpoint
            .provider()
            .get_transaction_receipt(tx_hash)
            .await
            .context("get_transaction_receipt")?;
        Ok(receipt.map(|r| TxReceiptInfo {
            status: if r.status() {
                TxStatus::Success
            } else {
                TxStatus::Failed
            },
            gas_used: r.gas_used,
        }))
    }

    async fn tx(&self, tx_hash: TxHash) -> Result<Option<TxInfo>> {
        let endpoint = self.pool.current();
        let tx = endpoint
            .provider()
            .get_transaction_by_hash(tx_hash)
            .await
            .context("get_transaction_by_hash")?;
        Ok(tx.map(|t| TxInfo { gas: t.gas_limit() }))
    }
}
