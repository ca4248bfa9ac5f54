use anyhow::{Context, Result};
use async_trait::async_trait;
use bitcoincore_rpc_async::{Auth, Client, RpcApi};

use super::chain::{BitcoinChain, BtcBlock, BtcHash};

/// One Bitcoin RPC endpoint's client handle.
pub struct BtcEndpointClient {
    client: Client,
}

impl BtcEndpointClient {
    pub async fn connect(host: &str, user: &str, pass: &str) -> Result<Self> {
        let url = format!("http://{host}");
        let client = Client::new(url, Auth::UserPass(user.to_string(), pass.to_string()))
            .await
            .context("constructing bitcoin RPC client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl BitcoinChain for BtcEndpointClient {
    async fn tip_height(&self) -> Result<i64> {
        let height = self
            .client
            .get_block_count()
            .await
            .context("get_block_count")?;
        Ok(height as i64)
    }

    async fn block_hash_at(&self, height: i64) -> Result<BtcHash> {
        self.client
            .get_block_hash(height as u64)
            .await
            .context("get_block_hash")
    }

    async fn get_block(&self, hash: &BtcHash) -> Result<BtcBlock> {
        self.client.get_block(hash).await.context("get_block")
    }

    async fn header_height(&self, hash: &BtcHash) -> Result<i64> {
        let info = self
            .client
            .get_block_header_info(hash)
            .await
            .context("get_block_header_info")?;
        Ok(info.height as i64)
    }
}
