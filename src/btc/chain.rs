//! The Bitcoin-side interface the Tip Reconciler and Relay Driver are
//! written against, backed by `bitcoincore-rpc-async` for the concrete
//! JSON-RPC client.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

pub use bitcoincore_rpc_async::bitcoin::{Block as BtcBlock, BlockHash as BtcHash};

/// A single Bitcoin endpoint's view of the chain, or the pool that
/// aggregates several of them behind one active endpoint.
#[async_trait]
pub trait BitcoinChain: Send + Sync {
    /// The endpoint's last-known tip height (`GetBlockCount`).
    async fn tip_height(&self) -> Result<i64>;

    /// The block hash at `height` on this endpoint's best chain.
    async fn block_hash_at(&self, height: i64) -> Result<BtcHash>;

    /// The full block for `hash`.
    async fn get_block(&self, hash: &BtcHash) -> Result<BtcBlock>;

    /// The height of the block identified by `hash`, via the verbose header
    /// lookup (`GetBlockHeaderVerbose`).
    async fn header_height(&self, hash: &BtcHash) -> Result<i64>;
}

#[async_trait]
impl<T: BitcoinChain + ?Sized> BitcoinChain for Arc<T> {
    async fn tip_height(&self) -> Result<i64> {
        (**self).tip_height().await
    }

    async fn block_hash_at(&self, height: i64) -> Result<BtcHash> {
        (**self).block_hash_at(height).await
    }

    async fn get_block(&self, hash: &BtcHash) -> Result<BtcBlock> {
        (**self).get_block(hash).await
    }

    async fn header_height(&self, hash: &BtcHash) -> Result<i64> {
        (**self).header_height(hash).await
    }
}
