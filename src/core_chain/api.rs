//! Shared types and traits for the Core (destination) chain gateways
//! (spec.md §4.C/§4.D). Grounded on the teacher's `impl Provider` parameter
//! style in `staking-cli/src/registration.rs`, generalized behind traits so
//! the Tip Reconciler and Relay Driver (spec.md §4.E/§4.F) can be written
//! and tested against stub implementations.

use std::sync::Arc;

use alloy::primitives::{TxHash, U256};
use anyhow::Result;
use async_trait::async_trait;

/// A 32-byte header hash, display order (Bitcoin convention) unless noted
/// otherwise. Distinct from the contract's on-wire order; see
/// [`super::mirror::reverse_hash`].
pub type Hash32 = [u8; 32];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxStatus {
    Success,
    Failed,
}

/// The subset of a transaction receipt the Relay Driver's result-polling
/// loop needs (spec.md §4.F step 7).
#[derive(Clone, Copy, Debug)]
pub struct TxReceiptInfo {
    pub status: TxStatus,
    pub gas_used: u64,
}

/// The subset of a submitted transaction the Relay Driver needs to classify
/// a failed receipt as out-of-gas vs. terminal revert.
#[derive(Clone, Copy, Debug)]
pub struct TxInfo {
    pub gas: u64,
}

/// Typed wrapper over the on-chain light-client contract (component C,
/// spec.md §4.C). All hash arguments/returns are in source display order;
/// implementations are responsible for the byte-reversal at the boundary.
#[async_trait]
pub trait LightClientApi: Send + Sync {
    async fn get_tip(&self) -> Result<Hash32>;
    async fn is_relayed(&self, hash: Hash32) -> Result<bool>;
    async fn query_submitter(&self, hash: Hash32) -> Result<String>;

    /// Submits the serialized `BtcLightMirror` payload and returns the
    /// destination transaction hash without waiting for inclusion.
    async fn submit(&self, mirror_bytes: Vec<u8>, gas_limit: u64, gas_price: u64)
        -> Result<TxHash>;

    async fn tx_receipt(&self, tx_hash: TxHash) -> Result<Option<TxReceiptInfo>>;
    async fn tx(&self, tx_hash: TxHash) -> Result<Option<TxInfo>>;
}

/// Typed wrapper over the RelayerHub contract (component D, spec.md §4.D).
#[async_trait]
pub trait RegistryApi: Send + Sync {
    async fn is_relayer(&self) -> Result<bool>;

    /// Registers the configured sender with the fixed deposit
    /// (100 native-unit × 10^18, spec.md §4.D).
    async fn register(&self, deposit: U256) -> Result<TxHash>;
}

#[async_trait]
impl<T: LightClientApi + ?Sized> LightClientApi for Arc<T> {
    async fn get_tip(&self) -> Result<Hash32> {
        (**self).get_tip().await
    }

    async fn is_relayed(&self, hash: Hash32) -> Result<bool> {
        (**self).is_relayed(hash).await
    }

    async fn query_submitter(&self, hash: Hash32) -> Result<String> {
        (**self).query_submitter(hash).await
    }

    async fn submit(&self, mirror_bytes: Vec<u8>, gas_limit: u64, gas_price: u64) -> Result<TxHash> {
        (**self).submit(mirror_bytes, gas_limit, gas_price).await
    }

    async fn tx_receipt(&self, tx_hash: TxHash) -> Result<Option<TxReceiptInfo>> {
        (**self).tx_receipt(tx_hash).await
    }

    async fn tx(&self, tx_hash: TxHash) -> Result<Option<TxInfo>> {
        (**self).tx(tx_hash).await
    }
}

#[async_trait]
impl<T: RegistryApi + ?Sized> RegistryApi for Arc<T> {
    async fn is_relayer(&self) -> Result<bool> {
        (**self).is_relayer().await
    }

    async fn register(&self, deposit: U256) -> Result<TxHash> {
        (**self).register(deposit).await
    }
}
