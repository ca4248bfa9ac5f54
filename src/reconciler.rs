//! Tip Reconciler (component E, spec.md §4.E). Figures out the last
//! Bitcoin height already committed on the destination chain, walking
//! backwards on a fork.
//!
//! The backwards walk in the original (`relayer/relayer.go`'s call into a
//! `recursionUnCommitTasks`-adjacent path) has no lower bound, which
//! spec.md §9 Open Question 1 flags as a real unbounded-regression risk —
//! this implementation clamps the walk at `btc_config.light_client_genesis_height`
//! (spec.md's SHOULD recommendation), per the Open-Question decision in
//! DESIGN.md.

use anyhow::{bail, Result};

use crate::btc::chain::BitcoinChain;
use crate::core_chain::{reverse_hash, LightClientApi};

pub struct TipReconciler<'a, B, L> {
    source: &'a B,
    light_client: &'a L,
    genesis_height: i64,
}

impl<'a, B: BitcoinChain, L: LightClientApi> TipReconciler<'a, B, L> {
    pub fn new(source: &'a B, light_client: &'a L, genesis_height: i64) -> Self {
        Self {
            source,
            light_client,
            genesis_height,
        }
    }

    /// Implements spec.md §4.E steps 1-4.
    pub async fn get_last_relay_height(&self) -> Result<i64> {
        let tip = self.light_client.get_tip().await?;
        let height = self.source.header_height(&parse_hash(tip)?).await?;

        let hash_at_height = self.source.block_hash_at(height).await?;
        if hash_bytes(&hash_at_height) == tip {
            return Ok(height);
        }

        // Fork case: walk backwards until we find an ancestor the light
        // client has already recorded as relayed.
        let mut k = height;
        while k > self.genesis_height {
            let hash_k = self.source.block_hash_at(k).await?;
            if self.light_client.is_relayed(hash_bytes(&hash_k)).await? {
                return Ok(k);
            }
            k -= 1;
        }

        bail!(
            "fork walk reached genesis height {} without finding a relayed ancestor",
            self.genesis_height
        );
    }
}

/// `get_tip` returns display order; `BtcHash::from_byte_array` expects the
/// internal/wire order Bitcoin's own consensus serialization uses, so the
/// display bytes must be reversed before reconstructing a `BtcHash` from
/// them (spec.md §4.C, §6 byte-reversal rule).
fn parse_hash(display_order: [u8; 32]) -> Result<crate::btc::chain::BtcHash> {
    use bitcoincore_rpc_async::bitcoin::hashes::Hash;
    Ok(crate::btc::chain::BtcHash::from_byte_array(reverse_hash(display_order)))
}

/// The inverse of [`parse_hash`]: converts a `BtcHash`'s internal/wire-order
/// bytes to the display order the `LightClientApi` surface and `get_tip`
/// use.
fn hash_bytes(hash: &crate::btc::chain::BtcHash) -> [u8; 32] {
    use bitcoincore_rpc_async::bitcoin::hashes::Hash;
    reverse_hash(hash.to_byte_array())
}
