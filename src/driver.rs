//! Relay Driver (component F, spec.md §4.F) — the main submission loop and
//! the single-height state machine (*Discover → Submit → Await →
//! Done/BumpGas/Fatal*).
//!
//! Grounded on `executor/core_executor.go::SyncBTCLightMirror` /
//! `CheckSuccessRelayed` for the submit-then-poll shape, and
//! `relayer/relayer.go`'s outer loop for the height-advancement and
//! retry-sleep behavior.

use std::time::Duration;

use anyhow::Result;
use parking_lot::Mutex;

use crate::btc::chain::BitcoinChain;
use crate::core_chain::mirror::BtcLightMirror;
use crate::core_chain::{GasPolicy, LightClientApi, TxStatus};
use crate::reconciler::TipReconciler;

/// Outcome of a single height's relay attempt, matching spec.md §4.F's
/// state machine terminal states.
#[derive(Debug, PartialEq, Eq)]
enum RelayOutcome {
    Done,
    Retry,
    Fatal,
}

pub struct RelayDriver<B, L> {
    source: B,
    light_client: L,
    gas_policy: Mutex<GasPolicy>,
    genesis_height: i64,
}

impl<B: BitcoinChain, L: LightClientApi> RelayDriver<B, L> {
    pub fn new(source: B, light_client: L, gas_policy: GasPolicy, genesis_height: i64) -> Self {
        Self {
            source,
            light_client,
            gas_policy: Mutex::new(gas_policy),
            genesis_height,
        }
    }

    /// The outer loop from spec.md §4.F. Runs forever.
    pub async fn run(&self, source_highest_seen_height: impl Fn() -> i64) {
        loop {
            let tip = source_highest_seen_height();
            if tip == 0 {
                tokio::time::sleep(Duration::from_secs(1)).await;
                continue;
            }

            let reconciler = TipReconciler::new(&self.source, &self.light_client, self.genesis_height);
            let last = match reconciler.get_last_relay_height().await {
                Ok(height) => height,
                Err(err) => {
                    tracing::warn!(%err, "failed to reconcile last relay height, retrying");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    continue;
                },
            };

            if last == tip {
                tracing::info!("no new block");
                tokio::time::sleep(Duration::from_secs(1)).await;
                continue;
            }

            let mut h = last + 1;
            while h <= tip {
                match self.relay_one(h).await {
                    RelayOutcome::Done => h += 1,
                    RelayOutcome::Retry => {
                        tokio::time::sleep(Duration::from_secs(3)).await;
                    },
                    RelayOutcome::Fatal => {
                        tracing::error!(height = h, "relay failed terminally, will re-check next iteration");
                        tokio::time::sleep(Duration::from_secs(3)).await;
                        break;
                    },
                }
            }
        }
    }

    /// Implements spec.md §4.F `relay_one(h)`, steps 1-7.
    async fn relay_one(&self, height: i64) -> RelayOutcome {
        let hash = match self.source.block_hash_at(height).await {
            Ok(hash) => hash,
            Err(err) => {
                tracing::warn!(height, %err, "failed to fetch block hash, will retry");
                return RelayOutcome::Retry;
            },
        };
        let display_hash = to_display_hash(&hash);

        match self.light_client.is_relayed(display_hash).await {
            Ok(true) => return RelayOutcome::Done,
            Ok(false) => {},
            Err(err) => {
                tracing::warn!(height, %err, "is_relayed check failed, will retry");
                return RelayOutcome::Retry;
            },
        }

        let block = match self.source.get_block(&hash).await {
            Ok(block) => block,
            Err(err) => {
                tracing::warn!(height, %err, "failed to fetch block, will retry");
                return RelayOutcome::Retry;
            },
        };

        let mirror_bytes = BtcLightMirror::from_block(&block).to_bytes();

        loop {
            let (gas_limit, gas_price) = {
                let policy = self.gas_policy.lock();
                (policy.gas_limit, policy.effective_gas_price())
            };

            let tx_hash = match self.light_client.submit(mirror_bytes.clone(), gas_limit, gas_price).await {
                Ok(tx_hash) => tx_hash,
                Err(err) => {
                    tracing::warn!(height, %err, "failed to submit header, will retry");
                    return RelayOutcome::Retry;
                },
            };
            tracing::info!(
                height,
                block_hash = %hex::encode(display_hash),
                %tx_hash,
                "submitted header, awaiting result"
            );

            match self.await_result(display_hash, tx_hash).await {
                AwaitOutcome::Relayed => return RelayOutcome::Done,
                AwaitOutcome::OutOfGas => {
                    let mut policy = self.gas_policy.lock();
                    policy.bump_for_out_of_gas();
                    tracing::info!(height, gas_limit = policy.gas_limit, "out of gas, resubmitting with higher limit");
                },
                AwaitOutcome::TerminalRevert => return RelayOutcome::Fatal,
                AwaitOutcome::Error => return RelayOutcome::Retry,
            }
        }
    }

    /// Result-polling loop, spec.md §4.F step 7.
    async fn await_result(&self, display_hash: [u8; 32], tx_hash: alloy::primitives::TxHash) -> AwaitOutcome {
        loop {
            match self.light_client.is_relayed(display_hash).await {
                Ok(true) => {
                    if let Ok(submitter) = self.light_client.query_submitter(display_hash).await {
                        if !submitter.is_empty() {
                            tracing::info!(%submitter, "successful, relayed by");
                        } else {
                            tracing::info!("successful");
                        }
                    }
                    return AwaitOutcome::Relayed;
                },
                Ok(false) => {},
                Err(err) => {
                    tracing::warn!(%err, "is_relayed check failed during await, will retry");
                    return AwaitOutcome::Error;
                },
            }

            let receipt = match self.light_client.tx_receipt(tx_hash).await {
                Ok(receipt) => receipt,
                Err(err) => {
                    tracing::warn!(%err, "tx_receipt lookup failed, will retry");
                    return AwaitOutcome::Error;
                },
            };

            match receipt {
                None => {
                    tracing::info!("relaying, continue to check");
                    tokio::time::sleep(Duration::from_millis(500)).await;
                },
                Some(receipt) if receipt.status == TxStatus::Success => {
                    // Receipt succeeded but the contract hasn't reflected it
                    // yet -- eventual consistency, keep polling.
                    tokio::time::sleep(Duration::from_millis(500)).await;
                },
                Some(receipt) => {
                    let tx_info = match self.light_client.tx(tx_hash).await {
                        Ok(Some(tx_info)) => tx_info,
                        _ => {
                            tracing::warn!("failed receipt but could not fetch tx for gas classification");
                            return AwaitOutcome::Error;
                        },
                    };
                    if tx_info.gas == receipt.gas_used {
                        tracing::info!("out of gas, retry");
                        return AwaitOutcome::OutOfGas;
                    }
                    tracing::info!("failed");
                    return AwaitOutcome::TerminalRevert;
                },
            }
        }
    }
}

enum AwaitOutcome {
    Relayed,
    OutOfGas,
    TerminalRevert,
    Error,
}

/// `BtcHash::to_byte_array` returns bytes in the internal/wire order used by
/// Bitcoin's own consensus serialization; the conventional display order
/// Bitcoin tooling (and this crate's `LightClientApi`) uses is the reverse
/// of that (spec.md §4.C, §6 byte-reversal rule), so this applies
/// `reverse_hash` rather than re-exposing `to_byte_array` directly.
fn to_display_hash(hash: &crate::btc::chain::BtcHash) -> [u8; 32] {
    use bitcoincore_rpc_async::bitcoin::hashes::Hash;
    crate::core_chain::reverse_hash(hash.to_byte_array())
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex as StdMutex;

    use alloy::primitives::TxHash;
    use async_trait::async_trait;

    use super::*;
    use crate::btc::chain::BtcBlock;
    use crate::core_chain::{Hash32, TxInfo, TxReceiptInfo};

    fn hash_for(seed: u8) -> crate::btc::chain::BtcHash {
        use bitcoincore_rpc_async::bitcoin::hashes::Hash;
        crate::btc::chain::BtcHash::from_byte_array([seed; 32])
    }

    struct StubChain;

    #[async_trait]
    impl BitcoinChain for StubChain {
        async fn tip_height(&self) -> Result<i64> {
            Ok(800_000)
        }

        async fn block_hash_at(&self, height: i64) -> Result<crate::btc::chain::BtcHash> {
            Ok(hash_for(height as u8))
        }

        async fn get_block(&self, _hash: &crate::btc::chain::BtcHash) -> Result<BtcBlock> {
            use bitcoincore_rpc_async::bitcoin::blockdata::block::{Header, Version};
            use bitcoincore_rpc_async::bitcoin::{BlockHash, CompactTarget, TxMerkleNode};

            Ok(BtcBlock {
                header: Header {
                    version: Version::ONE,
                    prev_blockhash: BlockHash::all_zeros(),
                    merkle_root: TxMerkleNode::all_zeros(),
                    time: 0,
                    bits: CompactTarget::from_consensus(0),
                    nonce: 0,
                },
                txdata: vec![],
            })
        }

        async fn header_height(&self, _hash: &crate::btc::chain::BtcHash) -> Result<i64> {
            unimplemented!("not exercised by driver tests")
        }
    }

    /// Drives spec.md §8 properties 5 and 6, and scenarios S4/S5.
    struct StubLightClient {
        relayed: StdMutex<bool>,
        submit_count: AtomicU64,
        receipts: StdMutex<HashMap<TxHash, TxReceiptInfo>>,
        tx_gas: StdMutex<HashMap<TxHash, u64>>,
        observed_gas_limits: StdMutex<Vec<u64>>,
        /// When true, the second submission (after an OOG retry) succeeds.
        second_submission_succeeds: bool,
        /// When true, the only submission reverts terminally (non-OOG).
        terminal_revert: bool,
    }

    #[async_trait]
    impl LightClientApi for StubLightClient {
        async fn get_tip(&self) -> Result<Hash32> {
            unimplemented!("not exercised by driver tests")
        }

        async fn is_relayed(&self, _hash: Hash32) -> Result<bool> {
            Ok(*self.relayed.lock().unwrap())
        }

        async fn query_submitter(&self, _hash: Hash32) -> Result<String> {
            Ok("competitor".to_string())
        }

        async fn submit(&self, _mirror_bytes: Vec<u8>, gas_limit: u64, _gas_price: u64) -> Result<TxHash> {
            self.observed_gas_limits.lock().unwrap().push(gas_limit);
            let attempt = self.submit_count.fetch_add(1, Ordering::SeqCst);
            let tx_hash = TxHash::from([attempt as u8 + 1; 32]);

            if self.terminal_revert {
                self.receipts.lock().unwrap().insert(
                    tx_hash,
                    TxReceiptInfo {
                        status: TxStatus::Failed,
                        gas_used: gas_limit,
                    },
                );
                self.tx_gas.lock().unwrap().insert(tx_hash, gas_limit * 2);
                return Ok(tx_hash);
            }

            if attempt == 0 && self.second_submission_succeeds {
                // first submission: out of gas (tx.gas == receipt.gas_used)
                self.receipts.lock().unwrap().insert(
                    tx_hash,
                    TxReceiptInfo {
                        status: TxStatus::Failed,
                        gas_used: gas_limit,
                    },
                );
                self.tx_gas.lock().unwrap().insert(tx_hash, gas_limit);
            } else {
                *self.relayed.lock().unwrap() = true;
            }
            Ok(tx_hash)
        }

        async fn tx_receipt(&self, tx_hash: TxHash) -> Result<Option<TxReceiptInfo>> {
            Ok(self.receipts.lock().unwrap().get(&tx_hash).copied())
        }

        async fn tx(&self, tx_hash: TxHash) -> Result<Option<TxInfo>> {
            Ok(self.tx_gas.lock().unwrap().get(&tx_hash).map(|gas| TxInfo { gas: *gas }))
        }
    }

    fn driver_with(light_client: StubLightClient) -> RelayDriver<StubChain, StubLightClient> {
        RelayDriver::new(
            StubChain,
            light_client,
            GasPolicy::new(500_000, 1, 100_000),
            0,
        )
    }

    #[tokio::test]
    async fn competitor_already_relayed_skips_submission() {
        // spec.md §8 property 5.
        let light_client = StubLightClient {
            relayed: StdMutex::new(true),
            submit_count: AtomicU64::new(0),
            receipts: StdMutex::new(HashMap::new()),
            tx_gas: StdMutex::new(HashMap::new()),
            observed_gas_limits: StdMutex::new(vec![]),
            second_submission_succeeds: false,
            terminal_revert: false,
        };
        let driver = driver_with(light_client);
        let outcome = driver.relay_one(800_000).await;
        assert_eq!(outcome, RelayOutcome::Done);
        assert_eq!(driver.light_client.submit_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn out_of_gas_escalates_then_succeeds() {
        // spec.md §8 property 6 / S4.
        let light_client = StubLightClient {
            relayed: StdMutex::new(false),
            submit_count: AtomicU64::new(0),
            receipts: StdMutex::new(HashMap::new()),
            tx_gas: StdMutex::new(HashMap::new()),
            observed_gas_limits: StdMutex::new(vec![]),
            second_submission_succeeds: true,
            terminal_revert: false,
        };
        let driver = driver_with(light_client);
        let outcome = driver.relay_one(800_000).await;
        assert_eq!(outcome, RelayOutcome::Done);

        let gas_limits = driver.light_client.observed_gas_limits.lock().unwrap();
        assert_eq!(gas_limits.len(), 2);
        assert!(gas_limits[1] > gas_limits[0]);
    }

    #[tokio::test]
    async fn terminal_revert_is_fatal_not_retried_forever() {
        // spec.md §8 property 7 / S5.
        let light_client = StubLightClient {
            relayed: StdMutex::new(false),
            submit_count: AtomicU64::new(0),
            receipts: StdMutex::new(HashMap::new()),
            tx_gas: StdMutex::new(HashMap::new()),
            observed_gas_limits: StdMutex::new(vec![]),
            second_submission_succeeds: false,
            terminal_revert: true,
        };
        let driver = driver_with(light_client);
        let outcome = driver.relay_one(800_000).await;
        assert_eq!(outcome, RelayOutcome::Fatal);
        assert_eq!(driver.light_client.submit_count.load(Ordering::SeqCst), 1);
    }
}
