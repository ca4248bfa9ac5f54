//! Source Endpoint Pool. Generic over the per-endpoint client type so the
//! active-endpoint-selection algorithm can be unit tested with synthetic
//! heights without a live Bitcoin node.
//!
//! A background task probes every configured endpoint on an interval and
//! keeps a `parking_lot::RwLock`-guarded active index pointed at whichever
//! endpoint has reported the highest tip, so callers reading through
//! `current_client` never block on a slow or unreachable endpoint.

use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;

use super::chain::{BitcoinChain, BtcBlock, BtcHash};
use crate::config::BtcConfig;
use crate::telegram::send_telegram_message;

struct Observed {
    last_observed_height: i64,
    last_updated_at: Instant,
}

struct Endpoint<C> {
    provider_url: String,
    client: C,
    observed: RwLock<Observed>,
}

struct PoolState {
    active_index: usize,
    highest_seen_height: i64,
}

/// The Source Endpoint Pool (component A). `C` is the concrete per-endpoint
/// client; production code uses [`super::client::BtcEndpointClient`], tests
/// use a small stub implementing [`BitcoinChain`] directly.
pub struct SourceEndpointPool<C> {
    endpoints: Vec<Endpoint<C>>,
    state: RwLock<PoolState>,
    deny_service_threshold: Duration,
    sleep_interval: Duration,
    telegram_identity: String,
    telegram_bot_id: String,
    telegram_chat_id: String,
}

impl<C: BitcoinChain> SourceEndpointPool<C> {
    pub fn new(
        endpoints: Vec<(String, C)>,
        cfg: &BtcConfig,
        telegram_identity: impl Into<String>,
        telegram_bot_id: impl Into<String>,
        telegram_chat_id: impl Into<String>,
    ) -> Self {
        let now = Instant::now();
        let endpoints = endpoints
            .into_iter()
            .map(|(provider_url, client)| Endpoint {
                provider_url,
                client,
                observed: RwLock::new(Observed {
                    last_observed_height: 0,
                    last_updated_at: now,
                }),
            })
            .collect();
        Self {
            endpoints,
            state: RwLock::new(PoolState {
                active_index: 0,
                highest_seen_height: 0,
            }),
            deny_service_threshold: Duration::from_secs_f64(cfg.data_seed_deny_service_threshold),
            sleep_interval: Duration::from_secs(cfg.sleep_second),
            telegram_identity: telegram_identity.into(),
            telegram_bot_id: telegram_bot_id.into(),
            telegram_chat_id: telegram_chat_id.into(),
        }
    }

    fn current_index(&self) -> usize {
        self.state.read().active_index
    }

    fn current_client(&self) -> &C {
        &self.endpoints[self.current_index()].client
    }

    pub fn highest_seen_height(&self) -> i64 {
        self.state.read().highest_seen_height
    }

    /// Runs forever, probing every endpoint each `sleep_interval` and
    /// switching the active endpoint to whichever one is most advanced.
    pub async fn probe_loop(&self) {
        loop {
            self.probe_once().await;
            tokio::time::sleep(self.sleep_interval).await;
        }
    }

    /// A single probe cycle, exposed separately from [`Self::probe_loop`] so
    /// tests can drive deterministic cycles.
    pub async fn probe_once(&self) {
        for endpoint in &self.endpoints {
            let is_stale = endpoint.observed.read().last_updated_at.elapsed() > self.deny_service_threshold;
            if is_stale {
                let msg = format!("data seed {} is not accessible", endpoint.provider_url);
                tracing::error!("{msg}");
                send_telegram_message(
                    &self.telegram_identity,
                    &self.telegram_bot_id,
                    &self.telegram_chat_id,
                    &msg,
                )
                .await;
            }

            match endpoint.client.tip_height().await {
                Ok(height) => {
                    let mut observed = endpoint.observed.write();
                    observed.last_observed_height = height;
                    observed.last_updated_at = Instant::now();
                },
                Err(err) => {
                    tracing::error!(provider = %endpoint.provider_url, %err, "get latest block height error");
                    continue;
                },
            }
        }

        let mut best_idx = 0usize;
        let mut best_height = 0i64;
        for (idx, endpoint) in self.endpoints.iter().enumerate() {
            let height = endpoint.observed.read().last_observed_height;
            if height > best_height {
                best_height = height;
                best_idx = idx;
            }
        }

        let mut state = self.state.write();
        if best_height > state.highest_seen_height {
            tracing::info!(height = best_height, "new height");
            state.active_index = best_idx;
            state.highest_seen_height = best_height;
        }
    }
}

#[async_trait]
impl<C: BitcoinChain> BitcoinChain for SourceEndpointPool<C> {
    async fn tip_height(&self) -> Result<i64> {
        self.current_client().tip_height().await
    }

    async fn block_hash_at(&self, height: i64) -> Result<BtcHash> {
        self.current_client().block_hash_at(height).await
    }

    async fn get_block(&self, hash: &BtcHash) -> Result<BtcBlock> {
        self.current_client().get_block(hash).await
    }

    async fn header_height(&self, hash: &BtcHash) -> Result<i64> {
        self.current_client().header_height(hash).await
    }
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicI64, Ordering};

    use super::*;

    /// A synthetic endpoint whose height is fixed at construction.
    struct StubEndpoint {
        height: AtomicI64,
    }

    impl StubEndpoint {
        fn new(height: i64) -> Self {
            Self {
                height: AtomicI64::new(height),
            }
        }
    }

    #[async_trait]
    impl BitcoinChain for StubEndpoint {
        async fn tip_height(&self) -> Result<i64> {
            Ok(self.height.load(Ordering::SeqCst))
        }

        async fn block_hash_at(&self, _height: i64) -> Result<BtcHash> {
            unimplemented!("not exercised by pool-switching tests")
        }

        async fn get_block(&self, _hash: &BtcHash) -> Result<BtcBlock> {
            unimplemented!("not exercised by pool-switching tests")
        }

        async fn header_height(&self, _hash: &BtcHash) -> Result<i64> {
            unimplemented!("not exercised by pool-switching tests")
        }
    }

    fn test_cfg() -> BtcConfig {
        BtcConfig {
            rpc_addrs: vec![],
            sleep_second: 1,
            data_seed_deny_service_threshold: 3600.0,
            light_client_genesis_height: 0,
        }
    }

    #[tokio::test]
    async fn source_pool_switches_to_any_ahead_endpoint() {
        // property 2: heights [10, 12], active 0 -> source pool moves to 1.
        let pool = SourceEndpointPool::new(
            vec![
                ("a".into(), StubEndpoint::new(10)),
                ("b".into(), StubEndpoint::new(12)),
            ],
            &test_cfg(),
            "id",
            "",
            "",
        );
        pool.probe_once().await;
        assert_eq!(pool.current_index(), 1);
        assert_eq!(pool.highest_seen_height(), 12);
    }

    #[tokio::test]
    async fn highest_seen_height_is_monotonic_across_cycles() {
        // property 1: highest_seen_height never decreases across cycles.
        let pool = SourceEndpointPool::new(
            vec![("a".into(), StubEndpoint::new(100))],
            &test_cfg(),
            "id",
            "",
            "",
        );
        pool.probe_once().await;
        assert_eq!(pool.highest_seen_height(), 100);

        // A subsequent cycle reporting a lower height must not regress
        // highest_seen_height.
        pool.endpoints[0].client.height.store(50, Ordering::SeqCst);
        pool.probe_once().await;
        assert_eq!(pool.highest_seen_height(), 100);

        pool.endpoints[0].client.height.store(150, Ordering::SeqCst);
        pool.probe_once().await;
        assert_eq!(pool.highest_seen_height(), 150);
    }
}
