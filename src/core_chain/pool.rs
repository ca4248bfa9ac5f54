//! Destination Endpoint Pool (component B, spec.md §4.B). Same shape as the
//! Source Endpoint Pool (`crate::btc::pool::SourceEndpointPool`), but with
//! the opposite switching policy: spec.md §4.B calls out this as the
//! "design-critical difference between A and B" — the destination pool
//! only switches when the active endpoint falls behind by more than
//! `fall_behind_threshold` blocks (`executor/core_executor.go::UpdateClients`,
//! `FallBehindThreshold` in `executor/const.go`), to avoid EVM-client churn
//! from mempool-sticky / nonce-recency behavior.

use std::time::{Duration, Instant};

use anyhow::Result;
use parking_lot::RwLock;

use crate::config::CoreConfig;
use crate::telegram::send_telegram_message;

/// Fixed at 5 blocks per `executor/const.go::FallBehindThreshold`.
pub const FALL_BEHIND_THRESHOLD: i64 = 5;

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
}

pub struct DestinationEndpointPool<C> {
    endpoints: Vec<Endpoint<C>>,
    state: RwLock<PoolState>,
    deny_service_threshold: Duration,
    sleep_interval: Duration,
    fall_behind_threshold: i64,
    telegram_identity: String,
    telegram_bot_id: String,
    telegram_chat_id: String,
}

impl<C> DestinationEndpointPool<C> {
    pub fn new(
        endpoints: Vec<(String, C)>,
        cfg: &CoreConfig,
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
            state: RwLock::new(PoolState { active_index: 0 }),
            deny_service_threshold: Duration::from_secs_f64(cfg.data_seed_deny_service_threshold),
            sleep_interval: Duration::from_secs(cfg.sleep_second),
            fall_behind_threshold: FALL_BEHIND_THRESHOLD,
            telegram_identity: telegram_identity.into(),
            telegram_bot_id: telegram_bot_id.into(),
            telegram_chat_id: telegram_chat_id.into(),
        }
    }

    fn current_index(&self) -> usize {
        self.state.read().active_index
    }

    pub fn current(&self) -> &C {
        &self.endpoints[self.current_index()].client
    }
}

/// The probe-loop / height-observation side of the pool, separated out so
/// it only needs the (fallible) `tip_height` capability rather than the
/// full `LightClientApi`/`RegistryApi` surface; production endpoints
/// implement both.
#[async_trait::async_trait]
pub trait CoreTipProbe: Send + Sync {
    async fn tip_height(&self) -> Result<i64>;
}

impl<C: CoreTipProbe> DestinationEndpointPool<C> {
    pub async fn probe_loop(&self) {
        loop {
            self.probe_once().await;
            tokio::time::sleep(self.sleep_interval).await;
        }
    }

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
        let active_height = self.endpoints[state.active_index].observed.read().last_observed_height;
        if active_height + self.fall_behind_threshold < best_height {
            tracing::info!(
                from = state.active_index,
                to = best_idx,
                "switching destination endpoint, fell behind"
            );
            state.active_index = best_idx;
        }
    }
}
