//! One Core (EVM) endpoint's client handle. Grounded on
//! `staking-cli/src/registration.rs`'s `impl Provider` parameter style and
//! `examples/sveitser-espresso-network/types/src/v0/impls/l1.rs`'s
//! wallet-filled provider construction, specialized to a concrete provider
//! type (rather than `impl Provider`) so a pool of endpoints sharing one
//! signer can be stored in a single `Vec`.

use alloy::network::{Ethereum, EthereumWallet};
use alloy::primitives::Address;
use alloy::providers::fillers::{
    BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller, WalletFiller,
};
use alloy::providers::{Identity, Provider, ProviderBuilder, RootProvider};
use alloy::signers::local::PrivateKeySigner;
use anyhow::{Context, Result};
use async_trait::async_trait;
use url::Url;

use super::pool::CoreTipProbe;

/// The concrete provider stack every Core endpoint is built with: the
/// default fillers (nonce, gas, chain id, blob gas) plus a wallet filler
/// for the relayer's signing key.
pub type CoreProvider = FillProvider<
    JoinFill<
        JoinFill<Identity, JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>>,
        WalletFiller<EthereumWallet>,
    >,
    RootProvider,
    Ethereum,
>;

pub struct CoreEndpointClient {
    provider: CoreProvider,
    sender: Address,
}

impl CoreEndpointClient {
    pub fn connect(url: Url, private_key_hex: &str) -> Result<Self> {
        let signer: PrivateKeySigner = private_key_hex
            .parse()
            .context("parsing core_config.private_key as a secp256k1 key")?;
        let sender = signer.address();
        let wallet = EthereumWallet::from(signer);
        let provider = ProviderBuilder::new().wallet(wallet).on_http(url);
        Ok(Self { provider, sender })
    }

    pub fn provider(&self) -> &CoreProvider {
        &self.provider
    }

    pub fn sender(&self) -> Address {
        self.sender
    }
}

#[async_trait]
impl CoreTipProbe for CoreEndpointClient {
    async fn tip_height(&self) -> Result<i64> {
        let number = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            self.provider.get_block_number(),
        )
        .await
        .context("timed out fetching core chain tip")?
        .context("get_block_number")?;
        Ok(number as i64)
    }
}
