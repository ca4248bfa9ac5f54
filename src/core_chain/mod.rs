//! Everything to do with the Core (destination) chain: the endpoint pool
//! (B), the two typed contract gateways (C, D), the gas policy, and the
//! `BtcLightMirror` wire payload.

pub mod api;
pub mod client;
pub mod gas;
pub mod light_client;
pub mod mirror;
pub mod pool;
pub mod relayer_hub;

pub use api::{Hash32, LightClientApi, RegistryApi, TxInfo, TxReceiptInfo, TxStatus};
pub use client::CoreEndpointClient;
pub use gas::GasPolicy;
pub use light_client::LightClientGateway;
pub use mirror::{reverse_hash, BtcLightMirror};
pub use pool::{CoreTipProbe, DestinationEndpointPool};
pub use relayer_hub::RelayerHubGateway;
