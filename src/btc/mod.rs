//! Everything to do with the Bitcoin (source) chain: the chain interface
//! trait, the concrete RPC client, and the endpoint pool (A).

pub mod chain;
pub mod client;
pub mod pool;

pub use chain::{BitcoinChain, BtcBlock, BtcHash};
pub use client::BtcEndpointClient;
pub use pool::SourceEndpointPool;
