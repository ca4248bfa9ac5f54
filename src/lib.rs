pub mod alert_monitor;
pub mod btc;
pub mod config;
pub mod core_chain;
pub mod driver;
pub mod error;
pub mod logging;
pub mod reconciler;
pub mod supervisor;
pub mod telegram;

pub use config::Config;
pub use error::RelayError;
