use thiserror::Error;

/// Error taxonomy for the relay control plane.
///
/// Leaf RPC errors are propagated as `anyhow::Error` so call sites can attach
/// context; this enum exists for the handful of places a caller needs to
/// *branch* on what kind of failure happened rather than just log it.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("configuration error: {0}")]
    ConfigFatal(String),

    #[error("endpoint unreachable: {0}")]
    EndpointTransient(String),

    #[error("registration failed: {0}")]
    RegistrationFailed(String),

    #[error("out of gas, gas_used == tx.gas")]
    OutOfGas,

    #[error("transaction reverted (non-OOG)")]
    TxReverted,
}
