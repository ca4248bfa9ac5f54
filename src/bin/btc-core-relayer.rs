//! Entry point (spec.md §6 "CLI"). No flags; loads `config/config.json`
//! relative to the executable directory, initializes logging, and starts
//! the Supervisor. Grounded on the overall shape of
//! `staking-cli/src/bin/staking-cli.rs::main`'s load-config-then-init-logger
//! sequence, simplified to match spec.md's "single binary; no flags".

use anyhow::Result;
use btc_core_relayer::config::Config;
use btc_core_relayer::logging;
use btc_core_relayer::supervisor::Supervisor;

#[tokio::main]
async fn main() -> Result<()> {
    let config = match Config::load_default() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("fatal: failed to load configuration: {err:#}");
            std::process::exit(1);
        },
    };

    let _logger_guard = logging::init(&config.log_config)?;

    let supervisor = match Supervisor::build(config).await {
        Ok(supervisor) => supervisor,
        Err(err) => {
            tracing::error!(%err, "fatal: failed to construct relayer");
            std::process::exit(1);
        },
    };

    if let Err(err) = supervisor.run().await {
        tracing::error!(%err, "fatal: relayer exited");
        std::process::exit(1);
    }

    Ok(())
}
