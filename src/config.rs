//! Configuration (spec.md §6). Parsing itself is out of scope as "interesting
//! work" but the shape and validation rules are reproduced faithfully from
//! `examples/original_source/config/config.go` since they are load-bearing
//! for the rest of the system.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use url::Url;

const CONFIG_RELATIVE_PATH: &str = "config/config.json";

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    pub cross_chain_config: CrossChainConfig,
    pub btc_config: BtcConfig,
    pub core_config: CoreConfig,
    pub log_config: LogConfig,
    pub alert_config: AlertConfig,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CrossChainConfig {
    /// Carried through per spec.md §9 Open Question 2: validated but not
    /// consumed by the Relay Driver or Reconciler in this implementation.
    pub recursion_height: i64,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BtcRpcAddr {
    pub host: String,
    pub user: String,
    pub pass: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BtcConfig {
    pub rpc_addrs: Vec<BtcRpcAddr>,
    pub sleep_second: u64,
    pub data_seed_deny_service_threshold: f64,
    /// Bitcoin height below which the Tip Reconciler's backward walk will
    /// not descend (spec.md §4.E, §9 Open Question 1). Defaults to 0 if
    /// absent, which imposes no floor beyond Bitcoin's own genesis.
    #[serde(default)]
    pub light_client_genesis_height: i64,
}

impl BtcConfig {
    fn validate(&self) -> Result<()> {
        if self.rpc_addrs.is_empty() {
            bail!("rpc endpoint of BTC chain should not be empty");
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CoreConfig {
    pub private_key: String,
    pub providers: Vec<Url>,
    pub gas_limit: u64,
    pub gas_price: u64,
    pub gas_increase: u64,
    pub sleep_second: u64,
    pub data_seed_deny_service_threshold: f64,
}

impl CoreConfig {
    fn validate(&self) -> Result<()> {
        if self.providers.is_empty() {
            bail!("provider address of Core Chain should not be empty");
        }
        if self.gas_limit == 0 {
            bail!("gas_limit of Core Chain should be larger than 0");
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LogConfig {
    pub level: String,
    pub filename: String,
    pub max_file_size_in_mb: i64,
    pub max_backups_of_log_files: usize,
    pub max_age_to_retain_log_files_in_days: u64,
    pub use_console_logger: bool,
    pub use_file_logger: bool,
    pub compress: bool,
}

impl LogConfig {
    fn validate(&self) -> Result<()> {
        if self.use_file_logger {
            if self.filename.is_empty() {
                bail!("filename should not be empty if using file logger");
            }
            if self.max_file_size_in_mb <= 0 {
                bail!("max_file_size_in_mb should be larger than 0 if using file logger");
            }
            if self.max_backups_of_log_files == 0 {
                bail!("max_backups_of_log_files should be larger than 0 if using file logger");
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AlertConfig {
    pub enable_alert: bool,
    pub enable_heart_beat: bool,
    pub interval: i64,

    pub identity: String,
    pub telegram_bot_id: String,
    pub telegram_chat_id: String,

    pub balance_threshold: String,
    /// Parsed and validated but never consumed in the relay path, per
    /// spec.md §9 Open Question 3.
    pub sequence_gap_threshold: u64,
}

impl AlertConfig {
    fn validate(&self) -> Result<()> {
        if !self.enable_alert {
            return Ok(());
        }
        if self.interval <= 0 {
            bail!("alert interval should be positive");
        }
        let threshold: Decimal = self
            .balance_threshold
            .parse()
            .context("unrecognized balance_threshold")?;
        if threshold <= Decimal::ZERO {
            bail!("balance_threshold should be positive");
        }
        if self.sequence_gap_threshold == 0 {
            bail!("sequence_gap_threshold should be positive");
        }
        Ok(())
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        self.btc_config.validate()?;
        self.core_config.validate()?;
        self.log_config.validate()?;
        self.alert_config.validate()?;
        Ok(())
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(content).context("invalid config JSON")?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `config/config.json` relative to the running executable's
    /// directory, matching `examples/original_source/config/config.go`'s
    /// `ParseConfigFromFile` + `GetCurrentAbPath`.
    pub fn load_default() -> Result<Self> {
        let path = resolve_config_path()?;
        tracing::info!(path = %path.display(), "loading configuration");
        let content =
            std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
        Self::from_json(&content)
    }
}

/// Reproduces `GetCurrentAbPath`: resolve the directory the built binary
/// lives in; if that directory is under the OS temp dir (as happens under
/// `cargo run`/`cargo test`, which build into a temp-like target dir during
/// some CI sandboxes), fall back to the directory this source file was
/// compiled from, so both built-binary and dev invocations find a sane
/// config directory.
fn resolve_config_path() -> Result<PathBuf> {
    let exe_dir = current_exe_dir()?;
    Ok(resolve_config_path_from(&exe_dir, &std::env::temp_dir()))
}

/// The pure decision `resolve_config_path` delegates to, split out so it can
/// be unit-tested against synthetic directories without relying on the test
/// binary's own `current_exe()` location.
fn resolve_config_path_from(exe_dir: &Path, tmp_dir: &Path) -> PathBuf {
    let base_dir = if exe_dir.starts_with(tmp_dir) {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    } else {
        exe_dir.to_path_buf()
    };
    base_dir.join(CONFIG_RELATIVE_PATH)
}

fn current_exe_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("resolving current executable path")?;
    let resolved = std::fs::canonicalize(&exe).unwrap_or(exe);
    let dir = resolved
        .parent()
        .map(Path::to_path_buf)
        .context("executable has no parent directory")?;
    Ok(dir)
}

#[cfg(test)]
mod test {
    use super::*;

    fn sample_json() -> &'static str {
        r#"{
            "cross_chain_config": {"recursion_height": 0},
            "btc_config": {
                "rpc_addrs": [{"host": "127.0.0.1:8332", "user": "u", "pass": "p"}],
                "sleep_second": 5,
                "data_seed_deny_service_threshold": 60.0
            },
            "core_config": {
                "private_key": "deadbeef",
                "providers": ["http://127.0.0.1:8545"],
                "gas_limit": 500000,
                "gas_price": 0,
                "gas_increase": 100000,
                "sleep_second": 5,
                "data_seed_deny_service_threshold": 60.0
            },
            "log_config": {
                "level": "info",
                "filename": "relayer.log",
                "max_file_size_in_mb": 100,
                "max_backups_of_log_files": 5,
                "max_age_to_retain_log_files_in_days": 30,
                "use_console_logger": true,
                "use_file_logger": false,
                "compress": false
            },
            "alert_config": {
                "enable_alert": true,
                "enable_heart_beat": true,
                "interval": 60,
                "identity": "relayer-1",
                "telegram_bot_id": "bot",
                "telegram_chat_id": "chat",
                "balance_threshold": "1000000000000000000",
                "sequence_gap_threshold": 10
            }
        }"#
    }

    #[test]
    fn parses_and_validates_a_well_formed_config() {
        let config = Config::from_json(sample_json()).unwrap();
        assert_eq!(config.btc_config.rpc_addrs.len(), 1);
        assert_eq!(config.core_config.gas_limit, 500000);
    }

    #[test]
    fn rejects_empty_btc_endpoints() {
        let mut config: Config = serde_json::from_str(sample_json()).unwrap();
        config.btc_config.rpc_addrs.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_gas_limit() {
        let mut config: Config = serde_json::from_str(sample_json()).unwrap();
        config.core_config.gas_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_non_positive_balance_threshold() {
        let mut config: Config = serde_json::from_str(sample_json()).unwrap();
        config.alert_config.balance_threshold = "0".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_sequence_gap_threshold() {
        let mut config: Config = serde_json::from_str(sample_json()).unwrap();
        config.alert_config.sequence_gap_threshold = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_path_under_os_temp_dir_falls_back_to_manifest_dir() {
        // Built-binary invocation: the executable lives somewhere under the
        // OS temp dir (as `cargo test` binaries do in some CI sandboxes), so
        // the dev fallback to CARGO_MANIFEST_DIR kicks in.
        let tmp = tempfile::tempdir().unwrap();
        let exe_dir = tmp.path().join("target/debug");
        let resolved = resolve_config_path_from(&exe_dir, tmp.path());
        assert_eq!(
            resolved,
            PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(CONFIG_RELATIVE_PATH)
        );
    }

    #[test]
    fn config_path_outside_os_temp_dir_uses_executable_directory() {
        let exe_tmp = tempfile::tempdir().unwrap();
        let other_tmp = tempfile::tempdir().unwrap();
        let resolved = resolve_config_path_from(exe_tmp.path(), other_tmp.path());
        assert_eq!(resolved, exe_tmp.path().join(CONFIG_RELATIVE_PATH));
    }
}
