//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::api::ApiConfig as ServerConfig;
use crate::ledger::{RpcConfig, WalletCliConfig};
use crate::timeline::TimelineConfig as ServiceConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ledger: LedgerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub timeline: TimelineConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Ledger access configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// Published timeline contract package
    #[serde(default)]
    pub package_id: Option<String>,

    #[serde(default = "default_network")]
    pub network: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_wait_timeout")]
    pub wait_timeout_ms: u64,

    /// Wallet binary used to sign and submit transactions
    #[serde(default = "default_cli_path")]
    pub cli_path: String,

    #[serde(default = "default_gas_budget")]
    pub gas_budget: u64,

    /// Wallet client config file, if not the wallet's default
    #[serde(default)]
    pub client_config: Option<String>,
}

fn default_rpc_url() -> String {
    "https://api.testnet.iota.cafe".to_string()
}

fn default_network() -> String {
    "testnet".to_string()
}

fn default_request_timeout() -> u64 {
    10_000
}

fn default_max_retries() -> u32 {
    3
}

fn default_wait_timeout() -> u64 {
    30_000
}

fn default_cli_path() -> String {
    "iota".to_string()
}

fn default_gas_budget() -> u64 {
    50_000_000
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            package_id: None,
            network: default_network(),
            request_timeout_ms: default_request_timeout(),
            max_retries: default_max_retries(),
            wait_timeout_ms: default_wait_timeout(),
            cli_path: default_cli_path(),
            gas_budget: default_gas_budget(),
            client_config: None,
        }
    }
}

impl LedgerConfig {
    pub fn rpc(&self) -> RpcConfig {
        RpcConfig {
            rpc_url: self.rpc_url.clone(),
            request_timeout_ms: self.request_timeout_ms,
            max_retries: self.max_retries,
            wait_timeout_ms: self.wait_timeout_ms,
            ..RpcConfig::default()
        }
    }

    pub fn wallet(&self) -> WalletCliConfig {
        WalletCliConfig {
            cli_path: PathBuf::from(&self.cli_path),
            gas_budget: self.gas_budget,
            client_config: self.client_config.as_ref().map(PathBuf::from),
        }
    }
}

/// Local storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_data_dir() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("mjtimeline").to_string_lossy().to_string())
        .unwrap_or_else(|| "./mjtimeline_data".to_string())
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl StorageConfig {
    /// `data_dir` with a leading `~/` expanded to the home directory
    pub fn data_path(&self) -> PathBuf {
        match (self.data_dir.strip_prefix("~/"), dirs::home_dir()) {
            (Some(rest), Some(home)) => home.join(rest),
            _ => PathBuf::from(&self.data_dir),
        }
    }
}

/// Timeline behaviour configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TimelineConfig {
    #[serde(default = "default_settle_delay")]
    pub settle_delay_ms: u64,

    /// Background refresh; unset disables polling
    #[serde(default)]
    pub poll_interval_ms: Option<u64>,

    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
}

fn default_settle_delay() -> u64 {
    1000
}

fn default_max_concurrent_fetches() -> usize {
    8
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay(),
            poll_interval_ms: None,
            max_concurrent_fetches: default_max_concurrent_fetches(),
        }
    }
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8085
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// First existing config file among the default locations
    pub fn default_path() -> Option<PathBuf> {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("mjtimeline").join("config.toml")),
            Some(PathBuf::from("/etc/mjtimeline/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        config_paths.into_iter().flatten().find(|p| p.exists())
    }

    /// Load `explicit`, else the first default location, else the environment
    ///
    /// Returns the file that was used so the caller can report it once
    /// logging is set up.
    pub fn resolve(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        let path = explicit.map(Path::to_path_buf).or_else(Self::default_path);

        match path {
            Some(path) => Ok((Self::load_with_env(&path)?, Some(path))),
            None => Ok((Self::from_env(), None)),
        }
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        // Ledger overrides
        if let Some(url) = var("MJTIMELINE_RPC_URL") {
            self.ledger.rpc_url = url;
        }
        if let Some(package_id) = var("MJTIMELINE_PACKAGE_ID") {
            self.ledger.package_id = Some(package_id);
        }
        if let Some(network) = var("MJTIMELINE_NETWORK") {
            self.ledger.network = network;
        }
        if let Some(cli) = var("MJTIMELINE_CLI_PATH") {
            self.ledger.cli_path = cli;
        }

        // Storage overrides
        if let Some(data_dir) = var("MJTIMELINE_DATA_DIR") {
            self.storage.data_dir = data_dir;
        }

        // Timeline overrides
        if let Some(ms) = var("MJTIMELINE_POLL_INTERVAL_MS") {
            if let Ok(ms) = ms.parse() {
                self.timeline.poll_interval_ms = Some(ms);
            }
        }

        // API overrides
        if let Some(host) = var("MJTIMELINE_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = var("MJTIMELINE_API_PORT") {
            if let Ok(p) = port.parse() {
                self.api.port = p;
            }
        }

        // Logging overrides
        if let Some(level) = var("MJTIMELINE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("MJTIMELINE_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Settings for the timeline service
    pub fn service(&self) -> ServiceConfig {
        ServiceConfig {
            package_id: self.ledger.package_id.clone().filter(|p| !p.is_empty()),
            settle_delay_ms: self.timeline.settle_delay_ms,
            poll_interval_ms: self.timeline.poll_interval_ms,
            max_concurrent_fetches: self.timeline.max_concurrent_fetches,
        }
    }

    /// Settings for the API server
    pub fn server(&self) -> ServerConfig {
        ServerConfig {
            host: self.api.host.clone(),
            port: self.api.port,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# mjtimeline Configuration
#
# Environment variables override these settings:
# - MJTIMELINE_RPC_URL
# - MJTIMELINE_PACKAGE_ID
# - MJTIMELINE_NETWORK
# - MJTIMELINE_CLI_PATH
# - MJTIMELINE_DATA_DIR
# - MJTIMELINE_POLL_INTERVAL_MS
# - MJTIMELINE_API_HOST
# - MJTIMELINE_API_PORT
# - MJTIMELINE_LOG_LEVEL
# - MJTIMELINE_LOG_FORMAT

[ledger]
# JSON-RPC node URL
rpc_url = "https://api.testnet.iota.cafe"

# Published timeline package (required to create timelines and posts)
# package_id = "0x..."

# Network name, informational
network = "testnet"

# Per-request timeout (ms)
request_timeout_ms = 10000

# Retries after a failed request (0 = single attempt)
max_retries = 3

# How long to wait for a transaction to be confirmed (ms)
wait_timeout_ms = 30000

# Wallet CLI used to sign and submit transactions
cli_path = "iota"

# Gas budget per transaction
gas_budget = 50000000

# Wallet client config, if not the default
# client_config = "~/.iota/iota_config/client.yaml"

[storage]
# Directory holding local_storage.json
data_dir = "~/.local/share/mjtimeline"

[timeline]
# Pause after a post is confirmed before refreshing (ms)
settle_delay_ms = 1000

# Background refresh interval (ms); leave unset to disable
# poll_interval_ms = 4000

# Maximum concurrent post fetches
max_concurrent_fetches = 8

[api]
# API server host
host = "127.0.0.1"

# API server port
port = 8085

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.ledger.rpc_url, "https://api.testnet.iota.cafe");
        assert!(config.ledger.package_id.is_none());
        assert_eq!(config.timeline.settle_delay_ms, 1000);
        assert!(config.timeline.poll_interval_ms.is_none());
        assert_eq!(config.api.port, 8085);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_generated_config_parses() {
        let config = Config::parse(&generate_default_config()).unwrap();
        assert_eq!(config.ledger.gas_budget, 50_000_000);
        assert_eq!(config.timeline.max_concurrent_fetches, 8);
        assert!(config.timeline.poll_interval_ms.is_none());
    }

    #[test]
    fn test_partial_file() {
        let config = Config::parse(
            r#"
            [ledger]
            package_id = "0xpkg"

            [timeline]
            poll_interval_ms = 4000
            "#,
        )
        .unwrap();

        assert_eq!(config.ledger.package_id.as_deref(), Some("0xpkg"));
        assert_eq!(config.ledger.max_retries, 3);
        assert_eq!(config.service().poll_interval_ms, Some(4000));
        assert_eq!(config.service().package_id.as_deref(), Some("0xpkg"));
    }

    #[test]
    fn test_resolve_reports_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[timeline]\nsettle_delay_ms = 250\n").unwrap();

        let (config, used) = Config::resolve(Some(&path)).unwrap();
        assert_eq!(used.as_deref(), Some(path.as_path()));
        assert_eq!(config.timeline.settle_delay_ms, 250);

        let missing = dir.path().join("absent.toml");
        assert!(matches!(
            Config::resolve(Some(&missing)),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_invalid_file() {
        assert!(Config::parse("[ledger\nrpc_url = 1").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("MJTIMELINE_PACKAGE_ID", "0xenv"),
            ("MJTIMELINE_API_PORT", "9000"),
            ("MJTIMELINE_POLL_INTERVAL_MS", "2500"),
            ("MJTIMELINE_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::parse("[ledger]\npackage_id = \"0xfile\"").unwrap();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.ledger.package_id.as_deref(), Some("0xenv"));
        assert_eq!(config.api.port, 9000);
        assert_eq!(config.timeline.poll_interval_ms, Some(2500));
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_bad_port_override_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|key| (key == "MJTIMELINE_API_PORT").then(|| "high".to_string()));
        assert_eq!(config.api.port, 8085);
    }

    #[test]
    fn test_empty_package_id_is_unset() {
        let config = Config::parse("[ledger]\npackage_id = \"\"").unwrap();
        assert!(config.service().package_id.is_none());
    }

    #[test]
    fn test_data_path() {
        let storage = StorageConfig {
            data_dir: "/var/lib/mjtimeline".to_string(),
        };
        assert_eq!(storage.data_path(), PathBuf::from("/var/lib/mjtimeline"));

        if let Some(home) = dirs::home_dir() {
            let storage = StorageConfig {
                data_dir: "~/.local/share/mjtimeline".to_string(),
            };
            assert_eq!(storage.data_path(), home.join(".local/share/mjtimeline"));
        }
    }

    #[test]
    fn test_wallet_config() {
        let config = Config::default();
        let wallet = config.ledger.wallet();
        assert_eq!(wallet.cli_path, PathBuf::from("iota"));
        assert!(wallet.client_config.is_none());
    }
}
