//! Configuration module for the governance engine
//!
//! The configuration surface is consumed once at startup: RPC endpoint URL,
//! network identifier, default contract address, and polling parameters.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default network name
pub const DEFAULT_NETWORK: &str = "testnet";
/// Default RPC endpoint (Conflux public testnet)
pub const DEFAULT_RPC_ENDPOINT: &str = "https://test.confluxrpc.com";

/// Network endpoints mapping
pub fn get_network_endpoint(network: &str) -> &'static str {
    match network {
        "mainnet" => "https://main.confluxrpc.com",
        "test" | "testnet" => "https://test.confluxrpc.com",
        "local" => "http://127.0.0.1:12537",
        _ => DEFAULT_RPC_ENDPOINT,
    }
}

/// Network identifier for a named network
pub fn get_network_id(network: &str) -> u32 {
    match network {
        "mainnet" => 1029,
        "test" | "testnet" => 1,
        _ => 1,
    }
}

/// Ledger connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub network: String,
    pub rpc_endpoint: String,
    pub network_id: u32,
    /// Contract address to bind on startup, if any
    pub default_contract_address: Option<String>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            network: DEFAULT_NETWORK.to_string(),
            rpc_endpoint: DEFAULT_RPC_ENDPOINT.to_string(),
            network_id: get_network_id(DEFAULT_NETWORK),
            default_contract_address: None,
        }
    }
}

/// Confirmation polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Fixed wait between receipt queries, in milliseconds
    pub interval_ms: u64,
    /// Upper bound on a single confirmation wait, in seconds; None disables it
    pub confirm_timeout_secs: Option<u64>,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1_000,
            confirm_timeout_secs: Some(300),
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn confirm_timeout(&self) -> Option<Duration> {
        self.confirm_timeout_secs.map(Duration::from_secs)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub debug: bool,
    pub trace: bool,
    pub record_log: bool,
    pub logging_dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            debug: false,
            trace: false,
            record_log: false,
            logging_dir: "~/.conflux-gov/logs".to_string(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub ledger: LedgerConfig,
    pub polling: PollingConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Create config for a named network
    pub fn for_network(network: &str) -> Self {
        Self {
            ledger: LedgerConfig {
                network: network.to_string(),
                rpc_endpoint: get_network_endpoint(network).to_string(),
                network_id: get_network_id(network),
                default_contract_address: None,
            },
            ..Default::default()
        }
    }

    /// Set network by name
    pub fn with_network(mut self, network: &str) -> Self {
        self.ledger.network = network.to_string();
        self.ledger.rpc_endpoint = get_network_endpoint(network).to_string();
        self.ledger.network_id = get_network_id(network);
        self
    }

    /// Set RPC endpoint directly
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.ledger.rpc_endpoint = endpoint.to_string();
        self
    }

    /// Set default contract address
    pub fn with_contract_address(mut self, address: impl Into<String>) -> Self {
        self.ledger.default_contract_address = Some(address.into());
        self
    }

    /// Set the receipt polling interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.polling.interval_ms = interval.as_millis() as u64;
        self
    }

    /// Set or disable the confirmation deadline
    pub fn with_confirm_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.polling.confirm_timeout_secs = timeout.map(|t| t.as_secs());
        self
    }

    /// Set debug mode
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.logging.debug = debug;
        self
    }

    /// Load config from environment variables
    ///
    /// Recognized variables: `GOV_NETWORK`, `GOV_RPC_URL`, `GOV_NETWORK_ID`,
    /// `GOV_CONTRACT_ADDRESS`, `GOV_DEBUG`.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(network) = std::env::var("GOV_NETWORK") {
            config.ledger.rpc_endpoint = get_network_endpoint(&network).to_string();
            config.ledger.network_id = get_network_id(&network);
            config.ledger.network = network;
        }

        if let Ok(endpoint) = std::env::var("GOV_RPC_URL") {
            config.ledger.rpc_endpoint = endpoint;
        }

        if let Ok(id) = std::env::var("GOV_NETWORK_ID") {
            if let Ok(id) = id.parse() {
                config.ledger.network_id = id;
            }
        }

        if let Ok(address) = std::env::var("GOV_CONTRACT_ADDRESS") {
            if !address.trim().is_empty() {
                config.ledger.default_contract_address = Some(address.trim().to_string());
            }
        }

        if std::env::var("GOV_DEBUG").is_ok() {
            config.logging.debug = true;
        }

        config
    }
}
