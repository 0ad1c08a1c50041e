use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::amount::Amount;
use crate::token::DEFAULT_READ_TIMEOUT;
use crate::transfer::settings::{
    DEFAULT_CONFIRMATION_TIMEOUT, DEFAULT_POLL_INTERVAL, DEFAULT_RPC_TIMEOUT, GasLimit,
    TransferSettings,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config yaml: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub chain: ChainConfig,
    pub token: TokenConfig,
    #[serde(default)]
    pub transfer: TransferConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChainConfig {
    pub rpc_url: String,
    /// HTTP-level timeout for a single JSON-RPC request
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TokenConfig {
    pub address: Address,
    /// JSON ABI file; the bundled ERC20 interface is used when absent
    #[serde(default)]
    pub abi_path: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct TransferConfig {
    pub gas_limit: GasLimit,
    pub read_timeout_ms: u64,
    pub rpc_timeout_ms: u64,
    pub confirmation_timeout_ms: u64,
    pub poll_interval_ms: u64,
    /// Requests above this amount are lowered to it
    pub max_amount: Option<Amount>,
    /// Environment variable holding the sender's hex private key
    pub private_key_env: String,
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            gas_limit: GasLimit::default(),
            read_timeout_ms: DEFAULT_READ_TIMEOUT.as_millis() as u64,
            rpc_timeout_ms: DEFAULT_RPC_TIMEOUT.as_millis() as u64,
            confirmation_timeout_ms: DEFAULT_CONFIRMATION_TIMEOUT.as_millis() as u64,
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            max_amount: None,
            private_key_env: "TRANSFER_PRIVATE_KEY".to_string(),
        }
    }
}

impl TransferConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn settings(&self) -> TransferSettings {
        TransferSettings {
            gas_limit: self.gas_limit,
            rpc_timeout: Duration::from_millis(self.rpc_timeout_ms),
            confirmation_timeout: Duration::from_millis(self.confirmation_timeout_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }
}

impl ChainConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl AppConfig {
    /// Load `config/{env}.yaml`
    pub fn load(env: &str) -> Result<Self, ConfigError> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path).map_err(|source| ConfigError::Io {
            path: config_path.clone(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.chain.rpc_url.trim().is_empty() {
            return Err(ConfigError::Invalid("chain.rpc_url is empty".to_string()));
        }
        let t = &self.transfer;
        for (name, value) in [
            ("read_timeout_ms", t.read_timeout_ms),
            ("rpc_timeout_ms", t.rpc_timeout_ms),
            ("confirmation_timeout_ms", t.confirmation_timeout_ms),
            ("poll_interval_ms", t.poll_interval_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid(format!(
                    "transfer.{} must be greater than zero",
                    name
                )));
            }
        }
        if t.max_amount.as_ref().is_some_and(Amount::is_zero) {
            return Err(ConfigError::Invalid(
                "transfer.max_amount must be greater than zero".to_string(),
            ));
        }
        if t.poll_interval_ms > t.confirmation_timeout_ms {
            return Err(ConfigError::Invalid(
                "transfer.poll_interval_ms exceeds confirmation_timeout_ms".to_string(),
            ));
        }
        Ok(())
    }
}
