//! Typed configuration for the options table in spec.md §6, loaded from a
//! TOML file with an environment-variable overlay (`RANGECHAIN_*`), in the
//! manner of the teacher's `strata-config` crate: plain serde structs, no
//! macro-driven config DSL.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid environment override {key}={value}: {reason}")]
    InvalidOverride {
        key: String,
        value: String,
        reason: String,
    },
}

/// The options table from spec.md §6.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Enables debug channels matching a filter string (a `tracing`
    /// `EnvFilter` directive, e.g. `"rangechain=debug"`).
    pub debug: Option<String>,

    /// Plug-in implementation selector for the anchor-chain client.
    pub eth_provider: Option<String>,

    /// Plug-in implementation selector for the operator client.
    pub operator_provider: Option<String>,

    /// Plug-in implementation selector for the wallet signer.
    pub wallet_provider: Option<String>,

    /// Blocks subtracted from anchor head before events are considered
    /// final.
    pub finality_depth: u64,

    /// Anchor event polling period, in milliseconds.
    pub event_poll_interval_ms: u64,

    /// Operator sync polling period, in milliseconds. Each pass also pings
    /// the operator and skips if it is offline (spec.md §4.G step 1).
    pub transaction_poll_interval_ms: u64,

    /// Anchor-chain registry contract address (hex, `0x`-prefixed).
    pub registry_address: Option<String>,

    /// Identifier resolved via the registry to a chain-contract address
    /// and operator endpoint.
    pub plasma_chain_name: Option<String>,

    /// Anchor JSON-RPC endpoint.
    pub ethereum_endpoint: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: None,
            eth_provider: None,
            operator_provider: None,
            wallet_provider: None,
            finality_depth: 12,
            event_poll_interval_ms: 15_000,
            transaction_poll_interval_ms: 15_000,
            registry_address: None,
            plasma_chain_name: None,
            ethereum_endpoint: "http://localhost:8545".to_string(),
        }
    }
}

impl Config {
    pub fn event_poll_interval(&self) -> Duration {
        Duration::from_millis(self.event_poll_interval_ms)
    }

    pub fn transaction_poll_interval(&self) -> Duration {
        Duration::from_millis(self.transaction_poll_interval_ms)
    }

    /// Loads defaults, then a TOML file if present, then an environment
    /// overlay (`RANGECHAIN_*`, e.g. `RANGECHAIN_FINALITY_DEPTH`).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overlay(std::env::vars())?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Ok(toml::from_str(&raw)?)
    }

    /// Overlays recognised `RANGECHAIN_*` environment variables onto an
    /// already-loaded config. Unrecognised `RANGECHAIN_*` keys are ignored
    /// (forward-compatible with keys a newer binary added).
    pub fn apply_env_overlay(
        &mut self,
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Result<(), ConfigError> {
        const PREFIX: &str = "RANGECHAIN_";
        for (key, value) in vars {
            let Some(suffix) = key.strip_prefix(PREFIX) else {
                continue;
            };
            self.apply_one_override(suffix, &value)?;
        }
        Ok(())
    }

    fn apply_one_override(&mut self, suffix: &str, value: &str) -> Result<(), ConfigError> {
        let parse_u64 = |v: &str| -> Result<u64, ConfigError> {
            v.parse().map_err(|_| ConfigError::InvalidOverride {
                key: suffix.to_string(),
                value: v.to_string(),
                reason: "expected an integer".to_string(),
            })
        };

        match suffix {
            "DEBUG" => self.debug = Some(value.to_string()),
            "ETH_PROVIDER" => self.eth_provider = Some(value.to_string()),
            "OPERATOR_PROVIDER" => self.operator_provider = Some(value.to_string()),
            "WALLET_PROVIDER" => self.wallet_provider = Some(value.to_string()),
            "FINALITY_DEPTH" => self.finality_depth = parse_u64(value)?,
            "EVENT_POLL_INTERVAL_MS" => self.event_poll_interval_ms = parse_u64(value)?,
            "TRANSACTION_POLL_INTERVAL_MS" => self.transaction_poll_interval_ms = parse_u64(value)?,
            "REGISTRY_ADDRESS" => self.registry_address = Some(value.to_string()),
            "PLASMA_CHAIN_NAME" => self.plasma_chain_name = Some(value.to_string()),
            "ETHEREUM_ENDPOINT" => self.ethereum_endpoint = value.to_string(),
            // Unknown suffix: ignore rather than fail, so this overlay stays
            // forward-compatible with config keys introduced later.
            _ => {}
        }
        Ok(())
    }
}
