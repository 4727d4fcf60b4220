//! Environment-based Configuration for the Staking Core
//!
//! Node-level settings come from environment variables. The stake catalog can
//! optionally be replaced by a TOML file at startup.
//!
//! # Environment Variables
//!
//! - `GBTC_NETWORK` - "mainnet", "testnet", or "devnet" (default: "devnet")
//! - `GBTC_GENESIS_CHALLENGE` - 32-byte hex genesis challenge (required except on devnet)
//! - `GBTC_DB_PATH` - stake record database (default: "./data/stake_record.sqlite")
//! - `GBTC_CACHE_CAPACITY` - entries per query cache (default: 104)
//! - `GBTC_CATALOG_PATH` - optional TOML stake catalog
//! - `GBTC_LOG_LEVEL` - Logging level (debug, info, warn, error)

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

use crate::catalog::{CatalogError, StakeCatalog};
use crate::storage::DEFAULT_CACHE_CAPACITY;
use crate::types::Bytes32;

pub const DEFAULT_DB_PATH: &str = "./data/stake_record.sqlite";

/// Genesis challenge used when devnet runs without one configured
const DEVNET_GENESIS_CHALLENGE: &str =
    "d0cae5e5b1a0e6ab5e8fa1a6cb2ae9f4fd3f0e9d1c0b3a2a9a8f7e6d5c4b3a29";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("network mismatch: expected {0}, got {1}")]
    NetworkMismatch(String, String),
}

/// Network environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Testnet,
    Devnet,
}

impl FromStr for Network {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainnet" | "main" => Ok(Network::Mainnet),
            "testnet" | "test" => Ok(Network::Testnet),
            "devnet" | "dev" => Ok(Network::Devnet),
            _ => Err(ConfigError::InvalidValue(
                "GBTC_NETWORK".to_string(),
                format!("unknown network: {}", s),
            )),
        }
    }
}

/// Main configuration struct
#[derive(Debug, Clone)]
pub struct StakeConfig {
    pub network: Network,

    /// Consensus genesis challenge, source of reward coin parent ids
    pub genesis_challenge: Bytes32,

    /// Stake record database path
    pub db_path: PathBuf,

    /// Entries per query cache
    pub cache_capacity: usize,

    /// Optional TOML catalog replacing the built-in tiers
    pub catalog_path: Option<PathBuf>,

    pub log_level: String,
}

impl StakeConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let network: Network = env::var("GBTC_NETWORK")
            .unwrap_or_else(|_| "devnet".to_string())
            .parse()?;

        let genesis_challenge = get_required_or_devnet_default(
            "GBTC_GENESIS_CHALLENGE",
            DEVNET_GENESIS_CHALLENGE,
            network,
        )?
        .parse::<Bytes32>()
        .map_err(|e| ConfigError::InvalidValue("GBTC_GENESIS_CHALLENGE".to_string(), e))?;

        let db_path = env::var("GBTC_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DB_PATH));

        let cache_capacity = match env::var("GBTC_CACHE_CAPACITY") {
            Ok(value) => value.parse::<usize>().ok().filter(|c| *c > 0).ok_or_else(|| {
                ConfigError::InvalidValue(
                    "GBTC_CACHE_CAPACITY".to_string(),
                    "must be a positive integer".to_string(),
                )
            })?,
            Err(_) => DEFAULT_CACHE_CAPACITY,
        };

        let catalog_path = env::var("GBTC_CATALOG_PATH").ok().map(PathBuf::from);

        let log_level = env::var("GBTC_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            network,
            genesis_challenge,
            db_path,
            cache_capacity,
            catalog_path,
            log_level,
        })
    }

    /// Built-in catalog, or the configured TOML file
    pub fn load_catalog(&self) -> Result<StakeCatalog, CatalogError> {
        match &self.catalog_path {
            Some(path) => StakeCatalog::from_file(path),
            None => Ok(StakeCatalog::default()),
        }
    }

    /// Validate configuration for production readiness
    pub fn validate_for_production(&self) -> Result<(), ConfigError> {
        if self.network != Network::Mainnet {
            return Err(ConfigError::NetworkMismatch(
                "mainnet".to_string(),
                format!("{:?}", self.network),
            ));
        }

        if self.genesis_challenge.to_hex() == DEVNET_GENESIS_CHALLENGE {
            return Err(ConfigError::InvalidValue(
                "GBTC_GENESIS_CHALLENGE".to_string(),
                "devnet challenge not allowed on mainnet".to_string(),
            ));
        }

        // Consensus must not depend on a node-local catalog file
        if self.catalog_path.is_some() {
            return Err(ConfigError::InvalidValue(
                "GBTC_CATALOG_PATH".to_string(),
                "custom catalogs are not allowed on mainnet".to_string(),
            ));
        }

        Ok(())
    }
}

/// Get required env var, or use default for devnet only
fn get_required_or_devnet_default(
    var_name: &str,
    devnet_default: &str,
    network: Network,
) -> Result<String, ConfigError> {
    match env::var(var_name) {
        Ok(value) => Ok(value),
        Err(_) => {
            if network == Network::Devnet {
                Ok(devnet_default.to_string())
            } else {
                Err(ConfigError::MissingEnvVar(var_name.to_string()))
            }
        }
    }
}
