//! Configuration loading from the environment and an optional TOML file.

use alloy::primitives::Address;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::schema::CyclerConfig;
use crate::config::validation::{validate_config, ValidationError, ValidationWarning};

/// JSON-RPC endpoint of the target chain.
pub const RPC_URL_ENV_VAR: &str = "TAIKO_RPC_URL";
/// Hex-encoded signing key.
pub const PRIVATE_KEY_ENV_VAR: &str = crate::blockchain::wallet::PRIVATE_KEY_ENV_VAR;
/// ETH gateway contract address.
pub const CONTRACT_ADDRESS_ENV_VAR: &str = "CONTRACT_ADDRESS";
/// Lending pool contract address.
pub const LENDING_POOL_ENV_VAR: &str = "LENDING_POOL";
/// Optional path to a TOML file overriding the built-in tunables.
pub const CONFIG_PATH_ENV_VAR: &str = "POOL_CYCLER_CONFIG";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Environment variable {0} not set")]
    MissingVar(&'static str),

    #[error("Environment variable {var} is not a valid address: {reason}")]
    InvalidAddress { var: &'static str, reason: String },

    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Everything the cycler needs at startup, validated.
#[derive(Clone)]
pub struct Settings {
    /// Tunables with the environment's RPC URL merged in.
    pub config: CyclerConfig,
    /// Hex-encoded private key. Never logged.
    pub private_key: String,
    /// ETH gateway contract.
    pub gateway: Address,
    /// Lending pool passed to every gateway call.
    pub lending_pool: Address,
    /// Non-fatal findings from validation.
    pub warnings: Vec<ValidationWarning>,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("config", &self.config)
            .field("private_key", &"<redacted>")
            .field("gateway", &self.gateway)
            .field("lending_pool", &self.lending_pool)
            .field("warnings", &self.warnings)
            .finish()
    }
}

/// Load tunables from a TOML file. Missing keys keep their defaults.
pub fn load_config(path: &Path) -> Result<CyclerConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: CyclerConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Load settings from the process environment, reading `.env` first if present.
pub fn load_settings_from_env() -> Result<Settings, ConfigError> {
    if let Ok(path) = dotenv::dotenv() {
        tracing::debug!(path = %path.display(), "Loaded .env file");
    }
    load_settings(|key| std::env::var(key).ok())
}

/// Load and validate settings from an environment lookup.
pub fn load_settings<F>(lookup: F) -> Result<Settings, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let required = |var: &'static str| -> Result<String, ConfigError> {
        lookup(var)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingVar(var))
    };

    let rpc_url = required(RPC_URL_ENV_VAR)?;
    let private_key = required(PRIVATE_KEY_ENV_VAR)?;
    let gateway = parse_address(CONTRACT_ADDRESS_ENV_VAR, &required(CONTRACT_ADDRESS_ENV_VAR)?)?;
    let lending_pool = parse_address(LENDING_POOL_ENV_VAR, &required(LENDING_POOL_ENV_VAR)?)?;

    let mut config = match lookup(CONFIG_PATH_ENV_VAR).filter(|p| !p.trim().is_empty()) {
        Some(path) => load_config(Path::new(path.trim()))?,
        None => CyclerConfig::default(),
    };
    config.chain.rpc_url = rpc_url;

    let warnings = validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(Settings {
        config,
        private_key,
        gateway,
        lending_pool,
        warnings,
    })
}

fn parse_address(var: &'static str, value: &str) -> Result<Address, ConfigError> {
    value.parse::<Address>().map_err(|e| ConfigError::InvalidAddress {
        var,
        reason: e.to_string(),
    })
}
