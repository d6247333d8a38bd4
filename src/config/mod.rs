//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! .env / process environment (RPC URL, key, addresses)
//!     + optional TOML overlay (POOL_CYCLER_CONFIG)
//!     → loader.rs (read & deserialize, env wins for the endpoint)
//!     → validation.rs (semantic checks, warnings)
//!     → Settings (validated, immutable for the process lifetime)
//! ```
//!
//! # Design Decisions
//! - All tunables have defaults; the TOML file is optional
//! - Secrets come only from the environment
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_settings, load_settings_from_env, ConfigError, Settings};
pub use schema::{CampaignConfig, ChainConfig, CyclerConfig, FeeConfig, ObservabilityConfig};
pub use validation::{ValidationError, ValidationWarning};
