//! Parallelism configuration.

use super::parse::{env_opt, parse_or};
use super::ConfigError;
use crate::maxprocs::DEFAULT_KNOB_NAME;
use crate::runtime::MIN_PARALLELISM;

/// Parallelism configuration loaded from environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcsConfig {
    /// Floor for the computed parallelism (MAXPROCS_MIN).
    pub min: i32,
    /// Override variable honoured instead of cgroups (MAXPROCS_ENV_KEY).
    pub env_key: String,
}

impl ProcsConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::resolve(env_opt("MAXPROCS_MIN"), env_opt("MAXPROCS_ENV_KEY"))
    }

    fn resolve(min: Option<String>, env_key: Option<String>) -> Result<Self, ConfigError> {
        let min = parse_or("MAXPROCS_MIN", min, MIN_PARALLELISM)?;
        if min <= 0 {
            return Err(ConfigError::Invalid {
                key: "MAXPROCS_MIN".into(),
                message: "minimum must be positive".into(),
            });
        }

        Ok(Self {
            min,
            env_key: env_key.unwrap_or_else(|| DEFAULT_KNOB_NAME.to_string()),
        })
    }
}

impl Default for ProcsConfig {
    fn default() -> Self {
        Self {
            min: MIN_PARALLELISM,
            env_key: DEFAULT_KNOB_NAME.to_string(),
        }
    }
}
