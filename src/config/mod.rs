//! Configuration loading from environment variables.
//!
//! # Example
//!
//! ```rust,ignore
//! use maxprocs::config::Config;
//!
//! let config = Config::from_env()?;
//! println!("Floor: {}", config.procs.min);
//! ```

mod error;
mod logging;
mod parse;
mod procs;

pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use procs::ProcsConfig;

/// Complete application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Parallelism configuration.
    pub procs: ProcsConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            procs: ProcsConfig::from_env()?,
            logging: LoggingConfig::from_env()?,
        })
    }

    /// Print configuration summary to log.
    pub fn log_summary(&self) {
        use tracing::info;

        info!("Configuration loaded:");
        info!("  Minimum parallelism: {}", self.procs.min);
        info!("  Override variable: {}", self.procs.env_key);
        info!("  Log filter: {}", self.logging.filter);
    }
}
