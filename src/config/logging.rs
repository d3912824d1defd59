//! Logging configuration.

use super::parse::env_opt;
use super::ConfigError;

/// Output format of the log subscriber.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration loaded from environment.
#[derive(Clone, Debug)]
pub struct LoggingConfig {
    /// Log level filter (from LOG_LEVEL or RUST_LOG).
    pub filter: String,
    /// Output format (from LOG_FORMAT).
    pub format: LogFormat,
}

impl LoggingConfig {
    /// Load configuration from environment variables.
    ///
    /// LOG_LEVEL accepts simple values: trace, debug, info, warn, error
    /// RUST_LOG accepts full tracing filter syntax: maxprocs=debug
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            filter: Self::resolve_log_filter(env_opt("LOG_LEVEL"), env_opt("RUST_LOG")),
            format: Self::resolve_format(env_opt("LOG_FORMAT"))?,
        })
    }

    /// Priority: LOG_LEVEL > RUST_LOG > default (info)
    fn resolve_log_filter(log_level: Option<String>, rust_log: Option<String>) -> String {
        if let Some(level) = log_level {
            let level = level.to_lowercase();
            match level.as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => {
                    return format!("maxprocs={}", level);
                }
                _ => {
                    // Invalid level, fall through to RUST_LOG
                    eprintln!(
                        "Warning: Invalid LOG_LEVEL '{}', expected: trace, debug, info, warn, error",
                        level
                    );
                }
            }
        }

        rust_log.unwrap_or_else(|| "maxprocs=info".to_string())
    }

    fn resolve_format(raw: Option<String>) -> Result<LogFormat, ConfigError> {
        match raw.as_deref().map(str::to_lowercase).as_deref() {
            None | Some("text") => Ok(LogFormat::Text),
            Some("json") => Ok(LogFormat::Json),
            Some(other) => Err(ConfigError::Invalid {
                key: "LOG_FORMAT".into(),
                message: format!("expected text or json, got '{}'", other),
            }),
        }
    }
}
