//! Options accepted by [`set`](super::set).

use std::fmt;
use std::sync::Arc;

use tracing::info;

use super::error::Error;
use super::knob::{GlobalKnob, ParallelismKnob};
use crate::config::Config;
use crate::runtime::{cpu_quota_to_parallelism, CpuQuotaStatus, MIN_PARALLELISM};

/// printf-style log sink.
pub type LogFn = Arc<dyn Fn(fmt::Arguments<'_>) + Send + Sync>;

/// Quota computation: floor in, `(procs, status)` out.
pub type ProcsFn = Arc<dyn Fn(i32) -> Result<(i32, CpuQuotaStatus), Error> + Send + Sync>;

/// Configuration for [`set`](super::set).
///
/// ```rust,ignore
/// let (undo, result) = maxprocs::set(Options::new().tracing_logger().min(2));
/// ```
#[derive(Clone)]
pub struct Options {
    pub(crate) log: Option<LogFn>,
    pub(crate) min: i32,
    pub(crate) env_key: Option<String>,
    pub(crate) knob: Arc<dyn ParallelismKnob>,
    pub(crate) procs: ProcsFn,
}

impl Options {
    pub fn new() -> Self {
        Self {
            log: None,
            min: MIN_PARALLELISM,
            env_key: None,
            knob: Arc::new(GlobalKnob),
            procs: Arc::new(|min| cpu_quota_to_parallelism(min).map_err(Error::from)),
        }
    }

    /// Build options from environment configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new()
            .min(config.procs.min)
            .env_key(config.procs.env_key.clone())
    }

    /// Install a printf-style log sink. Without one, `set` is silent.
    pub fn logger<F>(mut self, log: F) -> Self
    where
        F: Fn(fmt::Arguments<'_>) + Send + Sync + 'static,
    {
        self.log = Some(Arc::new(log));
        self
    }

    /// Route log lines to `tracing` at info level.
    pub fn tracing_logger(self) -> Self {
        self.logger(|args| info!("{}", args))
    }

    /// Floor for the computed parallelism. Values `<= 0` are ignored.
    pub fn min(mut self, min: i32) -> Self {
        if min > 0 {
            self.min = min;
        }
        self
    }

    /// Environment variable that, when set, disables cgroup inspection.
    /// Defaults to the knob's name.
    pub fn env_key(mut self, key: impl Into<String>) -> Self {
        self.env_key = Some(key.into());
        self
    }

    /// Knob to adjust instead of the process-wide [`GlobalKnob`].
    pub fn knob(mut self, knob: Arc<dyn ParallelismKnob>) -> Self {
        self.knob = knob;
        self
    }

    /// Replace the quota computation.
    pub fn procs<F>(mut self, procs: F) -> Self
    where
        F: Fn(i32) -> Result<(i32, CpuQuotaStatus), Error> + Send + Sync + 'static,
    {
        self.procs = Arc::new(procs);
        self
    }

    pub(crate) fn env_key_or_default(&self) -> &str {
        self.env_key.as_deref().unwrap_or_else(|| self.knob.name())
    }

    pub(crate) fn log(&self, args: fmt::Arguments<'_>) {
        if let Some(log) = &self.log {
            log(args);
        }
    }
}

impl Default for Options {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("log", &self.log.is_some())
            .field("min", &self.min)
            .field("env_key", &self.env_key_or_default())
            .field("knob", &self.knob.name())
            .finish()
    }
}
