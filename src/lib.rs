//! maxprocs - parallelism from cgroup CPU quotas.
//!
//! Finds the cgroups of the current process, reads their CPU bandwidth
//! limits and turns them into a worker count for the host runtime.
//!
//! # Features
//!
//! - **cgroup v2**: `cpu.max` in the unified hierarchy
//! - **cgroup v1**: `cpu.cfs_quota_us` / `cpu.cfs_period_us`, resolved
//!   through mountinfo so bind-mounted container hierarchies work
//! - **Override**: an explicitly configured environment variable always wins
//! - **Reversible**: [`set`] returns an [`Undo`] guard
//! - **One call**: [`auto`] applies the quota with a floor of 2 and keeps it
//!
//! On platforms other than Linux the quota is always undefined.
//!
//! # Example
//!
//! ```rust,ignore
//! let (undo, result) = maxprocs::set(maxprocs::Options::new().tracing_logger());
//! if let Err(e) = result {
//!     tracing::warn!("Failed to read CPU quota: {}", e);
//! }
//! undo.keep();
//!
//! let runtime = tokio::runtime::Builder::new_multi_thread()
//!     .worker_threads(maxprocs::current())
//!     .build()?;
//! ```

/// Package version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cgroups;
pub mod config;
pub mod logging;
pub mod maxprocs;
pub mod runtime;

// Re-exports for convenience
pub use crate::maxprocs::{apply, auto, current, set, Applied, Error, Options, ParallelismKnob, Undo};
pub use config::Config;
pub use runtime::{cpu_quota_to_parallelism, CpuQuotaStatus, AUTO_MIN_PARALLELISM, MIN_PARALLELISM};
