use std::sync::{Arc, OnceLock};

use serde::Serialize;
use tracing::{info, warn};

use maxprocs::config::Config;
use maxprocs::runtime::{self, CgroupVersion, CpuQuotaStatus, ProcPaths};
use maxprocs::{logging, Applied, Options};

/// Printed to stdout as JSON.
#[derive(Serialize)]
struct Report {
    /// Parallelism in effect after applying the quota.
    procs: usize,
    /// Quota status acted on; null when the override won or on error.
    status: Option<CpuQuotaStatus>,
    version: CgroupVersion,
    /// Set when the override variable short-circuited cgroup inspection.
    #[serde(skip_serializing_if = "Option::is_none")]
    env_override: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = Config::from_env()?;
    logging::init(&config.logging);
    config.log_summary();

    info!("maxprocs {}", maxprocs::VERSION);

    let paths = ProcPaths::default();
    let seen_version = Arc::new(OnceLock::new());

    let options = {
        let paths = paths.clone();
        let seen_version = seen_version.clone();
        Options::from_config(&config)
            .tracing_logger()
            .procs(move |min| {
                let (procs, status, version) = runtime::quota_with_version_at(&paths, min)?;
                let _ = seen_version.set(version);
                Ok((procs, status))
            })
    };

    let (undo, result) = maxprocs::apply(options);
    undo.keep();

    let mut report = Report {
        procs: maxprocs::current(),
        status: None,
        version: CgroupVersion::None,
        env_override: None,
        error: None,
    };

    match result {
        Ok(Applied::EnvOverride { value, .. }) => report.env_override = Some(value),
        Ok(Applied::Quota { status, .. }) => report.status = Some(status),
        Err(e) => {
            warn!("Failed to apply CPU quota: {}", e);
            report.error = Some(e.to_string());
        }
    }

    // Cgroups were only read when the quota was computed successfully.
    report.version = match seen_version.get() {
        Some(version) => *version,
        None => runtime::detect_version(&paths).unwrap_or_else(|e| {
            warn!("Failed to detect cgroup version: {}", e);
            CgroupVersion::None
        }),
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
