//! Conversion of the process's CPU quota into a parallelism count.
//!
//! On Linux the quota comes from cgroups (v2 first, then v1). On every
//! other platform the quota is always undefined.
//!
//! # Example
//!
//! - CPU quota 2.5 → 3
//! - CPU quota 0.5 with floor 2 → 2 (`MinUsed`)
//! - No quota → -1 (`Undefined`)

#[cfg(target_os = "linux")]
mod linux;
#[cfg(not(target_os = "linux"))]
mod unsupported;

#[cfg(target_os = "linux")]
pub use linux::{cpu_quota_to_parallelism_at, detect_version, quota_with_version_at, Queryer};
#[cfg(not(target_os = "linux"))]
pub use unsupported::{cpu_quota_to_parallelism_at, detect_version, quota_with_version_at};

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::cgroups::{CgroupError, CGROUP_V2_MOUNT_POINT, PROC_PATH_CGROUP, PROC_PATH_MOUNT_INFO};

/// Baseline floor for the computed parallelism.
pub const MIN_PARALLELISM: i32 = 1;

/// Floor used by [`auto`](crate::maxprocs::auto).
pub const AUTO_MIN_PARALLELISM: i32 = 2;

/// How the returned parallelism relates to the CPU quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CpuQuotaStatus {
    /// No quota applies; the returned count is -1.
    Undefined,
    /// The quota is used as-is.
    Used,
    /// The quota is below the floor, so the floor is used.
    MinUsed,
}

impl fmt::Display for CpuQuotaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => write!(f, "undefined"),
            Self::Used => write!(f, "used"),
            Self::MinUsed => write!(f, "min-used"),
        }
    }
}

/// Cgroup version backing the quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CgroupVersion {
    /// cgroup v2 (unified hierarchy)
    V2,
    /// cgroup v1 (legacy hierarchy)
    V1,
    /// No cgroup detected (bare metal or unsupported)
    None,
}

impl fmt::Display for CgroupVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V2 => write!(f, "v2"),
            Self::V1 => write!(f, "v1"),
            Self::None => write!(f, "none"),
        }
    }
}

/// Locations of the files cgroup discovery reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcPaths {
    pub mount_info: PathBuf,
    pub cgroup: PathBuf,
    /// Where a `cgroup2` mount must sit to be treated as the unified hierarchy.
    pub v2_mount_point: PathBuf,
}

impl ProcPaths {
    /// Paths for another process, read through `/proc/<pid>`.
    pub fn for_pid(pid: u32) -> Self {
        Self {
            mount_info: PathBuf::from(format!("/proc/{}/mountinfo", pid)),
            cgroup: PathBuf::from(format!("/proc/{}/cgroup", pid)),
            v2_mount_point: PathBuf::from(CGROUP_V2_MOUNT_POINT),
        }
    }
}

impl Default for ProcPaths {
    fn default() -> Self {
        Self {
            mount_info: PathBuf::from(PROC_PATH_MOUNT_INFO),
            cgroup: PathBuf::from(PROC_PATH_CGROUP),
            v2_mount_point: PathBuf::from(CGROUP_V2_MOUNT_POINT),
        }
    }
}

/// Compute the parallelism for the current process from its CPU quota.
///
/// Returns `(-1, Undefined)` when no quota applies. When `min_value > 0`
/// and the rounded-up quota is below it, returns `(min_value, MinUsed)`.
pub fn cpu_quota_to_parallelism(min_value: i32) -> Result<(i32, CpuQuotaStatus), CgroupError> {
    cpu_quota_to_parallelism_at(&ProcPaths::default(), min_value)
}

/// Round a quota ratio up to a whole count and apply the floor.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
pub(crate) fn quota_to_parallelism(quota: Option<f64>, min_value: i32) -> (i32, CpuQuotaStatus) {
    let Some(quota) = quota else {
        return (-1, CpuQuotaStatus::Undefined);
    };

    let procs = quota.ceil() as i32;
    if min_value > 0 && procs < min_value {
        return (min_value, CpuQuotaStatus::MinUsed);
    }
    (procs, CpuQuotaStatus::Used)
}
