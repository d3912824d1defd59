//! Cgroup discovery for the current process.
//!
//! Locates the process's cgroups from `/proc/self/mountinfo` and
//! `/proc/self/cgroup` and reads CPU bandwidth parameters from them.
//!
//! # Cgroup Support
//!
//! - **cgroup v2**: unified hierarchy mounted at `/sys/fs/cgroup`, quota in `cpu.max`
//! - **cgroup v1**: per-controller hierarchies, quota in `cpu.cfs_quota_us` / `cpu.cfs_period_us`
//!
//! # Example
//!
//! ```rust,ignore
//! use maxprocs::cgroups::{CGroups, CGroups2};
//!
//! let quota = match CGroups2::for_current_process() {
//!     Ok(v2) => v2.cpu_quota()?,
//!     Err(e) if e.is_not_v2() => CGroups::for_current_process()?.cpu_quota()?,
//!     Err(e) => return Err(e),
//! };
//! ```

mod cgroup;
mod error;
mod mountpoint;
mod subsys;
mod v1;
mod v2;

pub use cgroup::CGroup;
pub use error::CgroupError;
pub use mountpoint::{parse_mount_info, MountPoint};
pub use subsys::{parse_cgroup_subsystems, CgroupSubsys};
pub use v1::CGroups;
pub use v2::{is_cgroup_v2, is_cgroup_v2_at, CGroups2};

/// Mount table of the current process.
pub const PROC_PATH_MOUNT_INFO: &str = "/proc/self/mountinfo";
/// Cgroup membership of the current process.
pub const PROC_PATH_CGROUP: &str = "/proc/self/cgroup";

/// Filesystem type of a v1 hierarchy in mountinfo.
pub const CGROUP_FS_TYPE: &str = "cgroup";
/// Filesystem type of the unified hierarchy in mountinfo.
pub const CGROUP_V2_FS_TYPE: &str = "cgroup2";
/// Where the unified hierarchy must be mounted to be used.
pub const CGROUP_V2_MOUNT_POINT: &str = "/sys/fs/cgroup";

pub const CGROUP_SUBSYS_CPU: &str = "cpu";
pub const CGROUP_SUBSYS_CPU_ACCT: &str = "cpuacct";
pub const CGROUP_SUBSYS_CPU_SET: &str = "cpuset";
pub const CGROUP_SUBSYS_MEMORY: &str = "memory";

pub const CGROUP_CPU_CFS_QUOTA_US_PARAM: &str = "cpu.cfs_quota_us";
pub const CGROUP_CPU_CFS_PERIOD_US_PARAM: &str = "cpu.cfs_period_us";

pub const CGROUP_V2_CPU_MAX: &str = "cpu.max";
/// Period assumed when `cpu.max` carries only a quota.
pub const CGROUP_V2_CPU_MAX_DEFAULT_PERIOD: i64 = 100_000;
pub const CGROUP_V2_CPU_MAX_QUOTA_MAX: &str = "max";
