//! cgroup v2: the unified hierarchy.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use super::cgroup::read_first_line;
use super::error::CgroupError;
use super::mountpoint::parse_mount_info;
use super::subsys::parse_cgroup_subsystems;
use super::{
    CGROUP_V2_CPU_MAX, CGROUP_V2_CPU_MAX_DEFAULT_PERIOD, CGROUP_V2_CPU_MAX_QUOTA_MAX,
    CGROUP_V2_FS_TYPE, CGROUP_V2_MOUNT_POINT, PROC_PATH_CGROUP, PROC_PATH_MOUNT_INFO,
};

/// Hierarchy id the kernel reports for the unified hierarchy.
const CGROUP_V2_HIERARCHY_ID: i64 = 0;

/// Check whether the current process sees the unified hierarchy mounted
/// at `/sys/fs/cgroup`.
pub fn is_cgroup_v2() -> Result<bool, CgroupError> {
    is_cgroup_v2_at(PROC_PATH_MOUNT_INFO, CGROUP_V2_MOUNT_POINT)
}

/// Check whether `proc_path_mount_info` lists a `cgroup2` mount at
/// `mount_point`. A hybrid layout with `cgroup2` elsewhere does not count.
pub fn is_cgroup_v2_at<P, M>(proc_path_mount_info: P, mount_point: M) -> Result<bool, CgroupError>
where
    P: AsRef<Path>,
    M: AsRef<Path>,
{
    let mount_point = mount_point.as_ref();
    let mut is_v2 = false;

    parse_mount_info(proc_path_mount_info, |mp| {
        if mp.fs_type == CGROUP_V2_FS_TYPE && Path::new(&mp.mount_point) == mount_point {
            is_v2 = true;
        }
        Ok(())
    })?;

    Ok(is_v2)
}

/// The process's group in the unified hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CGroups2 {
    mount_point: PathBuf,
    group_path: String,
    cpu_max_file: String,
}

impl CGroups2 {
    /// Locate the current process in the unified hierarchy.
    ///
    /// Fails with [`CgroupError::NotV2`] when `/sys/fs/cgroup` is not a
    /// `cgroup2` mount or the cgroup file has no unified entry.
    pub fn for_current_process() -> Result<Self, CgroupError> {
        Self::new(PROC_PATH_MOUNT_INFO, PROC_PATH_CGROUP, CGROUP_V2_MOUNT_POINT)
    }

    pub fn new<P, Q, M>(
        proc_path_mount_info: P,
        proc_path_cgroup: Q,
        mount_point: M,
    ) -> Result<Self, CgroupError>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
        M: AsRef<Path>,
    {
        let mount_point = mount_point.as_ref();
        if !is_cgroup_v2_at(proc_path_mount_info, mount_point)? {
            return Err(CgroupError::NotV2);
        }

        let subsystems = parse_cgroup_subsystems(proc_path_cgroup)?;
        let group_path = subsystems
            .values()
            .find(|subsys| subsys.id == CGROUP_V2_HIERARCHY_ID)
            .map(|subsys| subsys.name.clone())
            .ok_or(CgroupError::NotV2)?;

        debug!(
            "Detected cgroup v2 (unified hierarchy) at {}, group {}",
            mount_point.display(),
            group_path
        );

        Ok(Self {
            mount_point: mount_point.to_path_buf(),
            group_path,
            cpu_max_file: CGROUP_V2_CPU_MAX.to_string(),
        })
    }

    pub fn mount_point(&self) -> &Path {
        &self.mount_point
    }

    /// Path of the group relative to the hierarchy root, e.g. `/` or
    /// `/system.slice/app.service`.
    pub fn group_path(&self) -> &str {
        &self.group_path
    }

    pub fn cpu_max_path(&self) -> PathBuf {
        let mut path = self.mount_point.clone();
        for segment in self.group_path.split('/').filter(|s| !s.is_empty()) {
            path.push(segment);
        }
        path.push(&self.cpu_max_file);
        path
    }

    /// Quota divided by period from `cpu.max`.
    ///
    /// `Ok(None)` when the file is absent or the quota is `max`.
    pub fn cpu_quota(&self) -> Result<Option<f64>, CgroupError> {
        let path = self.cpu_max_path();
        let line = match read_first_line(&path) {
            Ok(line) => line,
            Err(CgroupError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                return Ok(None)
            }
            Err(e) => return Err(e),
        };

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() || fields.len() > 2 {
            return Err(CgroupError::InvalidFormat { path });
        }

        if fields[0] == CGROUP_V2_CPU_MAX_QUOTA_MAX {
            return Ok(None);
        }

        let max: i64 = fields[0]
            .parse()
            .map_err(|e| CgroupError::parse_int(fields[0], e))?;

        let period: i64 = match fields.get(1) {
            Some(period) => period
                .parse()
                .map_err(|e| CgroupError::parse_int(period, e))?,
            None => CGROUP_V2_CPU_MAX_DEFAULT_PERIOD,
        };

        if period == 0 {
            return Err(CgroupError::ZeroPeriod { path });
        }

        trace!("cgroup v2 cpu.max: {}/{}", max, period);
        Ok(Some(max as f64 / period as f64))
    }
}
