//! cgroup v1: one hierarchy per controller set.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, trace};

use super::cgroup::CGroup;
use super::error::CgroupError;
use super::mountpoint::parse_mount_info;
use super::subsys::parse_cgroup_subsystems;
use super::{
    CGROUP_CPU_CFS_PERIOD_US_PARAM, CGROUP_CPU_CFS_QUOTA_US_PARAM, CGROUP_FS_TYPE,
    CGROUP_SUBSYS_CPU, PROC_PATH_CGROUP, PROC_PATH_MOUNT_INFO,
};

/// Controller name to cgroup directory, e.g. `cpu` to
/// `/sys/fs/cgroup/cpu,cpuacct/docker/abc`.
#[derive(Debug, Clone, Default)]
pub struct CGroups {
    groups: HashMap<String, CGroup>,
}

impl CGroups {
    /// Resolve every v1 controller of a process from its mountinfo and
    /// cgroup files.
    pub fn new<P, Q>(proc_path_mount_info: P, proc_path_cgroup: Q) -> Result<Self, CgroupError>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let subsystems = parse_cgroup_subsystems(proc_path_cgroup)?;
        let mut groups = HashMap::new();

        parse_mount_info(proc_path_mount_info, |mp| {
            if mp.fs_type != CGROUP_FS_TYPE {
                return Ok(());
            }

            for opt in &mp.super_options {
                let Some(subsys) = subsystems.get(opt) else {
                    continue;
                };

                let cgroup_path = mp.translate(&subsys.name)?;
                trace!("cgroup v1 {}: {}", opt, cgroup_path);
                groups.insert(opt.clone(), CGroup::new(cgroup_path));
            }

            Ok(())
        })?;

        debug!("Resolved {} cgroup v1 controllers", groups.len());
        Ok(Self { groups })
    }

    /// Resolve the controllers of the current process.
    pub fn for_current_process() -> Result<Self, CgroupError> {
        Self::new(PROC_PATH_MOUNT_INFO, PROC_PATH_CGROUP)
    }

    pub fn get(&self, subsys: &str) -> Option<&CGroup> {
        self.groups.get(subsys)
    }

    #[cfg(test)]
    pub(crate) fn insert(&mut self, subsys: impl Into<String>, cgroup: CGroup) {
        self.groups.insert(subsys.into(), cgroup);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CGroup)> {
        self.groups.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// CFS quota divided by CFS period for the `cpu` controller.
    ///
    /// `Ok(None)` when there is no `cpu` controller or the quota is not
    /// positive (`-1` means unlimited). A period that is not positive is an
    /// error.
    pub fn cpu_quota(&self) -> Result<Option<f64>, CgroupError> {
        let Some(cpu) = self.groups.get(CGROUP_SUBSYS_CPU) else {
            return Ok(None);
        };

        let quota = cpu.read_int(CGROUP_CPU_CFS_QUOTA_US_PARAM)?;
        if quota <= 0 {
            return Ok(None);
        }

        let period = cpu.read_int(CGROUP_CPU_CFS_PERIOD_US_PARAM)?;
        if period <= 0 {
            return Err(CgroupError::ZeroPeriod {
                path: cpu.param_path(CGROUP_CPU_CFS_PERIOD_US_PARAM),
            });
        }

        trace!("cgroup v1 cpu quota: {}/{}", quota, period);
        Ok(Some(quota as f64 / period as f64))
    }
}
