//! Linux: quota from cgroup v2, falling back to cgroup v1.

use tracing::debug;

use super::{quota_to_parallelism, CgroupVersion, CpuQuotaStatus, ProcPaths};
use crate::cgroups::{CGroups, CGroups2, CgroupError};

/// The cgroup hierarchy a quota is read from.
#[derive(Debug, Clone)]
pub enum Queryer {
    V1(CGroups),
    V2(CGroups2),
}

impl Queryer {
    /// Pick the unified hierarchy when it is in use, otherwise v1.
    ///
    /// Only the "not v2" outcome falls through to v1; any other v2 failure
    /// is returned as-is.
    pub fn new(paths: &ProcPaths) -> Result<Self, CgroupError> {
        match CGroups2::new(&paths.mount_info, &paths.cgroup, &paths.v2_mount_point) {
            Ok(v2) => Ok(Self::V2(v2)),
            Err(e) if e.is_not_v2() => {
                debug!("cgroup v2 not in use, falling back to cgroup v1");
                CGroups::new(&paths.mount_info, &paths.cgroup).map(Self::V1)
            }
            Err(e) => Err(e),
        }
    }

    pub fn version(&self) -> CgroupVersion {
        match self {
            Self::V2(_) => CgroupVersion::V2,
            Self::V1(cgroups) if cgroups.is_empty() => CgroupVersion::None,
            Self::V1(_) => CgroupVersion::V1,
        }
    }

    /// CPU quota as a fraction of one CPU; `None` when unlimited.
    pub fn cpu_quota(&self) -> Result<Option<f64>, CgroupError> {
        match self {
            Self::V1(cgroups) => cgroups.cpu_quota(),
            Self::V2(cgroups) => cgroups.cpu_quota(),
        }
    }
}

/// Compute the parallelism from the cgroups described by `paths`.
pub fn cpu_quota_to_parallelism_at(
    paths: &ProcPaths,
    min_value: i32,
) -> Result<(i32, CpuQuotaStatus), CgroupError> {
    quota_with_version_at(paths, min_value).map(|(procs, status, _)| (procs, status))
}

/// Like [`cpu_quota_to_parallelism_at`], also reporting the cgroup version
/// the quota was read from. Discovery runs once.
pub fn quota_with_version_at(
    paths: &ProcPaths,
    min_value: i32,
) -> Result<(i32, CpuQuotaStatus, CgroupVersion), CgroupError> {
    let queryer = Queryer::new(paths)?;
    let version = queryer.version();
    let quota = queryer.cpu_quota()?;
    let (procs, status) = quota_to_parallelism(quota, min_value);
    debug!(
        "CPU quota {:?} from cgroup {}: {} ({})",
        quota, version, procs, status
    );
    Ok((procs, status, version))
}

/// Report which cgroup version applies to the process behind `paths`.
pub fn detect_version(paths: &ProcPaths) -> Result<CgroupVersion, CgroupError> {
    Queryer::new(paths).map(|q| q.version())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn proc_paths(dir: &Path, mount_info: &str, cgroup: &str) -> ProcPaths {
        let paths = ProcPaths {
            mount_info: dir.join("mountinfo"),
            cgroup: dir.join("cgroup"),
            v2_mount_point: dir.join("unified"),
        };
        fs::write(&paths.mount_info, mount_info).unwrap();
        fs::write(&paths.cgroup, cgroup).unwrap();
        paths
    }

    fn v2_mount_info(dir: &Path) -> String {
        format!(
            "26 1 0:23 / {} rw,nosuid,nodev,noexec,relatime shared:5 - cgroup2 cgroup2 rw,nsdelegate\n",
            dir.join("unified").display()
        )
    }

    #[test]
    fn test_queryer_uses_v2() {
        let dir = tempfile::tempdir().unwrap();
        let paths = proc_paths(dir.path(), &v2_mount_info(dir.path()), "0::/\n");

        let queryer = Queryer::new(&paths).unwrap();
        assert!(matches!(queryer, Queryer::V2(_)));
        assert_eq!(queryer.version(), CgroupVersion::V2);
    }

    #[test]
    fn test_queryer_v2_error() {
        let dir = tempfile::tempdir().unwrap();
        let paths = proc_paths(dir.path(), &v2_mount_info(dir.path()), "garbage\n");

        let err = Queryer::new(&paths).unwrap_err();
        assert!(matches!(err, CgroupError::CgroupSubsysFormat { .. }));
    }

    #[test]
    fn test_queryer_uses_v1() {
        let dir = tempfile::tempdir().unwrap();
        let paths = proc_paths(
            dir.path(),
            "8 5 0:7 / /sys/fs/cgroup/cpu,cpuacct rw shared:8 - cgroup cgroup rw,cpu,cpuacct\n",
            "2:cpu,cpuacct:/\n",
        );

        let queryer = Queryer::new(&paths).unwrap();
        match &queryer {
            Queryer::V1(cgroups) => assert_eq!(
                cgroups.get("cpu").unwrap().path(),
                Path::new("/sys/fs/cgroup/cpu,cpuacct")
            ),
            other => panic!("must be a v1 cgroup, got {:?}", other),
        }
        assert_eq!(queryer.version(), CgroupVersion::V1);
    }

    #[test]
    fn test_queryer_v1_error() {
        let dir = tempfile::tempdir().unwrap();
        let paths = proc_paths(
            dir.path(),
            "31 23 0:24 /docker/abc /sys/fs/cgroup/cpu rw shared:1 - cgroup cgroup rw,cpu\n",
            "1:cpu:/system.slice\n",
        );

        let err = Queryer::new(&paths).unwrap_err();
        assert!(matches!(err, CgroupError::PathNotExposed { .. }));
    }

    #[test]
    fn test_no_cgroups_is_undefined() {
        let dir = tempfile::tempdir().unwrap();
        let paths = proc_paths(dir.path(), "1 0 8:1 / / rw - ext4 /dev/sda1 rw\n", "");

        assert_eq!(detect_version(&paths).unwrap(), CgroupVersion::None);
        assert_eq!(
            cpu_quota_to_parallelism_at(&paths, 1).unwrap(),
            (-1, CpuQuotaStatus::Undefined)
        );
    }

    #[test]
    fn test_quota_with_version() {
        let dir = tempfile::tempdir().unwrap();
        let paths = proc_paths(dir.path(), &v2_mount_info(dir.path()), "0::/\n");
        fs::create_dir(&paths.v2_mount_point).unwrap();
        fs::write(paths.v2_mount_point.join("cpu.max"), "250000 100000\n").unwrap();

        assert_eq!(
            quota_with_version_at(&paths, 1).unwrap(),
            (3, CpuQuotaStatus::Used, CgroupVersion::V2)
        );
        assert_eq!(
            quota_with_version_at(&paths, 4).unwrap(),
            (4, CpuQuotaStatus::MinUsed, CgroupVersion::V2)
        );
    }

    #[test]
    fn test_v1_zero_period_is_surfaced() {
        let dir = tempfile::tempdir().unwrap();
        let mount = dir.path().join("cpu");
        fs::create_dir(&mount).unwrap();
        fs::write(mount.join("cpu.cfs_quota_us"), "100000\n").unwrap();
        fs::write(mount.join("cpu.cfs_period_us"), "0\n").unwrap();
        let paths = proc_paths(
            dir.path(),
            &format!(
                "8 5 0:7 / {} rw shared:8 - cgroup cgroup rw,cpu\n",
                mount.display()
            ),
            "2:cpu:/\n",
        );

        let err = cpu_quota_to_parallelism_at(&paths, 1).unwrap_err();
        assert!(matches!(err, CgroupError::ZeroPeriod { .. }), "{}", err);
    }

    #[test]
    fn test_non_utf8_mount_does_not_block_discovery() {
        let dir = tempfile::tempdir().unwrap();
        let mount = dir.path().join("cpu");
        fs::create_dir(&mount).unwrap();
        fs::write(mount.join("cpu.cfs_quota_us"), "200000\n").unwrap();
        fs::write(mount.join("cpu.cfs_period_us"), "100000\n").unwrap();
        let paths = proc_paths(dir.path(), "", "2:cpu:/\n");
        let mut mount_info = b"40 1 8:2 / /mnt/caf\xe9 rw - ext4 /dev/sdb1 rw\n".to_vec();
        mount_info.extend_from_slice(
            format!("8 5 0:7 / {} rw shared:8 - cgroup cgroup rw,cpu\n", mount.display())
                .as_bytes(),
        );
        fs::write(&paths.mount_info, mount_info).unwrap();

        assert_eq!(
            quota_with_version_at(&paths, 1).unwrap(),
            (2, CpuQuotaStatus::Used, CgroupVersion::V1)
        );
    }

    #[test]
    fn test_quota_error_is_surfaced() {
        let dir = tempfile::tempdir().unwrap();
        let paths = proc_paths(dir.path(), &v2_mount_info(dir.path()), "0::/\n");
        fs::create_dir(&paths.v2_mount_point).unwrap();
        fs::write(paths.v2_mount_point.join("cpu.max"), "100000 0\n").unwrap();

        let err = cpu_quota_to_parallelism_at(&paths, 1).unwrap_err();
        assert!(matches!(err, CgroupError::ZeroPeriod { .. }));
    }
}
