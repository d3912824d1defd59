//! Platforms without cgroups: the quota is always undefined.

use super::{CgroupVersion, CpuQuotaStatus, ProcPaths};
use crate::cgroups::CgroupError;

pub fn cpu_quota_to_parallelism_at(
    _paths: &ProcPaths,
    _min_value: i32,
) -> Result<(i32, CpuQuotaStatus), CgroupError> {
    Ok((-1, CpuQuotaStatus::Undefined))
}

pub fn quota_with_version_at(
    _paths: &ProcPaths,
    _min_value: i32,
) -> Result<(i32, CpuQuotaStatus, CgroupVersion), CgroupError> {
    Ok((-1, CpuQuotaStatus::Undefined, CgroupVersion::None))
}

pub fn detect_version(_paths: &ProcPaths) -> Result<CgroupVersion, CgroupError> {
    Ok(CgroupVersion::None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_always_undefined() {
        let paths = ProcPaths::default();
        assert_eq!(
            cpu_quota_to_parallelism_at(&paths, 4).unwrap(),
            (-1, CpuQuotaStatus::Undefined)
        );
        assert_eq!(detect_version(&paths).unwrap(), CgroupVersion::None);
        assert_eq!(
            quota_with_version_at(&paths, 4).unwrap(),
            (-1, CpuQuotaStatus::Undefined, CgroupVersion::None)
        );
    }
}
