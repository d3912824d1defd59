//! End-to-end quota scenarios against on-disk proc and cgroup fixtures.

#![cfg(target_os = "linux")]

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use maxprocs::runtime::{cpu_quota_to_parallelism_at, detect_version, CgroupVersion, ProcPaths};
use maxprocs::{Applied, CpuQuotaStatus, Options, ParallelismKnob};

/// A v1 `cpu,cpuacct` hierarchy whose root is the container's group.
fn v1_fixture(dir: &Path, quota: &str, period: &str) -> ProcPaths {
    let mount = dir.join("cpu,cpuacct");
    fs::create_dir(&mount).unwrap();
    fs::write(mount.join("cpu.cfs_quota_us"), quota).unwrap();
    fs::write(mount.join("cpu.cfs_period_us"), period).unwrap();

    let paths = ProcPaths {
        mount_info: dir.join("mountinfo"),
        cgroup: dir.join("cgroup"),
        v2_mount_point: dir.join("unified"),
    };
    fs::write(
        &paths.mount_info,
        format!(
            "1 0 8:1 / / rw,noatime shared:1 - ext4 /dev/sda1 rw\n\
             31 23 0:24 /docker/abc {} rw,nosuid,nodev,noexec,relatime shared:8 - cgroup cgroup rw,cpu,cpuacct\n",
            mount.display()
        ),
    )
    .unwrap();
    fs::write(&paths.cgroup, "4:cpu,cpuacct:/docker/abc\n1:name=systemd:/docker/abc\n").unwrap();
    paths
}

/// A unified hierarchy with the process in its root group.
fn v2_fixture(dir: &Path, cpu_max: &str) -> ProcPaths {
    let paths = ProcPaths {
        mount_info: dir.join("mountinfo"),
        cgroup: dir.join("cgroup"),
        v2_mount_point: dir.join("unified"),
    };
    fs::create_dir(&paths.v2_mount_point).unwrap();
    fs::write(paths.v2_mount_point.join("cpu.max"), cpu_max).unwrap();
    fs::write(
        &paths.mount_info,
        format!(
            "1 0 8:1 / / rw,noatime shared:1 - ext4 /dev/sda1 rw\n\
             26 1 0:23 / {} rw,nosuid,nodev,noexec,relatime shared:5 - cgroup2 cgroup2 rw,nsdelegate\n",
            paths.v2_mount_point.display()
        ),
    )
    .unwrap();
    fs::write(&paths.cgroup, "0::/\n").unwrap();
    paths
}

#[test]
fn v1_quota_set() {
    let dir = tempfile::tempdir().unwrap();
    let paths = v1_fixture(dir.path(), "600000\n", "100000\n");

    assert_eq!(detect_version(&paths).unwrap(), CgroupVersion::V1);
    assert_eq!(
        cpu_quota_to_parallelism_at(&paths, 1).unwrap(),
        (6, CpuQuotaStatus::Used)
    );
}

#[test]
fn v1_quota_undefined() {
    let dir = tempfile::tempdir().unwrap();
    let paths = v1_fixture(dir.path(), "-1\n", "100000\n");

    assert_eq!(
        cpu_quota_to_parallelism_at(&paths, 1).unwrap(),
        (-1, CpuQuotaStatus::Undefined)
    );
}

#[test]
fn v1_quota_below_floor() {
    let dir = tempfile::tempdir().unwrap();
    let paths = v1_fixture(dir.path(), "150000\n", "100000\n");

    assert_eq!(
        cpu_quota_to_parallelism_at(&paths, 5).unwrap(),
        (5, CpuQuotaStatus::MinUsed)
    );
    assert_eq!(
        cpu_quota_to_parallelism_at(&paths, 1).unwrap(),
        (2, CpuQuotaStatus::Used)
    );
}

#[test]
fn v2_quota_set() {
    let dir = tempfile::tempdir().unwrap();
    let paths = v2_fixture(dir.path(), "250000 100000\n");

    assert_eq!(detect_version(&paths).unwrap(), CgroupVersion::V2);
    assert_eq!(
        cpu_quota_to_parallelism_at(&paths, 1).unwrap(),
        (3, CpuQuotaStatus::Used)
    );
}

#[test]
fn v2_max_quota() {
    let dir = tempfile::tempdir().unwrap();
    let paths = v2_fixture(dir.path(), "max 100000\n");

    assert_eq!(
        cpu_quota_to_parallelism_at(&paths, 1).unwrap(),
        (-1, CpuQuotaStatus::Undefined)
    );
}

#[test]
fn v2_quota_without_period() {
    let dir = tempfile::tempdir().unwrap();
    let paths = v2_fixture(dir.path(), "500000\n");

    assert_eq!(
        cpu_quota_to_parallelism_at(&paths, 1).unwrap(),
        (5, CpuQuotaStatus::Used)
    );
}

#[test]
fn v2_zero_period_fails() {
    let dir = tempfile::tempdir().unwrap();
    let paths = v2_fixture(dir.path(), "250000 0\n");

    let err = cpu_quota_to_parallelism_at(&paths, 1).unwrap_err();
    assert_eq!(err.to_string(), "zero value for period is not allowed");
}

#[test]
fn v1_zero_period_fails() {
    let dir = tempfile::tempdir().unwrap();
    let paths = v1_fixture(dir.path(), "100000\n", "0\n");

    let err = cpu_quota_to_parallelism_at(&paths, 1).unwrap_err();
    assert_eq!(err.to_string(), "zero value for period is not allowed");
}

#[test]
fn v1_quota_with_non_utf8_mount() {
    let dir = tempfile::tempdir().unwrap();
    let paths = v1_fixture(dir.path(), "600000\n", "100000\n");
    let mut mount_info = b"40 1 8:2 / /mnt/caf\xe9 rw - ext4 /dev/sdb1 rw\n".to_vec();
    mount_info.extend(fs::read(&paths.mount_info).unwrap());
    fs::write(&paths.mount_info, mount_info).unwrap();

    assert_eq!(
        cpu_quota_to_parallelism_at(&paths, 1).unwrap(),
        (6, CpuQuotaStatus::Used)
    );
}

struct RuntimeKnob(AtomicUsize);

impl ParallelismKnob for RuntimeKnob {
    fn name(&self) -> &str {
        "GOMAXPROCS"
    }

    fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn set(&self, procs: usize) {
        self.0.store(procs, Ordering::SeqCst);
    }
}

#[test]
fn environment_override() {
    std::env::set_var("GOMAXPROCS", "42");

    let knob = Arc::new(RuntimeKnob(AtomicUsize::new(16)));
    let log = Arc::new(Mutex::new(String::new()));
    let sink = log.clone();
    let opts = Options::new()
        .knob(knob.clone())
        .logger(move |args| sink.lock().unwrap().push_str(&args.to_string()))
        .procs(|_| panic!("cgroups must not be read"));

    let (undo, result) = maxprocs::set(opts);
    std::env::remove_var("GOMAXPROCS");

    assert!(result.is_ok());
    assert_eq!(knob.get(), 16, "knob must be unchanged");
    assert!(log.lock().unwrap().contains("honoring explicitly-configured"));
    undo.undo();
    assert_eq!(knob.get(), 16);
}

#[test]
fn apply_reports_status_acted_on() {
    let dir = tempfile::tempdir().unwrap();
    let paths = v1_fixture(dir.path(), "50000\n", "100000\n");

    let knob = Arc::new(RuntimeKnob(AtomicUsize::new(16)));
    let opts = Options::new()
        .knob(knob.clone())
        .env_key("MAXPROCS_SCENARIO_APPLY")
        .min(2)
        .procs(move |min| Ok(cpu_quota_to_parallelism_at(&paths, min)?));

    let (undo, result) = maxprocs::apply(opts);
    assert_eq!(
        result.unwrap(),
        Applied::Quota {
            procs: 2,
            status: CpuQuotaStatus::MinUsed
        }
    );
    assert_eq!(knob.get(), 2);
    undo.undo();
}

#[test]
fn apply_quota_then_undo() {
    let dir = tempfile::tempdir().unwrap();
    let paths = v2_fixture(dir.path(), "250000 100000\n");

    let knob = Arc::new(RuntimeKnob(AtomicUsize::new(16)));
    let opts = Options::new()
        .knob(knob.clone())
        .env_key("MAXPROCS_SCENARIO_UNSET")
        .procs(move |min| Ok(cpu_quota_to_parallelism_at(&paths, min)?));

    let (undo, result) = maxprocs::set(opts);
    result.unwrap();
    assert_eq!(knob.get(), 3);

    undo.undo();
    assert_eq!(knob.get(), 16);
}

#[test]
fn apply_error_leaves_knob() {
    let dir = tempfile::tempdir().unwrap();
    let paths = v2_fixture(dir.path(), "a b c\n");

    let knob = Arc::new(RuntimeKnob(AtomicUsize::new(16)));
    let opts = Options::new()
        .knob(knob.clone())
        .env_key("MAXPROCS_SCENARIO_UNSET")
        .procs(move |min| Ok(cpu_quota_to_parallelism_at(&paths, min)?));

    let (undo, result) = maxprocs::set(opts);
    assert_eq!(result.unwrap_err().to_string(), "invalid format");
    assert_eq!(knob.get(), 16);
    drop(undo);
    assert_eq!(knob.get(), 16);
}
