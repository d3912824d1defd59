//! Cgroup discovery error types.

use std::fmt;
use std::io;
use std::num::ParseIntError;
use std::path::PathBuf;

/// Errors raised while discovering cgroups or reading their parameters.
#[derive(Debug)]
pub enum CgroupError {
    /// Opening or reading a file failed.
    Io { path: PathBuf, source: io::Error },
    /// A numeric field did not parse as a base-10 integer.
    ParseInt {
        value: String,
        source: ParseIntError,
    },
    /// A `/proc/self/mountinfo` line has the wrong shape.
    MountPointFormat { line: String },
    /// A `/proc/self/cgroup` line has the wrong shape.
    CgroupSubsysFormat { line: String },
    /// A cgroup path lies outside the root exposed by its mount.
    PathNotExposed {
        mount_point: String,
        root: String,
        path: String,
    },
    /// The unified hierarchy is not in use for this process.
    NotV2,
    /// `cpu.max` holds zero or more than two fields.
    InvalidFormat { path: PathBuf },
    /// `cpu.max` declares a zero period.
    ZeroPeriod { path: PathBuf },
    /// A parameter file was empty.
    UnexpectedEof { path: PathBuf },
}

impl CgroupError {
    /// Check if this is the "not v2" sentinel consumed by the selector.
    pub fn is_not_v2(&self) -> bool {
        matches!(self, CgroupError::NotV2)
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CgroupError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse_int(value: &str, source: ParseIntError) -> Self {
        CgroupError::ParseInt {
            value: value.to_string(),
            source,
        }
    }
}

impl fmt::Display for CgroupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CgroupError::Io { path, source } => {
                write!(f, "open {}: {}", path.display(), source)
            }
            CgroupError::ParseInt { value, source } => {
                write!(f, "parsing {:?}: {}", value, source)
            }
            CgroupError::MountPointFormat { line } => {
                write!(f, "invalid format for MountPoint: {:?}", line)
            }
            CgroupError::CgroupSubsysFormat { line } => {
                write!(f, "invalid format for CGroupSubsys: {:?}", line)
            }
            CgroupError::PathNotExposed {
                mount_point,
                root,
                path,
            } => write!(
                f,
                "path {:?} is not a descendant of mount point root {:?} and cannot be exposed from {:?}",
                path, root, mount_point
            ),
            CgroupError::NotV2 => write!(f, "not using cgroups2"),
            CgroupError::InvalidFormat { .. } => write!(f, "invalid format"),
            CgroupError::ZeroPeriod { .. } => {
                write!(f, "zero value for period is not allowed")
            }
            CgroupError::UnexpectedEof { .. } => write!(f, "unexpected EOF"),
        }
    }
}

impl std::error::Error for CgroupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CgroupError::Io { source, .. } => Some(source),
            CgroupError::ParseInt { source, .. } => Some(source),
            _ => None,
        }
    }
}
