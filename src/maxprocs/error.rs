//! Errors surfaced by [`set`](super::set).

use std::fmt;

use crate::cgroups::CgroupError;

/// Failure to derive the parallelism from the CPU quota.
#[derive(Debug)]
pub enum Error {
    /// Reading cgroups failed.
    Cgroup(CgroupError),
    /// A replacement quota computation failed.
    Quota(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Cgroup(e) => write!(f, "{}", e),
            Error::Quota(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Cgroup(e) => Some(e),
            Error::Quota(_) => None,
        }
    }
}

impl From<CgroupError> for Error {
    fn from(e: CgroupError) -> Self {
        Error::Cgroup(e)
    }
}
