//! A single controller directory and its parameter files.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::trace;

use super::error::CgroupError;

/// Directory holding one controller's parameter files, e.g.
/// `/sys/fs/cgroup/cpu,cpuacct/docker/abc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CGroup {
    path: PathBuf,
}

impl CGroup {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Absolute path of a parameter file in this cgroup.
    pub fn param_path(&self, param: &str) -> PathBuf {
        self.path.join(param)
    }

    /// Read the first line of a parameter file, without trimming.
    pub fn read_first_line(&self, param: &str) -> Result<String, CgroupError> {
        read_first_line(&self.param_path(param))
    }

    /// Read a parameter file whose first line is a base-10 integer.
    pub fn read_int(&self, param: &str) -> Result<i64, CgroupError> {
        let text = self.read_first_line(param)?;
        let value = text
            .parse()
            .map_err(|e| CgroupError::parse_int(&text, e))?;
        trace!("cgroup {}: {}", self.param_path(param).display(), value);
        Ok(value)
    }
}

/// Read the first line of `path`. An empty file is [`CgroupError::UnexpectedEof`].
pub(crate) fn read_first_line(path: &Path) -> Result<String, CgroupError> {
    let file = File::open(path).map_err(|e| CgroupError::io(path, e))?;

    let mut line = String::new();
    let read = BufReader::new(file)
        .read_line(&mut line)
        .map_err(|e| CgroupError::io(path, e))?;
    if read == 0 {
        return Err(CgroupError::UnexpectedEof {
            path: path.to_path_buf(),
        });
    }

    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    Ok(line)
}
