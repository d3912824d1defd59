//! `/proc/$PID/cgroup` parsing.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::error::CgroupError;

const CGROUP_SEP: char = ':';
const CGROUP_SUBSYS_SEP: char = ',';
const FIELD_COUNT: usize = 3;

/// One `hierarchy-ID:controller-list:cgroup-path` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CgroupSubsys {
    pub id: i64,
    /// Controllers bound to the hierarchy, in file order. The unified
    /// hierarchy yields a single empty name.
    pub subsystems: Vec<String>,
    pub name: String,
}

impl CgroupSubsys {
    /// Parse a single line. Only the first two colons delimit fields, so
    /// runtime-generated names such as `/kubepods/pod:abc` survive intact.
    pub fn from_line(line: &str) -> Result<Self, CgroupError> {
        let fields: Vec<&str> = line.splitn(FIELD_COUNT, CGROUP_SEP).collect();
        if fields.len() != FIELD_COUNT {
            return Err(CgroupError::CgroupSubsysFormat {
                line: line.to_string(),
            });
        }

        let id = fields[0]
            .parse()
            .map_err(|e| CgroupError::parse_int(fields[0], e))?;

        Ok(Self {
            id,
            subsystems: fields[1]
                .split(CGROUP_SUBSYS_SEP)
                .map(|s| s.to_string())
                .collect(),
            name: fields[2].to_string(),
        })
    }
}

/// Parse a cgroup file into a map keyed by every controller name.
///
/// An entry bound to several controllers appears under each of them. When a
/// controller shows up on more than one line, the last line wins.
pub fn parse_cgroup_subsystems<P: AsRef<Path>>(
    path: P,
) -> Result<HashMap<String, CgroupSubsys>, CgroupError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| CgroupError::io(path, e))?;
    let mut subsystems = HashMap::new();

    for line in BufReader::new(file).split(b'\n') {
        let line = line.map_err(|e| CgroupError::io(path, e))?;
        let cgroup = CgroupSubsys::from_line(&String::from_utf8_lossy(&line))?;
        for subsys in &cgroup.subsystems {
            subsystems.insert(subsys.clone(), cgroup.clone());
        }
    }

    Ok(subsystems)
}
