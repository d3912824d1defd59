//! `/proc/$PID/mountinfo` parsing.
//!
//! Line format (see proc(5)):
//!
//! ```text
//! 36 35 98:0 /mnt1 /mnt2 rw,noatime master:1 - ext3 /dev/root rw,errors=continue
//! (1)(2)(3)   (4)   (5)      (6)      (7)   (8) (9)   (10)         (11)
//! ```
//!
//! Field (7) repeats zero or more times; the hyphen (8) closes that region.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::error::CgroupError;

const MOUNT_INFO_SEP: &str = " ";
const MOUNT_INFO_OPTS_SEP: &str = ",";
const MOUNT_INFO_OPTIONAL_FIELD_SEP: &str = "-";

/// Fields before the optional region: id, parent, dev, root, mount point, options.
const FIELD_COUNT_FIRST_HALF: usize = 6;
/// Fields after the hyphen: fs type, source, super options.
const FIELD_COUNT_SECOND_HALF: usize = 3;

/// One mount as described by a line of `/proc/$PID/mountinfo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountPoint {
    pub mount_id: i64,
    pub parent_id: i64,
    /// `major:minor` of the backing device.
    pub device_id: String,
    /// Path inside the source filesystem exposed at `mount_point`.
    pub root: String,
    pub mount_point: String,
    pub options: Vec<String>,
    pub optional_fields: Vec<String>,
    pub fs_type: String,
    pub mount_source: String,
    pub super_options: Vec<String>,
}

impl MountPoint {
    /// Parse a single mountinfo line.
    pub fn from_line(line: &str) -> Result<Self, CgroupError> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let invalid = || CgroupError::MountPointFormat {
            line: line.to_string(),
        };

        if fields.len() < FIELD_COUNT_FIRST_HALF + 1 + FIELD_COUNT_SECOND_HALF {
            return Err(invalid());
        }

        let sep = fields[FIELD_COUNT_FIRST_HALF..]
            .iter()
            .position(|f| *f == MOUNT_INFO_OPTIONAL_FIELD_SEP)
            .map(|i| i + FIELD_COUNT_FIRST_HALF)
            .ok_or_else(invalid)?;

        let tail = &fields[sep + 1..];
        if tail.len() != FIELD_COUNT_SECOND_HALF {
            return Err(invalid());
        }

        let mount_id = parse_id(fields[0])?;
        let parent_id = parse_id(fields[1])?;

        Ok(Self {
            mount_id,
            parent_id,
            device_id: fields[2].to_string(),
            root: fields[3].to_string(),
            mount_point: fields[4].to_string(),
            options: split_opts(fields[5]),
            optional_fields: fields[FIELD_COUNT_FIRST_HALF..sep]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            fs_type: tail[0].to_string(),
            mount_source: tail[1].to_string(),
            super_options: split_opts(tail[2]),
        })
    }

    /// Translate an absolute path inside the mounted filesystem into the
    /// corresponding path in this process's namespace.
    ///
    /// Fails with [`CgroupError::PathNotExposed`] unless `root` is a
    /// path-component prefix of `abs_path`.
    pub fn translate(&self, abs_path: &str) -> Result<String, CgroupError> {
        let not_exposed = || CgroupError::PathNotExposed {
            mount_point: self.mount_point.clone(),
            root: self.root.clone(),
            path: abs_path.to_string(),
        };

        if !abs_path.starts_with('/') {
            return Err(not_exposed());
        }

        let root = clean_segments(&self.root);
        let path = clean_segments(abs_path);
        let rel = path.strip_prefix(root.as_slice()).ok_or_else(not_exposed)?;

        let mut translated = clean_segments(&self.mount_point);
        translated.extend_from_slice(rel);
        Ok(join_absolute(&translated))
    }
}

impl fmt::Display for MountPoint {
    /// Canonical single-space mountinfo rendering.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {}",
            self.mount_id,
            self.parent_id,
            self.device_id,
            self.root,
            self.mount_point,
            self.options.join(MOUNT_INFO_OPTS_SEP)
        )?;
        for field in &self.optional_fields {
            write!(f, "{}{}", MOUNT_INFO_SEP, field)?;
        }
        write!(
            f,
            " {} {} {} {}",
            MOUNT_INFO_OPTIONAL_FIELD_SEP,
            self.fs_type,
            self.mount_source,
            self.super_options.join(MOUNT_INFO_OPTS_SEP)
        )
    }
}

/// Stream a mountinfo file, handing every parsed record to `visit`.
///
/// Stops at the first parse or visitor error.
pub fn parse_mount_info<P, F>(path: P, mut visit: F) -> Result<(), CgroupError>
where
    P: AsRef<Path>,
    F: FnMut(&MountPoint) -> Result<(), CgroupError>,
{
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| CgroupError::io(path, e))?;

    // Mount paths are raw bytes; only whitespace and backslash are escaped.
    for line in BufReader::new(file).split(b'\n') {
        let line = line.map_err(|e| CgroupError::io(path, e))?;
        let mount_point = MountPoint::from_line(&String::from_utf8_lossy(&line))?;
        visit(&mount_point)?;
    }

    Ok(())
}

fn parse_id(value: &str) -> Result<i64, CgroupError> {
    value
        .parse()
        .map_err(|e| CgroupError::parse_int(value, e))
}

fn split_opts(value: &str) -> Vec<String> {
    value
        .split(MOUNT_INFO_OPTS_SEP)
        .map(|s| s.to_string())
        .collect()
}

/// Lexically normalise an absolute path into its segments.
fn clean_segments(path: &str) -> Vec<&str> {
    let mut out = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            s => out.push(s),
        }
    }
    out
}

fn join_absolute(segments: &[&str]) -> String {
    format!("/{}", segments.join("/"))
}
