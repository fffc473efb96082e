//! Parsing helpers for `/proc/self/mountinfo` (and similar mountinfo files).

use std::path::{Path, PathBuf};

/// Filesystem type rclone registers for its FUSE mounts.
pub const RCLONE_FSTYPE: &str = "fuse.rclone";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountInfo {
    pub source: String,
    pub mount_point: PathBuf,
    pub fstype: String,
}

impl MountInfo {
    pub fn new(source: impl Into<String>, mount_point: impl Into<PathBuf>, fstype: &str) -> Self {
        Self {
            source: source.into(),
            mount_point: mount_point.into(),
            fstype: fstype.to_string(),
        }
    }

    /// Remote name of an rclone mount source (`gdrive:` or `gdrive:some/dir`).
    pub fn rclone_remote(&self) -> Option<&str> {
        if self.fstype != RCLONE_FSTYPE {
            return None;
        }
        let (name, _) = self.source.split_once(':')?;
        if name.is_empty() {
            return None;
        }
        Some(name)
    }
}

pub fn parse_mountinfo(content: &str) -> Vec<MountInfo> {
    content
        .lines()
        .filter_map(|line| {
            // mountinfo format:
            //   <pre fields...> <mount point> <...> - <fstype> <source> <superopts>
            let (pre, post) = line.split_once(" - ")?;
            let pre_fields: Vec<&str> = pre.split_whitespace().collect();
            if pre_fields.len() < 5 {
                return None;
            }
            let mut post_fields = post.split_whitespace();
            let fstype = post_fields.next()?;
            let source = post_fields.next()?;
            Some(MountInfo {
                source: unescape_mount_path(source),
                mount_point: PathBuf::from(unescape_mount_path(pre_fields[4])),
                fstype: fstype.to_string(),
            })
        })
        .collect()
}

pub fn is_mounted_from_info(path: &Path, entries: &[MountInfo]) -> bool {
    let target = normalize_path(path);
    entries
        .iter()
        .any(|entry| normalize_path(&entry.mount_point) == target)
}

/// First mount whose source is exactly `<remote>:` or `<remote>:<subpath>`.
///
/// The colon is part of the match so `gdrive1` never matches `gdrive10:`.
pub fn find_remote_mount<'a>(remote: &str, entries: &'a [MountInfo]) -> Option<&'a MountInfo> {
    let prefix = format!("{remote}:");
    entries
        .iter()
        .find(|entry| entry.source.starts_with(&prefix))
}

pub fn unescape_mount_path(raw: &str) -> String {
    raw.replace("\\040", " ")
        .replace("\\011", "\t")
        .replace("\\012", "\n")
        .replace("\\134", "\\")
}

pub fn normalize_path(path: &Path) -> String {
    let s = path.to_string_lossy();
    if s.len() > 1 && s.ends_with('/') {
        s.trim_end_matches('/').to_string()
    } else {
        s.to_string()
    }
}
