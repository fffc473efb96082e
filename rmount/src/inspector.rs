//! Live mount status of rclone remotes.

use rmount_hal::procfs::mountinfo::{find_remote_mount, is_mounted_from_info};
use rmount_hal::{MountInfo, MountTableOps};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountStatus {
    Unmounted,
    MountedAt(PathBuf),
}

impl fmt::Display for MountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MountStatus::Unmounted => write!(f, "unmounted"),
            MountStatus::MountedAt(_) => write!(f, "mounted"),
        }
    }
}

/// Read-only view over the mount table. Every call re-reads it.
pub struct MountInspector<'a, H: MountTableOps + ?Sized> {
    hal: &'a H,
}

impl<'a, H: MountTableOps + ?Sized> MountInspector<'a, H> {
    pub fn new(hal: &'a H) -> Self {
        Self { hal }
    }

    // Fail open: an unreadable table looks empty. The worst case is a
    // redundant mount attempt, which rclone rejects on a busy target.
    fn snapshot(&self) -> Vec<MountInfo> {
        match self.hal.list_mounts() {
            Ok(entries) => entries,
            Err(err) => {
                log::warn!("cannot read mount table, assuming nothing is mounted: {err}");
                Vec::new()
            }
        }
    }

    pub fn current_mount(&self, remote: &str) -> MountStatus {
        let entries = self.snapshot();
        match find_remote_mount(remote, &entries) {
            Some(entry) => MountStatus::MountedAt(entry.mount_point.clone()),
            None => MountStatus::Unmounted,
        }
    }

    /// True when anything at all is mounted on `path`.
    pub fn path_in_use(&self, path: &Path) -> bool {
        is_mounted_from_info(path, &self.snapshot())
    }

    /// Remotes with an active rclone mount, in mount-table order, each once.
    pub fn mounted_remotes(&self) -> Vec<String> {
        let mut remotes: Vec<String> = Vec::new();
        for entry in self.snapshot() {
            if let Some(remote) = entry.rclone_remote() {
                if !remotes.iter().any(|r| r == remote) {
                    remotes.push(remote.to_string());
                }
            }
        }
        remotes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmount_hal::FakeHal;

    #[test]
    fn current_mount_reports_path() {
        let hal = FakeHal::new();
        hal.add_rclone_mount("gdrive", "/mnt/gdrive");

        let inspector = MountInspector::new(&hal);
        assert_eq!(
            inspector.current_mount("gdrive"),
            MountStatus::MountedAt(PathBuf::from("/mnt/gdrive"))
        );
        assert_eq!(inspector.current_mount("box"), MountStatus::Unmounted);
    }

    #[test]
    fn current_mount_is_prefix_safe() {
        let hal = FakeHal::new();
        hal.add_rclone_mount("gdrive10", "/mnt/gdrive10");

        let inspector = MountInspector::new(&hal);
        assert_eq!(inspector.current_mount("gdrive1"), MountStatus::Unmounted);
        assert!(matches!(
            inspector.current_mount("gdrive10"),
            MountStatus::MountedAt(_)
        ));
    }

    #[test]
    fn path_in_use_ignores_source() {
        let hal = FakeHal::new();
        hal.add_mount("/dev/sdb1", "/mnt/usb", "ext4");

        let inspector = MountInspector::new(&hal);
        assert!(inspector.path_in_use(Path::new("/mnt/usb")));
        assert!(inspector.path_in_use(Path::new("/mnt/usb/")));
        assert!(!inspector.path_in_use(Path::new("/mnt/usb2")));
    }

    #[test]
    fn broken_mount_table_fails_open() {
        let hal = FakeHal::new();
        hal.add_rclone_mount("gdrive", "/mnt/gdrive");
        hal.break_mount_table();

        let inspector = MountInspector::new(&hal);
        assert_eq!(inspector.current_mount("gdrive"), MountStatus::Unmounted);
        assert!(!inspector.path_in_use(Path::new("/mnt/gdrive")));
    }

    #[test]
    fn mounted_remotes_lists_only_rclone_mounts() {
        let hal = FakeHal::new();
        hal.add_mount("/dev/sda1", "/", "ext4");
        hal.add_rclone_mount("b", "/mnt/b");
        hal.add_mount("a:photos", "/mnt/a", "fuse.rclone");
        hal.add_rclone_mount("b", "/mnt/b-again");

        let inspector = MountInspector::new(&hal);
        assert_eq!(inspector.mounted_remotes(), vec!["b", "a"]);
    }
}
