//! Fake HAL implementation for testing.
//!
//! This implementation records all operations without executing them and keeps
//! an in-memory mount table, allowing for CI-safe testing without FUSE,
//! rclone or a configured remote.

use super::{FuseOps, MountRequest, MountTableOps, RcloneOps};
use crate::procfs::mountinfo::{normalize_path, MountInfo, RCLONE_FSTYPE};
use crate::{HalError, HalResult};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Operation records for testing and verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Mount(MountRequest),
    Unmount {
        target: PathBuf,
    },
    Configure,
}

/// Shared state for FakeHal operations.
#[derive(Debug, Clone, Default)]
struct FakeHalState {
    /// All operations that were recorded
    operations: Vec<Operation>,
    /// Simulated mount table
    mounts: Vec<MountInfo>,
    /// Remotes reported by `list_remotes`
    remotes: Vec<String>,
    /// Remotes whose mount call fails
    failing_mounts: HashSet<String>,
    /// Targets that stay mounted after an unmount call
    stuck_targets: HashSet<String>,
    /// Whether `list_mounts` should fail
    mount_table_broken: bool,
    /// Remotes added when `configure` runs
    configured_remotes: Vec<String>,
}

/// Fake HAL implementation that records operations without executing them.
///
/// This is designed for testing and CI environments where real system
/// operations would fail or be dangerous.
#[derive(Debug, Clone, Default)]
pub struct FakeHal {
    state: Arc<Mutex<FakeHalState>>,
}

impl FakeHal {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeHalState::default())),
        }
    }

    /// Fake HAL whose rclone config holds `remotes`.
    pub fn with_remotes<I, S>(remotes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let hal = Self::new();
        hal.set_remotes(remotes);
        hal
    }

    pub fn set_remotes<I, S>(&self, remotes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.lock().unwrap().remotes = remotes.into_iter().map(Into::into).collect();
    }

    /// Remotes that appear once `configure` has run.
    pub fn set_configured_remotes<I, S>(&self, remotes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.lock().unwrap().configured_remotes =
            remotes.into_iter().map(Into::into).collect();
    }

    /// Seed the mount table with an arbitrary entry.
    pub fn add_mount(&self, source: &str, target: impl Into<PathBuf>, fstype: &str) {
        self.state
            .lock()
            .unwrap()
            .mounts
            .push(MountInfo::new(source, target, fstype));
    }

    /// Seed the mount table with an rclone mount of `remote`.
    pub fn add_rclone_mount(&self, remote: &str, target: impl Into<PathBuf>) {
        self.add_mount(&format!("{remote}:"), target, RCLONE_FSTYPE);
    }

    /// Make `mount_remote` fail for `remote`.
    pub fn fail_mount_for(&self, remote: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_mounts
            .insert(remote.to_string());
    }

    /// Keep `target` in the mount table even after it is unmounted.
    pub fn keep_mounted(&self, target: &Path) {
        self.state
            .lock()
            .unwrap()
            .stuck_targets
            .insert(normalize_path(target));
    }

    /// Make `list_mounts` return an error.
    pub fn break_mount_table(&self) {
        self.state.lock().unwrap().mount_table_broken = true;
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<Operation> {
        self.state.lock().unwrap().operations.clone()
    }

    /// Get the number of operations recorded.
    pub fn operation_count(&self) -> usize {
        self.state.lock().unwrap().operations.len()
    }

    /// Check if a specific operation was recorded.
    pub fn has_operation(&self, check: impl Fn(&Operation) -> bool) -> bool {
        self.state.lock().unwrap().operations.iter().any(check)
    }

    /// All recorded mount requests, in call order.
    pub fn mount_requests(&self) -> Vec<MountRequest> {
        self.operations()
            .into_iter()
            .filter_map(|op| match op {
                Operation::Mount(req) => Some(req),
                _ => None,
            })
            .collect()
    }

    /// All recorded unmount targets, in call order.
    pub fn unmount_targets(&self) -> Vec<PathBuf> {
        self.operations()
            .into_iter()
            .filter_map(|op| match op {
                Operation::Unmount { target } => Some(target),
                _ => None,
            })
            .collect()
    }

    /// Clear all recorded operations and the simulated mount table.
    pub fn clear(&self) {
        let mut state = self.state.lock().unwrap();
        state.operations.clear();
        state.mounts.clear();
    }

    fn record_operation(&self, op: Operation) {
        self.state.lock().unwrap().operations.push(op);
    }
}

impl MountTableOps for FakeHal {
    fn list_mounts(&self) -> HalResult<Vec<MountInfo>> {
        let state = self.state.lock().unwrap();
        if state.mount_table_broken {
            return Err(HalError::Parse("FAKE HAL: mount table unavailable".into()));
        }
        Ok(state.mounts.clone())
    }
}

impl RcloneOps for FakeHal {
    fn list_remotes(&self) -> HalResult<Vec<String>> {
        let mut remotes = self.state.lock().unwrap().remotes.clone();
        remotes.sort();
        remotes.dedup();
        Ok(remotes)
    }

    fn mount_remote(&self, request: &MountRequest, dry_run: bool) -> HalResult<()> {
        if dry_run {
            log::info!(
                "FAKE HAL DRY RUN: mount {}: -> {}",
                request.remote,
                request.target.display()
            );
            return Ok(());
        }

        log::info!(
            "FAKE HAL: mount {}: -> {} {:?}",
            request.remote,
            request.target.display(),
            request.params
        );
        self.record_operation(Operation::Mount(request.clone()));

        if self
            .state
            .lock()
            .unwrap()
            .failing_mounts
            .contains(&request.remote)
        {
            return Err(HalError::CommandFailed {
                program: "rclone".to_string(),
                code: Some(1),
                stderr: format!("FAKE HAL: mount of {} refused", request.remote),
            });
        }

        self.add_rclone_mount(&request.remote, request.target.clone());
        Ok(())
    }

    fn configure(&self, dry_run: bool) -> HalResult<()> {
        if dry_run {
            log::info!("FAKE HAL DRY RUN: rclone config");
            return Ok(());
        }
        self.record_operation(Operation::Configure);
        let mut state = self.state.lock().unwrap();
        let added = std::mem::take(&mut state.configured_remotes);
        state.remotes.extend(added);
        Ok(())
    }
}

impl FuseOps for FakeHal {
    fn unmount(&self, target: &Path, dry_run: bool) -> HalResult<()> {
        if dry_run {
            log::info!("FAKE HAL DRY RUN: unmount {}", target.display());
            return Ok(());
        }

        log::info!("FAKE HAL: unmount {}", target.display());
        self.record_operation(Operation::Unmount {
            target: target.to_path_buf(),
        });

        let wanted = normalize_path(target);
        let mut state = self.state.lock().unwrap();
        if state.stuck_targets.contains(&wanted) {
            return Err(HalError::CommandFailed {
                program: "fusermount".to_string(),
                code: Some(1),
                stderr: format!("FAKE HAL: {} is busy", target.display()),
            });
        }
        let before = state.mounts.len();
        state
            .mounts
            .retain(|m| normalize_path(&m.mount_point) != wanted);
        if state.mounts.len() == before {
            return Err(HalError::CommandFailed {
                program: "fusermount".to_string(),
                code: Some(1),
                stderr: format!("FAKE HAL: {} not mounted", target.display()),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_hal_records_mount_and_updates_table() {
        let hal = FakeHal::with_remotes(["gdrive"]);
        let req = MountRequest::new("gdrive", "/mnt/gdrive", vec!["--read-only".into()]);

        hal.mount_remote(&req, false).unwrap();

        assert_eq!(hal.mount_requests(), vec![req]);
        let mounts = hal.list_mounts().unwrap();
        assert_eq!(mounts.len(), 1);
        assert_eq!(mounts[0].rclone_remote(), Some("gdrive"));
    }

    #[test]
    fn fake_hal_records_unmount() {
        let hal = FakeHal::new();
        hal.add_rclone_mount("gdrive", "/mnt/gdrive");

        hal.unmount(Path::new("/mnt/gdrive"), false).unwrap();

        assert_eq!(hal.unmount_targets(), vec![PathBuf::from("/mnt/gdrive")]);
        assert!(hal.list_mounts().unwrap().is_empty());
    }

    #[test]
    fn fake_hal_dry_run_records_nothing() {
        let hal = FakeHal::new();
        hal.mount_remote(&MountRequest::new("a", "/mnt/a", Vec::new()), true)
            .unwrap();
        hal.unmount(Path::new("/mnt/a"), true).unwrap();
        assert_eq!(hal.operation_count(), 0);
    }

    #[test]
    fn fake_hal_stuck_target_survives_unmount() {
        let hal = FakeHal::new();
        hal.add_rclone_mount("gdrive", "/mnt/gdrive");
        hal.keep_mounted(Path::new("/mnt/gdrive"));

        assert!(hal.unmount(Path::new("/mnt/gdrive"), false).is_err());
        assert_eq!(hal.list_mounts().unwrap().len(), 1);
    }

    #[test]
    fn fake_hal_configure_adds_remotes() {
        let hal = FakeHal::new();
        hal.set_configured_remotes(["b", "a"]);
        assert!(hal.list_remotes().unwrap().is_empty());

        hal.configure(false).unwrap();

        assert_eq!(hal.list_remotes().unwrap(), vec!["a", "b"]);
        assert!(hal.has_operation(|op| matches!(op, Operation::Configure)));
    }

    #[test]
    fn fake_hal_can_clear() {
        let hal = FakeHal::new();
        hal.mount_remote(&MountRequest::new("a", "/mnt/a", Vec::new()), false)
            .unwrap();
        assert_eq!(hal.operation_count(), 1);

        hal.clear();

        assert_eq!(hal.operation_count(), 0);
        assert!(hal.list_mounts().unwrap().is_empty());
    }
}
