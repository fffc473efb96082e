//! Remote-storage client operations (`rclone`).

use crate::HalResult;
use std::path::PathBuf;

/// A single `rclone mount` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountRequest {
    pub remote: String,
    pub target: PathBuf,
    pub params: Vec<String>,
    /// Ask rclone to daemonize and return once the mount is handed off.
    pub daemon: bool,
}

impl MountRequest {
    pub fn new(remote: impl Into<String>, target: impl Into<PathBuf>, params: Vec<String>) -> Self {
        Self {
            remote: remote.into(),
            target: target.into(),
            params,
            daemon: true,
        }
    }
}

pub trait RcloneOps {
    /// Names of all configured remotes, without the trailing colon.
    fn list_remotes(&self) -> HalResult<Vec<String>>;

    /// Start a mount. With `request.daemon` set this returns as soon as
    /// rclone has detached; it does not wait for the mount to serve traffic.
    ///
    /// # Arguments
    /// * `request` - Remote, target directory and mount params
    /// * `dry_run` - If true, log the operation but don't execute it
    fn mount_remote(&self, request: &MountRequest, dry_run: bool) -> HalResult<()>;

    /// Run the interactive `rclone config` session on the current terminal.
    fn configure(&self, dry_run: bool) -> HalResult<()>;
}
