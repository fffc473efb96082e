//! Remotes known to the rclone configuration.

use rmount_error::{RmountError, RmountResult};
use rmount_hal::RcloneOps;
use std::collections::BTreeSet;

pub struct RemoteCatalog<'a, H: RcloneOps + ?Sized> {
    hal: &'a H,
}

impl<'a, H: RcloneOps + ?Sized> RemoteCatalog<'a, H> {
    pub fn new(hal: &'a H) -> Self {
        Self { hal }
    }

    /// All configured remotes. An empty configuration is an error: it means
    /// `rmount config` has never been run.
    pub fn list(&self) -> RmountResult<BTreeSet<String>> {
        let remotes: BTreeSet<String> = self.hal.list_remotes()?.into_iter().collect();
        if remotes.is_empty() {
            return Err(RmountError::NoRemotesConfigured);
        }
        log::debug!("rclone remotes: {:?}", remotes);
        Ok(remotes)
    }

    pub fn exists(&self, remote: &str) -> RmountResult<bool> {
        Ok(self.list()?.contains(remote))
    }
}
