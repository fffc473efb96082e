//! FUSE unmount helper.

use crate::HalResult;
use std::path::Path;

pub trait FuseOps {
    /// Unmount a FUSE filesystem.
    ///
    /// # Arguments
    /// * `target` - Mount point path to unmount
    /// * `dry_run` - If true, log the operation but don't execute it
    fn unmount(&self, target: &Path, dry_run: bool) -> HalResult<()>;
}
