//! Live mount table queries.

use crate::procfs::mountinfo::MountInfo;
use crate::HalResult;

pub trait MountTableOps {
    /// Every active mount as source/target/fstype.
    fn list_mounts(&self) -> HalResult<Vec<MountInfo>>;
}
