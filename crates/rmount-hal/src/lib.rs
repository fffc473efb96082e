//! rmount system abstraction layer.
//!
//! Everything that touches the outside world (the `rclone` client, the FUSE
//! unmount helper, the kernel mount table) lives behind the traits in [`hal`]
//! so the reconciler can be exercised against [`FakeHal`] in tests.

pub mod hal;
pub mod procfs;
pub mod rclone;

pub use hal::{
    FakeHal, FuseOps, LinuxHal, MountRequest, MountTableOps, Operation, ProcessOps, RcloneOps,
    SystemHal,
};
pub use procfs::mountinfo::MountInfo;
pub use rmount_error::{HalError, HalResult};
