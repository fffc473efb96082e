//! HAL trait definitions and implementations.
//!
//! This module defines the traits for every external collaborator rmount
//! talks to and provides both real (LinuxHal) and fake (FakeHal)
//! implementations.

pub mod fake_hal;
pub mod fuse_ops;
pub mod linux_hal;
pub mod mount_table_ops;
pub mod process_ops;
pub mod rclone_ops;

pub use fake_hal::{FakeHal, Operation};
pub use fuse_ops::FuseOps;
pub use linux_hal::LinuxHal;
pub use mount_table_ops::MountTableOps;
pub use process_ops::ProcessOps;
pub use rclone_ops::{MountRequest, RcloneOps};

/// Complete HAL combining all system operation traits.
pub trait SystemHal: MountTableOps + RcloneOps + FuseOps + Send + Sync {}

/// Automatically implement SystemHal for any type implementing all required traits.
impl<T> SystemHal for T where T: MountTableOps + RcloneOps + FuseOps + Send + Sync {}
