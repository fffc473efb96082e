//! Process execution helpers.
//!
//! rclone and fusermount are only ever started through this trait. Every call
//! is bounded by a timeout; a hung helper becomes `HalError::CommandTimeout`.

use crate::HalResult;
use std::process::Output;
use std::time::Duration;

/// External command runner with captured output.
pub trait ProcessOps {
    fn command_output(&self, program: &str, args: &[&str], timeout: Duration) -> HalResult<Output>;

    /// Like [`ProcessOps::command_output`], but a non-zero exit is an error.
    fn command_status(&self, program: &str, args: &[&str], timeout: Duration) -> HalResult<()>;
}
