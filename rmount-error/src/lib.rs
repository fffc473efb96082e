use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type HalResult<T> = Result<T, HalError>;
pub type RmountResult<T> = Result<T, RmountError>;

#[derive(Error, Debug)]
pub enum HalError {
    #[error("Permission denied")]
    PermissionDenied,

    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("Command failed: {program} (exit={code:?}): {stderr}")]
    CommandFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Command timed out: {program} after {timeout_secs}s")]
    CommandTimeout { program: String, timeout_secs: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("nix errno: {0}")]
    Nix(#[from] nix::errno::Errno),

    #[error("UTF-8 decode error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

#[derive(Error, Debug)]
pub enum RmountError {
    #[error(transparent)]
    Hal(#[from] HalError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Unknown remote '{0}' (not present in rclone config)")]
    UnknownRemote(String),

    #[error("No rclone remotes configured. Run `rmount config` first.")]
    NoRemotesConfigured,

    #[error("Mount registry {} is corrupt: {reason}", .path.display())]
    ConfigCorrupt { path: PathBuf, reason: String },

    #[error("Cannot write mount registry {}: {reason}", .path.display())]
    StorageUnwritable { path: PathBuf, reason: String },

    #[error("'{remote}' is still mounted at {} after unmount", .path.display())]
    UnmountFailed { remote: String, path: PathBuf },

    #[error("'{remote}' is already mounted at {}. Unmount it first.", .path.display())]
    AlreadyMounted { remote: String, path: PathBuf },

    #[error("Mount point {} is already in use", .0.display())]
    MountPointBusy(PathBuf),

    #[error("Another rmount process is working on '{0}'")]
    Locked(String),

    #[error("Settings error: {0}")]
    Settings(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hal_error_converts_into_rmount_error() {
        let err: RmountError = HalError::CommandNotFound("rclone".to_string()).into();
        assert!(matches!(err, RmountError::Hal(HalError::CommandNotFound(_))));
        assert_eq!(err.to_string(), "Command not found: rclone");
    }

    #[test]
    fn messages_name_the_path() {
        let err = RmountError::MountPointBusy(PathBuf::from("/mnt/a"));
        assert_eq!(err.to_string(), "Mount point /mnt/a is already in use");

        let err = RmountError::UnmountFailed {
            remote: "gdrive".to_string(),
            path: PathBuf::from("/home/u/mnt/gdrive"),
        };
        assert!(err.to_string().contains("/home/u/mnt/gdrive"));
    }
}
