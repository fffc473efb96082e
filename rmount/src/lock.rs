//! Per-remote advisory locks.
//!
//! Held across inspect, act and verify so two rmount processes never race
//! on the same remote. Released on drop.

use nix::errno::Errno;
use nix::fcntl::{Flock, FlockArg};
use rmount_error::{HalError, RmountError, RmountResult};
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

pub struct RemoteLock {
    path: PathBuf,
    _flock: Flock<File>,
}

impl RemoteLock {
    /// Take the exclusive lock for `remote` without blocking.
    pub fn acquire(lock_dir: &Path, remote: &str) -> RmountResult<Self> {
        fs::create_dir_all(lock_dir)?;
        let path = lock_dir.join(format!("{}.lock", lock_file_stem(remote)));
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)?;

        match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
            Ok(flock) => {
                log::debug!("locked {}", path.display());
                Ok(Self {
                    path,
                    _flock: flock,
                })
            }
            Err((_, Errno::EWOULDBLOCK)) => Err(RmountError::Locked(remote.to_string())),
            Err((_, errno)) => Err(RmountError::Hal(HalError::Nix(errno))),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Debug for RemoteLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteLock").field("path", &self.path).finish()
    }
}

fn lock_file_stem(remote: &str) -> String {
    remote
        .chars()
        .map(|c| if c == '/' || c == '\0' { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn second_lock_on_same_remote_is_refused() {
        let dir = tempdir().unwrap();
        let first = RemoteLock::acquire(dir.path(), "gdrive").unwrap();

        let err = RemoteLock::acquire(dir.path(), "gdrive").unwrap_err();
        assert!(matches!(err, RmountError::Locked(ref r) if r == "gdrive"));

        // Other remotes are independent.
        let _other = RemoteLock::acquire(dir.path(), "box").unwrap();

        drop(first);
        RemoteLock::acquire(dir.path(), "gdrive").unwrap();
    }

    #[test]
    fn lock_file_name_is_sanitised() {
        let dir = tempdir().unwrap();
        let lock = RemoteLock::acquire(&dir.path().join("locks"), "odd/name").unwrap();
        assert_eq!(lock.path(), dir.path().join("locks/odd_name.lock"));
    }
}
