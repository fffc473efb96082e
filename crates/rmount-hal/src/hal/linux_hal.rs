//! Linux HAL implementation that shells out to rclone and fusermount.

use super::{FuseOps, MountRequest, MountTableOps, ProcessOps, RcloneOps};
use crate::procfs::mountinfo::{parse_mountinfo, MountInfo};
use crate::rclone::{mount_args, parse_listremotes};
use crate::{HalError, HalResult};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::time::Duration;
use wait_timeout::ChildExt;

pub const DEFAULT_RCLONE_BIN: &str = "rclone";
pub const DEFAULT_FUSERMOUNT_BIN: &str = "fusermount";
const FUSERMOUNT3_BIN: &str = "fusermount3";
const DEFAULT_MOUNTINFO: &str = "/proc/self/mountinfo";

const LIST_TIMEOUT: Duration = Duration::from_secs(30);
const MOUNT_TIMEOUT: Duration = Duration::from_secs(60);
const UNMOUNT_TIMEOUT: Duration = Duration::from_secs(30);

/// Real HAL implementation for Linux systems.
#[derive(Debug, Clone)]
pub struct LinuxHal {
    rclone_bin: String,
    fusermount_bin: String,
    mountinfo_path: PathBuf,
}

impl Default for LinuxHal {
    fn default() -> Self {
        Self {
            rclone_bin: DEFAULT_RCLONE_BIN.to_string(),
            fusermount_bin: DEFAULT_FUSERMOUNT_BIN.to_string(),
            mountinfo_path: PathBuf::from(DEFAULT_MOUNTINFO),
        }
    }
}

impl LinuxHal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rclone_bin(mut self, bin: impl Into<String>) -> Self {
        self.rclone_bin = bin.into();
        self
    }

    pub fn with_fusermount_bin(mut self, bin: impl Into<String>) -> Self {
        self.fusermount_bin = bin.into();
        self
    }

    pub fn with_mountinfo_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.mountinfo_path = path.into();
        self
    }

    fn fusermount(&self, bin: &str, target: &Path) -> HalResult<()> {
        let target = target.display().to_string();
        self.command_status(bin, &["-u", target.as_str()], UNMOUNT_TIMEOUT)
    }
}

fn map_command_err(program: &str, err: std::io::Error) -> HalError {
    match err.kind() {
        std::io::ErrorKind::NotFound => HalError::CommandNotFound(program.to_string()),
        std::io::ErrorKind::PermissionDenied => HalError::PermissionDenied,
        _ => HalError::Io(err),
    }
}

fn output_failed(program: &str, output: &Output) -> HalError {
    HalError::CommandFailed {
        program: program.to_string(),
        code: output.status.code(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
}

fn output_with_timeout(program: &str, cmd: &mut Command, timeout: Duration) -> HalResult<Output> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    let mut child = cmd.spawn().map_err(|e| map_command_err(program, e))?;

    let mut stdout = child.stdout.take();
    let mut stderr = child.stderr.take();

    // Drain pipes concurrently to avoid deadlocks on large output.
    let stdout_handle = std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut out) = stdout.take() {
            let _ = out.read_to_end(&mut buf);
        }
        buf
    });
    let stderr_handle = std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut err) = stderr.take() {
            let _ = err.read_to_end(&mut buf);
        }
        buf
    });

    let status = match child.wait_timeout(timeout).map_err(HalError::Io)? {
        Some(status) => status,
        None => {
            let _ = child.kill();
            let _ = child.wait();
            let _ = stdout_handle.join();
            let _ = stderr_handle.join();
            return Err(HalError::CommandTimeout {
                program: program.to_string(),
                timeout_secs: timeout.as_secs(),
            });
        }
    };

    let stdout = stdout_handle.join().unwrap_or_default();
    let stderr = stderr_handle.join().unwrap_or_default();
    Ok(Output {
        status,
        stdout,
        stderr,
    })
}

impl ProcessOps for LinuxHal {
    fn command_output(&self, program: &str, args: &[&str], timeout: Duration) -> HalResult<Output> {
        let mut cmd = Command::new(program);
        cmd.args(args);
        output_with_timeout(program, &mut cmd, timeout)
    }

    fn command_status(&self, program: &str, args: &[&str], timeout: Duration) -> HalResult<()> {
        let output = self.command_output(program, args, timeout)?;
        if !output.status.success() {
            return Err(output_failed(program, &output));
        }
        Ok(())
    }
}

impl MountTableOps for LinuxHal {
    fn list_mounts(&self) -> HalResult<Vec<MountInfo>> {
        let content = fs::read_to_string(&self.mountinfo_path)?;
        Ok(parse_mountinfo(&content))
    }
}

impl RcloneOps for LinuxHal {
    fn list_remotes(&self) -> HalResult<Vec<String>> {
        let output = self.command_output(&self.rclone_bin, &["listremotes"], LIST_TIMEOUT)?;
        if !output.status.success() {
            return Err(output_failed(&self.rclone_bin, &output));
        }
        let stdout = String::from_utf8(output.stdout)?;
        Ok(parse_listremotes(&stdout))
    }

    fn mount_remote(&self, request: &MountRequest, dry_run: bool) -> HalResult<()> {
        let args = mount_args(
            &request.remote,
            &request.target,
            &request.params,
            request.daemon,
        );
        if dry_run {
            log::info!("DRY RUN: {} {}", self.rclone_bin, args.join(" "));
            return Ok(());
        }

        log::debug!("{} {}", self.rclone_bin, args.join(" "));
        let argv: Vec<&str> = args.iter().map(String::as_str).collect();
        self.command_status(&self.rclone_bin, &argv, MOUNT_TIMEOUT)
    }

    fn configure(&self, dry_run: bool) -> HalResult<()> {
        if dry_run {
            log::info!("DRY RUN: {} config", self.rclone_bin);
            return Ok(());
        }

        // Interactive: inherit the terminal and wait as long as the user needs.
        let status = Command::new(&self.rclone_bin)
            .arg("config")
            .status()
            .map_err(|e| map_command_err(&self.rclone_bin, e))?;
        if !status.success() {
            return Err(HalError::CommandFailed {
                program: self.rclone_bin.clone(),
                code: status.code(),
                stderr: String::new(),
            });
        }
        Ok(())
    }
}

impl FuseOps for LinuxHal {
    fn unmount(&self, target: &Path, dry_run: bool) -> HalResult<()> {
        if dry_run {
            log::info!("DRY RUN: {} -u {}", self.fusermount_bin, target.display());
            return Ok(());
        }

        match self.fusermount(&self.fusermount_bin, target) {
            Err(HalError::CommandNotFound(_)) if self.fusermount_bin == DEFAULT_FUSERMOUNT_BIN => {
                log::debug!("fusermount not found, trying {}", FUSERMOUNT3_BIN);
                self.fusermount(FUSERMOUNT3_BIN, target)
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn write_executable(path: &Path, content: &str) {
        fs::write(path, content).unwrap();
        let mut perms = fs::metadata(path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(path, perms).unwrap();
    }

    #[test]
    fn list_mounts_reads_configured_mountinfo() {
        let dir = TempDir::new().unwrap();
        let mi = dir.path().join("mountinfo");
        fs::write(
            &mi,
            "52 36 0:45 / /mnt/gdrive rw - fuse.rclone gdrive: rw,user_id=1000\n",
        )
        .unwrap();

        let hal = LinuxHal::new().with_mountinfo_path(&mi);
        let mounts = hal.list_mounts().unwrap();
        assert_eq!(mounts.len(), 1);
        assert_eq!(mounts[0].rclone_remote(), Some("gdrive"));
    }

    #[test]
    fn missing_binary_is_command_not_found() {
        let hal = LinuxHal::new().with_rclone_bin("/nonexistent/rclone-binary");
        let err = hal.list_remotes().unwrap_err();
        assert!(matches!(err, HalError::CommandNotFound(_)));
    }

    #[test]
    fn failing_command_reports_stderr() {
        let dir = TempDir::new().unwrap();
        let bin = dir.path().join("rclone");
        write_executable(&bin, "#!/bin/sh\necho 'config file not found' >&2\nexit 3\n");

        let hal = LinuxHal::new().with_rclone_bin(bin.display().to_string());
        match hal.list_remotes().unwrap_err() {
            HalError::CommandFailed { code, stderr, .. } => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "config file not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn dry_run_mount_does_not_spawn() {
        let hal = LinuxHal::new().with_rclone_bin("/nonexistent/rclone-binary");
        let req = MountRequest::new("gdrive", "/mnt/gdrive", Vec::new());
        hal.mount_remote(&req, true).unwrap();
        hal.unmount(Path::new("/mnt/gdrive"), true).unwrap();
    }
}
