use rmount_hal::{FuseOps, LinuxHal, MountRequest, RcloneOps};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tempfile::TempDir;

fn write_executable(path: &Path, content: &str) {
    fs::write(path, content).expect("write script");
    let mut perms = fs::metadata(path).expect("metadata").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).expect("set perms");
}

fn stub_command(bin_dir: &Path, name: &str, log_path: &Path, stdout: &str) -> String {
    let script = format!(
        "#!/bin/sh\necho '{name} '\"$@\" >> '{}'\nprintf '{stdout}'\nexit 0\n",
        log_path.display()
    );
    let path = bin_dir.join(name);
    write_executable(&path, &script);
    path.display().to_string()
}

#[test]
fn list_remotes_parses_rclone_output() {
    let temp_dir = TempDir::new().expect("temp dir");
    let log_path = temp_dir.path().join("calls.log");
    let rclone = stub_command(
        temp_dir.path(),
        "rclone",
        &log_path,
        "onedrive:\\ngdrive:\\n\\n",
    );

    let hal = LinuxHal::new().with_rclone_bin(rclone);
    let remotes = hal.list_remotes().expect("list remotes");

    assert_eq!(remotes, vec!["gdrive", "onedrive"]);
    let log = fs::read_to_string(&log_path).expect("read log");
    assert!(log.contains("rclone listremotes"));
}

#[test]
fn mount_remote_passes_params_and_daemon_flag() {
    let temp_dir = TempDir::new().expect("temp dir");
    let log_path = temp_dir.path().join("calls.log");
    let rclone = stub_command(temp_dir.path(), "rclone", &log_path, "");

    let hal = LinuxHal::new().with_rclone_bin(rclone);
    let request = MountRequest::new(
        "gdrive",
        "/home/me/mnt/gdrive",
        vec![
            "--vfs-cache-mode full".to_string(),
            "--buffer-size".to_string(),
            "32M".to_string(),
        ],
    );
    hal.mount_remote(&request, false).expect("mount");

    let log = fs::read_to_string(&log_path).expect("read log");
    assert!(log.contains(
        "rclone mount gdrive: /home/me/mnt/gdrive --vfs-cache-mode full --buffer-size 32M --daemon"
    ));
}

#[test]
fn unmount_calls_fusermount_with_u_flag() {
    let temp_dir = TempDir::new().expect("temp dir");
    let log_path = temp_dir.path().join("calls.log");
    let fusermount = stub_command(temp_dir.path(), "fusermount", &log_path, "");

    let hal = LinuxHal::new().with_fusermount_bin(fusermount);
    hal.unmount(Path::new("/home/me/mnt/gdrive"), false)
        .expect("unmount");

    let log = fs::read_to_string(&log_path).expect("read log");
    assert!(log.contains("fusermount -u /home/me/mnt/gdrive"));
}
