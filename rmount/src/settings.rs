//! Runtime settings.
//!
//! Everything that used to be looked up ad hoc (home directory, current user,
//! where the registry lives) is resolved once here and passed down explicitly.
//! Resolution order per field: CLI flag, then the TOML settings file, then a
//! built-in default.

use rmount_error::{RmountError, RmountResult};
use rmount_hal::hal::linux_hal::{DEFAULT_FUSERMOUNT_BIN, DEFAULT_RCLONE_BIN};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "rmount";
const SETTINGS_FILE: &str = "config.toml";
const REGISTRY_FILE: &str = "mounts.json";
const MOUNT_BASE: &str = "mnt";

/// Optional on-disk settings (`~/.config/rmount/config.toml`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsFile {
    pub base_dir: Option<PathBuf>,
    pub registry: Option<PathBuf>,
    pub lock_dir: Option<PathBuf>,
    pub rclone_bin: Option<String>,
    pub fusermount_bin: Option<String>,
}

impl SettingsFile {
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Read `path`; a missing file is an empty settings file.
    pub fn load(path: &Path) -> RmountResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| {
            RmountError::Settings(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::parse(&content).map_err(|e| {
            RmountError::Settings(format!("failed to parse {}: {e}", path.display()))
        })
    }
}

/// The process environment values settings depend on, captured once.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    pub home: Option<PathBuf>,
    pub xdg_config_home: Option<PathBuf>,
    pub xdg_runtime_dir: Option<PathBuf>,
    pub user: Option<String>,
}

impl Environment {
    pub fn from_process() -> Self {
        let non_empty = |key: &str| std::env::var_os(key).filter(|v| !v.is_empty());
        Self {
            home: non_empty("HOME").map(PathBuf::from),
            xdg_config_home: non_empty("XDG_CONFIG_HOME").map(PathBuf::from),
            xdg_runtime_dir: non_empty("XDG_RUNTIME_DIR").map(PathBuf::from),
            user: current_user_name(),
        }
    }

    fn config_dir(&self) -> Option<PathBuf> {
        self.xdg_config_home
            .clone()
            .or_else(|| self.home.as_ref().map(|h| h.join(".config")))
            .map(|dir| dir.join(APP_DIR))
    }
}

fn current_user_name() -> Option<String> {
    match nix::unistd::User::from_uid(nix::unistd::getuid()) {
        Ok(Some(user)) => Some(user.name),
        _ => std::env::var("USER").ok().filter(|u| !u.is_empty()),
    }
}

/// Values supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub base_dir: Option<PathBuf>,
    pub registry: Option<PathBuf>,
    pub settings_file: Option<PathBuf>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Default mount points are `<base_dir>/<remote>`.
    pub base_dir: PathBuf,
    pub registry_path: PathBuf,
    /// Per-remote advisory lock files live here.
    pub lock_dir: PathBuf,
    pub user: String,
    pub rclone_bin: String,
    pub fusermount_bin: String,
    pub dry_run: bool,
}

impl Settings {
    pub fn new(
        base_dir: impl Into<PathBuf>,
        registry_path: impl Into<PathBuf>,
        lock_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            base_dir: base_dir.into(),
            registry_path: registry_path.into(),
            lock_dir: lock_dir.into(),
            user: String::from("nobody"),
            rclone_bin: DEFAULT_RCLONE_BIN.to_string(),
            fusermount_bin: DEFAULT_FUSERMOUNT_BIN.to_string(),
            dry_run: false,
        }
    }

    pub fn resolve(overrides: &SettingsOverrides, env: &Environment) -> RmountResult<Self> {
        let settings_path = overrides
            .settings_file
            .clone()
            .or_else(|| env.config_dir().map(|d| d.join(SETTINGS_FILE)));
        let file = match &settings_path {
            Some(path) => SettingsFile::load(path)?,
            None => SettingsFile::default(),
        };
        if let Some(path) = &settings_path {
            log::debug!("settings file: {}", path.display());
        }

        let base_dir = match overrides.base_dir.clone().or(file.base_dir) {
            Some(dir) => dir,
            None => env
                .home
                .as_ref()
                .map(|h| h.join(MOUNT_BASE))
                .ok_or_else(|| missing_home("--base-dir"))?,
        };

        let registry_path = match overrides.registry.clone().or(file.registry) {
            Some(path) => path,
            None => env
                .config_dir()
                .map(|d| d.join(REGISTRY_FILE))
                .ok_or_else(|| missing_home("--registry"))?,
        };

        let mut settings = Self {
            base_dir: absolutize(&base_dir)?,
            registry_path: absolutize(&registry_path)?,
            lock_dir: PathBuf::new(),
            user: env.user.clone().unwrap_or_else(|| "nobody".to_string()),
            rclone_bin: file
                .rclone_bin
                .unwrap_or_else(|| DEFAULT_RCLONE_BIN.to_string()),
            fusermount_bin: file
                .fusermount_bin
                .unwrap_or_else(|| DEFAULT_FUSERMOUNT_BIN.to_string()),
            dry_run: overrides.dry_run,
        };
        settings.lock_dir = match file.lock_dir {
            Some(dir) => absolutize(&dir)?,
            None => settings.default_lock_dir(env),
        };
        Ok(settings)
    }

    /// `$XDG_RUNTIME_DIR/rmount`, or a per-user directory under the system
    /// temp dir when there is no runtime dir.
    pub fn default_lock_dir(&self, env: &Environment) -> PathBuf {
        match &env.xdg_runtime_dir {
            Some(dir) => dir.join(APP_DIR),
            None => std::env::temp_dir().join(format!("{APP_DIR}-{}", self.user)),
        }
    }

    /// `<base_dir>/<remote>`, used whenever the registry has no mount point.
    pub fn default_mount_point(&self, remote: &str) -> PathBuf {
        self.base_dir.join(remote)
    }
}

/// Resolve `path` against the current directory. Relative paths are
/// otherwise compared verbatim against the absolute targets in the mount
/// table and never match.
pub fn absolutize(path: &Path) -> RmountResult<PathBuf> {
    std::path::absolute(path).map_err(|e| {
        RmountError::Settings(format!("cannot resolve {}: {e}", path.display()))
    })
}

fn missing_home(flag: &str) -> RmountError {
    RmountError::Settings(format!("HOME is not set; pass {flag} explicitly"))
}
