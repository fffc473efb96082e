//! Mount registry: the user's desired mount point and params per remote.
//!
//! Stored as a JSON object keyed by remote name:
//!
//! ```json
//! { "gdrive": { "mount_point": "/home/me/mnt/gdrive", "mount_params": ["--read-only"] } }
//! ```
//!
//! Either field may be null or missing, in which case defaults apply.

use rmount_error::{RmountError, RmountResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Options used when a remote has no stored params or is mounted at an
/// explicit path. `--vfs-cache-max-age` is `1h` for every entry point.
pub const BASELINE_PARAMS: [&str; 8] = [
    "--vfs-cache-mode",
    "full",
    "--vfs-cache-max-age",
    "1h",
    "--dir-cache-time",
    "30s",
    "--buffer-size",
    "32M",
];

pub fn baseline_params() -> Vec<String> {
    BASELINE_PARAMS.iter().map(|s| s.to_string()).collect()
}

/// One registry entry as persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSpec {
    #[serde(default)]
    pub mount_point: Option<PathBuf>,
    #[serde(default)]
    pub mount_params: Option<Vec<String>>,
}

/// Effective mount configuration for one remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountSpec {
    pub mount_point: PathBuf,
    pub mount_params: Vec<String>,
}

pub type RegistryMap = BTreeMap<String, StoredSpec>;

/// Read the registry document. A missing file is an empty mapping.
pub fn load_registry(path: &Path) -> RmountResult<RegistryMap> {
    if !path.exists() {
        return Ok(RegistryMap::new());
    }
    let corrupt = |reason: String| RmountError::ConfigCorrupt {
        path: path.to_path_buf(),
        reason,
    };
    let content = fs::read_to_string(path).map_err(|e| corrupt(e.to_string()))?;
    if content.trim().is_empty() {
        return Ok(RegistryMap::new());
    }
    serde_json::from_str(&content).map_err(|e| corrupt(e.to_string()))
}

/// Atomically replace the registry document with `map`.
pub fn save_registry(path: &Path, map: &RegistryMap) -> RmountResult<()> {
    let unwritable = |reason: String| RmountError::StorageUnwritable {
        path: path.to_path_buf(),
        reason,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| unwritable(format!("create {}: {e}", parent.display())))?;
    }

    let tmp_path = temp_path(path);
    let payload = serde_json::to_string_pretty(map).map_err(|e| unwritable(e.to_string()))?;

    let mut file = File::create(&tmp_path)
        .map_err(|e| unwritable(format!("create {}: {e}", tmp_path.display())))?;
    file.write_all(payload.as_bytes())
        .and_then(|_| file.write_all(b"\n"))
        .and_then(|_| file.sync_all())
        .map_err(|e| unwritable(e.to_string()))?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        unwritable(format!("replace: {e}"))
    })?;

    if let Some(parent) = path.parent() {
        if let Ok(dir) = File::open(parent) {
            dir.sync_all().ok();
        }
    }

    log::debug!("wrote {} registry entries to {}", map.len(), path.display());
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("mounts.json");
    path.with_file_name(format!("{file_name}.tmp"))
}

/// Loaded registry plus the rules for filling in defaults.
#[derive(Debug, Clone)]
pub struct MountRegistry {
    path: PathBuf,
    base_dir: PathBuf,
    entries: RegistryMap,
}

impl MountRegistry {
    pub fn new(path: impl Into<PathBuf>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            base_dir: base_dir.into(),
            entries: RegistryMap::new(),
        }
    }

    pub fn load(path: impl Into<PathBuf>, base_dir: impl Into<PathBuf>) -> RmountResult<Self> {
        let mut registry = Self::new(path, base_dir);
        registry.entries = load_registry(&registry.path)?;
        Ok(registry)
    }

    /// Like [`MountRegistry::load`], but a corrupt document degrades to
    /// defaults with a warning.
    pub fn load_or_default(path: impl Into<PathBuf>, base_dir: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let base_dir = base_dir.into();
        match Self::load(&path, &base_dir) {
            Ok(registry) => registry,
            Err(err) => {
                log::warn!("{err}; using default mount settings");
                Self::new(path, base_dir)
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &RegistryMap {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut RegistryMap {
        &mut self.entries
    }

    /// Default spec for `remote`: `<base_dir>/<remote>` and the baseline params.
    pub fn default_spec(&self, remote: &str) -> MountSpec {
        MountSpec {
            mount_point: self.base_dir.join(remote),
            mount_params: baseline_params(),
        }
    }

    /// Effective spec for `remote`. Never fails: unknown remotes and
    /// null/empty fields fall back to [`MountRegistry::default_spec`].
    /// Relative mount points are taken relative to the base directory.
    pub fn get(&self, remote: &str) -> MountSpec {
        let mut spec = self.default_spec(remote);
        let Some(stored) = self.entries.get(remote) else {
            return spec;
        };

        if let Some(mp) = stored
            .mount_point
            .as_ref()
            .filter(|p| !p.as_os_str().is_empty())
        {
            spec.mount_point = if mp.is_absolute() {
                mp.clone()
            } else {
                self.base_dir.join(mp)
            };
        }
        if let Some(params) = stored.mount_params.as_ref().filter(|p| !p.is_empty()) {
            spec.mount_params = params.clone();
        }
        spec
    }

    pub fn save(&self) -> RmountResult<()> {
        save_registry(&self.path, &self.entries)
    }
}
