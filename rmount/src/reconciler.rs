//! Bring remotes into the requested mount state.
//!
//! Each remote goes through validate, inspect, act and (for unmounts)
//! verify, and ends in exactly one [`ReconcileResult`]. Sweeps over `all`
//! never stop early; every remote is attempted and the outcomes are
//! collected into a [`Summary`].

use crate::catalog::RemoteCatalog;
use crate::inspector::{MountInspector, MountStatus};
use crate::lock::RemoteLock;
use crate::registry::{baseline_params, MountRegistry, MountSpec};
use crate::settings::{absolutize, Settings};
use rmount_error::{RmountError, RmountResult};
use rmount_hal::{MountRequest, SystemHal};
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub const ALL_REMOTES: &str = "all";

/// Which remotes a command applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    All,
    Remote(String),
}

impl Target {
    pub fn parse(arg: &str) -> Self {
        if arg == ALL_REMOTES {
            Target::All
        } else {
            Target::Remote(arg.to_string())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Mount,
    Unmount,
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    UnknownRemote,
    /// Explicit-path mount of a remote that is already mounted.
    AlreadyMounted,
    MountFailed,
    UnmountFailed,
    Locked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    AlreadyInState,
    Conflict,
    Failure(FailureReason),
}

impl Outcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Success | Outcome::AlreadyInState)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileResult {
    pub remote: String,
    pub action: Action,
    pub outcome: Outcome,
    /// Mount point involved, when one was resolved.
    pub path: Option<PathBuf>,
    pub detail: String,
}

impl ReconcileResult {
    fn new(remote: &str, action: Action, outcome: Outcome, detail: impl Into<String>) -> Self {
        Self {
            remote: remote.to_string(),
            action,
            outcome,
            path: None,
            detail: detail.into(),
        }
    }

    fn at(mut self, path: &Path) -> Self {
        self.path = Some(path.to_path_buf());
        self
    }

    fn failed(remote: &str, action: Action, reason: FailureReason, err: &RmountError) -> Self {
        Self::new(remote, action, Outcome::Failure(reason), err.to_string())
    }
}

impl fmt::Display for ReconcileResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match &self.outcome {
            Outcome::Success => "ok",
            Outcome::AlreadyInState => "unchanged",
            Outcome::Conflict => "conflict",
            Outcome::Failure(_) => "FAILED",
        };
        write!(f, "[{tag}] {}: {}", self.remote, self.detail)
    }
}

/// Outcomes of one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub results: Vec<ReconcileResult>,
}

impl Summary {
    pub fn single(result: ReconcileResult) -> Self {
        Self {
            results: vec![result],
        }
    }

    pub fn is_success(&self) -> bool {
        self.results.iter().all(|r| r.outcome.is_ok())
    }

    pub fn succeeded(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Success))
    }

    pub fn unchanged(&self) -> usize {
        self.count(|o| matches!(o, Outcome::AlreadyInState))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| !o.is_ok())
    }

    pub fn get(&self, remote: &str) -> Option<&ReconcileResult> {
        self.results.iter().find(|r| r.remote == remote)
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.results.iter().filter(|r| pred(&r.outcome)).count()
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} succeeded, {} already in state, {} failed",
            self.succeeded(),
            self.unchanged(),
            self.failed()
        )
    }
}

/// How to treat a remote that is already mounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strictness {
    /// Already mounted is a no-op.
    Lenient,
    /// Already mounted is an error; the caller must unmount first.
    Strict,
}

pub struct Reconciler<'a, H: SystemHal + ?Sized> {
    hal: &'a H,
    settings: &'a Settings,
    registry: &'a MountRegistry,
}

impl<'a, H: SystemHal + ?Sized> Reconciler<'a, H> {
    pub fn new(hal: &'a H, settings: &'a Settings, registry: &'a MountRegistry) -> Self {
        Self {
            hal,
            settings,
            registry,
        }
    }

    fn inspector(&self) -> MountInspector<'a, H> {
        MountInspector::new(self.hal)
    }

    /// Mount one remote, or every catalog remote for [`Target::All`], using
    /// registry settings. Already-mounted remotes are left alone.
    pub fn mount(&self, target: &Target) -> RmountResult<Summary> {
        let catalog = RemoteCatalog::new(self.hal).list()?;
        match target {
            Target::Remote(remote) => Ok(Summary::single(self.mount_one(
                remote,
                None,
                Strictness::Lenient,
                &catalog,
            ))),
            Target::All => {
                log::info!("Mounting {} remote(s)", catalog.len());
                let results = catalog
                    .iter()
                    .map(|remote| self.mount_one(remote, None, Strictness::Lenient, &catalog))
                    .collect();
                Ok(Summary { results })
            }
        }
    }

    /// Mount `remote` at an explicit `path` with the baseline params.
    /// Fails if the remote is mounted anywhere already. A relative `path` is
    /// taken relative to the current directory.
    pub fn mount_at(&self, remote: &str, path: &Path) -> RmountResult<Summary> {
        let path = absolutize(path)?;
        let catalog = RemoteCatalog::new(self.hal).list()?;
        Ok(Summary::single(self.mount_one(
            remote,
            Some(&path),
            Strictness::Strict,
            &catalog,
        )))
    }

    /// Unmount one remote, or every currently mounted rclone remote for
    /// [`Target::All`].
    pub fn unmount(&self, target: &Target) -> RmountResult<Summary> {
        match target {
            Target::Remote(remote) => {
                let catalog = RemoteCatalog::new(self.hal).list()?;
                if !catalog.contains(remote) {
                    let err = RmountError::UnknownRemote(remote.clone());
                    return Ok(Summary::single(ReconcileResult::failed(
                        remote,
                        Action::Skip,
                        FailureReason::UnknownRemote,
                        &err,
                    )));
                }
                Ok(Summary::single(self.unmount_one(remote)))
            }
            Target::All => {
                let mounted = self.inspector().mounted_remotes();
                if mounted.is_empty() {
                    log::info!("No rclone remotes are mounted");
                }
                let results = mounted
                    .iter()
                    .map(|remote| self.unmount_one(remote))
                    .collect();
                Ok(Summary { results })
            }
        }
    }

    fn mount_one(
        &self,
        remote: &str,
        explicit_path: Option<&Path>,
        strictness: Strictness,
        catalog: &BTreeSet<String>,
    ) -> ReconcileResult {
        if !catalog.contains(remote) {
            let err = RmountError::UnknownRemote(remote.to_string());
            log::error!("{err}");
            return ReconcileResult::failed(remote, Action::Skip, FailureReason::UnknownRemote, &err);
        }

        let _lock = match RemoteLock::acquire(&self.settings.lock_dir, remote) {
            Ok(lock) => lock,
            Err(err) => {
                log::error!("{err}");
                return ReconcileResult::failed(remote, Action::Skip, FailureReason::Locked, &err);
            }
        };

        let inspector = self.inspector();
        if let MountStatus::MountedAt(current) = inspector.current_mount(remote) {
            return match strictness {
                Strictness::Lenient => {
                    log::info!("{} is already mounted at {}", remote, current.display());
                    ReconcileResult::new(
                        remote,
                        Action::Skip,
                        Outcome::AlreadyInState,
                        format!("already mounted at {}", current.display()),
                    )
                    .at(&current)
                }
                Strictness::Strict => {
                    let err = RmountError::AlreadyMounted {
                        remote: remote.to_string(),
                        path: current.clone(),
                    };
                    log::error!("{err}");
                    ReconcileResult::failed(
                        remote,
                        Action::Skip,
                        FailureReason::AlreadyMounted,
                        &err,
                    )
                    .at(&current)
                }
            };
        }

        let spec = match explicit_path {
            Some(path) => MountSpec {
                mount_point: path.to_path_buf(),
                mount_params: baseline_params(),
            },
            None => self.registry.get(remote),
        };
        let target = spec.mount_point.as_path();

        if inspector.path_in_use(target) {
            let err = RmountError::MountPointBusy(target.to_path_buf());
            log::warn!("{}: {err}", remote);
            return ReconcileResult::new(remote, Action::Skip, Outcome::Conflict, err.to_string())
                .at(target);
        }

        if self.settings.dry_run {
            log::info!("DRY RUN: mkdir -p {}", target.display());
        } else if let Err(err) = fs::create_dir_all(target) {
            let err = RmountError::Io(err);
            log::error!("cannot create {}: {err}", target.display());
            return ReconcileResult::failed(remote, Action::Mount, FailureReason::MountFailed, &err)
                .at(target);
        }

        log::info!("Mounting {}: at {}", remote, target.display());
        let request = MountRequest::new(remote, target, spec.mount_params);
        match self.hal.mount_remote(&request, self.settings.dry_run) {
            Ok(()) => ReconcileResult::new(
                remote,
                Action::Mount,
                Outcome::Success,
                format!("mounted at {}", target.display()),
            )
            .at(target),
            Err(err) => {
                let err = RmountError::Hal(err);
                log::error!("mount of {} failed: {err}", remote);
                ReconcileResult::failed(remote, Action::Mount, FailureReason::MountFailed, &err)
                    .at(target)
            }
        }
    }

    fn unmount_one(&self, remote: &str) -> ReconcileResult {
        let _lock = match RemoteLock::acquire(&self.settings.lock_dir, remote) {
            Ok(lock) => lock,
            Err(err) => {
                log::error!("{err}");
                return ReconcileResult::failed(remote, Action::Skip, FailureReason::Locked, &err);
            }
        };

        let inspector = self.inspector();
        let path = match inspector.current_mount(remote) {
            MountStatus::MountedAt(path) => path,
            MountStatus::Unmounted => {
                log::info!("{} is not mounted", remote);
                return ReconcileResult::new(
                    remote,
                    Action::Skip,
                    Outcome::AlreadyInState,
                    "not mounted",
                );
            }
        };

        log::info!("Unmounting {} from {}", remote, path.display());
        let unmount_err = self.hal.unmount(&path, self.settings.dry_run).err();
        if let Some(err) = &unmount_err {
            log::warn!("unmount of {} reported: {err}", path.display());
        }

        if self.settings.dry_run {
            return ReconcileResult::new(
                remote,
                Action::Unmount,
                Outcome::Success,
                format!("would unmount {}", path.display()),
            )
            .at(&path);
        }

        if inspector.path_in_use(&path) {
            let err = RmountError::UnmountFailed {
                remote: remote.to_string(),
                path: path.clone(),
            };
            log::error!("{err}");
            let mut result =
                ReconcileResult::failed(remote, Action::Unmount, FailureReason::UnmountFailed, &err)
                    .at(&path);
            if let Some(cause) = unmount_err {
                result.detail = format!("{} ({cause})", result.detail);
            }
            return result;
        }

        if path == self.settings.default_mount_point(remote) {
            if let Err(err) = fs::remove_dir(&path) {
                log::debug!("left {} in place: {err}", path.display());
            }
        }

        ReconcileResult::new(
            remote,
            Action::Unmount,
            Outcome::Success,
            format!("unmounted {}", path.display()),
        )
        .at(&path)
    }
}
