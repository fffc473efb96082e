//! Command dispatch: one function per CLI verb.

use crate::catalog::RemoteCatalog;
use crate::cli::Command;
use crate::inspector::{MountInspector, MountStatus};
use crate::reconciler::{Reconciler, Summary, Target};
use crate::registry::{baseline_params, MountRegistry, StoredSpec};
use crate::settings::Settings;
use anyhow::{bail, Context, Result};
use rmount_error::RmountError;
use rmount_hal::SystemHal;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

/// Exit status when a single-remote command fails.
pub const EXIT_FAILURE: u8 = 1;
/// Exit status when an `all` sweep finished with at least one failure.
pub const EXIT_PARTIAL: u8 = 2;

pub fn dispatch<H, W>(
    command: &Command,
    settings: &Settings,
    hal: &H,
    out: &mut W,
) -> Result<ExitCode>
where
    H: SystemHal + ?Sized,
    W: Write,
{
    match command {
        Command::Mount { remote, path } => {
            let target = Target::parse(remote);
            let registry =
                MountRegistry::load_or_default(&settings.registry_path, &settings.base_dir);
            let reconciler = Reconciler::new(hal, settings, &registry);
            let summary = match (&target, path) {
                (Target::All, Some(_)) => {
                    bail!("an explicit mount path needs a single remote, not `all`")
                }
                (Target::Remote(name), Some(path)) => reconciler.mount_at(name, path)?,
                (_, None) => reconciler.mount(&target)?,
            };
            report(out, &target, &summary)
        }
        Command::Unmount { remote } => {
            let target = Target::parse(remote);
            let registry =
                MountRegistry::load_or_default(&settings.registry_path, &settings.base_dir);
            let summary = Reconciler::new(hal, settings, &registry).unmount(&target)?;
            report(out, &target, &summary)
        }
        Command::List => {
            list(hal, settings, out)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Config {
            force,
            remote,
            mount_point,
            params,
        } => {
            let change = remote.as_ref().map(|name| EntryChange {
                remote: name.clone(),
                mount_point: mount_point.clone(),
                params: params.clone(),
            });
            configure(hal, settings, *force, change, out)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn report<W: Write>(out: &mut W, target: &Target, summary: &Summary) -> Result<ExitCode> {
    for result in &summary.results {
        writeln!(out, "{result}")?;
    }
    match target {
        Target::All => {
            if summary.results.is_empty() {
                writeln!(out, "Nothing to do.")?;
            } else {
                writeln!(out, "{summary}")?;
            }
            if summary.is_success() {
                Ok(ExitCode::SUCCESS)
            } else {
                writeln!(out, "Some remotes failed; see above.")?;
                Ok(ExitCode::from(EXIT_PARTIAL))
            }
        }
        Target::Remote(_) => {
            if summary.is_success() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::from(EXIT_FAILURE))
            }
        }
    }
}

/// Print every catalog remote with its status and mount point.
pub fn list<H, W>(hal: &H, settings: &Settings, out: &mut W) -> Result<()>
where
    H: SystemHal + ?Sized,
    W: Write,
{
    let remotes = RemoteCatalog::new(hal).list()?;
    let registry = MountRegistry::load_or_default(&settings.registry_path, &settings.base_dir);
    let inspector = MountInspector::new(hal);

    let width = remotes.iter().map(String::len).max().unwrap_or(0).max(6);
    writeln!(out, "{:<width$}  {:<9}  MOUNT POINT", "REMOTE", "STATUS")?;
    for remote in &remotes {
        let status = inspector.current_mount(remote);
        let path = match &status {
            MountStatus::MountedAt(path) => path.clone(),
            MountStatus::Unmounted => registry.get(remote).mount_point,
        };
        writeln!(out, "{:<width$}  {:<9}  {}", remote, status, path.display())?;
    }
    Ok(())
}

/// A `config --remote` edit.
#[derive(Debug, Clone, Default)]
pub struct EntryChange {
    pub remote: String,
    pub mount_point: Option<PathBuf>,
    pub params: Vec<String>,
}

/// Run `rclone config` when forced or on first use, then write a registry
/// entry for every configured remote.
pub fn configure<H, W>(
    hal: &H,
    settings: &Settings,
    force: bool,
    change: Option<EntryChange>,
    out: &mut W,
) -> Result<()>
where
    H: SystemHal + ?Sized,
    W: Write,
{
    let first_run = !settings.registry_path.exists();

    // Fail before the interactive session if the registry cannot be kept.
    let mut registry = MountRegistry::load(&settings.registry_path, &settings.base_dir)?;

    if force || first_run {
        log::info!("Starting rclone config");
        hal.configure(settings.dry_run)
            .context("rclone config did not finish")?;
    } else {
        log::info!(
            "Registry {} exists; skipping rclone config (use --force to run it)",
            registry.path().display()
        );
    }

    let remotes = RemoteCatalog::new(hal).list()?;

    let map = registry.entries_mut();
    let before = map.len();
    map.retain(|name, _| remotes.contains(name));
    let dropped = before - map.len();
    if dropped > 0 {
        log::info!("Dropped {dropped} registry entries for removed remotes");
    }

    let mut added = 0;
    for remote in &remotes {
        map.entry(remote.clone()).or_insert_with(|| {
            added += 1;
            StoredSpec {
                mount_point: Some(settings.default_mount_point(remote)),
                mount_params: Some(baseline_params()),
            }
        });
    }

    if let Some(change) = change {
        let entry = map
            .get_mut(&change.remote)
            .ok_or_else(|| RmountError::UnknownRemote(change.remote.clone()))?;
        if let Some(mp) = change.mount_point {
            entry.mount_point = Some(mp);
        }
        if !change.params.is_empty() {
            entry.mount_params = Some(change.params);
        }
        writeln!(out, "Updated {}", change.remote)?;
    }

    let total = registry.entries().len();
    if settings.dry_run {
        log::info!(
            "DRY RUN: would write {} entries to {}",
            total,
            registry.path().display()
        );
    } else {
        registry.save()?;
    }

    writeln!(
        out,
        "{} remote(s) in {} ({} new, {} removed)",
        total,
        registry.path().display(),
        added,
        dropped
    )?;
    Ok(())
}
