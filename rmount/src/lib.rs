//! rmount: mount rclone remotes at remembered mount points.
//!
//! The pieces, leaf first: [`registry`] (desired mount point and options per
//! remote), [`inspector`] (what the kernel says is mounted), [`catalog`]
//! (what rclone knows about), and [`reconciler`] which compares them and
//! issues at most one mount or unmount per remote.

pub mod catalog;
pub mod cli;
pub mod dispatch;
pub mod inspector;
pub mod lock;
pub mod logging;
pub mod reconciler;
pub mod registry;
pub mod settings;

use clap::Parser;
use rmount_hal::LinuxHal;
use std::process::ExitCode;

pub use rmount_error::{RmountError, RmountResult};

pub fn run() -> anyhow::Result<ExitCode> {
    let cli = cli::Cli::parse();
    logging::init_with(cli.log_file.clone(), cli.verbose);

    let env = settings::Environment::from_process();
    let settings = settings::Settings::resolve(&cli.overrides(), &env)?;
    log::debug!("{:?}", settings);
    if settings.dry_run {
        log::info!("DRY RUN: nothing will be mounted, unmounted or written");
    }

    let hal = LinuxHal::new()
        .with_rclone_bin(settings.rclone_bin.clone())
        .with_fusermount_bin(settings.fusermount_bin.clone());

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    dispatch::dispatch(&cli.command, &settings, &hal, &mut out)
}
